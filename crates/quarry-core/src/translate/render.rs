//! Module: translate::render
//! Responsibility: decide which bound nodes the wire target can express, and
//! render bound predicates and projectors into filter/projection documents.
//! Does not own: stage ordering or execution-target selection.

use crate::{
    ID_ELEMENT, codec,
    expr::{BinaryOp, ExprArena, ExprId, ExprKind, FieldMapping, HostExpr, render},
    translate::{
        TranslateError,
        evaluate::{LocalMethod, is_locally_evaluable},
    },
    value::{Value, ValueType},
};
use bson::{Bson, Document, doc};

///
/// StageContext
///
/// Which stage a body is being checked for.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StageContext {
    Filter,
    Projection,
}

///
/// TargetCapability
///
/// Predicate over bound nodes: can the wire target (or, for projections,
/// client-side shaping over returned documents) handle this node?
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct TargetCapability {
    document: ExprId,
    context: StageContext,
}

impl TargetCapability {
    pub(crate) const fn new(document: ExprId, context: StageContext) -> Self {
        Self { document, context }
    }

    pub(crate) fn supports(&self, arena: &ExprArena, id: ExprId) -> bool {
        if self.is_document_chain(arena, id) {
            return true;
        }

        match arena.kind(id) {
            ExprKind::Field { .. } => true,
            ExprKind::Match { .. } | ExprKind::Project { .. } => false,
            ExprKind::Host(host) => match self.context {
                StageContext::Projection => is_locally_evaluable(arena, id),
                StageContext::Filter => Self::supports_in_filter(arena, host),
            },
        }
    }

    fn supports_in_filter(arena: &ExprArena, host: &HostExpr) -> bool {
        match host {
            HostExpr::Constant(_) | HostExpr::Captured { .. } | HostExpr::Not(_) => true,
            HostExpr::Binary { op, left, right } if op.is_comparison() => {
                field_and_literal(arena, *left, *right).is_some()
            }
            HostExpr::Binary { op, .. } => op.is_logical(),
            HostExpr::Call {
                method,
                target: Some(target),
                args,
            } => match (LocalMethod::parse(method), args.as_slice()) {
                (Some(LocalMethod::StartsWith | LocalMethod::EndsWith), [arg]) => {
                    text_field(arena, *target) && is_literal(arena, *arg)
                }
                (Some(LocalMethod::Contains), [arg]) => {
                    field_and_literal(arena, *target, *arg).is_some()
                }
                _ => false,
            },
            _ => false,
        }
    }

    // the document parameter, or member chains hanging off it
    fn is_document_chain(&self, arena: &ExprArena, id: ExprId) -> bool {
        if id == self.document {
            return true;
        }

        match arena.kind(id) {
            ExprKind::Host(HostExpr::Member { target, .. }) => {
                self.is_document_chain(arena, *target)
            }
            _ => false,
        }
    }
}

fn is_literal(arena: &ExprArena, id: ExprId) -> bool {
    literal(arena, id).is_some()
}

fn literal(arena: &ExprArena, id: ExprId) -> Option<&Value> {
    match arena.kind(id) {
        ExprKind::Host(HostExpr::Constant(value) | HostExpr::Captured { value, .. }) => Some(value),
        _ => None,
    }
}

fn field(arena: &ExprArena, id: ExprId) -> Option<&FieldMapping> {
    match arena.kind(id) {
        ExprKind::Field { mapping, .. } => Some(mapping),
        _ => None,
    }
}

fn text_field(arena: &ExprArena, id: ExprId) -> bool {
    field(arena, id).is_some_and(|mapping| matches!(mapping.ty, ValueType::String))
}

/// Split a `(field, literal)` pair in either order. `true` means the literal
/// came first.
fn field_and_literal<'a>(
    arena: &'a ExprArena,
    left: ExprId,
    right: ExprId,
) -> Option<(&'a FieldMapping, &'a Value, bool)> {
    match (field(arena, left), literal(arena, right)) {
        (Some(mapping), Some(value)) => Some((mapping, value, false)),
        _ => match (literal(arena, left), field(arena, right)) {
            (Some(value), Some(mapping)) => Some((mapping, value, true)),
            _ => None,
        },
    }
}

///
/// FilterRenderer
///

pub(crate) struct FilterRenderer<'a> {
    arena: &'a ExprArena,
}

impl<'a> FilterRenderer<'a> {
    pub(crate) const fn new(arena: &'a ExprArena) -> Self {
        Self { arena }
    }

    pub(crate) fn render(&self, id: ExprId) -> Result<Document, TranslateError> {
        match self.arena.kind(id) {
            ExprKind::Field { mapping, .. } if matches!(mapping.ty, ValueType::Boolean) => {
                Ok(doc! { mapping.element.as_str(): true })
            }
            ExprKind::Host(host) => self.render_host(id, host),
            _ => Err(self.untranslatable(id)),
        }
    }

    fn render_host(&self, id: ExprId, host: &HostExpr) -> Result<Document, TranslateError> {
        match host {
            HostExpr::Constant(Value::Bool(true)) => Ok(Document::new()),
            HostExpr::Constant(Value::Bool(false)) => Ok(doc! { "$nor": [Document::new()] }),
            HostExpr::Binary { op, .. } if op.is_logical() => {
                let mut clauses = Vec::new();
                self.flatten(*op, id, &mut clauses)?;
                let key = if *op == BinaryOp::And { "$and" } else { "$or" };

                Ok(doc! { key: clauses })
            }
            HostExpr::Binary { op, left, right } if op.is_comparison() => {
                self.render_comparison(id, *op, *left, *right)
            }
            HostExpr::Not(operand) => Ok(doc! { "$nor": [self.render(*operand)?] }),
            HostExpr::Call {
                method,
                target: Some(target),
                args,
            } => self.render_call(id, method, *target, args),
            _ => Err(self.untranslatable(id)),
        }
    }

    // a && (b && c) renders as one $and with three clauses
    fn flatten(
        &self,
        op: BinaryOp,
        id: ExprId,
        clauses: &mut Vec<Document>,
    ) -> Result<(), TranslateError> {
        match self.arena.kind(id) {
            ExprKind::Host(HostExpr::Binary {
                op: inner,
                left,
                right,
            }) if *inner == op => {
                self.flatten(op, *left, clauses)?;
                self.flatten(op, *right, clauses)
            }
            _ => {
                clauses.push(self.render(id)?);
                Ok(())
            }
        }
    }

    fn render_comparison(
        &self,
        id: ExprId,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    ) -> Result<Document, TranslateError> {
        let (mapping, value, flipped) =
            field_and_literal(self.arena, left, right).ok_or_else(|| self.untranslatable(id))?;
        let op = if flipped { op.flipped() } else { op };
        let wire = codec::encode(value, &mapping.ty)?;
        let path = mapping.element.as_str();

        Ok(match op {
            BinaryOp::Eq => doc! { path: wire },
            BinaryOp::Ne => doc! { path: { "$ne": wire } },
            BinaryOp::Lt => doc! { path: { "$lt": wire } },
            BinaryOp::Lte => doc! { path: { "$lte": wire } },
            BinaryOp::Gt => doc! { path: { "$gt": wire } },
            BinaryOp::Gte => doc! { path: { "$gte": wire } },
            _ => return Err(self.untranslatable(id)),
        })
    }

    fn render_call(
        &self,
        id: ExprId,
        method: &str,
        target: ExprId,
        args: &[ExprId],
    ) -> Result<Document, TranslateError> {
        let [arg] = args else {
            return Err(self.untranslatable(id));
        };

        match LocalMethod::parse(method) {
            Some(method @ (LocalMethod::StartsWith | LocalMethod::EndsWith)) => {
                let (Some(mapping), Some(Value::Text(text))) =
                    (field(self.arena, target), literal(self.arena, *arg))
                else {
                    return Err(self.untranslatable(id));
                };
                let escaped = regex::escape(text);
                let pattern = if method == LocalMethod::StartsWith {
                    format!("^{escaped}")
                } else {
                    format!("{escaped}$")
                };

                Ok(doc! { mapping.element.as_str(): { "$regex": pattern } })
            }
            Some(LocalMethod::Contains) => self.render_contains(id, target, *arg),
            _ => Err(self.untranslatable(id)),
        }
    }

    fn render_contains(
        &self,
        id: ExprId,
        target: ExprId,
        arg: ExprId,
    ) -> Result<Document, TranslateError> {
        let (mapping, value, literal_first) =
            field_and_literal(self.arena, target, arg).ok_or_else(|| self.untranslatable(id))?;
        let path = mapping.element.as_str();

        match (literal_first, value, &mapping.ty) {
            // list.contains(field)
            (true, Value::List(items), ty) => {
                let encoded = items
                    .iter()
                    .map(|item| codec::encode(item, ty))
                    .collect::<Result<Vec<Bson>, _>>()?;

                Ok(doc! { path: { "$in": encoded } })
            }
            (false, Value::Text(text), ValueType::String) => {
                Ok(doc! { path: { "$regex": regex::escape(text) } })
            }
            // array field contains element
            (false, value, ValueType::Array(element)) => {
                Ok(doc! { path: codec::encode(value, element)? })
            }
            _ => Err(self.untranslatable(id)),
        }
    }

    fn untranslatable(&self, id: ExprId) -> TranslateError {
        TranslateError::UntranslatableExpression {
            expression: render(self.arena, id),
        }
    }
}

/// Combine filters from successive `Where` stages into one document.
pub(crate) fn combine_filters(mut filters: Vec<Document>) -> Document {
    filters.retain(|filter| !filter.is_empty());

    match filters.len() {
        0 => Document::new(),
        1 => filters.remove(0),
        _ => doc! { "$and": filters },
    }
}

///
/// Compute the projection document for a projector, or `None` when the
/// projector needs the whole stored document.
///
pub(crate) fn render_projection(
    arena: &ExprArena,
    projector: ExprId,
    document: ExprId,
) -> Option<Document> {
    let mut paths = Vec::new();
    if !collect_paths(arena, projector, document, &mut paths) {
        return None;
    }

    // a stored path covers every path beneath it; order is first-seen
    let mut kept: Vec<String> = Vec::new();
    for path in paths {
        if kept.iter().any(|prefix| covers(prefix, &path)) {
            continue;
        }
        kept.retain(|existing| !covers(&path, existing));
        kept.push(path);
    }

    let mut projection = Document::new();
    for path in &kept {
        projection.insert(path.as_str(), 1);
    }
    if !kept.iter().any(|path| path == ID_ELEMENT) {
        projection.insert(ID_ELEMENT, 0);
    }

    Some(projection)
}

fn covers(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

// false when the document root itself is referenced
fn collect_paths(
    arena: &ExprArena,
    id: ExprId,
    document: ExprId,
    paths: &mut Vec<String>,
) -> bool {
    if id == document {
        return false;
    }

    match arena.kind(id) {
        ExprKind::Field { mapping, .. } => {
            paths.push(mapping.element.clone());
            true
        }
        kind => kind
            .children()
            .into_iter()
            .all(|child| collect_paths(arena, child, document, paths)),
    }
}
