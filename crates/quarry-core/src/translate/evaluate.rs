//! Module: translate::evaluate
//! Responsibility: local evaluation of host subtrees, both ahead of translation
//! (constant folding) and over returned documents (client-side shaping).
//! Does not own: wire rendering or field binding.

use crate::{
    codec::{self, lookup_path},
    expr::{BinaryOp, ExprArena, ExprId, ExprKind, HostExpr, render},
    translate::{TranslateError, nominate::nominate, replace::replace_all},
    value::{Value, ValueType},
};
use bson::{Bson, Document};
use std::{cmp::Ordering, collections::BTreeMap};

///
/// LocalMethod
///
/// Host methods the local evaluator knows how to run.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum LocalMethod {
    StartsWith,
    EndsWith,
    Contains,
    Len,
    ToUpper,
    ToLower,
    Trim,
}

impl LocalMethod {
    pub(crate) fn parse(method: &str) -> Option<Self> {
        Some(match method {
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "contains" => Self::Contains,
            "len" => Self::Len,
            "to_upper" => Self::ToUpper,
            "to_lower" => Self::ToLower,
            "trim" => Self::Trim,
            _ => return None,
        })
    }
}

/// True for nodes that can be computed without a stored document.
pub(crate) fn is_locally_evaluable(arena: &ExprArena, id: ExprId) -> bool {
    match arena.kind(id) {
        ExprKind::Match { .. } | ExprKind::Project { .. } | ExprKind::Field { .. } => false,
        ExprKind::Host(host) => match host {
            HostExpr::Parameter { .. }
            | HostExpr::Lambda { .. }
            | HostExpr::Collection(_)
            | HostExpr::Sequence { .. } => false,
            HostExpr::Call { method, .. } => LocalMethod::parse(method).is_some(),
            HostExpr::Constant(_)
            | HostExpr::Captured { .. }
            | HostExpr::Member { .. }
            | HostExpr::Binary { .. }
            | HostExpr::Not(_)
            | HostExpr::NewObject { .. } => true,
        },
    }
}

///
/// Replace every maximal document-independent subtree of `root` with the
/// constant it evaluates to. Subtrees that are already constants are left alone.
///
pub(crate) fn fold_local_subtrees(
    arena: &mut ExprArena,
    root: ExprId,
) -> Result<ExprId, TranslateError> {
    let candidates = nominate(arena, root, is_locally_evaluable);
    let targets: Vec<ExprId> = candidates
        .maximal(arena, root)
        .into_iter()
        .filter(|id| !matches!(arena.kind(*id), ExprKind::Host(HostExpr::Constant(_))))
        .collect();
    if targets.is_empty() {
        return Ok(root);
    }

    let evaluator = Evaluator::detached(arena);
    let folded = targets
        .iter()
        .map(|id| Ok((evaluator.evaluate(*id)?, arena.result_type(*id).clone())))
        .collect::<Result<Vec<(Value, ValueType)>, TranslateError>>()?;

    let constants: Vec<ExprId> = folded
        .into_iter()
        .map(|(value, ty)| arena.typed_constant(value, ty))
        .collect();

    Ok(replace_all(arena, root, &targets, &constants)?)
}

///
/// Row
///
/// A returned document plus the parameter that stands for it.
///

#[derive(Clone, Copy)]
struct Row<'a> {
    document: &'a Document,
    root: ExprId,
}

///
/// Evaluator
///
/// Computes host values. Without a row, fields and parameters are errors;
/// with a row, fields are decoded from the document through the codec.
///

pub(crate) struct Evaluator<'a> {
    arena: &'a ExprArena,
    row: Option<Row<'a>>,
}

impl<'a> Evaluator<'a> {
    pub(crate) const fn detached(arena: &'a ExprArena) -> Self {
        Self { arena, row: None }
    }

    pub(crate) const fn over_row(
        arena: &'a ExprArena,
        document: &'a Document,
        root: ExprId,
    ) -> Self {
        Self {
            arena,
            row: Some(Row { document, root }),
        }
    }

    pub(crate) fn evaluate(&self, id: ExprId) -> Result<Value, TranslateError> {
        match self.arena.kind(id) {
            ExprKind::Field { mapping, .. } => {
                let row = self.row.ok_or_else(|| self.fail(id, "field has no document to read"))?;
                match lookup_path(row.document, &mapping.element) {
                    Some(wire) => Ok(codec::decode(wire, &mapping.ty)?),
                    None => Ok(Value::Null),
                }
            }
            ExprKind::Match { .. } | ExprKind::Project { .. } => {
                Err(self.fail(id, "stages cannot be evaluated locally"))
            }
            ExprKind::Host(host) => self.evaluate_host(id, host),
        }
    }

    fn evaluate_host(&self, id: ExprId, host: &HostExpr) -> Result<Value, TranslateError> {
        match host {
            HostExpr::Constant(value) | HostExpr::Captured { value, .. } => Ok(value.clone()),
            HostExpr::Parameter { .. } => match self.row {
                Some(row) if row.root == id => Ok(codec::decode(
                    &Bson::Document(row.document.clone()),
                    self.arena.result_type(id),
                )?),
                _ => Err(self.fail(id, "parameter is not bound to a value")),
            },
            HostExpr::Member { target, member } => match self.evaluate(*target)? {
                Value::Document(fields) => Ok(fields.get(member).cloned().unwrap_or(Value::Null)),
                Value::Null => Ok(Value::Null),
                _ => Err(self.fail(id, "member access on a non-document value")),
            },
            HostExpr::Binary { op, left, right } => self.evaluate_binary(*op, *left, *right),
            HostExpr::Not(operand) => match self.evaluate(*operand)? {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                _ => Err(self.fail(id, "negation of a non-boolean value")),
            },
            HostExpr::Call {
                method,
                target,
                args,
            } => self.evaluate_call(id, method, *target, args),
            HostExpr::NewObject { members } => {
                let mut fields = BTreeMap::new();
                for (name, member) in members {
                    fields.insert(name.clone(), self.evaluate(*member)?);
                }
                Ok(Value::Document(fields))
            }
            HostExpr::Lambda { .. } | HostExpr::Collection(_) | HostExpr::Sequence { .. } => {
                Err(self.fail(id, "sequence expressions cannot be evaluated locally"))
            }
        }
    }

    fn evaluate_binary(
        &self,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    ) -> Result<Value, TranslateError> {
        // logical operators short-circuit
        if op.is_logical() {
            let lhs = self.evaluate_bool(left)?;
            return match (op, lhs) {
                (BinaryOp::And, false) => Ok(Value::Bool(false)),
                (BinaryOp::Or, true) => Ok(Value::Bool(true)),
                _ => Ok(Value::Bool(self.evaluate_bool(right)?)),
            };
        }

        let lhs = self.evaluate(left)?;
        let rhs = self.evaluate(right)?;
        if op.is_comparison() {
            return compare(op, &lhs, &rhs)
                .map(Value::Bool)
                .ok_or_else(|| invalid_operands(op, &lhs, &rhs));
        }

        arithmetic(op, &lhs, &rhs).ok_or_else(|| invalid_operands(op, &lhs, &rhs))
    }

    fn evaluate_bool(&self, id: ExprId) -> Result<bool, TranslateError> {
        self.evaluate(id)?
            .as_bool()
            .ok_or_else(|| self.fail(id, "expected a boolean value"))
    }

    fn evaluate_call(
        &self,
        id: ExprId,
        method: &str,
        target: Option<ExprId>,
        args: &[ExprId],
    ) -> Result<Value, TranslateError> {
        let method = LocalMethod::parse(method).ok_or_else(|| self.fail(id, "unknown method"))?;
        let Some(target) = target else {
            return Err(self.fail(id, "method call has no receiver"));
        };
        let receiver = self.evaluate(target)?;
        let args = args
            .iter()
            .map(|arg| self.evaluate(*arg))
            .collect::<Result<Vec<_>, _>>()?;

        let result = match (method, &receiver, args.as_slice()) {
            (LocalMethod::StartsWith, Value::Text(s), [Value::Text(p)]) => {
                Value::Bool(s.starts_with(p.as_str()))
            }
            (LocalMethod::EndsWith, Value::Text(s), [Value::Text(p)]) => {
                Value::Bool(s.ends_with(p.as_str()))
            }
            (LocalMethod::Contains, Value::Text(s), [Value::Text(p)]) => {
                Value::Bool(s.contains(p.as_str()))
            }
            (LocalMethod::Contains, Value::List(items), [needle]) => Value::Bool(
                items
                    .iter()
                    .any(|item| compare(BinaryOp::Eq, item, needle) == Some(true)),
            ),
            (LocalMethod::Len, Value::Text(s), []) => Value::Int64(count(s.chars().count())),
            (LocalMethod::Len, Value::List(items), []) => Value::Int64(count(items.len())),
            (LocalMethod::ToUpper, Value::Text(s), []) => Value::Text(s.to_uppercase()),
            (LocalMethod::ToLower, Value::Text(s), []) => Value::Text(s.to_lowercase()),
            (LocalMethod::Trim, Value::Text(s), []) => Value::Text(s.trim().to_string()),
            _ => return Err(self.fail(id, "method does not apply to these operands")),
        };

        Ok(result)
    }

    fn fail(&self, id: ExprId, reason: &'static str) -> TranslateError {
        TranslateError::Evaluation {
            expression: render(self.arena, id),
            reason,
        }
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn invalid_operands(op: BinaryOp, left: &Value, right: &Value) -> TranslateError {
    TranslateError::InvalidOperands {
        op,
        left: left.kind_label(),
        right: right.kind_label(),
    }
}

/// Host comparison semantics. `None` when the operands are not comparable.
pub(crate) fn compare(op: BinaryOp, left: &Value, right: &Value) -> Option<bool> {
    let ordering = left.compare(right);

    match op {
        BinaryOp::Eq => Some(ordering == Some(Ordering::Equal) || left == right),
        BinaryOp::Ne => Some(ordering != Some(Ordering::Equal) && left != right),
        BinaryOp::Lt => Some(ordering? == Ordering::Less),
        BinaryOp::Lte => Some(ordering? != Ordering::Greater),
        BinaryOp::Gt => Some(ordering? == Ordering::Greater),
        BinaryOp::Gte => Some(ordering? != Ordering::Less),
        _ => None,
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) if op == BinaryOp::Add => {
            Some(Value::Text(format!("{a}{b}")))
        }
        (Value::Int32(a), Value::Int32(b)) => int_op(op, i64::from(*a), i64::from(*b))
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int32),
        (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
            int_op(op, left.as_i64()?, right.as_i64()?).map(Value::Int64)
        }
        _ => float_op(op, left.as_f64()?, right.as_f64()?).map(Value::Double),
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        _ => None,
    }
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Option<f64> {
    match op {
        BinaryOp::Add => Some(a + b),
        BinaryOp::Sub => Some(a - b),
        BinaryOp::Mul => Some(a * b),
        BinaryOp::Div => Some(a / b),
        BinaryOp::Mod => Some(a % b),
        _ => None,
    }
}
