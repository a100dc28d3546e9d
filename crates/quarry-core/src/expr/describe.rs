use crate::{
    expr::{ExprArena, ExprId, ExprKind, HostExpr},
    value::ValueType,
};
use std::fmt::Write;

///
/// NodeKind
///
/// Discriminant of a node's role, without its payload.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Match,
    Project,
    Field,
    Parameter,
    Constant,
    Captured,
    Member,
    Binary,
    Not,
    Call,
    Lambda,
    NewObject,
    Collection,
    Sequence,
}

impl NodeKind {
    #[must_use]
    pub const fn of(kind: &ExprKind) -> Self {
        match kind {
            ExprKind::Match { .. } => Self::Match,
            ExprKind::Project { .. } => Self::Project,
            ExprKind::Field { .. } => Self::Field,
            ExprKind::Host(host) => match host {
                HostExpr::Parameter { .. } => Self::Parameter,
                HostExpr::Constant(_) => Self::Constant,
                HostExpr::Captured { .. } => Self::Captured,
                HostExpr::Member { .. } => Self::Member,
                HostExpr::Binary { .. } => Self::Binary,
                HostExpr::Not(_) => Self::Not,
                HostExpr::Call { .. } => Self::Call,
                HostExpr::Lambda { .. } => Self::Lambda,
                HostExpr::NewObject { .. } => Self::NewObject,
                HostExpr::Collection(_) => Self::Collection,
                HostExpr::Sequence { .. } => Self::Sequence,
            },
        }
    }
}

///
/// ExprDescription
///
/// Read-only view of one node for external formatters.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ExprDescription {
    pub kind: NodeKind,
    pub result_type: ValueType,
    pub children: Vec<ExprId>,
    pub text: String,
}

/// Describe a node without exposing the arena.
#[must_use]
pub fn describe(arena: &ExprArena, id: ExprId) -> ExprDescription {
    let node = arena.get(id);

    ExprDescription {
        kind: NodeKind::of(node.kind()),
        result_type: node.result_type().clone(),
        children: node.kind().children(),
        text: render(arena, id),
    }
}

/// Render a compact one-line diagnostic form of a subtree.
#[must_use]
pub fn render(arena: &ExprArena, id: ExprId) -> String {
    let mut out = String::new();
    write_node(arena, id, &mut out);

    out
}

fn write_list(arena: &ExprArena, ids: &[ExprId], out: &mut String) {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_node(arena, *id, out);
    }
}

// String writes are infallible; results are ignored.
fn write_node(arena: &ExprArena, id: ExprId, out: &mut String) {
    match arena.kind(id) {
        ExprKind::Match { source, predicate } => {
            out.push_str("Match(");
            write_list(arena, &[*source, *predicate], out);
            out.push(')');
        }
        ExprKind::Project { source, projector } => {
            out.push_str("Project(");
            write_list(arena, &[*source, *projector], out);
            out.push(')');
        }
        ExprKind::Field {
            mapping,
            is_projected,
            ..
        } => {
            let marker = if *is_projected { "*" } else { "" };
            let _ = write!(out, "Field({}{marker})", mapping.element);
        }
        ExprKind::Host(host) => match host {
            HostExpr::Parameter { name } | HostExpr::Captured { name, .. } => out.push_str(name),
            HostExpr::Constant(value) => {
                let _ = write!(out, "{value}");
            }
            HostExpr::Member { target, member } => {
                write_node(arena, *target, out);
                let _ = write!(out, ".{member}");
            }
            HostExpr::Binary { op, left, right } => {
                out.push('(');
                write_node(arena, *left, out);
                let _ = write!(out, " {op} ");
                write_node(arena, *right, out);
                out.push(')');
            }
            HostExpr::Not(operand) => {
                out.push('!');
                write_node(arena, *operand, out);
            }
            HostExpr::Call {
                method,
                target,
                args,
            } => {
                if let Some(target) = target {
                    write_node(arena, *target, out);
                    out.push('.');
                }
                let _ = write!(out, "{method}(");
                write_list(arena, args, out);
                out.push(')');
            }
            HostExpr::Lambda { params, body } => {
                out.push('|');
                write_list(arena, params, out);
                out.push_str("| ");
                write_node(arena, *body, out);
            }
            HostExpr::NewObject { members } => {
                out.push_str("{ ");
                for (i, (name, member)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{name}: ");
                    write_node(arena, *member, out);
                }
                out.push_str(" }");
            }
            HostExpr::Collection(namespace) => {
                let _ = write!(out, "Collection({namespace})");
            }
            HostExpr::Sequence {
                operator,
                source,
                args,
            } => {
                write_node(arena, *source, out);
                let _ = write!(out, ".{operator}(");
                write_list(arena, args, out);
                out.push(')');
            }
        },
    }
}
