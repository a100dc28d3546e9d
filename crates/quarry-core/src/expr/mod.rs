//! Module: expr
//! Responsibility: the expression node model shared by host expressions and translation IR.
//! Does not own: traversal passes (see `translate`) or wire rendering.
//! Boundary: nodes are allocated in an `ExprArena`; an `ExprId` is a node's identity.

mod arena;
mod describe;

#[cfg(test)]
mod tests;

pub use arena::ExprArena;
pub use describe::{ExprDescription, NodeKind, describe, render};

use crate::{
    model::Namespace,
    value::{Value, ValueType},
};
use derive_more::Display;
use std::fmt;
use thiserror::Error as ThisError;

///
/// ExprId
///
/// Arena index of one node, tagged with the arena that minted it. Two
/// structurally identical nodes are distinct unless they share an id.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("#{index}")]
pub struct ExprId {
    arena: u64,
    index: usize,
}

///
/// Expr
///
/// Immutable node: a kind plus the result type fixed at construction.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    kind: ExprKind,
    ty: ValueType,
}

impl Expr {
    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    #[must_use]
    pub const fn result_type(&self) -> &ValueType {
        &self.ty
    }
}

///
/// ExprKind
///
/// Closed set of IR stages plus a fallback for host-grammar nodes.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Filter stage: `predicate` evaluated per element of `source`.
    Match { source: ExprId, predicate: ExprId },

    /// Reshape stage: `projector` describes each output element of `source`.
    Project { source: ExprId, projector: ExprId },

    /// Bound reference to a stored element.
    Field {
        inner: ExprId,
        mapping: FieldMapping,
        is_projected: bool,
    },

    Host(HostExpr),
}

impl ExprKind {
    /// Ordered child ids; the generic visitation used by every traversal.
    #[must_use]
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            Self::Match { source, predicate } => vec![*source, *predicate],
            Self::Project { source, projector } => vec![*source, *projector],
            Self::Field { inner, .. } => vec![*inner],
            Self::Host(host) => host.children(),
        }
    }

    /// Same node shape with children taken from `children` in order.
    /// Missing entries keep the original child.
    #[must_use]
    pub fn with_children(&self, children: &[ExprId]) -> Self {
        let mut it = children.iter().copied();
        let mut next = |original: ExprId| it.next().unwrap_or(original);

        match self {
            Self::Match { source, predicate } => Self::Match {
                source: next(*source),
                predicate: next(*predicate),
            },
            Self::Project { source, projector } => Self::Project {
                source: next(*source),
                projector: next(*projector),
            },
            Self::Field {
                inner,
                mapping,
                is_projected,
            } => Self::Field {
                inner: next(*inner),
                mapping: mapping.clone(),
                is_projected: *is_projected,
            },
            Self::Host(host) => Self::Host(host.with_children(&mut next)),
        }
    }

    #[must_use]
    pub const fn as_host(&self) -> Option<&HostExpr> {
        match self {
            Self::Host(host) => Some(host),
            _ => None,
        }
    }
}

///
/// HostExpr
///
/// Nodes of the host query-expression grammar that the IR wraps but does not define.
///

#[derive(Clone, Debug, PartialEq)]
pub enum HostExpr {
    Parameter {
        name: String,
    },
    Constant(Value),
    /// Variable captured from the caller's scope; evaluated locally.
    Captured {
        name: String,
        value: Value,
    },
    Member {
        target: ExprId,
        member: String,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Not(ExprId),
    Call {
        method: String,
        target: Option<ExprId>,
        args: Vec<ExprId>,
    },
    Lambda {
        params: Vec<ExprId>,
        body: ExprId,
    },
    NewObject {
        members: Vec<(String, ExprId)>,
    },
    Collection(Namespace),
    Sequence {
        operator: SequenceOperator,
        source: ExprId,
        args: Vec<ExprId>,
    },
}

impl HostExpr {
    #[must_use]
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            Self::Parameter { .. }
            | Self::Constant(_)
            | Self::Captured { .. }
            | Self::Collection(_) => Vec::new(),
            Self::Member { target, .. } => vec![*target],
            Self::Binary { left, right, .. } => vec![*left, *right],
            Self::Not(operand) => vec![*operand],
            Self::Call { target, args, .. } => target.iter().chain(args).copied().collect(),
            Self::Lambda { params, body } => {
                params.iter().copied().chain(std::iter::once(*body)).collect()
            }
            Self::NewObject { members } => members.iter().map(|(_, id)| *id).collect(),
            Self::Sequence { source, args, .. } => {
                std::iter::once(*source).chain(args.iter().copied()).collect()
            }
        }
    }

    fn with_children(&self, next: &mut impl FnMut(ExprId) -> ExprId) -> Self {
        match self {
            Self::Parameter { .. }
            | Self::Constant(_)
            | Self::Captured { .. }
            | Self::Collection(_) => self.clone(),
            Self::Member { target, member } => Self::Member {
                target: next(*target),
                member: member.clone(),
            },
            Self::Binary { op, left, right } => Self::Binary {
                op: *op,
                left: next(*left),
                right: next(*right),
            },
            Self::Not(operand) => Self::Not(next(*operand)),
            Self::Call {
                method,
                target,
                args,
            } => Self::Call {
                method: method.clone(),
                target: target.map(&mut *next),
                args: args.iter().map(|arg| next(*arg)).collect(),
            },
            Self::Lambda { params, body } => Self::Lambda {
                params: params.iter().map(|param| next(*param)).collect(),
                body: next(*body),
            },
            Self::NewObject { members } => Self::NewObject {
                members: members
                    .iter()
                    .map(|(name, id)| (name.clone(), next(*id)))
                    .collect(),
            },
            Self::Sequence {
                operator,
                source,
                args,
            } => Self::Sequence {
                operator: *operator,
                source: next(*source),
                args: args.iter().map(|arg| next(*arg)).collect(),
            },
        }
    }
}

///
/// FieldMapping
///
/// Wire element path (dotted for nested documents) and declared type of a bound field.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldMapping {
    pub element: String,
    pub ty: ValueType,
}

impl FieldMapping {
    #[must_use]
    pub fn new(element: impl Into<String>, ty: ValueType) -> Self {
        Self {
            element: element.into(),
            ty,
        }
    }

    /// Mapping for a member nested under this one.
    #[must_use]
    pub fn nested(&self, element: &str, ty: ValueType) -> Self {
        Self::new(format!("{}.{element}", self.element), ty)
    }
}

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte
        )
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Operator to use when the operands are swapped.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
            Self::Gt => Self::Lt,
            Self::Gte => Self::Lte,
            other => other,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// SequenceOperator
///
/// Query operators of the host sequence API. Only `Where` and `Select`
/// have a target-side equivalent.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SequenceOperator {
    Where,
    Select,
    Aggregate,
    Concat,
    DefaultIfEmpty,
    Distinct,
    Except,
    GroupBy,
    GroupJoin,
    Intersect,
    Join,
    Reverse,
    SelectMany,
    SequenceEqual,
    Union,
    Zip,
}

impl SequenceOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Where => "Where",
            Self::Select => "Select",
            Self::Aggregate => "Aggregate",
            Self::Concat => "Concat",
            Self::DefaultIfEmpty => "DefaultIfEmpty",
            Self::Distinct => "Distinct",
            Self::Except => "Except",
            Self::GroupBy => "GroupBy",
            Self::GroupJoin => "GroupJoin",
            Self::Intersect => "Intersect",
            Self::Join => "Join",
            Self::Reverse => "Reverse",
            Self::SelectMany => "SelectMany",
            Self::SequenceEqual => "SequenceEqual",
            Self::Union => "Union",
            Self::Zip => "Zip",
        }
    }

    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Where | Self::Select)
    }
}

impl fmt::Display for SequenceOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ConstructionError
///
/// A required component of an IR node was absent or foreign to the arena.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConstructionError {
    #[error("{node} node requires a {component}")]
    MissingComponent {
        node: &'static str,
        component: &'static str,
    },

    #[error("{node} node references unknown expression {id}")]
    UnknownExpression { node: &'static str, id: ExprId },

    #[error("substitution requires matching lists, got {from} sources and {to} replacements")]
    SubstitutionArity { from: usize, to: usize },
}
