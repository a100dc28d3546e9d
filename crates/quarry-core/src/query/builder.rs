//! Module: query::builder
//! Responsibility: a small expression DSL for operator closures.
//! Does not own: typing rules (the arena decides result types).

use crate::{
    expr::{BinaryOp, ExprArena, ExprId},
    value::{Value, ValueType},
};

///
/// ExprBuilder
///
/// Borrowed view over a queryable's arena handed to `filter_with` and
/// `select_with` closures. Every method allocates exactly one node.
///

pub struct ExprBuilder<'a> {
    arena: &'a mut ExprArena,
}

impl<'a> ExprBuilder<'a> {
    pub(crate) const fn new(arena: &'a mut ExprArena) -> Self {
        Self { arena }
    }

    #[must_use]
    pub const fn arena(&self) -> &ExprArena {
        self.arena
    }

    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------

    pub fn constant(&mut self, value: impl Into<Value>) -> ExprId {
        self.arena.constant(value)
    }

    pub fn typed_constant(&mut self, value: impl Into<Value>, ty: ValueType) -> ExprId {
        self.arena.typed_constant(value, ty)
    }

    /// A variable captured from the calling scope. Folded to a constant
    /// before translation.
    pub fn captured(&mut self, name: impl Into<String>, value: impl Into<Value>) -> ExprId {
        self.arena.captured(name, value)
    }

    // ------------------------------------------------------------------
    // Member access
    // ------------------------------------------------------------------

    pub fn member(&mut self, target: ExprId, member: impl Into<String>) -> ExprId {
        self.arena.member(target, member)
    }

    /// Follow a dotted member path, e.g. `address.city`.
    pub fn path(&mut self, target: ExprId, path: &str) -> ExprId {
        path.split('.')
            .fold(target, |current, member| self.arena.member(current, member))
    }

    pub fn new_object<S: Into<String>>(
        &mut self,
        members: impl IntoIterator<Item = (S, ExprId)>,
    ) -> ExprId {
        let members = members
            .into_iter()
            .map(|(name, expr)| (name.into(), expr))
            .collect();

        self.arena.new_object(members)
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.arena.binary(op, left, right)
    }

    pub fn eq(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Eq, left, right)
    }

    pub fn ne(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Ne, left, right)
    }

    pub fn lt(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Lt, left, right)
    }

    pub fn lte(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Lte, left, right)
    }

    pub fn gt(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Gt, left, right)
    }

    pub fn gte(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Gte, left, right)
    }

    pub fn and(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::And, left, right)
    }

    pub fn or(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Or, left, right)
    }

    pub fn add(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Add, left, right)
    }

    pub fn sub(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Sub, left, right)
    }

    pub fn mul(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.binary(BinaryOp::Mul, left, right)
    }

    pub fn not(&mut self, operand: ExprId) -> ExprId {
        self.arena.not(operand)
    }

    // ------------------------------------------------------------------
    // Method calls
    // ------------------------------------------------------------------

    pub fn call(
        &mut self,
        method: impl Into<String>,
        target: ExprId,
        args: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        self.arena
            .call(method, Some(target), args.into_iter().collect())
    }

    pub fn starts_with(&mut self, target: ExprId, prefix: ExprId) -> ExprId {
        self.call("starts_with", target, [prefix])
    }

    pub fn ends_with(&mut self, target: ExprId, suffix: ExprId) -> ExprId {
        self.call("ends_with", target, [suffix])
    }

    /// Substring test on strings, membership test on lists.
    pub fn contains(&mut self, target: ExprId, item: ExprId) -> ExprId {
        self.call("contains", target, [item])
    }

    pub fn len(&mut self, target: ExprId) -> ExprId {
        self.call("len", target, [])
    }

    pub fn to_upper(&mut self, target: ExprId) -> ExprId {
        self.call("to_upper", target, [])
    }

    pub fn to_lower(&mut self, target: ExprId) -> ExprId {
        self.call("to_lower", target, [])
    }

    pub fn trim(&mut self, target: ExprId) -> ExprId {
        self.call("trim", target, [])
    }
}
