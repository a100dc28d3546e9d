use crate::{
    expr::{
        BinaryOp, ConstructionError, Expr, ExprId, ExprKind, FieldMapping, HostExpr,
        SequenceOperator,
    },
    model::Namespace,
    value::{Value, ValueType},
};
use std::sync::atomic::{AtomicU64, Ordering};

// Source of arena tags; every arena mints ids under its own tag.
static NEXT_ARENA: AtomicU64 = AtomicU64::new(1);

///
/// ExprArena
///
/// Append-only storage for the nodes of one query expression.
/// Nodes are never mutated after allocation; rewriting allocates new nodes
/// and leaves untouched subtrees shared by id. A clone keeps the tag, so
/// ids stay valid in copies made for translation.
///

#[derive(Clone, Debug)]
pub struct ExprArena {
    tag: u64,
    nodes: Vec<Expr>,
}

impl ExprArena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: NEXT_ARENA.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when `id` was minted by this arena (or the arena it was cloned from).
    #[must_use]
    pub const fn contains(&self, id: ExprId) -> bool {
        id.arena == self.tag && id.index < self.nodes.len()
    }

    /// Borrow a node.
    ///
    /// # Panics
    ///
    /// Panics when `id` does not belong to this arena; stage constructors
    /// and `translate` reject such ids before any lookup.
    #[must_use]
    pub fn get(&self, id: ExprId) -> &Expr {
        assert!(self.contains(id), "expression {id} does not belong to this arena");

        &self.nodes[id.index]
    }

    #[must_use]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.get(id).kind
    }

    #[must_use]
    pub fn result_type(&self, id: ExprId) -> &ValueType {
        &self.get(id).ty
    }

    /// Host node behind `id`, if it is not an IR stage or field.
    #[must_use]
    pub fn host(&self, id: ExprId) -> Option<&HostExpr> {
        self.kind(id).as_host()
    }

    fn alloc(&mut self, kind: ExprKind, ty: ValueType) -> ExprId {
        let id = ExprId {
            arena: self.tag,
            index: self.nodes.len(),
        };
        self.nodes.push(Expr { kind, ty });

        id
    }

    fn alloc_host(&mut self, host: HostExpr, ty: ValueType) -> ExprId {
        self.alloc(ExprKind::Host(host), ty)
    }

    // ------------------------------------------------------------------
    // Host grammar
    // ------------------------------------------------------------------

    pub fn parameter(&mut self, name: impl Into<String>, ty: ValueType) -> ExprId {
        self.alloc_host(HostExpr::Parameter { name: name.into() }, ty)
    }

    pub fn constant(&mut self, value: impl Into<Value>) -> ExprId {
        let value = value.into();
        let ty = value.value_type();

        self.alloc_host(HostExpr::Constant(value), ty)
    }

    pub fn typed_constant(&mut self, value: impl Into<Value>, ty: ValueType) -> ExprId {
        self.alloc_host(HostExpr::Constant(value.into()), ty)
    }

    pub fn captured(&mut self, name: impl Into<String>, value: impl Into<Value>) -> ExprId {
        let value = value.into();
        let ty = value.value_type();

        self.alloc_host(
            HostExpr::Captured {
                name: name.into(),
                value,
            },
            ty,
        )
    }

    pub fn member(&mut self, target: ExprId, member: impl Into<String>) -> ExprId {
        let member = member.into();
        let ty = self.member_type(target, &member);

        self.alloc_host(HostExpr::Member { target, member }, ty)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        let ty = if op.is_comparison() || op.is_logical() {
            ValueType::Boolean
        } else {
            self.result_type(left).widen(self.result_type(right))
        };

        self.alloc_host(HostExpr::Binary { op, left, right }, ty)
    }

    pub fn not(&mut self, operand: ExprId) -> ExprId {
        self.alloc_host(HostExpr::Not(operand), ValueType::Boolean)
    }

    pub fn call(
        &mut self,
        method: impl Into<String>,
        target: Option<ExprId>,
        args: Vec<ExprId>,
    ) -> ExprId {
        let method = method.into();
        let ty = match method.as_str() {
            "starts_with" | "ends_with" | "contains" => ValueType::Boolean,
            "len" => ValueType::Int64,
            "to_upper" | "to_lower" | "trim" => ValueType::String,
            _ => ValueType::Any,
        };

        self.alloc_host(
            HostExpr::Call {
                method,
                target,
                args,
            },
            ty,
        )
    }

    pub fn lambda(&mut self, params: Vec<ExprId>, body: ExprId) -> ExprId {
        let ty = ValueType::Function(Box::new(self.result_type(body).clone()));

        self.alloc_host(HostExpr::Lambda { params, body }, ty)
    }

    pub fn new_object(&mut self, members: Vec<(String, ExprId)>) -> ExprId {
        self.alloc_host(HostExpr::NewObject { members }, ValueType::Anonymous)
    }

    /// Root of a query: the stored documents of one collection.
    pub fn collection(&mut self, namespace: Namespace, element: ValueType) -> ExprId {
        self.alloc_host(
            HostExpr::Collection(namespace),
            ValueType::sequence(element),
        )
    }

    pub fn sequence(
        &mut self,
        operator: SequenceOperator,
        source: ExprId,
        args: Vec<ExprId>,
    ) -> ExprId {
        let ty = match (operator, args.first()) {
            (SequenceOperator::Select, Some(selector)) => match self.result_type(*selector) {
                ValueType::Function(body) => ValueType::Sequence(body.clone()),
                _ => ValueType::sequence(ValueType::Any),
            },
            _ => self.result_type(source).clone(),
        };

        self.alloc_host(
            HostExpr::Sequence {
                operator,
                source,
                args,
            },
            ty,
        )
    }

    // ------------------------------------------------------------------
    // IR stages
    // ------------------------------------------------------------------

    /// Build a filter stage. The result type is the source's type.
    pub fn match_stage(
        &mut self,
        source: Option<ExprId>,
        predicate: ExprId,
    ) -> Result<ExprId, ConstructionError> {
        let source = self.require("Match", "source", source)?;
        let predicate = self.require("Match", "predicate", Some(predicate))?;

        Ok(self.alloc_match(source, predicate))
    }

    /// Build a reshape stage. The result type is the projector's type.
    pub fn project_stage(
        &mut self,
        source: Option<ExprId>,
        projector: ExprId,
    ) -> Result<ExprId, ConstructionError> {
        let source = self.require("Project", "source", source)?;
        let projector = self.require("Project", "projector", Some(projector))?;

        Ok(self.alloc_project(source, projector))
    }

    pub fn field(
        &mut self,
        inner: Option<ExprId>,
        mapping: FieldMapping,
        is_projected: bool,
    ) -> Result<ExprId, ConstructionError> {
        let inner = self.require("Field", "inner expression", inner)?;

        Ok(self.alloc_field(inner, mapping, is_projected))
    }

    fn require(
        &self,
        node: &'static str,
        component: &'static str,
        id: Option<ExprId>,
    ) -> Result<ExprId, ConstructionError> {
        let id = id.ok_or(ConstructionError::MissingComponent { node, component })?;
        if !self.contains(id) {
            return Err(ConstructionError::UnknownExpression { node, id });
        }

        Ok(id)
    }

    pub(crate) fn alloc_match(&mut self, source: ExprId, predicate: ExprId) -> ExprId {
        let ty = self.result_type(source).clone();

        self.alloc(ExprKind::Match { source, predicate }, ty)
    }

    pub(crate) fn alloc_project(&mut self, source: ExprId, projector: ExprId) -> ExprId {
        let ty = self.result_type(projector).clone();

        self.alloc(ExprKind::Project { source, projector }, ty)
    }

    pub(crate) fn alloc_field(
        &mut self,
        inner: ExprId,
        mapping: FieldMapping,
        is_projected: bool,
    ) -> ExprId {
        let ty = mapping.ty.clone();

        self.alloc(
            ExprKind::Field {
                inner,
                mapping,
                is_projected,
            },
            ty,
        )
    }

    /// Reallocate a host node with new children, keeping its result type.
    pub(crate) fn rebuild_host(&mut self, id: ExprId, children: &[ExprId]) -> ExprId {
        let node = self.get(id);
        let kind = node.kind.with_children(children);
        let ty = node.ty.clone();

        self.alloc(kind, ty)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Structural equality: same kinds, payloads, types and child shapes,
    /// regardless of node identity.
    #[must_use]
    pub fn same_shape(&self, left: ExprId, right: ExprId) -> bool {
        if left == right {
            return true;
        }

        let (a, b) = (self.get(left), self.get(right));
        let a_children = a.kind.children();
        let b_children = b.kind.children();
        if a.ty != b.ty || a_children.len() != b_children.len() {
            return false;
        }

        // Compare payloads with every child slot pinned to the same placeholder.
        let placeholder = ExprId {
            arena: self.tag,
            index: usize::MAX,
        };
        let pinned = vec![placeholder; a_children.len()];
        if a.kind.with_children(&pinned) != b.kind.with_children(&pinned) {
            return false;
        }

        a_children
            .iter()
            .zip(&b_children)
            .all(|(l, r)| self.same_shape(*l, *r))
    }

    fn member_type(&self, target: ExprId, member: &str) -> ValueType {
        let node = self.get(target);
        if let Some(model) = node.ty.document_model() {
            return model
                .lookup(member)
                .map_or(ValueType::Any, |field| field.ty.clone());
        }

        match &node.kind {
            ExprKind::Host(HostExpr::NewObject { members }) => members
                .iter()
                .find(|(name, _)| name == member)
                .map_or(ValueType::Any, |(_, id)| self.result_type(*id).clone()),
            ExprKind::Host(HostExpr::Constant(value) | HostExpr::Captured { value, .. }) => value
                .member(member)
                .map_or(ValueType::Any, Value::value_type),
            _ => ValueType::Any,
        }
    }
}

impl Default for ExprArena {
    fn default() -> Self {
        Self::new()
    }
}
