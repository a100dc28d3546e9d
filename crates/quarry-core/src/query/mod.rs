//! Module: query
//! Responsibility: deferred, re-enumerable queryable sequences bound to a
//! collection, an execution target and an executor.
//! Does not own: translation rules or wire rendering.
//! Boundary: operator methods only build expressions; translation and
//! execution happen on `translate`/`execute`/`to_values`.

mod builder;

#[cfg(test)]
mod tests;

pub use builder::ExprBuilder;

use crate::{
    config::ExecutionTarget,
    error::Error,
    expr::{ExprArena, ExprId, SequenceOperator},
    model::{DocumentModel, Namespace},
    translate::{TranslatedQuery, translate},
    value::{Value, ValueType},
};
use bson::Document;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ExecutionError
///
/// Failure reported by a `QueryExecutor`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ExecutionError {
    #[error("query execution failed on {namespace}: {message}")]
    Failed { namespace: String, message: String },
}

impl ExecutionError {
    pub fn failed(namespace: &Namespace, message: impl Into<String>) -> Self {
        Self::Failed {
            namespace: namespace.to_string(),
            message: message.into(),
        }
    }
}

///
/// QueryExecutor
///
/// The execution layer a queryable hands translated documents to.
///

pub trait QueryExecutor {
    /// Run a single filter/projection query.
    fn find(
        &self,
        namespace: &Namespace,
        filter: &Document,
        projection: Option<&Document>,
    ) -> Result<Vec<Document>, ExecutionError>;

    /// Run an aggregation pipeline.
    fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, ExecutionError>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn find(
        &self,
        namespace: &Namespace,
        filter: &Document,
        projection: Option<&Document>,
    ) -> Result<Vec<Document>, ExecutionError> {
        (**self).find(namespace, filter, projection)
    }

    fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, ExecutionError> {
        (**self).aggregate(namespace, pipeline)
    }
}

///
/// Collection
///
/// A named collection and the model of the documents stored in it.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Collection {
    namespace: Namespace,
    model: Arc<DocumentModel>,
}

impl Collection {
    #[must_use]
    pub fn new(namespace: Namespace, model: DocumentModel) -> Self {
        Self {
            namespace,
            model: Arc::new(model),
        }
    }

    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    #[must_use]
    pub fn model(&self) -> &DocumentModel {
        &self.model
    }

    #[must_use]
    pub fn element_type(&self) -> ValueType {
        ValueType::Document(Arc::clone(&self.model))
    }
}

///
/// Queryable
///
/// Immutable-by-value query under construction. Each operator consumes the
/// queryable and returns one with a longer sequence expression.
///

#[derive(Clone, Debug)]
pub struct Queryable<X> {
    executor: X,
    target: ExecutionTarget,
    arena: ExprArena,
    expression: ExprId,
}

impl<X: QueryExecutor> Queryable<X> {
    #[must_use]
    pub fn new(collection: &Collection, target: ExecutionTarget, executor: X) -> Self {
        let mut arena = ExprArena::new();
        let expression = arena.collection(collection.namespace.clone(), collection.element_type());

        Self {
            executor,
            target,
            arena,
            expression,
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn arena(&self) -> &ExprArena {
        &self.arena
    }

    #[must_use]
    pub const fn expression(&self) -> ExprId {
        self.expression
    }

    #[must_use]
    pub const fn target(&self) -> ExecutionTarget {
        self.target
    }

    /// Type of the elements this sequence currently yields.
    #[must_use]
    pub fn element_type(&self) -> ValueType {
        self.arena
            .result_type(self.expression)
            .element()
            .cloned()
            .unwrap_or(ValueType::Any)
    }

    #[must_use]
    pub fn with_target(mut self, target: ExecutionTarget) -> Self {
        self.target = target;
        self
    }

    // ------------------------------------------------------------------
    // Operators (pure)
    // ------------------------------------------------------------------

    /// Keep elements for which the built predicate holds.
    #[must_use]
    pub fn filter_with(self, build: impl FnOnce(&mut ExprBuilder<'_>, ExprId) -> ExprId) -> Self {
        self.with_lambda(SequenceOperator::Where, build)
    }

    /// Reshape each element with the built projector.
    #[must_use]
    pub fn select_with(self, build: impl FnOnce(&mut ExprBuilder<'_>, ExprId) -> ExprId) -> Self {
        self.with_lambda(SequenceOperator::Select, build)
    }

    /// Set intersection against a host sequence. Has no target equivalent;
    /// translation rejects it.
    #[must_use]
    pub fn intersect(self, other: Vec<Value>) -> Self {
        self.apply(SequenceOperator::Intersect, vec![Value::List(other)])
    }

    /// Set intersection with a named equality comparer.
    #[must_use]
    pub fn intersect_by(self, other: Vec<Value>, comparer: impl Into<String>) -> Self {
        self.apply(
            SequenceOperator::Intersect,
            vec![Value::List(other), Value::Text(comparer.into())],
        )
    }

    /// Append an arbitrary sequence operator with constant arguments.
    #[must_use]
    pub fn apply(mut self, operator: SequenceOperator, args: Vec<Value>) -> Self {
        let args = args
            .into_iter()
            .map(|value| self.arena.constant(value))
            .collect();
        self.expression = self.arena.sequence(operator, self.expression, args);
        self
    }

    fn with_lambda(
        mut self,
        operator: SequenceOperator,
        build: impl FnOnce(&mut ExprBuilder<'_>, ExprId) -> ExprId,
    ) -> Self {
        let element = self.element_type();
        let param = self.arena.parameter("x", element);
        let body = build(&mut ExprBuilder::new(&mut self.arena), param);
        let lambda = self.arena.lambda(vec![param], body);
        self.expression = self.arena.sequence(operator, self.expression, vec![lambda]);
        self
    }

    // ------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------

    /// Translate without executing. Runs the full pipeline on every call.
    pub fn translate(&self) -> Result<TranslatedQuery, Error> {
        Ok(translate(&self.arena, self.expression, self.target)?)
    }

    /// Translate, then hand the documents to the executor.
    pub fn execute(&self) -> Result<Vec<Document>, Error> {
        let query = self.translate()?;

        Ok(self.run(&query)?)
    }

    /// Execute and shape each returned document with the final projector.
    pub fn to_values(&self) -> Result<Vec<Value>, Error> {
        let query = self.translate()?;
        let documents = self.run(&query)?;

        documents
            .iter()
            .map(|document| query.shape(document).map_err(Error::from))
            .collect()
    }

    fn run(&self, query: &TranslatedQuery) -> Result<Vec<Document>, ExecutionError> {
        match query.target {
            ExecutionTarget::Query => {
                self.executor
                    .find(&query.namespace, &query.filter, query.projection.as_ref())
            }
            ExecutionTarget::Pipeline => self.executor.aggregate(&query.namespace, &query.pipeline),
        }
    }
}
