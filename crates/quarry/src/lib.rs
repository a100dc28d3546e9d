//! ## Crate layout
//! - `core`: expression IR, nomination and substitution passes, stage
//!   assembly, codec, configuration and observability.
//!
//! The `prelude` module carries the vocabulary needed to build and run
//! queries; `AsQueryable` is the entry point that turns a collection handle
//! into a deferred queryable sequence.

pub use quarry_core as core;

/// re-exports
///
/// stops callers having to depend on the wire document crate directly
pub mod __reexports {
    pub use bson;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::{
    config::{ClientSettings, ExecutionTarget},
    error::{Error, ErrorClass, ErrorOrigin},
    query::{Collection, ExecutionError, ExprBuilder, QueryExecutor, Queryable},
    translate::{TranslateError, TranslatedQuery},
};

///
/// AsQueryable
///
/// Binds a collection handle and an execution target to a deferred
/// `Queryable`. Nothing is translated or executed until the queryable is
/// enumerated.
///

pub trait AsQueryable {
    /// Queryable using the default (`Query`) execution target.
    fn as_queryable<X: QueryExecutor>(&self, executor: X) -> Queryable<X> {
        self.as_queryable_with(ExecutionTarget::default(), executor)
    }

    fn as_queryable_with<X: QueryExecutor>(
        &self,
        target: ExecutionTarget,
        executor: X,
    ) -> Queryable<X>;

    /// Queryable whose execution target comes from client settings. Other
    /// settings are not interpreted here.
    fn as_queryable_from<X: QueryExecutor>(
        &self,
        settings: &ClientSettings,
        executor: X,
    ) -> Queryable<X> {
        self.as_queryable_with(settings.execution_target(), executor)
    }
}

impl AsQueryable for Collection {
    fn as_queryable_with<X: QueryExecutor>(
        &self,
        target: ExecutionTarget,
        executor: X,
    ) -> Queryable<X> {
        Queryable::new(self, target, executor)
    }
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        AsQueryable as _,
        core::{
            expr::SequenceOperator,
            model::{DocumentModel, Namespace},
            value::{Value, ValueType},
        },
        Collection, ExecutionTarget, ExprBuilder, QueryExecutor, Queryable,
    };
}
