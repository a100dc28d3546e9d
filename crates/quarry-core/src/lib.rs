//! Core translation runtime for Quarry: the expression IR, nomination and
//! substitution passes, stage assembly, and the identifier codec that turn a
//! typed query expression into filter, projection and pipeline documents.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod codec;
pub mod config;
pub mod error;
pub mod expr;
pub mod model;
pub mod obs;
pub mod query;
pub mod translate;
pub mod value;

///
/// CONSTANTS
///

/// Element name the target system uses for document identity.
pub const ID_ELEMENT: &str = "_id";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, or codec helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        config::ExecutionTarget,
        expr::{BinaryOp, ExprArena, ExprId, SequenceOperator},
        model::{DocumentModel, Namespace},
        query::{Collection, ExprBuilder, Queryable},
        value::{Value, ValueType},
    };
}
