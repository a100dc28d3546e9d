#![allow(dead_code)]

use quarry::{
    ExecutionError, QueryExecutor,
    __reexports::bson::Document,
    prelude::*,
};
use std::cell::RefCell;

///
/// Call
///

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Find {
        filter: Document,
        projection: Option<Document>,
    },
    Aggregate {
        pipeline: Vec<Document>,
    },
}

///
/// MemoryExecutor
///
/// Records every call and answers with canned rows.
///

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    pub calls: RefCell<Vec<Call>>,
    pub rows: Vec<Document>,
}

impl MemoryExecutor {
    #[must_use]
    pub fn with_rows(rows: Vec<Document>) -> Self {
        Self {
            calls: RefCell::default(),
            rows,
        }
    }
}

impl QueryExecutor for MemoryExecutor {
    fn find(
        &self,
        _: &Namespace,
        filter: &Document,
        projection: Option<&Document>,
    ) -> Result<Vec<Document>, ExecutionError> {
        self.calls.borrow_mut().push(Call::Find {
            filter: filter.clone(),
            projection: projection.cloned(),
        });
        Ok(self.rows.clone())
    }

    fn aggregate(
        &self,
        _: &Namespace,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, ExecutionError> {
        self.calls.borrow_mut().push(Call::Aggregate {
            pipeline: pipeline.to_vec(),
        });
        Ok(self.rows.clone())
    }
}

#[must_use]
pub fn customers() -> Collection {
    Collection::new(
        Namespace::new("crm", "customers"),
        DocumentModel::new("Customer")
            .id_field("id", ValueType::ObjectId)
            .field("name", ValueType::String)
            .mapped_field("spend", "total_spend", ValueType::Double)
            .field("region", ValueType::String)
            .field("referrer", ValueType::ObjectId),
    )
}
