use super::*;
use crate::translate::TranslateError;
use bson::doc;
use std::cell::RefCell;

///
/// RecordingExecutor
///

#[derive(Debug, Default)]
struct RecordingExecutor {
    calls: RefCell<Vec<String>>,
    rows: Vec<Document>,
}

impl RecordingExecutor {
    fn returning(rows: Vec<Document>) -> Self {
        Self {
            calls: RefCell::default(),
            rows,
        }
    }
}

impl QueryExecutor for RecordingExecutor {
    fn find(
        &self,
        namespace: &Namespace,
        filter: &Document,
        projection: Option<&Document>,
    ) -> Result<Vec<Document>, ExecutionError> {
        self.calls
            .borrow_mut()
            .push(format!("find {namespace} {filter} {projection:?}"));
        Ok(self.rows.clone())
    }

    fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, ExecutionError> {
        self.calls
            .borrow_mut()
            .push(format!("aggregate {namespace} {}", pipeline.len()));
        Ok(self.rows.clone())
    }
}

struct FailingExecutor;

impl QueryExecutor for FailingExecutor {
    fn find(
        &self,
        namespace: &Namespace,
        _: &Document,
        _: Option<&Document>,
    ) -> Result<Vec<Document>, ExecutionError> {
        Err(ExecutionError::failed(namespace, "connection reset"))
    }

    fn aggregate(
        &self,
        namespace: &Namespace,
        _: &[Document],
    ) -> Result<Vec<Document>, ExecutionError> {
        Err(ExecutionError::failed(namespace, "connection reset"))
    }
}

fn books() -> Collection {
    Collection::new(
        Namespace::new("shop", "books"),
        DocumentModel::new("Book")
            .id_field("id", ValueType::ObjectId)
            .field("title", ValueType::String)
            .mapped_field("pages", "page_count", ValueType::Int32),
    )
}

#[test]
fn operators_do_not_translate_or_execute() {
    let executor = RecordingExecutor::default();

    let query = Queryable::new(&books(), ExecutionTarget::Query, &executor)
        .filter_with(|b, x| {
            let pages = b.member(x, "pages");
            let limit = b.constant(100);
            b.gt(pages, limit)
        })
        .select_with(|b, x| b.member(x, "title"));

    assert!(executor.calls.borrow().is_empty());
    assert_eq!(query.element_type(), ValueType::String);
}

#[test]
fn query_target_calls_find_with_filter_and_projection() {
    let executor = RecordingExecutor::default();
    let query = Queryable::new(&books(), ExecutionTarget::Query, &executor)
        .filter_with(|b, x| {
            let pages = b.member(x, "pages");
            let limit = b.constant(100);
            b.gt(pages, limit)
        })
        .select_with(|b, x| b.member(x, "title"));

    let translated = query.translate().unwrap();
    assert_eq!(translated.filter, doc! { "page_count": { "$gt": 100 } });
    assert_eq!(translated.projection, Some(doc! { "title": 1, "_id": 0 }));

    query.execute().unwrap();
    assert_eq!(executor.calls.borrow().len(), 1);
    assert!(executor.calls.borrow()[0].starts_with("find shop.books"));
}

#[test]
fn pipeline_target_calls_aggregate() {
    let executor = RecordingExecutor::default();
    let query = Queryable::new(&books(), ExecutionTarget::Query, &executor)
        .filter_with(|b, x| {
            let title = b.member(x, "title");
            let prefix = b.constant("Rust");
            b.starts_with(title, prefix)
        })
        .with_target(ExecutionTarget::Pipeline);

    query.execute().unwrap();

    assert_eq!(
        executor.calls.borrow().as_slice(),
        &["aggregate shop.books 1".to_string()]
    );
}

#[test]
fn enumeration_is_repeatable() {
    let executor = RecordingExecutor::returning(vec![doc! { "title": "Dune" }]);
    let query = Queryable::new(&books(), ExecutionTarget::Query, &executor)
        .select_with(|b, x| b.member(x, "title"));

    let first = query.to_values().unwrap();
    let second = query.to_values().unwrap();

    assert_eq!(first, vec![Value::from("Dune")]);
    assert_eq!(first, second);
    assert_eq!(executor.calls.borrow().len(), 2);
}

#[test]
fn intersect_is_rejected_before_execution() {
    let executor = RecordingExecutor::default();
    let query = Queryable::new(&books(), ExecutionTarget::Query, &executor)
        .intersect(vec![Value::from("a")]);

    let err = query.execute().unwrap_err();

    assert!(matches!(
        err,
        Error::Translate(TranslateError::UnsupportedOperator {
            operator: SequenceOperator::Intersect
        })
    ));
    assert!(executor.calls.borrow().is_empty());
}

#[test]
fn executor_failures_surface_as_execution_errors() {
    let query = Queryable::new(&books(), ExecutionTarget::Query, FailingExecutor);

    let err = query.execute().unwrap_err();

    assert_eq!(
        err.to_string(),
        "query execution failed on shop.books: connection reset"
    );
}

#[test]
fn builder_path_follows_nested_members() {
    let mut arena = ExprArena::new();
    let param = arena.parameter("x", ValueType::Any);
    let mut builder = ExprBuilder::new(&mut arena);

    let chain = builder.path(param, "a.b.c");

    assert_eq!(crate::expr::render(builder.arena(), chain), "x.a.b.c");
}
