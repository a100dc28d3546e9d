use super::*;
use crate::model::DocumentModel;

fn person_type() -> ValueType {
    DocumentModel::new("Person")
        .id_field("id", ValueType::ObjectId)
        .field("name", ValueType::String)
        .field("age", ValueType::Int32)
        .into_type()
}

fn people(arena: &mut ExprArena) -> ExprId {
    arena.collection(Namespace::new("app", "people"), person_type())
}

#[test]
fn match_stage_rejects_absent_source() {
    let mut arena = ExprArena::new();
    let predicate = arena.constant(true);

    let err = arena.match_stage(None, predicate).unwrap_err();

    assert_eq!(
        err,
        ConstructionError::MissingComponent {
            node: "Match",
            component: "source",
        }
    );
    assert_eq!(err.to_string(), "Match node requires a source");
}

#[test]
fn project_stage_rejects_absent_source() {
    let mut arena = ExprArena::new();
    let projector = arena.constant(1);

    let err = arena.project_stage(None, projector).unwrap_err();

    assert!(matches!(
        err,
        ConstructionError::MissingComponent {
            node: "Project",
            ..
        }
    ));
}

#[test]
fn stage_rejects_ids_from_another_arena() {
    let mut other = ExprArena::new();
    for i in 0..4 {
        other.constant(i);
    }
    let foreign = other.constant(99);

    let mut arena = ExprArena::new();
    let source = people(&mut arena);

    let err = arena.match_stage(Some(source), foreign).unwrap_err();

    assert_eq!(
        err,
        ConstructionError::UnknownExpression {
            node: "Match",
            id: foreign,
        }
    );
}

#[test]
fn stage_rejects_foreign_id_that_is_in_range_here() {
    let mut other = ExprArena::new();
    other.constant(1);
    let foreign = other.constant(2);

    let mut arena = ExprArena::new();
    let source = people(&mut arena);
    let predicate = arena.constant(true);
    assert!(arena.len() > 2);
    assert!(!arena.contains(foreign));

    let err = arena.match_stage(Some(foreign), predicate).unwrap_err();
    assert_eq!(
        err,
        ConstructionError::UnknownExpression {
            node: "Match",
            id: foreign,
        }
    );

    let err = arena.project_stage(Some(source), foreign).unwrap_err();
    assert!(matches!(
        err,
        ConstructionError::UnknownExpression {
            node: "Project",
            ..
        }
    ));
}

#[test]
fn cloned_arena_accepts_ids_from_its_origin() {
    let mut arena = ExprArena::new();
    let source = people(&mut arena);
    let predicate = arena.constant(true);

    let mut copy = arena.clone();

    assert!(copy.contains(source));
    assert!(copy.match_stage(Some(source), predicate).is_ok());
    assert!(!ExprArena::new().contains(source));
}

#[test]
#[should_panic(expected = "does not belong to this arena")]
fn lookup_of_foreign_id_panics_with_message() {
    let mut other = ExprArena::new();
    let foreign = other.constant(1);

    let mut arena = ExprArena::new();
    arena.constant(2);

    let _ = arena.get(foreign);
}

#[test]
fn match_keeps_source_type_and_project_takes_projector_type() {
    let mut arena = ExprArena::new();
    let source = people(&mut arena);
    let predicate = arena.constant(true);
    let projector = arena.constant("label");

    let matched = arena.match_stage(Some(source), predicate).unwrap();
    let projected = arena.project_stage(Some(matched), projector).unwrap();

    assert_eq!(arena.result_type(matched), arena.result_type(source));
    assert_eq!(arena.result_type(projected), &ValueType::String);
}

#[test]
fn field_type_comes_from_mapping() {
    let mut arena = ExprArena::new();
    let doc = arena.parameter("doc", person_type());
    let access = arena.member(doc, "age");

    let field = arena
        .field(Some(access), FieldMapping::new("age", ValueType::Int32), false)
        .unwrap();

    assert_eq!(arena.result_type(field), &ValueType::Int32);
    assert_eq!(arena.kind(field).children(), vec![access]);
}

#[test]
fn member_type_follows_document_model() {
    let mut arena = ExprArena::new();
    let doc = arena.parameter("doc", person_type());

    let name = arena.member(doc, "name");
    let unknown = arena.member(doc, "nickname");

    assert_eq!(arena.result_type(name), &ValueType::String);
    assert_eq!(arena.result_type(unknown), &ValueType::Any);
}

#[test]
fn structurally_equal_nodes_keep_distinct_identity() {
    let mut arena = ExprArena::new();
    let a = arena.constant(5);
    let b = arena.constant(5);
    let c = arena.constant(6);

    assert_ne!(a, b);
    assert!(arena.same_shape(a, b));
    assert!(!arena.same_shape(a, c));
}

#[test]
fn same_shape_compares_children_recursively() {
    let mut arena = ExprArena::new();
    let doc = arena.parameter("doc", person_type());
    let age_a = arena.member(doc, "age");
    let age_b = arena.member(doc, "age");
    let ten = arena.constant(10);
    let eleven = arena.constant(11);

    let left = arena.binary(BinaryOp::Gt, age_a, ten);
    let right = arena.binary(BinaryOp::Gt, age_b, ten);
    let other = arena.binary(BinaryOp::Gt, age_b, eleven);

    assert!(arena.same_shape(left, right));
    assert!(!arena.same_shape(left, other));
}

#[test]
fn render_and_describe_expose_read_only_view() {
    let mut arena = ExprArena::new();
    let source = people(&mut arena);
    let doc = arena.parameter("doc", person_type());
    let age = arena.member(doc, "age");
    let field = arena
        .field(Some(age), FieldMapping::new("age", ValueType::Int32), true)
        .unwrap();
    let limit = arena.constant(21);
    let predicate = arena.binary(BinaryOp::Gte, field, limit);
    let stage = arena.match_stage(Some(source), predicate).unwrap();

    assert_eq!(
        render(&arena, stage),
        "Match(Collection(app.people), (Field(age*) >= 21))"
    );

    let description = describe(&arena, stage);
    assert_eq!(description.kind, NodeKind::Match);
    assert_eq!(description.children, vec![source, predicate]);
    assert_eq!(&description.result_type, arena.result_type(source));
}

#[test]
fn select_sequence_types_by_selector_body() {
    let mut arena = ExprArena::new();
    let source = people(&mut arena);
    let doc = arena.parameter("x", person_type());
    let name = arena.member(doc, "name");
    let selector = arena.lambda(vec![doc], name);

    let select = arena.sequence(SequenceOperator::Select, source, vec![selector]);

    assert_eq!(
        arena.result_type(select),
        &ValueType::sequence(ValueType::String)
    );
}

#[test]
fn unsupported_operators_are_flagged() {
    assert!(SequenceOperator::Where.is_supported());
    assert!(SequenceOperator::Select.is_supported());
    assert!(!SequenceOperator::Intersect.is_supported());
    assert_eq!(SequenceOperator::Intersect.to_string(), "Intersect");
}
