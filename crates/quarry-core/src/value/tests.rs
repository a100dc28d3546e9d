use super::*;

#[test]
fn numeric_compare_widens_across_widths() {
    assert_eq!(
        Value::Int32(7).compare(&Value::Int64(7)),
        Some(Ordering::Equal)
    );
    assert_eq!(
        Value::Int64(3).compare(&Value::Double(3.5)),
        Some(Ordering::Less)
    );
}

#[test]
fn compare_rejects_unrelated_kinds() {
    assert_eq!(Value::Text("a".into()).compare(&Value::Int32(1)), None);
    assert_eq!(Value::Bool(true).compare(&Value::Null), None);
}

#[test]
fn list_value_type_uses_first_element() {
    let list = Value::from(vec![1_i64, 2, 3]);

    assert_eq!(list.value_type(), ValueType::array(ValueType::Int64));
    assert_eq!(
        Value::List(Vec::new()).value_type(),
        ValueType::array(ValueType::Any)
    );
}

#[test]
fn widen_prefers_double_then_int64() {
    assert_eq!(ValueType::Int32.widen(&ValueType::Double), ValueType::Double);
    assert_eq!(ValueType::Int32.widen(&ValueType::Int64), ValueType::Int64);
    assert_eq!(ValueType::Boolean.widen(&ValueType::Int64), ValueType::Any);
    assert_eq!(ValueType::Boolean.widen(&ValueType::String), ValueType::Any);
}

#[test]
fn absent_identifier_converts_to_null() {
    assert_eq!(Value::from(None::<ObjectId>), Value::Null);
}
