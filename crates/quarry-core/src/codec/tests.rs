use super::*;
use bson::doc;

fn sample_id() -> ObjectId {
    ObjectId::parse_str("5f1d7c2e9a1b2c3d4e5f6a7b").unwrap()
}

#[test]
fn identifier_round_trips() {
    let id = sample_id();

    let wire = encode(&Value::ObjectId(id), &ValueType::ObjectId).unwrap();
    assert_eq!(wire, Bson::ObjectId(id));

    let back = decode(&wire, &ValueType::ObjectId).unwrap();
    assert_eq!(back, Value::ObjectId(id));
}

#[test]
fn absent_identifier_uses_host_null_marker() {
    let wire = encode(&Value::Null, &ValueType::ObjectId).unwrap();

    assert_eq!(wire, Bson::Document(doc! { "_hostnull": true }));
    assert_ne!(wire, Bson::Null);
    assert_eq!(decode(&wire, &ValueType::ObjectId).unwrap(), Value::Null);
}

#[test]
fn identifier_codec_accepts_wire_null() {
    assert_eq!(ObjectIdCodec::decode(&Bson::Null).unwrap(), None);
    assert_eq!(ObjectIdCodec::encode(None), Bson::Document(doc! { HOST_NULL_MARKER: true }));
}

#[test]
fn identifier_decode_rejects_other_wire_types() {
    let err = ObjectIdCodec::decode(&Bson::String("abc".into())).unwrap_err();

    assert_eq!(
        err,
        CodecError::FormatMismatch {
            expected: "ObjectId".to_string(),
            found: "String".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Cannot deserialize ObjectId from BsonType String."
    );
}

#[test]
fn marker_lookalike_documents_are_not_host_null() {
    let wire = Bson::Document(doc! { "_hostnull": true, "extra": 1 });

    let err = ObjectIdCodec::decode(&wire).unwrap_err();
    assert!(matches!(err, CodecError::FormatMismatch { found, .. } if found == "Document"));
    assert!(!is_host_null(&doc! { "_hostnull": false }));
}

#[test]
fn non_identifier_values_reject_wrong_kind() {
    let err = encode(&Value::Text("x".into()), &ValueType::ObjectId).unwrap_err();

    assert!(matches!(err, CodecError::UnsupportedValue { .. }));
    assert!(encode(&Value::Bool(true), &ValueType::Int32).is_err());
}

#[test]
fn numerics_widen_under_declared_type() {
    assert_eq!(
        encode(&Value::Int32(4), &ValueType::Int64).unwrap(),
        Bson::Int64(4)
    );
    assert_eq!(
        decode(&Bson::Int32(4), &ValueType::Double).unwrap(),
        Value::Double(4.0)
    );
    assert!(encode(&Value::Int64(i64::MAX), &ValueType::Int32).is_err());
}

#[test]
fn numerics_cross_widths_in_both_directions() {
    assert_eq!(
        encode(&Value::Int64(5), &ValueType::Double).unwrap(),
        Bson::Double(5.0)
    );
    assert_eq!(
        encode(&Value::Double(20.5), &ValueType::Int32).unwrap(),
        Bson::Double(20.5)
    );
    assert_eq!(
        encode(&Value::Double(-1.25), &ValueType::Int64).unwrap(),
        Bson::Double(-1.25)
    );

    assert_eq!(
        decode(&Bson::Int64(7), &ValueType::Double).unwrap(),
        Value::Double(7.0)
    );
    assert_eq!(
        decode(&Bson::Double(42.0), &ValueType::Int32).unwrap(),
        Value::Int32(42)
    );
    assert_eq!(
        decode(&Bson::Double(42.0), &ValueType::Int64).unwrap(),
        Value::Int64(42)
    );
}

#[test]
fn numbers_outside_declared_width_keep_stored_value() {
    assert_eq!(
        decode(&Bson::Double(20.5), &ValueType::Int32).unwrap(),
        Value::Double(20.5)
    );
    assert_eq!(
        decode(&Bson::Double(1e12), &ValueType::Int32).unwrap(),
        Value::Double(1e12)
    );
    assert_eq!(
        decode(&Bson::Double(f64::INFINITY), &ValueType::Int64).unwrap(),
        Value::Double(f64::INFINITY)
    );
    assert_eq!(
        decode(&Bson::Int64(i64::MAX), &ValueType::Int32).unwrap(),
        Value::Int64(i64::MAX)
    );
}

#[test]
fn mismatch_names_wire_types_like_the_serializer() {
    let cases = [
        (Bson::Document(doc! { "a": 1 }), "Document"),
        (Bson::Array(vec![]), "Array"),
        (Bson::Boolean(true), "Boolean"),
        (Bson::Int64(1), "Int64"),
        (Bson::Double(1.0), "Double"),
        (Bson::JavaScriptCode("f()".into()), "JavaScript"),
    ];

    for (wire, name) in cases {
        let err = ObjectIdCodec::decode(&wire).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Cannot deserialize ObjectId from BsonType {name}.")
        );
    }
}

#[test]
fn documents_map_members_to_elements() {
    let model = DocumentModel::new("Person")
        .id_field("id", ValueType::ObjectId)
        .field("name", ValueType::String);
    let declared = model.clone().into_type();
    let id = sample_id();

    let mut fields = BTreeMap::new();
    fields.insert("id".to_string(), Value::ObjectId(id));
    fields.insert("name".to_string(), Value::Text("Ada".into()));

    let wire = encode(&Value::Document(fields.clone()), &declared).unwrap();
    assert_eq!(wire, Bson::Document(doc! { "_id": id, "name": "Ada" }));

    let back = decode(&wire, &declared).unwrap();
    assert_eq!(back, Value::Document(fields));
}

#[test]
fn lookup_path_walks_nested_documents() {
    let doc = doc! { "address": { "city": "Oslo" }, "age": 3 };

    assert_eq!(
        lookup_path(&doc, "address.city"),
        Some(&Bson::String("Oslo".into()))
    );
    assert_eq!(lookup_path(&doc, "age.value"), None);
    assert_eq!(lookup_path(&doc, "missing"), None);
}
