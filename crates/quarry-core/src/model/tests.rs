use super::*;

#[test]
fn id_field_maps_to_identity_element() {
    let model = DocumentModel::new("Person")
        .id_field("id", ValueType::ObjectId)
        .field("name", ValueType::String);

    let id = model.lookup("id").expect("id field");
    assert_eq!(id.element, "_id");
    assert_eq!(model.lookup_element("name").map(|f| f.member.as_str()), Some("name"));
    assert!(model.lookup("missing").is_none());
}

#[test]
fn namespace_displays_dotted() {
    assert_eq!(Namespace::new("app", "people").to_string(), "app.people");
}
