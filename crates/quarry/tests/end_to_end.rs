mod support;

use quarry::{ClientSettings, __reexports::bson::doc, prelude::*};
use support::{Call, MemoryExecutor, customers};

#[test]
fn query_target_sends_one_filter_and_projection() {
    let executor = MemoryExecutor::default();
    let threshold = 250.0;

    customers()
        .as_queryable(&executor)
        .filter_with(|b, x| {
            let spend = b.member(x, "spend");
            let limit = b.captured("threshold", threshold);
            let region = b.member(x, "region");
            let north = b.constant("north");
            let rich = b.gte(spend, limit);
            let local = b.eq(region, north);
            b.and(rich, local)
        })
        .select_with(|b, x| {
            let name = b.member(x, "name");
            let spend = b.member(x, "spend");
            b.new_object([("name", name), ("spend", spend)])
        })
        .execute()
        .unwrap();

    assert_eq!(
        executor.calls.borrow().as_slice(),
        &[Call::Find {
            filter: doc! { "$and": [
                { "total_spend": { "$gte": 250.0 } },
                { "region": "north" }
            ] },
            projection: Some(doc! { "name": 1, "total_spend": 1, "_id": 0 }),
        }]
    );
}

#[test]
fn pipeline_target_sends_stages_in_operator_order() {
    let executor = MemoryExecutor::default();
    let settings = ClientSettings::from_toml_str(
        r#"
        [query]
        target = "pipeline"

        [connection]
        uri = "mongodb://localhost"
        "#,
    )
    .unwrap();

    customers()
        .as_queryable_from(&settings, &executor)
        .select_with(|b, x| {
            let name = b.member(x, "name");
            let region = b.member(x, "region");
            b.new_object([("label", name), ("area", region)])
        })
        .filter_with(|b, row| {
            let area = b.member(row, "area");
            let names = b.captured("areas", vec!["north", "east"]);
            b.contains(names, area)
        })
        .execute()
        .unwrap();

    assert_eq!(
        executor.calls.borrow().as_slice(),
        &[Call::Aggregate {
            pipeline: vec![
                doc! { "$project": { "name": 1, "region": 1, "_id": 0 } },
                doc! { "$match": { "region": { "$in": ["north", "east"] } } },
            ],
        }]
    );
}

#[test]
fn values_are_shaped_client_side() {
    let executor = MemoryExecutor::with_rows(vec![
        doc! { "name": "  Ada ", "total_spend": 10.5 },
        doc! { "name": "Grace", "total_spend": 4.5 },
    ]);

    let values = customers()
        .as_queryable(&executor)
        .select_with(|b, x| {
            let name = b.member(x, "name");
            let trimmed = b.trim(name);
            let upper = b.to_upper(trimmed);
            let spend = b.member(x, "spend");
            let two = b.constant(2.0);
            let doubled = b.mul(spend, two);
            b.new_object([("name", upper), ("spend", doubled)])
        })
        .to_values()
        .unwrap();

    let names: Vec<_> = values.iter().filter_map(|v| v.member("name")).collect();
    let spends: Vec<_> = values.iter().filter_map(|v| v.member("spend")).collect();
    assert_eq!(names, [&Value::from("ADA"), &Value::from("GRACE")]);
    assert_eq!(spends, [&Value::Double(21.0), &Value::Double(9.0)]);
}

#[test]
fn untranslatable_predicates_name_the_culprit() {
    let executor = MemoryExecutor::default();

    let err = customers()
        .as_queryable(&executor)
        .filter_with(|b, x| {
            let name = b.member(x, "name");
            let len = b.len(name);
            let five = b.constant(5i64);
            b.gt(len, five)
        })
        .execute()
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "The expression Field(name).len() cannot be translated to a query document."
    );
    assert!(executor.calls.borrow().is_empty());
}
