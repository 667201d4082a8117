use facet_columnar::{
    BuildParams, ColumnStore, DistinctEstimate, FieldDescriptor, StorageClass, StoreBuilder,
    Value, ValueType,
};
use facet_io::{from_json_str, read_store, to_json_string, write_store, UNLIMITED_ESTIMATE};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

/// An indexed string column (with a declared-but-unobserved value), a
/// numeric column, and a forced-dense column with leading nulls.
fn sample_store() -> Arc<ColumnStore> {
    let mut explicit = HashMap::new();
    explicit.insert(
        "color".to_owned(),
        vec![Value::from("red"), Value::from("blue"), Value::from("green")],
    );
    let mut overrides = HashMap::new();
    overrides.insert("note".to_owned(), StorageClass::UnIndexed);
    let params = BuildParams {
        explicit_values: explicit,
        storage_overrides: overrides,
        ..BuildParams::default()
    };

    let mut builder = StoreBuilder::new(
        vec![
            FieldDescriptor::new("color", ValueType::String),
            FieldDescriptor::new("qty", ValueType::Number),
            FieldDescriptor::new("note", ValueType::String),
        ],
        params,
    )
    .unwrap();
    let rows: Vec<(Value, Value, Value)> = vec![
        (Value::from("red"), Value::from(1.0), Value::Null),
        (Value::from("blue"), Value::from(2.5), Value::Null),
        (Value::from("red"), Value::from(3.0), Value::from("tagged")),
        (Value::from("blue"), Value::Null, Value::from("x")),
    ];
    for (c, q, n) in rows {
        builder.add_row(vec![c, q, n]).unwrap();
    }
    Arc::new(builder.finish().unwrap())
}

#[test]
fn wire_model_round_trips_behavior() {
    let store = sample_store();
    let restored = Arc::new(read_store(write_store(&store)).unwrap());

    assert_eq!(restored.size(), store.size());
    let ids: Vec<&str> = restored.fields().iter().map(|f| f.identifier()).collect();
    assert_eq!(ids, vec!["color", "qty", "note"]);

    // Indexed column: same value order, same sets, including the
    // declared-but-unobserved "green".
    let color = restored.field("color").unwrap().as_indexed().unwrap();
    let names: Vec<String> = color.all_values().iter().map(|v| v.key_string()).collect();
    assert_eq!(names, vec!["red", "blue", "green"]);
    assert!(color.int_set_for_value(&Value::from("green")).is_empty());
    assert_eq!(
        color.int_set_for_value(&Value::from("red")).iter().collect::<Vec<_>>(),
        vec![0, 2]
    );

    // Numeric descriptor metadata survives.
    let qty = restored.field("qty").unwrap().descriptor();
    let range = qty.range.unwrap();
    assert_eq!((range.min, range.max), (1.0, 3.0));
    assert!(!range.integer_only);

    // Dense column: offset trims the leading nulls, values line up.
    let note = restored.field("note").unwrap().as_unindexed().unwrap();
    assert_eq!(note.first_row(), 2);
    assert_eq!(note.value(2), &Value::from("tagged"));
    assert_eq!(note.value(0), &Value::Null);

    // Queries agree between the original and the restored store.
    let before = store.filter_value("color", "red").unwrap();
    let after = restored.filter_value("color", "red").unwrap();
    assert_eq!(before.int_set(), after.int_set());
    let parts_before = store.partition("note").unwrap();
    let parts_after = restored.partition("note").unwrap();
    assert_eq!(parts_before.len(), parts_after.len());
    for (key, view) in parts_before {
        assert_eq!(view.int_set(), parts_after[&key].int_set());
    }
}

#[test]
fn json_text_round_trips() {
    let store = sample_store();
    let text = to_json_string(&store).unwrap();
    let restored = Arc::new(from_json_str(&text).unwrap());
    assert_eq!(restored.size(), store.size());
    assert_eq!(
        restored.filter_value("color", "blue").unwrap().size(),
        store.filter_value("color", "blue").unwrap().size()
    );

    // Re-serializing the restored store is stable.
    assert_eq!(to_json_string(&restored).unwrap(), text);
}

#[test]
fn unlimited_estimates_use_the_finite_stand_in() {
    let mut builder = StoreBuilder::new(
        vec![FieldDescriptor::builder("id", ValueType::String)
            .unlimited_values()
            .build()],
        BuildParams::default(),
    )
    .unwrap();
    for i in 0..4 {
        builder.add_row(vec![Value::from(format!("row-{i}"))]).unwrap();
    }
    let store = builder.finish().unwrap();

    let data = write_store(&store);
    let text = serde_json::to_string(&data).unwrap();
    assert!(text.contains(&UNLIMITED_ESTIMATE.to_string()));

    let restored = read_store(data).unwrap();
    assert_eq!(
        restored.field("id").unwrap().descriptor().distinct_estimate,
        DistinctEstimate::Unlimited
    );
}

#[test]
fn type_constructor_names_survive_untouched() {
    let mut builder = StoreBuilder::new(
        vec![FieldDescriptor::builder("payload", ValueType::Object)
            .type_constructor("GeoPoint")
            .unlimited_values()
            .build()],
        BuildParams::default(),
    )
    .unwrap();
    builder
        .add_row(vec![Value::Object(Arc::new(serde_json::json!({"lat": 1.0})))])
        .unwrap();
    let store = builder.finish().unwrap();

    let restored = read_store(write_store(&store)).unwrap();
    assert_eq!(
        restored
            .field("payload")
            .unwrap()
            .descriptor()
            .type_constructor
            .as_deref(),
        Some("GeoPoint")
    );
}

#[test]
fn malformed_metadata_is_fatal() {
    // Rows indexed past the declared size.
    let bad = r#"{
        "size": 2,
        "fields": [{
            "type": "indexed",
            "identifier": "x",
            "displayName": "x",
            "typeOfValue": "string",
            "distinctValueEstimate": 1,
            "values": [{"value": "a", "data": {"type": "array", "data": [0, 5]}}]
        }]
    }"#;
    assert!(from_json_str(bad).is_err());

    // Descending set data.
    let bad = r#"{
        "size": 10,
        "fields": [{
            "type": "indexed",
            "identifier": "x",
            "displayName": "x",
            "typeOfValue": "string",
            "distinctValueEstimate": 1,
            "values": [{"value": "a", "data": {"type": "array", "data": [5, 1]}}]
        }]
    }"#;
    assert!(from_json_str(bad).is_err());

    // Unknown set encoding.
    let bad = r#"{
        "size": 10,
        "fields": [{
            "type": "indexed",
            "identifier": "x",
            "displayName": "x",
            "typeOfValue": "string",
            "distinctValueEstimate": 1,
            "values": [{"value": "a", "data": {"type": "mystery/enc;hint"}}]
        }]
    }"#;
    assert!(from_json_str(bad).is_err());

    // Dense data overrunning the row count.
    let bad = r#"{
        "size": 1,
        "fields": [{
            "type": "unindexed",
            "identifier": "x",
            "displayName": "x",
            "typeOfValue": "string",
            "distinctValueEstimate": 2,
            "offset": 0,
            "dataArray": ["a", "b"]
        }]
    }"#;
    assert!(from_json_str(bad).is_err());

    // Not even the right shape.
    assert!(from_json_str("{\"sizes\": true}").is_err());
}

#[test]
fn empty_store_round_trips() {
    let builder = StoreBuilder::new(
        vec![FieldDescriptor::new("k", ValueType::String)],
        BuildParams::default(),
    )
    .unwrap();
    let store = builder.finish().unwrap();
    assert_eq!(store.size(), 0);

    let restored = read_store(write_store(&store)).unwrap();
    assert_eq!(restored.size(), 0);
    assert_eq!(restored.fields().len(), 1);
}
