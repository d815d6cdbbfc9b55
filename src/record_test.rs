use super::*;
use serde_json::json;

fn package() -> PackageInfo {
    PackageInfo::new("my-app", "1.4.0").expect("package")
}

fn sample_record() -> Record {
    let mut record = Record::new(&package(), 7, Timestamp::from_epoch_seconds(100));
    record.upsert("theme", json!("dark"), Timestamp::from_epoch_seconds(110));
    record.upsert("fontSize", json!(14), Timestamp::from_epoch_seconds(120));
    record
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_record_is_empty_and_stamped() {
    let record = Record::new(&package(), 7, Timestamp::from_epoch_seconds(100));
    assert!(record.preferences.is_empty());
    assert_eq!(record.meta.user_id, 7);
    assert_eq!(record.meta.schema_code, "my-app:user:metadata");
    assert_eq!(record.meta.created_at.epoch_seconds(), 100);
    assert_eq!(record.meta.schema_version, Version::new(1, 4, 0));
}

// =============================================================
// Upsert
// =============================================================

#[test]
fn upsert_appends_new_codes_in_order() {
    let record = sample_record();
    let codes: Vec<&str> = record.preferences.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(codes, ["theme", "fontSize"]);
}

#[test]
fn upsert_overwrites_in_place() {
    let mut record = sample_record();
    record.upsert("theme", json!("light"), Timestamp::from_epoch_seconds(200));

    assert_eq!(record.preferences.len(), 2);
    assert_eq!(record.preferences[0].code, "theme");
    assert_eq!(record.preferences[0].value, json!("light"));
    assert_eq!(record.preferences[0].updated_at.epoch_seconds(), 200);
    assert_eq!(record.preferences[1].updated_at.epoch_seconds(), 120);
}

#[test]
fn upsert_does_not_touch_meta() {
    let mut record = sample_record();
    let before = record.meta.clone();
    record.upsert("theme", json!(null), Timestamp::from_epoch_seconds(999));
    assert_eq!(record.meta, before);
}

#[test]
fn find_and_to_map() {
    let record = sample_record();
    assert_eq!(record.find("fontSize").map(|p| &p.value), Some(&json!(14)));
    assert!(record.find("missing").is_none());

    let map = record.to_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("theme"), Some(&json!("dark")));
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn encode_uses_camel_case_wire_names() {
    let raw = sample_record().encode().expect("encode");
    let value: Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(value["meta"]["userId"], json!(7));
    assert_eq!(value["meta"]["schemaCode"], json!("my-app:user:metadata"));
    assert_eq!(value["meta"]["schemaVersion"], json!("1.4.0"));
    assert_eq!(value["meta"]["createdAt"]["epochSeconds"], json!(100));
    assert_eq!(value["preferences"][0]["code"], json!("theme"));
    assert_eq!(value["preferences"][0]["updatedAt"]["epochSeconds"], json!(110));
}

#[test]
fn decode_preserves_order_and_values() {
    let record = sample_record();
    let decoded = Record::decode(&record.encode().expect("encode")).expect("decode");
    assert_eq!(decoded, record);
}

#[test]
fn decode_empty_or_garbage_is_none() {
    assert!(Record::decode("").is_none());
    assert!(Record::decode("   ").is_none());
    assert!(Record::decode("{not json").is_none());
    assert!(Record::decode("[]").is_none());
}

#[test]
fn decode_accepts_legacy_field_names() {
    let raw = json!({
        "meta": {
            "userId": "3",
            "code": "my-app:user:metadata",
            "time": {"unix": "1700000000.25", "iso": "x", "string": "y"},
            "version": "0.9.1"
        },
        "preferences": [
            {"code": "darkMode", "value": true, "time": {"unix": 1_700_000_100.5}}
        ]
    })
    .to_string();

    let record = Record::decode(&raw).expect("decode");
    assert_eq!(record.meta.user_id, 3);
    assert_eq!(record.meta.created_at.epoch_seconds(), 1_700_000_000);
    assert_eq!(record.meta.schema_version, Version::new(0, 9, 1));
    assert_eq!(record.preferences[0].value, json!(true));
    assert_eq!(record.preferences[0].updated_at.epoch_seconds(), 1_700_000_100);
}

#[test]
fn decode_rejects_negative_user_id() {
    let raw = json!({
        "meta": {"userId": -1, "schemaCode": "x", "createdAt": 0, "schemaVersion": "1.0.0"},
        "preferences": []
    })
    .to_string();
    assert!(Record::decode(&raw).is_none());
}

#[test]
fn decode_defaults_missing_preferences_to_empty() {
    let raw = json!({
        "meta": {"userId": 1, "schemaCode": "x", "createdAt": 0, "schemaVersion": "1.0.0"}
    })
    .to_string();
    let record = Record::decode(&raw).expect("decode");
    assert!(record.preferences.is_empty());
}

#[test]
fn decode_keeps_first_entry_for_repeated_code() {
    let raw = json!({
        "meta": {"userId": 1, "schemaCode": "x", "createdAt": 0, "schemaVersion": "1.0.0"},
        "preferences": [
            {"code": "theme", "value": "dark", "updatedAt": 1},
            {"code": "fontSize", "value": 12, "updatedAt": 2},
            {"code": "theme", "value": "light", "updatedAt": 3}
        ]
    })
    .to_string();

    let record = Record::decode(&raw).expect("decode");
    let codes: Vec<&str> = record.preferences.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(codes, ["theme", "fontSize"]);
    assert_eq!(record.find("theme").map(|p| &p.value), Some(&json!("dark")));
    assert_eq!(record.to_map().get("theme"), Some(&json!("dark")));
}
