use std::collections::BTreeMap;

use modelkit_bundle::{Bundle, BundleBuilder, BundleError, BundleManifest, EndpointRecord};
use modelkit_types::ColumnInformation;
use pretty_assertions::assert_eq;
use serde_json::json;

fn typed_record(name: &str) -> EndpointRecord {
    let mut columns = BTreeMap::new();
    columns.insert("a".to_string(), ColumnInformation::int32());
    columns.insert("b".to_string(), ColumnInformation::float64().optional());
    EndpointRecord {
        name: name.into(),
        apply: name.into(),
        prepare: Some("scale".into()),
        columns: Some(columns),
    }
}

// ── File round trip ─────────────────────────────────────────────

#[test]
fn write_and_open_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bundle");

    let mut properties = BTreeMap::new();
    properties.insert("threshold".to_string(), json!(0.75));

    BundleBuilder::new(BundleManifest::new("churn", "3.0"))
        .endpoint(typed_record("predict"))
        .properties(properties)
        .write_to(&path)
        .unwrap();

    let bundle = Bundle::open(&path).unwrap();
    assert_eq!(bundle.manifest.model_id, "churn");
    assert_eq!(bundle.manifest.model_version, "3.0");
    assert_eq!(bundle.properties["threshold"], json!(0.75));

    let record = &bundle.endpoints()["predict"];
    assert_eq!(record.apply, "predict");
    assert_eq!(record.prepare.as_deref(), Some("scale"));
    let columns = record.columns.as_ref().unwrap();
    assert!(columns["a"].required);
    assert!(!columns["b"].required);

    assert!(format!("{bundle:?}").contains("churn"));
}

#[test]
fn column_declarations_survive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bundle");

    BundleBuilder::new(BundleManifest::new("churn", "3.0"))
        .endpoint(typed_record("predict"))
        .write_to(&path)
        .unwrap();

    let bundle = Bundle::open(&path).unwrap();
    let columns = bundle.endpoints()["predict"].columns.clone().unwrap();
    let mut expected = BTreeMap::new();
    expected.insert("a".to_string(), ColumnInformation::int32());
    expected.insert("b".to_string(), ColumnInformation::float64().optional());
    assert_eq!(columns, expected);
}

// ── Error paths ─────────────────────────────────────────────────

#[test]
fn missing_file_is_not_found() {
    let err = Bundle::open("/nonexistent/model.bundle").unwrap_err();
    match err {
        BundleError::NotFound(path) => assert!(path.contains("/nonexistent/model.bundle")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn corrupt_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.bundle");
    std::fs::write(&path, b"this is not a zip archive").unwrap();

    let err = Bundle::open(&path).unwrap_err();
    match err {
        BundleError::Corrupt { path: p, .. } => assert!(p.contains("broken.bundle")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn truncated_bundle_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trunc.bundle");

    let bytes = BundleBuilder::new(BundleManifest::new("m", "1.0"))
        .endpoint(typed_record("e"))
        .build()
        .unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(Bundle::open(&path).is_err());
}

// ── Metadata surface ────────────────────────────────────────────

#[test]
fn engine_keys_are_exposed() {
    let mut manifest = BundleManifest::new("m", "1.0");
    manifest
        .extra
        .insert("engine.trained_at".into(), json!("2026-08-12T10:00:00Z"));

    let bytes = BundleBuilder::new(manifest)
        .endpoint(typed_record("e"))
        .build()
        .unwrap();
    let bundle = Bundle::from_reader(std::io::Cursor::new(&bytes)).unwrap();

    assert_eq!(
        bundle.metadata("engine.trained_at").unwrap(),
        json!("2026-08-12T10:00:00Z")
    );
    assert!(!bundle.metadata("engine.version").unwrap().as_str().unwrap().is_empty());
    assert_eq!(bundle.metadata("model.endpoints").unwrap(), json!(["e"]));
}

#[test]
fn content_hash_differs_when_contents_differ() {
    let b1 = BundleBuilder::new(BundleManifest::new("m", "1.0"))
        .endpoint(typed_record("e"))
        .build()
        .unwrap();
    let b2 = BundleBuilder::new(BundleManifest::new("m", "1.1"))
        .endpoint(typed_record("e"))
        .build()
        .unwrap();

    let h1 = Bundle::from_reader(std::io::Cursor::new(b1)).unwrap().content_hash();
    let h2 = Bundle::from_reader(std::io::Cursor::new(b2)).unwrap().content_hash();
    assert_ne!(h1, h2);
}
