use std::collections::BTreeMap;
use std::sync::Arc;

use modelkit_bundle::{BundleBuilder, BundleManifest, EndpointRecord};
use modelkit_context::{LoadedModel, RoutineError, RoutineRegistry};
use modelkit_serve::{build_router, builtin_registry};
use modelkit_types::{ColumnInformation, Record, TypedValue};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn arithmetic_registry() -> RoutineRegistry {
    let mut registry = builtin_registry().unwrap();
    registry
        .register_apply(
            "sum",
            Arc::new(|input: &Record| {
                let (a, b) = operands(input)?;
                Ok(json!({ "result": a + b }))
            }),
        )
        .unwrap();
    registry
        .register_apply(
            "mul",
            Arc::new(|input: &Record| {
                let (a, b) = operands(input)?;
                Ok(json!({ "result": a * b }))
            }),
        )
        .unwrap();
    registry
        .register_apply(
            "boom",
            Arc::new(|_: &Record| -> Result<Value, RoutineError> {
                Err(RoutineError::new("model exploded"))
            }),
        )
        .unwrap();
    registry
}

fn operands(record: &Record) -> Result<(i64, i64), RoutineError> {
    let get = |name: &str| {
        record
            .get(name)
            .and_then(TypedValue::as_i64)
            .ok_or_else(|| RoutineError::new(format!("field {name} missing")))
    };
    Ok((get("a")?, get("b")?))
}

fn int_columns() -> BTreeMap<String, ColumnInformation> {
    let mut columns = BTreeMap::new();
    columns.insert("a".to_string(), ColumnInformation::int32());
    columns.insert("b".to_string(), ColumnInformation::int32());
    columns
}

fn typed_endpoint(name: &str, apply: &str) -> EndpointRecord {
    EndpointRecord {
        name: name.to_string(),
        apply: apply.to_string(),
        prepare: None,
        columns: Some(int_columns()),
    }
}

/// Writes a two-endpoint arithmetic bundle plus an untyped echo endpoint,
/// then serves it on an OS-assigned port. Returns the base URL.
async fn spawn_test_server() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calc.bundle");

    BundleBuilder::new(BundleManifest::new("calc", "1.0"))
        .endpoint(typed_endpoint("sum", "sum"))
        .endpoint(typed_endpoint("mul", "mul"))
        .endpoint(typed_endpoint("boom", "boom"))
        .endpoint(EndpointRecord {
            name: "default".to_string(),
            apply: "echo".to_string(),
            prepare: Some("identity".to_string()),
            columns: None,
        })
        .write_to(&path)
        .unwrap();

    let model = LoadedModel::load(&path, arithmetic_registry()).unwrap();
    let app = build_router(Arc::new(model));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (dir, format!("http://127.0.0.1:{}", port))
}

#[tokio::test]
async fn healthcheck_returns_ok() {
    let (_dir, base) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/healthcheck", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn info_describes_every_endpoint() {
    let (_dir, base) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/model/calc/info", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["model_id"], "calc");
    assert_eq!(body["model_version"], "1.0");
    assert_eq!(body["endpoints"]["sum"]["input"]["a"]["scalar"], "integer");
    assert_eq!(body["endpoints"]["default"]["input"], Value::Null);
}

#[tokio::test]
async fn invoke_dispatches_by_endpoint_name() {
    let (_dir, base) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let sum: Value = client
        .post(format!("{}/api/model/calc/invoke/sum", base))
        .form(&[("a", "3"), ("b", "4")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sum, json!({ "result": 7 }));

    let mul: Value = client
        .post(format!("{}/api/model/calc/invoke/mul", base))
        .form(&[("a", "3"), ("b", "4")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mul, json!({ "result": 12 }));
}

#[tokio::test]
async fn invoke_without_endpoint_uses_default() {
    let (_dir, base) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/model/calc/invoke?greeting=hello", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["greeting"]["text"], "hello");
}

#[tokio::test]
async fn query_params_merge_with_form_fields() {
    let (_dir, base) = spawn_test_server().await;
    let client = reqwest::Client::new();

    // a arrives in the query, b in the form body.
    let resp = client
        .post(format!("{}/api/model/calc/invoke/sum?a=10", base))
        .form(&[("b", "5")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "result": 15 }));
}

#[tokio::test]
async fn form_fields_override_query_on_collision() {
    let (_dir, base) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/model/calc/invoke/sum?a=1&b=1", base))
        .form(&[("a", "100")])
        .send()
        .await
        .unwrap();

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "result": 101 }));
}

#[tokio::test]
async fn multipart_file_fields_win_over_text_fields() {
    let (_dir, base) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new()
        .text("note", "typed")
        .part(
            "note",
            reqwest::multipart::Part::bytes(b"uploaded".to_vec()).file_name("note.txt"),
        );
    let resp = client
        .post(format!("{}/api/model/calc/invoke", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["note"]["bytes"], json!(b"uploaded".to_vec()));
}

#[tokio::test]
async fn missing_required_column_is_a_client_error() {
    let (_dir, base) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/model/calc/invoke/sum", base))
        .form(&[("a", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("\"b\""));
}

#[tokio::test]
async fn uncoercible_value_is_a_client_error() {
    let (_dir, base) = spawn_test_server().await;
    let resp = reqwest::get(format!(
        "{}/api/model/calc/invoke/sum?a=three&b=4",
        base
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_endpoint_is_not_found() {
    let (_dir, base) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/model/calc/invoke/ghost", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn routine_failure_is_a_server_error() {
    let (_dir, base) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/model/calc/invoke/boom?a=1&b=1", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("model exploded"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (_dir, base) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/model/calc/nonexistent", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
