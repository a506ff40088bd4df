//! HTTP-level tests for the PostgREST store adapter

use ecole_config::RestStoreConfig;
use ecole_database::{Filter, Row, RestStore, StoreAdapter, StoreError, Table};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::{json, Value};

fn store_for(server: &MockServer) -> RestStore {
    RestStore::new(&RestStoreConfig {
        base_url: server.base_url(),
        api_key: Some("anon-key".to_string()),
        request_timeout_seconds: 5,
    })
    .unwrap()
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn select_all_sends_api_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/classes")
                .query_param("select", "*")
                .header("apikey", "anon-key")
                .header("authorization", "Bearer anon-key");
            then.status(200)
                .json_body(json!([{"id": "c1", "name": "6A", "contact_email": null}]));
        })
        .await;

    let rows = store_for(&server).select_all(Table::Classes).await.unwrap();

    mock.assert_async().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "6A");
}

#[tokio::test]
async fn select_where_uses_eq_operator() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/users")
                .query_param("email", "eq.jean@x.com");
            then.status(200).json_body(json!([{"id": "u1", "email": "jean@x.com"}]));
        })
        .await;

    let rows = store_for(&server)
        .select_where(Table::Users, &Filter::eq("email", "jean@x.com"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(rows[0]["id"], "u1");
}

#[tokio::test]
async fn insert_posts_row_and_returns_representation() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/exams")
                .header("prefer", "return=representation")
                .json_body(json!([{"id": "e1", "room": "S1", "duration_minutes": 90}]));
            then.status(201)
                .json_body(json!([{"id": "e1", "room": "S1", "duration_minutes": 90}]));
        })
        .await;

    let created = store_for(&server)
        .insert(
            Table::Exams,
            row(json!({"id": "e1", "room": "S1", "duration_minutes": 90})),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created["duration_minutes"], 90);
}

#[tokio::test]
async fn update_with_no_matching_row_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/polls")
                .query_param("id", "eq.p9");
            then.status(200).json_body(json!([]));
        })
        .await;

    let err = store_for(&server)
        .update(Table::Polls, "p9", row(json!({"active": false})))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound { table: Table::Polls, .. }));
}

#[tokio::test]
async fn delete_targets_single_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/rest/v1/announcements")
                .query_param("id", "eq.a1");
            then.status(204);
        })
        .await;

    store_for(&server)
        .delete(Table::Announcements, "a1")
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn upsert_merges_on_conflict_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/app_settings")
                .query_param("on_conflict", "key")
                .header("prefer", "resolution=merge-duplicates,return=representation");
            then.status(201)
                .json_body(json!([{"id": "s1", "key": "school_name", "value": "Lycée Hugo"}]));
        })
        .await;

    let stored = store_for(&server)
        .upsert(
            Table::AppSettings,
            "key",
            row(json!({"key": "school_name", "value": "Lycée Hugo"})),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(stored["value"], "Lycée Hugo");
}

#[tokio::test]
async fn conflict_status_maps_to_constraint() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/v1/users");
            then.status(409).json_body(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"users_email_key\""
            }));
        })
        .await;

    let err = store_for(&server)
        .insert(Table::Users, row(json!({"id": "u2", "email": "jean@x.com"})))
        .await
        .unwrap_err();

    match err {
        StoreError::Constraint(message) => assert!(message.contains("users_email_key")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_carry_status_and_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/meets");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let err = store_for(&server).select_all(Table::Meets).await.unwrap_err();

    match &err {
        StoreError::Rejected { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let store = RestStore::new(&RestStoreConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: None,
        request_timeout_seconds: 1,
    })
    .unwrap();

    let err = store.select_all(Table::Classes).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
