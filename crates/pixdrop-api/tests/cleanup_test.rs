//! Record-deleted cleanup integration tests.

mod helpers;

use axum::http::StatusCode;
use helpers::{
    bearer, image_form, minimal_png, setup_test_app, setup_test_app_with, TestOptions, TEST_TOKEN,
};
use pixdrop_storage::Storage;
use serde_json::{json, Value};

async fn upload(app: &helpers::TestApp) -> String {
    let body: Value = app
        .client()
        .post("/storeImage")
        .add_header("Authorization", bearer(TEST_TOKEN))
        .multipart(image_form("cat.png", &minimal_png()))
        .await
        .json();
    body["imagePath"].as_str().expect("imagePath").to_string()
}

#[tokio::test]
async fn test_record_deleted_removes_object_and_is_idempotent() {
    let app = setup_test_app().await;
    let image_path = upload(&app).await;
    assert!(app.storage.exists(&image_path).await.unwrap());

    let event = json!({"recordId": "rec-1", "data": {"imagePath": image_path, "title": "cat"}});

    let first = app.client().post("/events/recordDeleted").json(&event).await;
    assert_eq!(first.status_code(), StatusCode::NO_CONTENT);
    assert!(!app.storage.exists(&image_path).await.unwrap());

    let second = app.client().post("/events/recordDeleted").json(&event).await;
    assert_eq!(second.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.storage.deletes(), 2);
}

#[tokio::test]
async fn test_record_without_image_path_is_ignored() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/events/recordDeleted")
        .json(&json!({"recordId": "rec-2", "data": {"title": "no image"}}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.storage.deletes(), 0);
}

#[tokio::test]
async fn test_malformed_notification_is_a_bad_request() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/events/recordDeleted")
        .add_header("Content-Type", "application/json")
        .text("{not json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shared_secret_is_enforced_when_configured() {
    let app = setup_test_app_with(TestOptions {
        events_shared_secret: Some("event-secret".to_string()),
        ..Default::default()
    })
    .await;
    let image_path = upload(&app).await;
    let event = json!({"data": {"imagePath": image_path}});

    let missing = app.client().post("/events/recordDeleted").json(&event).await;
    assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .client()
        .post("/events/recordDeleted")
        .add_header("Authorization", bearer("nope"))
        .json(&event)
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    assert!(app.storage.exists(&image_path).await.unwrap());

    let ok = app
        .client()
        .post("/events/recordDeleted")
        .add_header("Authorization", bearer("event-secret"))
        .json(&event)
        .await;
    assert_eq!(ok.status_code(), StatusCode::NO_CONTENT);
    assert!(!app.storage.exists(&image_path).await.unwrap());
}

async fn upload_to(app: &helpers::TestApp, object_path: &str) {
    let form = image_form("replacement.png", object_path.as_bytes())
        .add_text("oldImagePath", urlencoding::encode(object_path).into_owned());
    let response = app
        .client()
        .post("/storeImage")
        .add_header("Authorization", bearer(TEST_TOKEN))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["imagePath"], json!(object_path));
}

#[tokio::test]
async fn test_cleanup_deletes_exactly_the_recorded_path() {
    let app = setup_test_app().await;
    upload_to(&app, "a.png").await;
    upload_to(&app, "a.png ").await;

    let response = app
        .client()
        .post("/events/recordDeleted")
        .json(&json!({"data": {"imagePath": "a.png "}}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert!(!app.storage.exists("a.png ").await.unwrap());
    assert!(app.storage.exists("a.png").await.unwrap());
}

#[tokio::test]
async fn test_cleanup_passes_decoded_replace_path_through_unchanged() {
    let app = setup_test_app().await;
    let target = "gallery/ sunset 50%+dusk.png";
    let neighbour = "gallery/sunset 50%+dusk.png";
    upload_to(&app, target).await;
    upload_to(&app, neighbour).await;

    let response = app
        .client()
        .post("/events/recordDeleted")
        .json(&json!({"recordId": "rec-9", "data": {"imagePath": target}}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.storage.deletes(), 1);
    assert!(!app.storage.exists(target).await.unwrap());
    assert!(app.storage.exists(neighbour).await.unwrap());
}
