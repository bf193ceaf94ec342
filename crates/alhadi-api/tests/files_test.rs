//! Stored file deletion.

mod helpers;

use alhadi_api::ErrorResponse;
use alhadi_upload::RelayUploadResponse;
use axum_test::multipart::{MultipartForm, Part};
use helpers::{payload, setup_test_app};
use serde_json::json;

async fn upload_video(app: &helpers::TestApp) -> RelayUploadResponse {
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(payload(512)).file_name("clip.mp4").mime_type("video/mp4"),
    );
    app.client().post("/api/upload").multipart(form).await.json()
}

#[tokio::test]
async fn test_delete_by_path() {
    let app = setup_test_app().await;
    let uploaded = upload_video(&app).await;
    let path = uploaded.file_path.unwrap();
    assert!(app.stored_file(&path).exists());

    let response = app
        .client()
        .delete("/api/files")
        .json(&json!({ "path": path }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], path.as_str());
    assert!(!app.stored_file(&path).exists());
}

#[tokio::test]
async fn test_delete_by_public_url() {
    let app = setup_test_app().await;
    let uploaded = upload_video(&app).await;
    let path = uploaded.file_path.unwrap();

    let response = app
        .client()
        .delete("/api/files")
        .json(&json!({ "path": uploaded.url.unwrap() }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["path"], path.as_str());
    assert!(!app.stored_file(&path).exists());
}

#[tokio::test]
async fn test_delete_empty_path_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .delete("/api/files")
        .json(&json!({ "path": "  " }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "File path is required");
}

#[tokio::test]
async fn test_delete_traversal_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .delete("/api/files")
        .json(&json!({ "path": "../outside.mp4" }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_delete_missing_object_succeeds() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .delete("/api/files")
        .json(&json!({ "path": "videos/never_uploaded.mp4" }))
        .await;

    response.assert_status_ok();
}
