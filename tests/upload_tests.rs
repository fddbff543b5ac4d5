mod common;

use axum::http::StatusCode;
use common::{book_form, file, multipart_request, png, test_app, test_app_with, text};
use library_api::{MockImageStore, upload::MAX_IMAGE_BYTES};
use serde_json::Value;

fn error_message(body: &Value) -> &str {
    body["errors"]["message"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn unsupported_image_types_are_rejected() {
    let app = test_app();

    let form = book_form(
        "Dune",
        "Herbert",
        "scifi",
        "1965/08/01",
        file("bookImage", "cover.webp", "image/webp", b"RIFF....WEBP".to_vec()),
    );
    let (status, body) = app
        .send(multipart_request("POST", "/api/book/add", &app.librarian_token(), &form))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_message(&body), "Invalid Input Type.");
    assert!(app.images.is_empty().await);
}

#[tokio::test]
async fn jpeg_and_gif_covers_keep_their_extension() {
    let app = test_app();
    let token = app.librarian_token();

    for (name, mime, ext) in [("A", "image/jpeg", ".jpeg"), ("B", "image/gif", ".gif")] {
        let form = book_form(name, "Author", "genre", "2020/01/01", file("bookImage", "cover", mime, vec![1, 2, 3]));
        let (status, body) = app
            .send(multipart_request("POST", "/api/book/add", &token, &form))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let id = body["id"].as_str().unwrap();
        let (_, book) = app
            .send(common::get_request(&format!("/api/book/{id}"), Some(&token)))
            .await;
        assert!(book["bookImage"].as_str().unwrap().ends_with(ext));
    }
}

#[tokio::test]
async fn oversized_images_are_rejected() {
    let app = test_app();

    let form = book_form(
        "Dune",
        "Herbert",
        "scifi",
        "1965/08/01",
        file("bookImage", "huge.png", "image/png", vec![0u8; MAX_IMAGE_BYTES + 1]),
    );
    let (status, body) = app
        .send(multipart_request("POST", "/api/book/add", &app.librarian_token(), &form))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["status"], 400);
    assert_eq!(error_message(&body), "File too large");
    assert!(app.images.is_empty().await);
}

#[tokio::test]
async fn only_one_image_field_is_accepted() {
    let app = test_app();
    let token = app.librarian_token();

    let mut two_files = book_form("Dune", "Herbert", "scifi", "1965/08/01", png());
    two_files.push(png());
    let (status, body) = app
        .send(multipart_request("POST", "/api/book/add", &token, &two_files))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_message(&body), "Unexpected field");

    let wrong_name = book_form(
        "Dune",
        "Herbert",
        "scifi",
        "1965/08/01",
        file("cover", "cover.png", "image/png", vec![1, 2, 3]),
    );
    let (status, body) = app
        .send(multipart_request("POST", "/api/book/add", &token, &wrong_name))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_message(&body), "Unexpected field");

    assert!(app.images.is_empty().await);
}

#[tokio::test]
async fn empty_image_parts_count_as_missing() {
    let app = test_app();

    let form = book_form(
        "Dune",
        "Herbert",
        "scifi",
        "1965/08/01",
        file("bookImage", "empty.png", "image/png", Vec::new()),
    );
    let (status, body) = app
        .send(multipart_request("POST", "/api/book/add", &app.librarian_token(), &form))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_message(&body), "Field can't be empty!");
    assert!(app.images.is_empty().await);
}

#[tokio::test]
async fn unknown_text_fields_are_ignored() {
    let app = test_app();

    let mut form = book_form("Dune", "Herbert", "scifi", "1965/08/01", png());
    form.insert(0, text("publisher", "Chilton"));
    let (status, _) = app
        .send(multipart_request("POST", "/api/book/add", &app.librarian_token(), &form))
        .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn storage_failures_surface_as_generic_errors() {
    let app = test_app_with(MockImageStore::new_failing());

    let (status, body) = app
        .send(multipart_request(
            "POST",
            "/api/book/add",
            &app.librarian_token(),
            &book_form("Dune", "Herbert", "scifi", "1965/08/01", png()),
        ))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), "An unknown error occurred!");
}
