//! Upload filtering, naming and size limits.
//!
//! Run with: `cargo test --test uploads_test`
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use futures_util::stream;
use uuid::Uuid;

use formfolio_backend::uploads::{
    UploadError, UploadStore, is_allowed_type, read_limited, sanitize_filename, stored_name,
};

#[test]
fn test_only_images_and_pdf_are_allowed() {
    assert!(is_allowed_type("image/png"));
    assert!(is_allowed_type("image/svg+xml"));
    assert!(is_allowed_type("Application/PDF"));
    assert!(!is_allowed_type("application/zip"));
    assert!(!is_allowed_type("text/html"));
    assert!(!is_allowed_type(""));
}

#[test]
fn test_filenames_are_sanitized() {
    assert_eq!(sanitize_filename("room plan (v2).pdf"), "room_plan__v2_.pdf");
    assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    assert_eq!(sanitize_filename("객실.jpg"), "__.jpg");
    assert_eq!(stored_name(1700000000000, "a b.png"), "1700000000000_a_b.png");
}

#[tokio::test]
async fn test_read_limited_collects_chunks() {
    let chunks = stream::iter(vec![
        Ok::<_, std::io::Error>(b"hello ".to_vec()),
        Ok(b"world".to_vec()),
    ]);
    let data = read_limited(chunks, 11).await.unwrap();
    assert_eq!(data, b"hello world");
}

#[tokio::test]
async fn test_read_limited_stops_at_limit() {
    let chunks = stream::iter(vec![
        Ok::<_, std::io::Error>(vec![0u8; 6]),
        Ok(vec![0u8; 6]),
    ]);
    let err = read_limited(chunks, 10).await.unwrap_err();
    assert!(matches!(err, UploadError::TooLarge(10)));
}

#[tokio::test]
async fn test_read_limited_reports_stream_errors() {
    let chunks = stream::iter(vec![
        Ok(vec![1u8]),
        Err(std::io::Error::other("connection dropped")),
    ]);
    let err = read_limited(chunks, 10).await.unwrap_err();
    assert!(matches!(err, UploadError::Multipart(msg) if msg.contains("connection dropped")));
}

#[tokio::test]
async fn test_store_writes_under_public_path() {
    let dir = std::env::temp_dir().join(format!("formfolio-uploads-{}", Uuid::new_v4()));
    let store = UploadStore::new(&dir, 1024);
    store.ensure_dir().await.unwrap();

    let url = store.save("floor plan.pdf", b"%PDF-1.4").await.unwrap();

    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with("_floor_plan.pdf"));
    let name = url.trim_start_matches("/uploads/");
    let written = tokio::fs::read(store.dir().join(name)).await.unwrap();
    assert_eq!(written, b"%PDF-1.4");

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[test]
fn test_upload_error_statuses() {
    assert_eq!(UploadError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        UploadError::TooLarge(10 * 1024 * 1024).to_string(),
        "Files cannot be larger than 10 MB"
    );
    assert_eq!(
        UploadError::Io(std::io::Error::other("disk full")).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
