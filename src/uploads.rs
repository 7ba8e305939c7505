use std::path::{Path, PathBuf};

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use futures_util::{Stream, StreamExt};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

/// URL path uploaded files are served under.
pub const PUBLIC_PATH: &str = "/uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("A file is required")]
    MissingFile,
    #[error("Only image or PDF files can be uploaded")]
    UnsupportedType,
    #[error("Files cannot be larger than {} MB", .0 / (1024 * 1024))]
    TooLarge(usize),
    #[error("Malformed upload: {0}")]
    Multipart(String),
    #[error("Failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            UploadError::Io(e) => {
                error!("Upload failed: {}", e);
                HttpResponse::InternalServerError().json(json!({
                    "error": "File upload failed",
                    "details": e.to_string(),
                }))
            }
            other => HttpResponse::BadRequest().json(json!({ "error": other.to_string() })),
        }
    }
}

/// Images of any subtype and PDF.
pub fn is_allowed_type(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    mime.starts_with("image/") || mime == "application/pdf"
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn stored_name(timestamp_millis: i64, original: &str) -> String {
    format!("{timestamp_millis}_{}", sanitize_filename(original))
}

/// Collect a byte stream, failing as soon as it exceeds `limit`.
pub async fn read_limited<S, B, E>(stream: S, limit: usize) -> Result<Vec<u8>, UploadError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| UploadError::Multipart(e.to_string()))?;
        let chunk = chunk.as_ref();
        if data.len() + chunk.len() > limit {
            return Err(UploadError::TooLarge(limit));
        }
        data.extend_from_slice(chunk);
    }
    Ok(data)
}

/// Files on local disk, served back by `actix-files`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write `data` and return its public URL path.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String, UploadError> {
        let name = stored_name(chrono::Utc::now().timestamp_millis(), original_name);
        tokio::fs::write(self.dir.join(&name), data).await?;
        info!("Stored upload {} ({} bytes)", name, data.len());
        Ok(format!("{PUBLIC_PATH}/{name}"))
    }
}
