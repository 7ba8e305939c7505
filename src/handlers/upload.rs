use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use serde_json::json;
use tracing::info;

use crate::auth::middleware::AuthenticatedUser;
use crate::uploads::{self, UploadError, UploadStore};

/// POST /api/upload: multipart field `file`, an image or a PDF.
///
/// Admins upload thumbnails with a token; respondents attach files to a
/// submission without one.
pub async fn upload_file(
    user: Option<AuthenticatedUser>,
    store: web::Data<UploadStore>,
    mut payload: Multipart,
) -> Result<HttpResponse, UploadError> {
    while let Some(field) = payload.next().await {
        let field = field.map_err(|e| UploadError::Multipart(e.to_string()))?;
        if field.name() != Some("file") {
            continue;
        }

        let mime = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        if !uploads::is_allowed_type(&mime) {
            return Err(UploadError::UnsupportedType);
        }
        let original_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();

        let data = uploads::read_limited(field, store.max_bytes()).await?;
        if data.is_empty() {
            return Err(UploadError::MissingFile);
        }
        let url = store.save(&original_name, &data).await?;

        info!(
            "Upload {} ({}, by {})",
            url,
            mime,
            user.as_ref()
                .map(|u| u.0.user_id.to_string())
                .unwrap_or_else(|| "anonymous".to_string())
        );
        return Ok(HttpResponse::Ok().json(json!({ "url": url })));
    }

    Err(UploadError::MissingFile)
}
