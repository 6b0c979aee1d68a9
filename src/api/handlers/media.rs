use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use super::releases::MEDIA_URL_PREFIX;
use crate::api::response::{ApiError, JSend};
use crate::auth::AdminSession;
use crate::object_store::ObjectStoreError;
use crate::storage::models::{MediaItem, MediaType};
use crate::AppState;

/// Store an uploaded image or video and return the `{type, url}` entry the
/// admin form attaches to a release.
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JSend<MediaItem>>), ApiError> {
    let mut upload: Option<(Bytes, Option<String>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

        if data.len() as u64 > state.config.storage.max_upload_size {
            return Err(ApiError::payload_too_large(format!(
                "File exceeds maximum upload size of {} bytes",
                state.config.storage.max_upload_size
            )));
        }

        upload = Some((data, file_name, content_type));
    }

    let (data, file_name, content_type) =
        upload.ok_or_else(|| ApiError::bad_request("file field is required"))?;

    if data.is_empty() {
        return Err(ApiError::bad_request("file must not be empty"));
    }

    // Trust the part's Content-Type unless it is the generic fallback
    let mime_type = content_type
        .filter(|ct| ct != "application/octet-stream")
        .or_else(|| {
            file_name
                .as_deref()
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.to_string())
        })
        .unwrap_or_default();

    let media_type = MediaType::from_mime(&mime_type).ok_or_else(|| {
        ApiError::unsupported_media_type("Only image and video uploads are accepted")
    })?;

    let extension = file_name
        .as_deref()
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&mime_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        });

    let id = uuid::Uuid::new_v4().to_string();
    let key = match extension {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    };

    let byte_size = data.len();
    state
        .object_store
        .put(&key, data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store media: {e}")))?;

    tracing::debug!(key = %key, mime_type = %mime_type, byte_size, "Stored media");

    Ok((
        StatusCode::CREATED,
        JSend::success(MediaItem {
            media_type,
            url: format!("{MEDIA_URL_PREFIX}{key}"),
        }),
    ))
}

/// Route: GET /media/:key
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let data = state.object_store.get(&key).await.map_err(|e| match e {
        ObjectStoreError::NotFound(_) | ObjectStoreError::InvalidKey(_) => {
            ApiError::not_found("Media not found")
        }
        _ => ApiError::internal(format!("Failed to retrieve media: {e}")),
    })?;

    let mime_type = mime_guess::from_path(&key).first_or_octet_stream();

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .as_ref()
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    // Keys are never reused, so blobs can be cached aggressively
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    Ok(response)
}
