use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, AppQuery, JSend, JSendPaginated};
use crate::auth::{AdminSession, Session};
use crate::export::{csv_filename, releases_to_csv};
use crate::query::{self, CategoryFilter, DatePreset, DateRange, ReleaseQuery, SortOrder};
use crate::storage::models::{
    is_placeholder_id, Category, MediaItem, ReleaseDraft, ReleaseNote, Tag, TagInput,
};
use crate::storage::Vocabulary;
use crate::AppState;

/// Prefix of URLs handed out for uploaded media.
pub const MEDIA_URL_PREFIX: &str = "/media/";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListReleasesParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_filter: Option<DatePreset>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

/// Release as submitted by the admin form. Dates and categories arrive as
/// strings so that bad values produce a readable 400.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReleaseRequest {
    pub title: String,
    pub description: String,
    pub datetime: String,
    pub category: String,
    #[serde(default)]
    pub tags: Option<Vec<TagInput>>,
    #[serde(default)]
    pub labels: Option<Vec<TagInput>>,
    #[serde(default)]
    pub media: Option<Vec<MediaItem>>,
}

#[derive(Debug, Serialize)]
pub struct DeletedRelease {
    pub id: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_releases(
    State(state): State<Arc<AppState>>,
    _session: Session,
    AppQuery(params): AppQuery<ListReleasesParams>,
) -> Result<Json<JSendPaginated<ReleaseNote>>, ApiError> {
    let query = build_query(params, Utc::now())?;
    let releases = state.db.fetch_releases()?;
    let page = query::run(releases, &query, state.config.releases.page_size);

    Ok(JSendPaginated::from_page(page, "No releases found"))
}

/// CSV of every release matching the filters, in display order, unpaginated.
pub async fn export_releases(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    AppQuery(params): AppQuery<ListReleasesParams>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let query = build_query(params, now)?;
    let releases = query::filter_and_sort(state.db.fetch_releases()?, &query);

    let body = releases_to_csv(&releases)
        .map_err(|e| ApiError::internal(format!("Failed to build CSV: {e}")))?;

    tracing::debug!(count = releases.len(), "Exported releases");

    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    if let Ok(value) = format!("attachment; filename=\"{}\"", csv_filename(now)).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// Share links use the slug; the id is accepted as well.
pub async fn get_release(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Path(key): Path<String>,
) -> Result<Json<JSend<ReleaseNote>>, ApiError> {
    let release = match state.db.get_release_by_slug(&key)? {
        Some(release) => Some(release),
        None => state.db.get_release(&key)?,
    };

    release
        .map(JSend::success)
        .ok_or_else(|| ApiError::not_found("Release not found"))
}

pub async fn create_release(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    AppJson(req): AppJson<ReleaseRequest>,
) -> Result<(StatusCode, Json<JSend<ReleaseNote>>), ApiError> {
    let draft = validate_release(req, None)?;
    let release = state.db.save_release(&draft)?;

    tracing::debug!(
        release_id = %release.id,
        slug = %release.slug,
        user = %admin.session().username,
        "Created release"
    );

    Ok((StatusCode::CREATED, JSend::success(release)))
}

pub async fn update_release(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    Path(id): Path<String>,
    AppJson(req): AppJson<ReleaseRequest>,
) -> Result<Json<JSend<ReleaseNote>>, ApiError> {
    // Client placeholder ids never name a stored release; only POST creates
    if is_placeholder_id(&id) {
        return Err(ApiError::not_found("Release not found"));
    }

    let draft = validate_release(req, Some(id.clone()))?;
    let previous_media = match draft.media {
        Some(_) => state.db.get_release(&id)?.map(|r| r.media),
        None => None,
    };

    let release = state.db.save_release(&draft)?;

    if let Some(previous) = previous_media {
        let dropped: Vec<String> = previous
            .into_iter()
            .filter(|old| !release.media.iter().any(|m| m.url == old.url))
            .map(|m| m.url)
            .collect();
        prune_media(&state, dropped).await;
    }

    tracing::debug!(
        release_id = %release.id,
        user = %admin.session().username,
        "Updated release"
    );

    Ok(JSend::success(release))
}

pub async fn delete_release(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<JSend<DeletedRelease>>, ApiError> {
    let existing = state
        .db
        .get_release(&id)?
        .ok_or_else(|| ApiError::not_found("Release not found"))?;

    if !state.db.delete_release(&id)? {
        return Err(ApiError::not_found("Release not found"));
    }

    prune_media(&state, existing.media.into_iter().map(|m| m.url).collect()).await;

    tracing::debug!(
        release_id = %id,
        user = %admin.session().username,
        "Deleted release"
    );

    Ok(JSend::success(DeletedRelease { id }))
}

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    _session: Session,
) -> Result<Json<JSend<Vec<Tag>>>, ApiError> {
    Ok(JSend::success(state.db.list_vocabulary(Vocabulary::Tags)?))
}

pub async fn list_labels(
    State(state): State<Arc<AppState>>,
    _session: Session,
) -> Result<Json<JSend<Vec<Tag>>>, ApiError> {
    Ok(JSend::success(state.db.list_vocabulary(Vocabulary::Labels)?))
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn build_query(
    params: ListReleasesParams,
    now: DateTime<Utc>,
) -> Result<ReleaseQuery, ApiError> {
    let category = match params.category.as_deref() {
        Some(value) => CategoryFilter::parse(value)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown category '{value}'")))?,
        None => CategoryFilter::All,
    };

    let date_range = params
        .date_filter
        .unwrap_or_default()
        .range(now)
        .unwrap_or(DateRange {
            from: params.from,
            to: params.to,
        });

    if let (Some(from), Some(to)) = (date_range.from, date_range.to) {
        if from > to {
            return Err(ApiError::bad_request("'from' must not be after 'to'"));
        }
    }

    Ok(ReleaseQuery {
        search: params.search.unwrap_or_default(),
        category,
        date_range,
        sort: params.sort.unwrap_or_default(),
        page: params.page,
    })
}

/// Form rules, checked before anything is written.
pub(crate) fn validate_release(
    req: ReleaseRequest,
    id: Option<String>,
) -> Result<ReleaseDraft, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::bad_request("description must not be empty"));
    }

    let datetime = DateTime::parse_from_rfc3339(req.datetime.trim())
        .map_err(|_| ApiError::bad_request("datetime must be an RFC 3339 timestamp"))?
        .with_timezone(&Utc);

    let category = Category::parse(req.category.trim()).ok_or_else(|| {
        ApiError::bad_request("category must be one of: bugfix, enhancement, feature")
    })?;

    for (field, entries) in [("tags", &req.tags), ("labels", &req.labels)] {
        for entry in entries.iter().flatten() {
            if entry.name.trim().is_empty() {
                return Err(ApiError::bad_request(format!("{field} must have a name")));
            }
            if !is_hex_color(&entry.color) {
                return Err(ApiError::bad_request(format!(
                    "{field} color '{}' is not a hex color",
                    entry.color
                )));
            }
        }
    }

    if req
        .media
        .iter()
        .flatten()
        .any(|item| item.url.trim().is_empty())
    {
        return Err(ApiError::bad_request("media url must not be empty"));
    }

    Ok(ReleaseDraft {
        id,
        title: req.title.trim().to_string(),
        description: req.description,
        datetime,
        category,
        tags: req.tags,
        labels: req.labels,
        media: req.media,
    })
}

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Remove uploaded blobs that no release references any more. Best-effort:
/// failures are logged and never fail the request.
async fn prune_media(state: &AppState, urls: Vec<String>) {
    if urls.is_empty() {
        return;
    }

    let referenced: HashSet<String> = match state.db.fetch_releases() {
        Ok(releases) => releases
            .into_iter()
            .flat_map(|r| r.media.into_iter().map(|m| m.url))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Skipped media cleanup, could not load releases");
            return;
        }
    };

    for url in urls {
        if referenced.contains(&url) {
            continue;
        }
        let Some(key) = url.strip_prefix(MEDIA_URL_PREFIX) else {
            continue;
        };
        if let Err(e) = state.object_store.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete media from object storage");
        }
    }
}
