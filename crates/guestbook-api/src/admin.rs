//! Moderation handlers. Every route here sits behind `gate::require_admin`.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use tracing::info;

use guestbook_types::api::{ModerationQuery, PendingEntry};
use guestbook_types::models::EntryStatus;

use crate::error::ApiError;
use crate::state::{AppState, with_db};

/// GET /admin/pending
pub async fn list_pending(State(state): State<AppState>) -> Result<Json<Vec<PendingEntry>>, ApiError> {
    let entries = with_db(&state, |db| db.list_pending()).await?;
    Ok(Json(entries.into_iter().map(PendingEntry::from).collect()))
}

/// GET /admin/approve?id=&token=
pub async fn approve(
    State(state): State<AppState>,
    query: Result<Query<ModerationQuery>, QueryRejection>,
) -> Result<String, ApiError> {
    moderate(state, query, EntryStatus::Approved).await
}

/// GET /admin/reject?id=&token=
pub async fn reject(
    State(state): State<AppState>,
    query: Result<Query<ModerationQuery>, QueryRejection>,
) -> Result<String, ApiError> {
    moderate(state, query, EntryStatus::Rejected).await
}

/// Last write wins: an entry can move between approved and rejected any
/// number of times. Unknown ids and repeated decisions are no-ops.
async fn moderate(
    state: AppState,
    query: Result<Query<ModerationQuery>, QueryRejection>,
    status: EntryStatus,
) -> Result<String, ApiError> {
    let query = query
        .map(|Query(query)| query)
        .map_err(|_| ApiError::BadRequest("Invalid query string.".to_string()))?;
    let id = parse_entry_id(query.id.as_deref())?;

    let changed = with_db(&state, move |db| db.set_status(id, status)).await?;
    if changed {
        info!(entry_id = id, status = %status, "entry moderated");
    } else {
        info!(entry_id = id, status = %status, "moderation had no effect");
    }

    Ok(format!("Entry {id} {status}."))
}

fn parse_entry_id(raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing id.".to_string()))?;

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest("Invalid id.".to_string())),
    }
}
