use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::{SecondsFormat, Utc};
use tracing::info;

use guestbook_types::api::{PublicEntry, SubmitEntryRequest, SubmitEntryResponse};
use guestbook_types::models::{Entry, EntryStatus, MESSAGE_MAX_CHARS, NAME_MAX_CHARS};

use crate::error::ApiError;
use crate::state::{AppState, with_db};
use crate::text::normalize_text;

/// Number of approved entries served publicly.
pub const PUBLIC_LIMIT: u32 = 50;

/// GET /api/entries: approved entries, newest first.
pub async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<PublicEntry>>, ApiError> {
    let entries = with_db(&state, |db| db.list_approved(PUBLIC_LIMIT)).await?;
    Ok(Json(entries.into_iter().map(PublicEntry::from).collect()))
}

/// POST /api/entries: store a pending entry, then notify the moderator.
///
/// An unparseable body counts as one with no fields, so every malformed
/// submission gets the same 400.
pub async fn submit_entry(
    State(state): State<AppState>,
    payload: Result<Json<SubmitEntryRequest>, JsonRejection>,
) -> Result<Json<SubmitEntryResponse>, ApiError> {
    let req = payload.map(|Json(req)| req).unwrap_or_default();

    let name = req.name.as_deref().and_then(|s| normalize_text(s, NAME_MAX_CHARS));
    let message = req.message.as_deref().and_then(|s| normalize_text(s, MESSAGE_MAX_CHARS));
    let (Some(name), Some(message)) = (name, message) else {
        return Err(ApiError::BadRequest("Name and message are required.".to_string()));
    };

    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let entry = with_db(&state, move |db| {
        let id = db.insert_entry(&name, &message, &created_at)?;
        Ok(Entry {
            id,
            name,
            message,
            status: EntryStatus::Pending,
            created_at,
        })
    })
    .await?;

    info!(entry_id = entry.id, "guestbook entry submitted");

    // Runs in the background; never holds up or fails the response.
    state.notifier.notify(&entry);

    Ok(Json(SubmitEntryResponse {
        ok: true,
        id: entry.id,
    }))
}
