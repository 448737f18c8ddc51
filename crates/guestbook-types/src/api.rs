use serde::{Deserialize, Serialize};

use crate::models::{Entry, EntryStatus};

// -- Public --

/// Body of `POST /api/entries`. Fields are optional so that a missing field
/// is reported as a validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitEntryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitEntryResponse {
    pub ok: bool,
    pub id: i64,
}

/// Public projection of an approved entry; never carries the status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicEntry {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub created_at: String,
}

impl From<Entry> for PublicEntry {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            message: entry.message,
            created_at: entry.created_at,
        }
    }
}

// -- Admin --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub status: EntryStatus,
    pub created_at: String,
}

impl From<Entry> for PendingEntry {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            message: entry.message,
            status: entry.status,
            created_at: entry.created_at,
        }
    }
}

/// Query string of the emailed approve/reject links. `id` stays a raw string
/// so malformed values reach the handler and get a readable 400.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationQuery {
    pub id: Option<String>,
    pub token: Option<String>,
}

// -- Errors / misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
