use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest name kept after whitespace normalization, in characters.
pub const NAME_MAX_CHARS: usize = 40;

/// Longest message kept after whitespace normalization, in characters.
pub const MESSAGE_MAX_CHARS: usize = 400;

/// Moderation state of a guestbook entry. Only `Approved` entries are public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Approved,
    Rejected,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown entry status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for EntryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A guestbook submission with its moderation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub status: EntryStatus,
    /// RFC 3339 UTC timestamp, e.g. `2026-10-19T08:15:30.123Z`.
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_its_own_text() {
        for status in [EntryStatus::Pending, EntryStatus::Approved, EntryStatus::Rejected] {
            assert_eq!(status.as_str().parse::<EntryStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&EntryStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
    }
}
