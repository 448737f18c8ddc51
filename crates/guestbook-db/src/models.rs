/// Database row types. These map directly to SQLite rows and are converted
/// to `guestbook_types` models at the query boundary.
use anyhow::Result;
use guestbook_types::models::Entry;

pub struct EntryRow {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

impl EntryRow {
    pub fn into_entry(self) -> Result<Entry> {
        Ok(Entry {
            status: self.status.parse()?,
            id: self.id,
            name: self.name,
            message: self.message,
            created_at: self.created_at,
        })
    }
}
