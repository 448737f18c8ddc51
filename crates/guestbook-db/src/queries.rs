use anyhow::Result;
use guestbook_types::models::{Entry, EntryStatus};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::Database;
use crate::models::EntryRow;

const ENTRY_COLUMNS: &str = "id, name, message, status, created_at";

impl Database {
    /// Persist a new pending entry and return its id.
    pub fn insert_entry(&self, name: &str, message: &str, created_at: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO entries (name, message, status, created_at) VALUES (?1, ?2, ?3, ?4)",
                (name, message, EntryStatus::Pending.as_str(), created_at),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent approved entries, newest id first.
    pub fn list_approved(&self, limit: u32) -> Result<Vec<Entry>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE status = ?1 ORDER BY id DESC LIMIT ?2"
                ),
                rusqlite::params![EntryStatus::Approved.as_str(), limit],
            )
        })
    }

    /// Every pending entry, most recent first.
    pub fn list_pending(&self) -> Result<Vec<Entry>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE status = ?1
                     ORDER BY created_at DESC, id DESC"
                ),
                rusqlite::params![EntryStatus::Pending.as_str()],
            )
        })
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
                    [id],
                    map_entry_row,
                )
                .optional()?;
            row.map(EntryRow::into_entry).transpose()
        })
    }

    /// Move an entry to `status`. Returns whether a row changed: `false` when
    /// the id does not exist or the entry already has that status.
    pub fn set_status(&self, id: i64, status: EntryStatus) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE entries SET status = ?2 WHERE id = ?1 AND status != ?2",
                rusqlite::params![id, status.as_str()],
            )?;
            Ok(changed > 0)
        })
    }
}

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        message: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_entries(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Entry>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_entry_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(EntryRow::into_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-10-19T08:00:00.000Z";

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let db = db();
        let a = db.insert_entry("a", "first", TS).unwrap();
        let b = db.insert_entry("b", "second", TS).unwrap();
        let c = db.insert_entry("c", "third", TS).unwrap();
        assert!(a < b && b < c);

        let entry = db.get_entry(b).unwrap().unwrap();
        assert_eq!(entry.name, "b");
        assert_eq!(entry.status, EntryStatus::Pending);
        assert_eq!(entry.created_at, TS);
    }

    #[test]
    fn approved_listing_hides_pending_and_rejected() {
        let db = db();
        let pending = db.insert_entry("p", "pending", TS).unwrap();
        let approved = db.insert_entry("a", "approved", TS).unwrap();
        let rejected = db.insert_entry("r", "rejected", TS).unwrap();
        db.set_status(approved, EntryStatus::Approved).unwrap();
        db.set_status(rejected, EntryStatus::Rejected).unwrap();

        let ids: Vec<i64> = db.list_approved(50).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![approved]);

        let ids: Vec<i64> = db.list_pending().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![pending]);
    }

    #[test]
    fn approved_listing_is_newest_first_and_capped() {
        let db = db();
        for i in 0..5 {
            let id = db.insert_entry(&format!("n{i}"), "m", TS).unwrap();
            db.set_status(id, EntryStatus::Approved).unwrap();
        }

        let listed = db.list_approved(3).unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(listed[0].name, "n4");
    }

    #[test]
    fn pending_listing_is_most_recent_first() {
        let db = db();
        let older = db.insert_entry("old", "m", "2026-10-18T08:00:00.000Z").unwrap();
        let newer = db.insert_entry("new", "m", "2026-10-19T08:00:00.000Z").unwrap();

        let ids: Vec<i64> = db.list_pending().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![newer, older]);
    }

    #[test]
    fn set_status_reports_changes_only() {
        let db = db();
        let id = db.insert_entry("n", "m", TS).unwrap();

        assert!(db.set_status(id, EntryStatus::Approved).unwrap());
        assert!(!db.set_status(id, EntryStatus::Approved).unwrap());
        assert!(!db.set_status(9999, EntryStatus::Rejected).unwrap());
        assert!(db.get_entry(9999).unwrap().is_none());
    }

    #[test]
    fn approve_after_reject_wins() {
        let db = db();
        let id = db.insert_entry("n", "m", TS).unwrap();
        db.set_status(id, EntryStatus::Rejected).unwrap();
        db.set_status(id, EntryStatus::Approved).unwrap();

        assert_eq!(db.get_entry(id).unwrap().unwrap().status, EntryStatus::Approved);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guestbook.db");

        let id = {
            let db = Database::open(&path).unwrap();
            let id = db.insert_entry("kept", "across restarts", TS).unwrap();
            db.set_status(id, EntryStatus::Approved).unwrap();
            id
        };

        let db = Database::open(&path).unwrap();
        let listed = db.list_approved(50).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        // ids keep increasing after reopen
        let next = db.insert_entry("next", "m", TS).unwrap();
        assert!(next > id);
    }
}
