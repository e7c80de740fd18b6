//! Message rows referenced by filters
//!
//! Filters and live views only ever look at a message's `folder` and
//! `flags`; the remaining columns ride along for callers that select
//! matching rows.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::Database;
use crate::error::MailviewError;

/// Message flag bits used by filters
pub mod flags {
    /// The message has been read
    pub const READ: i64 = 0x1;
    /// The message is starred/flagged
    pub const MARKED: i64 = 0x4;
}

/// One row of the `messages` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub message_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub from_address: Option<String>,
    pub subject: Option<String>,
    pub folder: i64,
    pub flags: i64,
}

/// A message ready to be stored, decoupled from any particular source
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub message_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub from_address: Option<String>,
    pub subject: Option<String>,
    pub folder: i64,
    pub flags: i64,
}

/// Insert a batch of messages in one transaction, returning how many rows
/// made it in; individual failures are logged and skipped
pub fn insert_messages(db: &Database, messages: &[NewMessage]) -> Result<usize, MailviewError> {
    let conn = db.connection()?;
    let tx = conn.unchecked_transaction()?;

    let mut count = 0;
    for msg in messages {
        let result = tx.execute(
            "INSERT INTO messages (message_id, date, from_address, subject, folder, flags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                msg.message_id,
                msg.date.map(|d| d.timestamp_millis()),
                msg.from_address,
                msg.subject,
                msg.folder,
                msg.flags,
            ],
        );
        match result {
            Ok(_) => count += 1,
            Err(e) => warn!("Failed to insert message: {}", e),
        }
    }

    tx.commit()?;
    Ok(count)
}

pub(crate) fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let date_ms: Option<i64> = row.get(2)?;
    Ok(Message {
        id: row.get(0)?,
        message_id: row.get(1)?,
        date: date_ms.and_then(DateTime::from_timestamp_millis),
        from_address: row.get(3)?,
        subject: row.get(4)?,
        folder: row.get(5)?,
        flags: row.get(6)?,
    })
}
