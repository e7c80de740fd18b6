//! Composed live view over the messages table
//!
//! A `LiveView` holds at most one folder-scope filter, at most one
//! thread-type filter, and any number of quick filters. The composition is
//! conjunctive: one `AND` clause with the merged parameters, and a
//! `matches` predicate that is the AND of every active filter's predicate.

use rusqlite::ToSql;

use crate::db::Database;
use crate::error::MailviewError;
use crate::filters::Filter;
use crate::messages::{message_from_row, Message};

#[derive(Debug, Clone, Default)]
pub struct LiveView {
    folder_filter: Option<Filter>,
    thread_type_filter: Option<Filter>,
    /// Additional, unordered filters layered on top of the typed slots
    pub quick_filters: Vec<Filter>,
}

impl LiveView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder_filter(&self) -> Option<&Filter> {
        self.folder_filter.as_ref()
    }

    /// Set or clear the folder slot; only folder-scope filter variants are
    /// accepted
    pub fn set_folder_filter(&mut self, filter: Option<Filter>) -> Result<(), MailviewError> {
        if let Some(filter) = &filter {
            if !filter.is_folder_filter() {
                return Err(MailviewError::InvalidInput(
                    "filter is not a folder filter".to_string(),
                ));
            }
        }
        self.folder_filter = filter;
        Ok(())
    }

    pub fn thread_type_filter(&self) -> Option<&Filter> {
        self.thread_type_filter.as_ref()
    }

    /// Set or clear the thread-type slot; only thread-type filter variants
    /// are accepted
    pub fn set_thread_type_filter(&mut self, filter: Option<Filter>) -> Result<(), MailviewError> {
        if let Some(filter) = &filter {
            if !filter.is_thread_type_filter() {
                return Err(MailviewError::InvalidInput(
                    "filter is not a thread type filter".to_string(),
                ));
            }
        }
        self.thread_type_filter = filter;
        Ok(())
    }

    fn all_filters(&self) -> impl Iterator<Item = &Filter> {
        self.folder_filter
            .iter()
            .chain(self.thread_type_filter.iter())
            .chain(self.quick_filters.iter())
    }

    /// Conjunctive SQL clause over `messages`; `"1"` when no filter is
    /// active
    pub fn clause(&self) -> String {
        let clauses: Vec<String> = self.all_filters().map(Filter::clause).collect();
        if clauses.is_empty() {
            "1".to_string()
        } else {
            clauses.join(" AND ")
        }
    }

    /// Merged parameters of every active filter; names are unique by
    /// construction
    pub fn params(&self) -> Vec<(String, i64)> {
        self.all_filters().flat_map(Filter::params).collect()
    }

    /// Conjunction of every active filter's predicate
    pub fn matches(&self, message: &Message) -> bool {
        self.all_filters().all(|filter| filter.matches(message))
    }

    /// Count matching messages
    pub fn count(&self, db: &Database) -> Result<i64, MailviewError> {
        let conn = db.connection()?;
        let sql = format!("SELECT COUNT(*) FROM messages WHERE {}", self.clause());
        let params = self.params();
        let bound: Vec<(&str, &dyn ToSql)> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        Ok(conn.query_row(&sql, bound.as_slice(), |row| row.get(0))?)
    }

    /// Fetch matching messages
    pub fn select(&self, db: &Database) -> Result<Vec<Message>, MailviewError> {
        let conn = db.connection()?;
        let sql = format!(
            "SELECT id, message_id, date, from_address, subject, folder, flags
             FROM messages WHERE {}",
            self.clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let params = self.params();
        let bound: Vec<(&str, &dyn ToSql)> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        let rows = stmt.query_map(bound.as_slice(), message_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
