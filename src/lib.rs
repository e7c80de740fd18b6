//! mailview - SQLite-backed mail folder hierarchy with live message views
//!
//! Folders are stored as a nested-set tree (one `lft`/`rgt` interval per
//! folder) in SQLite. Containment of intervals encodes the hierarchy, so
//! ancestor and descendant lookups are single range queries and moving a
//! whole subtree is arithmetic on the interval bounds.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and schema for the backing database
//! - `folders`: Folder nodes and the interval-tree store
//! - `messages`: Message rows referenced by filters
//! - `filters`: Composable message filters and the `LiveView` over them
//! - `error`: Crate error type

mod error;

pub mod db;
pub mod filters;
pub mod folders;
pub mod messages;

pub use db::Database;
pub use error::MailviewError;
pub use filters::{Filter, LiveView, ThreadKind};
pub use folders::{FolderNode, FolderStore, FolderTypeTable, MoveTo};
pub use messages::{Message, NewMessage};
