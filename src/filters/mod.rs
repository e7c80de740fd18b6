//! Composable message filters
//!
//! Each filter produces an SQL clause over the `messages` table, the named
//! parameters the clause binds, and an equivalent in-memory predicate. The
//! clause and the predicate must agree for every message.
//!
//! Filters are immutable snapshots: folder identity and interval data are
//! captured at construction and do not track later hierarchy changes.
//! Rebuild filters after moving, creating or deleting folders.

pub mod live_view;

pub use live_view::LiveView;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::MailviewError;
use crate::folders::{FolderNode, FolderStore};
use crate::messages::{flags, Message};

// Parameter names are derived from a process-unique sequence number drawn
// per filter instance, so composed filters never collide on a name.
static FILTER_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 {
    FILTER_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Thread-level classifications permitted in the LiveView thread-type slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    /// Messages without the read bit
    UnreadMessages,
    // Planned: threads with unread messages, watched threads with unread
    // messages, ignored threads.
}

impl ThreadKind {
    fn mask(self) -> i64 {
        match self {
            Self::UnreadMessages => flags::READ,
        }
    }

    fn wanted(self) -> i64 {
        match self {
            Self::UnreadMessages => 0,
        }
    }
}

/// A stateless message predicate with an SQL rendition
#[derive(Debug, Clone)]
pub enum Filter {
    /// The message's folder equals a fixed folder
    SingleFolder { seq: u64, folder: i64 },
    /// The message's folder is the given folder or one of its descendants
    ///
    /// The id list is a snapshot for the in-memory predicate; the clause is
    /// the equivalent containment sub-query over the snapshotted bounds.
    FolderSubtree {
        seq: u64,
        left: i64,
        right: i64,
        ids: Vec<i64>,
    },
    /// The message's folder is one of an explicit fixed set
    MultiFolder { seq: u64, ids: Vec<i64> },
    /// Thread-type classification (see [`ThreadKind`])
    ThreadType { seq: u64, kind: ThreadKind },
    /// The message's flags, masked by a fixed bit, equal a fixed value
    MessageFlags { seq: u64, mask: i64, wanted: i64 },
}

impl Filter {
    pub fn single_folder(folder: &FolderNode) -> Self {
        Filter::SingleFolder {
            seq: next_seq(),
            folder: folder.id,
        }
    }

    /// Snapshot the folder's bounds and descendant ids from the store
    pub fn folder_subtree(store: &FolderStore, folder_id: i64) -> Result<Self, MailviewError> {
        let node = store
            .get(folder_id)
            .ok_or(MailviewError::FolderNotFound(folder_id))?;
        let mut ids = vec![node.id];
        ids.extend(
            store
                .find_descendants(node.left, node.right)?
                .iter()
                .map(|f| f.id),
        );
        Ok(Filter::FolderSubtree {
            seq: next_seq(),
            left: node.left,
            right: node.right,
            ids,
        })
    }

    pub fn multi_folder<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        Filter::MultiFolder {
            seq: next_seq(),
            ids: ids.into_iter().collect(),
        }
    }

    pub fn thread_type(kind: ThreadKind) -> Self {
        Filter::ThreadType {
            seq: next_seq(),
            kind,
        }
    }

    /// Messages without the read bit
    pub fn unread() -> Self {
        Self::thread_type(ThreadKind::UnreadMessages)
    }

    /// Messages with the marked/starred bit
    pub fn flagged() -> Self {
        Self::message_flags(flags::MARKED, flags::MARKED)
    }

    pub fn message_flags(mask: i64, wanted: i64) -> Self {
        Filter::MessageFlags {
            seq: next_seq(),
            mask,
            wanted,
        }
    }

    /// Parameterized SQL predicate over the `messages` table
    pub fn clause(&self) -> String {
        match self {
            Filter::SingleFolder { seq, .. } => format!("folder = :folder_{seq}"),
            Filter::FolderSubtree { seq, .. } => format!(
                "folder IN (SELECT id FROM folders WHERE lft >= :lft_{seq} AND rgt <= :rgt_{seq})"
            ),
            Filter::MultiFolder { seq, ids } => {
                if ids.is_empty() {
                    // An empty IN list is an SQL syntax error
                    return "0".to_string();
                }
                let names: Vec<String> = (0..ids.len())
                    .map(|i| format!(":folder_{seq}_{i}"))
                    .collect();
                format!("folder IN ({})", names.join(", "))
            }
            Filter::ThreadType { seq, .. } | Filter::MessageFlags { seq, .. } => {
                format!("flags & :mask_{seq} = :want_{seq}")
            }
        }
    }

    /// Name/value pairs bound by [`clause`](Self::clause); names carry the
    /// `:` prefix ready for named binding
    pub fn params(&self) -> Vec<(String, i64)> {
        match self {
            Filter::SingleFolder { seq, folder } => {
                vec![(format!(":folder_{seq}"), *folder)]
            }
            Filter::FolderSubtree {
                seq, left, right, ..
            } => vec![
                (format!(":lft_{seq}"), *left),
                (format!(":rgt_{seq}"), *right),
            ],
            Filter::MultiFolder { seq, ids } => ids
                .iter()
                .enumerate()
                .map(|(i, id)| (format!(":folder_{seq}_{i}"), *id))
                .collect(),
            Filter::ThreadType { seq, kind } => vec![
                (format!(":mask_{seq}"), kind.mask()),
                (format!(":want_{seq}"), kind.wanted()),
            ],
            Filter::MessageFlags { seq, mask, wanted } => vec![
                (format!(":mask_{seq}"), *mask),
                (format!(":want_{seq}"), *wanted),
            ],
        }
    }

    /// In-memory equivalent of evaluating the clause against the message
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Filter::SingleFolder { folder, .. } => message.folder == *folder,
            Filter::FolderSubtree { ids, .. } | Filter::MultiFolder { ids, .. } => {
                ids.contains(&message.folder)
            }
            Filter::ThreadType { kind, .. } => message.flags & kind.mask() == kind.wanted(),
            Filter::MessageFlags { mask, wanted, .. } => message.flags & mask == *wanted,
        }
    }

    /// Whether this filter may occupy the LiveView folder slot
    pub(crate) fn is_folder_filter(&self) -> bool {
        matches!(
            self,
            Filter::SingleFolder { .. } | Filter::FolderSubtree { .. } | Filter::MultiFolder { .. }
        )
    }

    /// Whether this filter may occupy the LiveView thread-type slot
    pub(crate) fn is_thread_type_filter(&self) -> bool {
        matches!(self, Filter::ThreadType { .. })
    }
}
