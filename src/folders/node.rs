//! Folder nodes and flags-derived classification
//!
//! A `FolderNode` is one entry of the in-memory mirror kept by
//! [`FolderStore`](crate::folders::FolderStore). Nodes reference each other
//! by id (the mirror owns them), so the parent back-reference never owns its
//! target and the tree has no reference cycles.

use serde::Serialize;

/// Folder flag bits, matching the classic mail folder flag values
pub mod flags {
    pub const TRASH: i64 = 0x0000_0100;
    pub const SENT_MAIL: i64 = 0x0000_0200;
    pub const DRAFTS: i64 = 0x0000_0400;
    pub const QUEUE: i64 = 0x0000_0800;
    pub const INBOX: i64 = 0x0000_1000;
    pub const ARCHIVE: i64 = 0x0000_4000;
    pub const TEMPLATES: i64 = 0x0040_0000;
    pub const JUNK: i64 = 0x4000_0000;
}

/// Ordered (mask, label) classification table
///
/// `classify` returns the label of the first entry whose mask bit is set in
/// the folder's flags, so entry order decides ties. The default table covers
/// the standard mail folder kinds; callers with other flag layouts supply
/// their own.
#[derive(Debug, Clone)]
pub struct FolderTypeTable {
    entries: Vec<(i64, String)>,
}

impl FolderTypeTable {
    pub fn new(entries: Vec<(i64, String)>) -> Self {
        Self { entries }
    }

    /// First matching label, or `""` when no entry matches
    pub fn classify(&self, flags: i64) -> &str {
        for (mask, label) in &self.entries {
            if flags & mask != 0 {
                return label;
            }
        }
        ""
    }
}

impl Default for FolderTypeTable {
    fn default() -> Self {
        Self::new(
            [
                (flags::TRASH, "Trash"),
                (flags::SENT_MAIL, "SentMail"),
                (flags::DRAFTS, "Drafts"),
                (flags::QUEUE, "Queue"),
                (flags::INBOX, "Inbox"),
                (flags::ARCHIVE, "Archive"),
                (flags::TEMPLATES, "Templates"),
                (flags::JUNK, "Junk"),
            ]
            .into_iter()
            .map(|(mask, label)| (mask, label.to_string()))
            .collect(),
        )
    }
}

/// One folder of the hierarchy
///
/// `left`/`right` are the nested-set bounds: for any two folders the
/// intervals are either disjoint or one strictly nests inside the other.
/// The bounds are written only by the store; nodes read them.
#[derive(Debug, Clone, Serialize)]
pub struct FolderNode {
    pub id: i64,
    pub name: String,
    pub left: i64,
    pub right: i64,
    pub flags: i64,
    /// Parent folder id; `None` for a root
    pub parent: Option<i64>,
    /// Child folder ids, left-to-right (pre-order)
    pub children: Vec<i64>,
}

impl FolderNode {
    pub(crate) fn new(id: i64, name: String, left: i64, right: i64, flags: i64) -> Self {
        Self {
            id,
            name,
            left,
            right,
            flags,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Strict interval containment: this folder's interval encloses `other`'s
    pub fn is_ancestor_of(&self, other: &FolderNode) -> bool {
        self.left < other.left && self.right > other.right
    }

    /// Strict interval containment: this folder's interval nests inside `other`'s
    pub fn is_descendant_of(&self, other: &FolderNode) -> bool {
        self.left > other.left && self.right < other.right
    }

    /// Classification of this folder's own flags against the given table
    pub fn classify<'a>(&self, table: &'a FolderTypeTable) -> &'a str {
        table.classify(self.flags)
    }
}
