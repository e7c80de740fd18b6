//! Folder hierarchy: nodes, classification, and the interval-tree store

pub mod node;
pub mod store;

pub use node::{flags, FolderNode, FolderTypeTable};
pub use store::{FolderStore, MoveTo};
