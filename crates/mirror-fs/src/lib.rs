//! Filesystem layer for the directory mirror
//!
//! Provides directory listing, file comparison policies, and metadata
//! preserving copy/removal primitives used by the tree reconciler.

pub mod compare;
pub mod copy;
pub mod entry;
pub mod error;
pub mod path;

pub use compare::{Comparator, CompareMode, ContentComparator, ShallowComparator};
pub use copy::{DescentGuard, TreeStats, copy_file, copy_tree, remove_entry};
pub use entry::{Entry, EntryKind, list_replica, list_source};
pub use error::{Error, Result};
pub use path::LogicalPath;
