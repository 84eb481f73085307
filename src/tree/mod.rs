//! Content Tree
//!
//! Paths through the content tree and the two resolvers that build them: the forward
//! walker (URL segments down to a node) and the ancestry resolver (a loaded node back up
//! to the root through its parent pointers).

pub mod ancestry;
pub mod path;
pub mod slug;
pub mod walker;

pub use ancestry::AncestryResolver;
pub use path::{Breadcrumb, Path, PathNode};
pub use walker::PathResolver;
