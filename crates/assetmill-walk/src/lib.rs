//! Source tree walking for assetmill.
//!
//! Artifacts are generated from an ordered list of root paths, each of which
//! may be a single file or a directory. This crate turns such a list into a
//! lazy, depth-first stream of files and answers the question every request
//! starts with: is the artifact older than any of its sources?
//!
//! # Traversal Order
//!
//! Roots are visited in the order given. A directory is never yielded
//! itself; its children (sorted by name) are spliced in ahead of whatever
//! was queued after it, so the walk is pre-order and depth-first:
//!
//! ```text
//! roots = [lib/, main.js]          lib/ = [a.js, ext/b.js]
//! yields  lib/a.js, lib/ext/b.js, main.js
//! ```
//!
//! # Walkers
//!
//! - [`SubpathWalker`] -- exclusive walker; `next` takes `&mut self` so a
//!   second advance cannot be started while one is pending.
//! - [`SharedWalker`] -- cloneable handle for callers that cannot hold a
//!   unique borrow; overlapping advances fail fast with [`WalkError::Busy`].

pub mod error;
pub mod path;
pub mod staleness;
pub mod walker;

pub use error::{WalkError, WalkResult};
pub use staleness::{is_stale, AcceptAll, SourcePredicate};
pub use walker::{Advance, SharedWalker, SubpathWalker, WalkEntry};
