//! Build deduplication for assetmill.
//!
//! When several requests for the same artifact arrive together, only one of
//! them may run the pipeline. The registry maps each destination path to
//! the build currently producing it; later requests join that build and
//! receive its outcome instead of starting their own.
//!
//! # Design Rules
//!
//! 1. At most one entry exists per destination path at any instant.
//! 2. The entry is created synchronously, before the builder performs any
//!    I/O, so two near-simultaneous requests cannot both become builders.
//! 3. Every joiner receives a clone of the one outcome the builder reports.
//! 4. A builder that disappears without reporting removes its entry, and
//!    its joiners observe [`RegistryError::Abandoned`].
//!
//! # Backends
//!
//! All backends implement [`GenerationRegistry`]:
//!
//! - [`InMemoryRegistry`] -- mutex-guarded `HashMap` for a single process

pub mod claim;
pub mod error;
pub mod memory;
pub mod traits;

pub use claim::{claim_or_join, BuildGuard, Claim, Waiter};
pub use error::{RegistryError, RegistryResult};
pub use memory::InMemoryRegistry;
pub use traits::{GenerationRegistry, Slot};
