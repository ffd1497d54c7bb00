//! Built-in stages used when a pipeline leaves a stage unconfigured.

pub mod filter;
pub mod finalize;
pub mod map;
pub mod reduce;
pub mod seed;

pub use filter::{AcceptAll, ExtensionPrefilter};
pub use finalize::{ContentFinalize, DefaultFinalize};
pub use map::{ContentMapper, ReadStream};
pub use reduce::DefaultReduce;
pub use seed::{SinkSeed, TextSeed};
