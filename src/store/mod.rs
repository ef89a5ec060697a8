//! Secondary-tier storage backends.
//!
//! ## Key Components
//! - [`SecondaryStore`]: append/load boundary the engine talks to.
//! - [`line_format`]: the `key:value;` record codec shared by all backends.
//! - [`FileStore`]: append-mode file, flushed after every record.
//! - [`MemoryStore`]: shared in-memory buffer with failure injection.

pub mod file;
pub mod line_format;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::SecondaryStore;
