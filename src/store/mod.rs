//! Persistence layer: whole-document JSON caches.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{Document, DocumentStore, load_typed, save_typed};
