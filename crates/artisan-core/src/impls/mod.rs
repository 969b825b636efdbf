//! In-memory implementations for development and tests.

mod memory_store;

pub use memory_store::MemoryStore;
