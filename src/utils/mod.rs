//! Storage backend and SYSCOHADA input checks

pub mod memory_storage;
pub mod validation;

pub use memory_storage::MemoryStorage;
pub use validation::*;
