//! In-memory data source adapter backing the engine tests.

pub mod memory_source;
