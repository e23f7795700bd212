//! Infrastructure layer: adapters implementing the ports.

pub mod console;
pub mod local_storage;
pub mod memory;
pub mod odbc;
