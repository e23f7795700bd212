//! Domain layer: plain data and pure rules, free of any I/O.

pub mod entities;
pub mod errors;
pub mod field_names;
pub mod output_path;
