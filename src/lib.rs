//! # Access Table Exporter
//!
//! Exports every user table of a legacy Access database file into its own
//! delimited text file.
//!
//! The crate follows the **Hexagonal Architecture** (Ports and Adapters):
//! `domain` holds the pure rules, `ports` the traits the `application`
//! layer depends on, and `infrastructure` the adapters (ODBC, local files,
//! console, in-memory).

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;
