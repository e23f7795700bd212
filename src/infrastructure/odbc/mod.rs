//! ODBC access to Access database files.
//!
//! The adapter itself needs a driver manager at link time and is only built
//! with the `odbc` feature.

#[cfg(feature = "odbc")]
pub mod access_adapter;
pub mod value_text;
