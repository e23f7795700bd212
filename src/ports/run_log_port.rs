//! Port for the user-facing run log.

/// `RunLog` is the line-oriented log of a run.
///
/// Every line is recorded; lines with `echo` set are also shown on the
/// console. Writing must never fail the export, so the method returns nothing.
pub trait RunLog: Send + Sync {
    fn write(&self, line: &str, echo: bool);
}
