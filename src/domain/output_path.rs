//! Output file naming.

use crate::domain::entities::FileNameCase;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Extension of every exported file.
pub const OUTPUT_EXTENSION: &str = "txt";

/// Builds `{dir}/{table}[_{yyyy-MM-dd}].txt`.
///
/// The case rule touches the table-name segment only. Path separators inside
/// a table name are replaced with `_` so the file always lands directly in
/// `output_dir`. `created` is ignored unless `append_date` is set.
pub fn resolve(
    table: &str,
    output_dir: &Path,
    case: FileNameCase,
    append_date: bool,
    created: Option<NaiveDate>,
) -> PathBuf {
    let segment: String = table
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let segment = match case {
        FileNameCase::None => segment,
        FileNameCase::Lower => segment.to_lowercase(),
        FileNameCase::Upper => segment.to_uppercase(),
    };

    let file_name = match (append_date, created) {
        (true, Some(date)) => {
            format!("{}_{}.{}", segment, date.format("%Y-%m-%d"), OUTPUT_EXTENSION)
        }
        _ => format!("{}.{}", segment, OUTPUT_EXTENSION),
    };
    output_dir.join(file_name)
}
