//! Table discovery.
//!
//! The catalog keeps the source's enumeration order as is. Providers differ in
//! how they order schema entries and the export does not pretend otherwise by
//! sorting: the same file exported twice yields the same order, which is the
//! only guarantee offered.

use crate::domain::entities::TableDescriptor;
use crate::domain::errors::{ExportError, Result};
use crate::ports::data_source_port::TableDataSource;
use log::debug;

/// Lists the user tables of `source` whose name contains `filter_mask`.
///
/// The mask is matched case-insensitively; an empty mask keeps every user
/// table. Entries whose type marker is not `TABLE` (system tables, views,
/// linked tables) are dropped.
pub fn list_tables(
    source: &mut dyn TableDataSource,
    filter_mask: &str,
) -> Result<Vec<TableDescriptor>> {
    let entries = source.schema_entries().map_err(|e| {
        if e.is_run_fatal() {
            e
        } else {
            ExportError::CatalogError(e.to_string())
        }
    })?;
    let mask = filter_mask.to_lowercase();

    let tables: Vec<TableDescriptor> = entries
        .into_iter()
        .filter(|entry| {
            if !entry.is_user_table() {
                debug!("Ignoring {} entry {}", entry.table_type, entry.name);
                return false;
            }
            mask.is_empty() || entry.name.to_lowercase().contains(&mask)
        })
        .collect();
    Ok(tables)
}
