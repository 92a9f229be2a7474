// # Built-in Backends
//
// Implementations of the collaborator traits that ship with the core.
//
// - `MemoryBackend`: in-process, not persistent. Used by tests and for
//   dry runs.
// - `FileBackend`: a JSON sandbox file with atomic writes, for exercising
//   the full create/remove/status flow without a cloud account.
//
// Both follow the provider rules: one call per invocation, no retries, no
// background work.

pub mod file;
pub mod memory;

pub use file::{FileBackend, FileBackendFactory};
pub use memory::{MemoryBackend, MemoryBackendFactory};

use crate::error::{BackendError, BackendResult};
use crate::name::names_match;
use crate::types::{AliasRecord, ChangeAction, Page, PageRequest, RecordChange};

/// Error code for a marker the backend did not issue
const INVALID_PAGINATION_TOKEN: &str = "InvalidPaginationToken";

/// Cut one page out of `items`
///
/// Markers are item offsets rendered as strings.
pub(crate) fn page_of<T: Clone>(
    items: &[T],
    request: &PageRequest,
    page_size: usize,
) -> BackendResult<Page<T>> {
    let start = match request.marker.as_deref() {
        None => 0,
        Some(marker) => marker.parse::<usize>().map_err(|_| {
            BackendError::new(
                INVALID_PAGINATION_TOKEN,
                format!("unknown pagination marker: {}", marker),
            )
        })?,
    };
    let size = page_size.min(request.max_items).max(1);
    let end = start.saturating_add(size).min(items.len());
    let slice = items.get(start..end).unwrap_or_default().to_vec();

    if end < items.len() {
        Ok(Page::more(slice, end.to_string()))
    } else {
        Ok(Page::last(slice))
    }
}

/// Apply one record change to a zone's alias records
///
/// Upserts replace the record with the same name or append a new one.
/// Deletes require an exact content match.
pub(crate) fn apply_change(
    records: &mut Vec<AliasRecord>,
    change: &RecordChange,
) -> BackendResult<()> {
    let position = records
        .iter()
        .position(|existing| names_match(&existing.name, &change.record.name));

    match change.action {
        ChangeAction::Upsert => {
            match position {
                Some(index) => records[index] = change.record.clone(),
                None => records.push(change.record.clone()),
            }
            Ok(())
        }
        ChangeAction::Delete => match position {
            Some(index) if same_content(&records[index], &change.record) => {
                records.remove(index);
                Ok(())
            }
            _ => Err(BackendError::new(
                BackendError::INVALID_CHANGE_BATCH,
                format!(
                    "Tried to delete resource record set [name='{}', type='{}'] but the values provided do not match the current values",
                    change.record.name, change.record_type
                ),
            )),
        },
    }
}

fn same_content(a: &AliasRecord, b: &AliasRecord) -> bool {
    names_match(&a.name, &b.name)
        && names_match(&a.target_dns_name, &b.target_dns_name)
        && a.target_hosted_zone_id == b.target_hosted_zone_id
        && a.evaluate_target_health == b.evaluate_target_health
}
