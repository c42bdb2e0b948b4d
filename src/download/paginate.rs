//! Generic cursor-following pagination over cached snapshots.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::types::Paged;
use crate::error::Result;
use crate::store::{LogicalKey, SnapshotStore};

/// Fetch or load every page of a category and merge the items in page order.
///
/// Page `n` is cached under `<category>/<category>_<n>`; the fetch closure
/// receives the previous page's cursor (absent for page 0). The loop stops
/// when a page's more-available predicate is false or the accumulator has
/// reached `limit` (unbounded by default).
///
/// The returned sequence is never truncated to `limit` — a page is always
/// merged whole, and consumers stop emitting once they have processed `limit`
/// items. No deduplication happens here; duplicates across pages are the
/// remote's to produce and the consumer's to tolerate.
pub fn paginate<P, F>(
    store: &SnapshotStore,
    category: &str,
    limit: Option<usize>,
    update: bool,
    fetch_page: F,
) -> Result<Vec<P::Item>>
where
    P: Paged + Serialize + DeserializeOwned,
    F: Fn(Option<&str>) -> Result<P>,
{
    let limit = limit.unwrap_or(usize::MAX);
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page = 0usize;

    loop {
        let key = LogicalKey::page(category, page)?;
        let cursor_arg = cursor.as_deref();
        let payload: P = store.fetch_or_load(&key, update, || fetch_page(cursor_arg))?;

        let more = payload.more_available();
        cursor = payload.next_cursor().map(str::to_owned);
        items.extend(payload.into_items());

        tracing::debug!(category, page, merged = items.len(), more, "page merged");

        if !more || items.len() >= limit {
            break;
        }
        page += 1;
    }

    Ok(items)
}
