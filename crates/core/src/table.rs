//! The table pipeline: sort, then paginate.
//!
//! [`visible_rows`] is a pure function of the full record collection and the
//! two view parameters. Callers recompute it whenever any input changes.

use crate::types::{CustomerRecord, PageSpec, SortSpec};

/// Compute the rows visible on the current page.
///
/// The input slice is never reordered: sorting happens on a copy. Sorting is
/// stable, so rows that compare equal keep their input order, and an inactive
/// [`SortSpec`] leaves the order untouched. The page slice may be shorter than
/// the page size on the last page, or empty past the end.
#[must_use]
pub fn visible_rows(
    records: &[CustomerRecord],
    sort: &SortSpec,
    page: &PageSpec,
) -> Vec<CustomerRecord> {
    let mut ordered: Vec<&CustomerRecord> = records.iter().collect();
    if sort.active().is_some() {
        ordered.sort_by(|a, b| sort.compare(a, b));
    }

    ordered
        .into_iter()
        .skip(page.offset())
        .take(page.size())
        .cloned()
        .collect()
}
