//! Pager figures derived from a page index and a total count.

use serde::Serialize;

/// Page counts up to this many are listed in full, without gaps.
const FULL_WINDOW: usize = 7;

/// Pages shown on each side of the current one in a windowed pager.
const NEIGHBOURS: usize = 1;

/// Zero-based page buttons for `total_pages > FULL_WINDOW`: the first and last
/// page, the current page and its neighbours, `None` for each gap.
fn windowed_pages(total_pages: usize, current: usize) -> Vec<Option<usize>> {
    let last = total_pages.saturating_sub(1);
    let current = current.min(last);
    let low = current.saturating_sub(NEIGHBOURS).max(1);
    let high = current.saturating_add(NEIGHBOURS).min(last.saturating_sub(1));

    let mut pages = vec![Some(0)];
    if low > 1 {
        pages.push(None);
    }
    pages.extend((low..=high).map(Some));
    if high + 1 < last {
        pages.push(None);
    }
    pages.push(Some(last));
    pages
}

/// "Showing x to y of z" plus the page buttons of a list view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    /// Never less than one, even for an empty list.
    pub total_pages: usize,
    /// One-based number of the first row shown, 0 when the page has no rows.
    pub start_record: usize,
    pub end_record: usize,
    pub total_count: usize,
    /// Zero-based page indices to render as buttons, `None` for an ellipsis.
    pub pages: Vec<Option<usize>>,
}

impl PageSummary {
    pub fn new(page_index: usize, page_size: usize, total_count: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_count.div_ceil(page_size).max(1);

        let first_row = page_index.saturating_mul(page_size);
        // A page past the end (e.g. after deleting its last row) shows nothing.
        let (start_record, end_record) = if first_row >= total_count {
            (0, 0)
        } else {
            (
                first_row + 1,
                first_row.saturating_add(page_size).min(total_count),
            )
        };

        let pages = if total_pages <= FULL_WINDOW {
            (0..total_pages).map(Some).collect()
        } else {
            windowed_pages(total_pages, page_index)
        };

        Self {
            total_pages,
            start_record,
            end_record,
            total_count,
            pages,
        }
    }
}
