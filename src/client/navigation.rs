//! Pagination state carried across navigation.
//!
//! A detail view receives the list's page position in its navigation state
//! and hands it back when the user returns, so the list reopens on the same
//! page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page size assumed when returning to a list whose state did not carry one.
pub const BACK_TO_LIST_PAGE_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoredNavigationState {
    pub page_index: usize,
    pub page_size: usize,
}

fn as_count(value: Option<&Value>) -> Option<usize> {
    value
        .and_then(Value::as_u64)
        .and_then(|count| usize::try_from(count).ok())
}

impl RestoredNavigationState {
    /// Reads `{pageIndex, pageSize}` from a navigation state value.
    ///
    /// `pageIndex` must be a non-negative integer or nothing is restored.
    /// The state may also be wrapped in a `usr` object, as browser history
    /// entries are. A missing or zero `pageSize` falls back to
    /// `default_page_size`.
    pub fn from_candidate(candidate: &Value, default_page_size: usize) -> Option<Self> {
        let state = match candidate.get("pageIndex") {
            Some(_) => candidate,
            None => candidate.get("usr")?,
        };
        let page_index = as_count(state.get("pageIndex"))?;
        let page_size = as_count(state.get("pageSize"))
            .filter(|size| *size > 0)
            .unwrap_or(default_page_size);
        Some(Self {
            page_index,
            page_size,
        })
    }
}

/// State to hand back to the list when leaving a detail view.
///
/// Candidates are tried in order (typically the navigation state, then the
/// history entry); without a usable one the list opens on its first page.
pub fn back_to_list_state(candidates: &[Option<&Value>]) -> RestoredNavigationState {
    candidates
        .iter()
        .flatten()
        .find_map(|candidate| {
            RestoredNavigationState::from_candidate(candidate, BACK_TO_LIST_PAGE_SIZE)
        })
        .unwrap_or(RestoredNavigationState {
            page_index: 0,
            page_size: BACK_TO_LIST_PAGE_SIZE,
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requires_numeric_page_index() {
        assert_eq!(
            RestoredNavigationState::from_candidate(&json!({"pageIndex": "2"}), 10),
            None
        );
        assert_eq!(
            RestoredNavigationState::from_candidate(&json!({"pageIndex": -1}), 10),
            None
        );
        assert_eq!(
            RestoredNavigationState::from_candidate(&json!({"pageIndex": 3}), 10),
            Some(RestoredNavigationState {
                page_index: 3,
                page_size: 10
            })
        );
    }

    #[test]
    fn reads_history_wrapped_state() {
        let state = json!({"usr": {"pageIndex": 1, "pageSize": 25}});
        assert_eq!(
            RestoredNavigationState::from_candidate(&state, 10),
            Some(RestoredNavigationState {
                page_index: 1,
                page_size: 25
            })
        );
    }

    #[test]
    fn back_to_list_prefers_first_usable_candidate() {
        let location = json!({"from": "detail"});
        let history = json!({"pageIndex": 4});
        assert_eq!(
            back_to_list_state(&[Some(&location), Some(&history)]),
            RestoredNavigationState {
                page_index: 4,
                page_size: 8
            }
        );
        assert_eq!(
            back_to_list_state(&[None]),
            RestoredNavigationState {
                page_index: 0,
                page_size: 8
            }
        );
    }
}
