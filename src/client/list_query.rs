//! Query state of a paginated, searchable, sortable list view.
//!
//! [`ListQueryManager`] owns the page position, page size, sort and search of
//! one list view and keeps its rows in sync with the server. Every effective
//! change of the query triggers exactly one fetch; search input is debounced
//! and only the newest fetch may publish a result.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::api::ListFetcher;
use crate::client::navigation::RestoredNavigationState;
use crate::domain::types::RecordId;
use crate::list::{DEFAULT_PAGE_SIZE, DEFAULT_SORT_FIELD, SortOrder, ViewType};

/// Quiet period after the last keystroke before a search is committed.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQueryState {
    pub page_index: usize,
    /// Always greater than zero.
    pub page_size: usize,
    /// Committed search term; differs from the raw input while debouncing.
    pub search: String,
    /// Empty means the server default (`createdAt`).
    pub sort_field: String,
    pub sort_descending: bool,
}

impl ListQueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: if page_size > 0 {
                page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
            search: String::new(),
            sort_field: String::new(),
            sort_descending: true,
        }
    }
}

/// Latest rows of the list. A failed fetch keeps the previous rows and count
/// and only raises `is_error`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQueryResult {
    pub rows: Vec<Value>,
    pub total_count: usize,
    pub is_error: bool,
}

/// Query parameters of one list request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    pub page: usize,
    pub per_page: usize,
    pub search: String,
    pub sort_field: String,
    pub sort_order: SortOrder,
    pub view_type: ViewType,
    pub owner_id: Option<RecordId>,
}

impl ListRequest {
    pub fn from_state(state: &ListQueryState, owner_id: Option<RecordId>) -> Self {
        let sort_field = if state.sort_field.is_empty() {
            DEFAULT_SORT_FIELD.to_string()
        } else {
            state.sort_field.clone()
        };
        Self {
            page: state.page_index,
            per_page: state.page_size,
            search: state.search.clone(),
            sort_field,
            sort_order: SortOrder::from_descending(state.sort_descending),
            view_type: ViewType::All,
            owner_id,
        }
    }

    /// Pairs in the order they appear on the query string.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("search", self.search.clone()),
            ("sortField", self.sort_field.clone()),
            ("sortOrder", self.sort_order.as_str().to_string()),
            ("viewType", self.view_type.as_str().to_string()),
            (
                "ownerId",
                self.owner_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct ListQueryConfig {
    /// Path of the list endpoint, e.g. `/user/getusers`.
    pub endpoint: String,
    pub default_page_size: usize,
    /// Signed-in user, sent as `ownerId`.
    pub owner_id: Option<RecordId>,
}

impl ListQueryConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            default_page_size: DEFAULT_PAGE_SIZE,
            owner_id: None,
        }
    }
}

struct Inner {
    state: ListQueryState,
    search_input: String,
    /// Until navigation state has been consulted, changes do not fetch.
    restoring: bool,
    issued_seq: u64,
    in_flight: Option<CancellationToken>,
    loading: bool,
    debounce: Option<JoinHandle<()>>,
}

struct Shared<F> {
    fetcher: F,
    config: ListQueryConfig,
    inner: Mutex<Inner>,
    results: watch::Sender<ListQueryResult>,
    shutdown: CancellationToken,
}

impl<F: ListFetcher> Shared<F> {
    /// Applies `change` and reports whether a fetch is due.
    fn apply(&self, change: impl FnOnce(&mut ListQueryState) -> bool) -> bool {
        let mut inner = self.inner.lock();
        let changed = change(&mut inner.state);
        changed && !inner.restoring && !self.shutdown.is_cancelled()
    }

    fn commit_search(&self, value: String) -> bool {
        self.apply(|state| {
            let changed = state.search != value || state.page_index != 0;
            state.search = value;
            state.page_index = 0;
            changed
        })
    }

    async fn fetch(&self) {
        let (seq, token, request) = {
            let mut inner = self.inner.lock();
            if self.shutdown.is_cancelled() {
                return;
            }
            if inner.restoring {
                log::debug!("List fetch skipped until navigation state is restored");
                return;
            }
            if let Some(previous) = inner.in_flight.take() {
                previous.cancel();
            }
            inner.issued_seq += 1;
            let token = self.shutdown.child_token();
            inner.in_flight = Some(token.clone());
            inner.loading = true;
            (
                inner.issued_seq,
                token,
                ListRequest::from_state(&inner.state, self.config.owner_id),
            )
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => {
                log::debug!("List fetch #{seq} cancelled");
                return;
            }
            outcome = self.fetcher.fetch_list(&self.config.endpoint, &request) => outcome,
        };

        let mut inner = self.inner.lock();
        if inner.issued_seq != seq || self.shutdown.is_cancelled() {
            log::debug!("Discarding stale list response #{seq}");
            return;
        }
        inner.in_flight = None;
        inner.loading = false;

        match outcome {
            Ok(page) => {
                self.results.send_replace(ListQueryResult {
                    rows: page.data,
                    total_count: page.total_row_count,
                    is_error: false,
                });
            }
            Err(err) => {
                log::error!("List fetch failed: {err}");
                self.results.send_modify(|result| result.is_error = true);
            }
        }
    }
}

/// Query-state manager of one list view.
///
/// Created in the restoring phase: call [`Self::restore_from_navigation`]
/// once the navigation state is known; that issues the first fetch.
/// Dropping the manager (or [`Self::shutdown`]) cancels the pending search
/// commit and any in-flight fetch.
pub struct ListQueryManager<F: ListFetcher> {
    shared: Arc<Shared<F>>,
}

impl<F: ListFetcher> ListQueryManager<F> {
    pub fn new(fetcher: F, config: ListQueryConfig) -> Self {
        let (results, _) = watch::channel(ListQueryResult::default());
        let inner = Inner {
            state: ListQueryState::new(config.default_page_size),
            search_input: String::new(),
            restoring: true,
            issued_seq: 0,
            in_flight: None,
            loading: false,
            debounce: None,
        };
        Self {
            shared: Arc::new(Shared {
                fetcher,
                config,
                inner: Mutex::new(inner),
                results,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn state(&self) -> ListQueryState {
        self.shared.inner.lock().state.clone()
    }

    /// Raw search box content, committed to the state after the debounce.
    pub fn search_input(&self) -> String {
        self.shared.inner.lock().search_input.clone()
    }

    pub fn result(&self) -> ListQueryResult {
        self.shared.results.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListQueryResult> {
        self.shared.results.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.inner.lock().loading
    }

    pub fn is_restoring(&self) -> bool {
        self.shared.inner.lock().restoring
    }

    pub async fn set_page(&self, page_index: usize) {
        let due = self.shared.apply(|state| {
            let changed = state.page_index != page_index;
            state.page_index = page_index;
            changed
        });
        if due {
            self.shared.fetch().await;
        }
    }

    /// Changes the page size and returns to the first page.
    pub async fn set_page_size(&self, page_size: usize) {
        if page_size == 0 {
            log::warn!("Ignoring page size of zero");
            return;
        }
        let due = self.shared.apply(|state| {
            if state.page_size == page_size {
                return false;
            }
            state.page_size = page_size;
            state.page_index = 0;
            true
        });
        if due {
            self.shared.fetch().await;
        }
    }

    /// Changes the sort and returns to the first page.
    pub async fn set_sort(&self, field: impl Into<String>, descending: bool) {
        let field = field.into();
        let due = self.shared.apply(|state| {
            if state.sort_field == field && state.sort_descending == descending {
                return false;
            }
            state.sort_field = field;
            state.sort_descending = descending;
            state.page_index = 0;
            true
        });
        if due {
            self.shared.fetch().await;
        }
    }

    /// Records a keystroke in the search box.
    ///
    /// The value is committed [`SEARCH_DEBOUNCE`] after the last call, which
    /// resets the page index and fetches. Must be called within a Tokio
    /// runtime.
    pub fn set_search_input(&self, text: impl Into<String>) {
        let text = text.into();
        let mut inner = self.shared.inner.lock();
        inner.search_input = text.clone();
        if let Some(pending) = inner.debounce.take() {
            pending.abort();
        }
        if self.shared.shutdown.is_cancelled() {
            return;
        }

        let shared: Weak<Shared<F>> = Arc::downgrade(&self.shared);
        inner.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            if shared.commit_search(text.trim().to_string()) {
                // Detached so a later keystroke aborting this timer cannot
                // abort the fetch halfway.
                tokio::spawn(async move { shared.fetch().await });
            }
        }));
    }

    /// Empties the search box and the committed search immediately.
    pub async fn clear_search(&self) {
        {
            let mut inner = self.shared.inner.lock();
            inner.search_input.clear();
            if let Some(pending) = inner.debounce.take() {
                pending.abort();
            }
        }
        if self.shared.commit_search(String::new()) {
            self.shared.fetch().await;
        }
    }

    /// Ends the restoring phase, applying `candidate` when it holds a page
    /// position, and issues the first fetch.
    ///
    /// Only the first call has an effect.
    pub async fn restore_from_navigation(&self, candidate: Option<&Value>) {
        {
            let mut inner = self.shared.inner.lock();
            if !inner.restoring {
                log::debug!("Navigation state already consumed");
                return;
            }
            if let Some(restored) = candidate.and_then(|candidate| {
                RestoredNavigationState::from_candidate(
                    candidate,
                    self.shared.config.default_page_size,
                )
            }) {
                inner.state.page_index = restored.page_index;
                inner.state.page_size = restored.page_size;
            }
            inner.restoring = false;
        }
        self.shared.fetch().await;
    }

    /// Fetches the current query again. Does nothing while restoring.
    pub async fn fetch(&self) {
        self.shared.fetch().await;
    }

    /// Moves back to the last page when the known total no longer reaches the
    /// current one, e.g. after deleting the only row of the last page.
    pub async fn clamp_to_last_page(&self) {
        let total_count = self.shared.results.borrow().total_count;
        let last_page = {
            let inner = self.shared.inner.lock();
            total_count.saturating_sub(1) / inner.state.page_size
        };
        let due = self.shared.apply(|state| {
            if state.page_index <= last_page {
                return false;
            }
            state.page_index = last_page;
            true
        });
        if due {
            self.shared.fetch().await;
        }
    }

    /// Stops the debounce timer and cancels any in-flight fetch. Nothing is
    /// fetched afterwards.
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
        let mut inner = self.shared.inner.lock();
        if let Some(pending) = inner.debounce.take() {
            pending.abort();
        }
        inner.in_flight = None;
        inner.loading = false;
    }
}

impl<F: ListFetcher> Drop for ListQueryManager<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_sort_field_and_order() {
        let state = ListQueryState::new(10);
        let request = ListRequest::from_state(&state, None);
        assert_eq!(
            request.query_pairs(),
            vec![
                ("page", "0".to_string()),
                ("per_page", "10".to_string()),
                ("search", String::new()),
                ("sortField", "createdAt".to_string()),
                ("sortOrder", "desc".to_string()),
                ("viewType", "all".to_string()),
                ("ownerId", String::new()),
            ]
        );
    }

    #[test]
    fn request_carries_owner_and_sort() {
        let owner = RecordId::generate();
        let mut state = ListQueryState::new(0);
        state.sort_field = "fullname".to_string();
        state.sort_descending = false;
        state.page_index = 3;

        let request = ListRequest::from_state(&state, Some(owner));
        assert_eq!(request.per_page, DEFAULT_PAGE_SIZE);
        assert_eq!(request.sort_order, SortOrder::Ascending);
        assert_eq!(request.page, 3);
        assert_eq!(request.owner_id, Some(owner));
    }
}
