//! Headless client of the list contract.
//!
//! Everything a list view needs apart from rendering: [`ListQueryManager`]
//! keeps the query state and rows, [`ApiClient`] talks to the server and
//! reports in-flight requests to a [`RequestTracker`], and the navigation
//! and pager helpers compute what the view shows.

pub mod api;
pub mod delete;
pub mod list_query;
pub mod navigation;
pub mod page_window;
pub mod tracker;

pub use api::{ApiClient, ApiError, ItemDeleter, ListFetcher, Session};
pub use delete::{DeleteOutcome, confirm_and_delete};
pub use list_query::{
    ListQueryConfig, ListQueryManager, ListQueryResult, ListQueryState, ListRequest,
    SEARCH_DEBOUNCE,
};
pub use navigation::{BACK_TO_LIST_PAGE_SIZE, RestoredNavigationState, back_to_list_state};
pub use page_window::PageSummary;
pub use tracker::{ApiStatus, RequestGuard, RequestTracker, Subscription};
