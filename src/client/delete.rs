//! Confirm-then-delete flow of a list row.

use std::future::Future;

use serde_json::Value;

use crate::client::api::{ItemDeleter, ListFetcher};
use crate::client::list_query::ListQueryManager;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent.
    Cancelled,
    /// The server confirmed and the list was refreshed.
    Deleted,
    /// The server answered without `success: true`; the list is unchanged.
    Rejected,
    /// The request failed; the failure has been logged.
    Failed,
}

/// Asks for confirmation, deletes `url` and refreshes the list on success.
///
/// Errors never propagate: they are logged and reported as
/// [`DeleteOutcome::Failed`].
pub async fn confirm_and_delete<D, F>(
    deleter: &D,
    list: &ListQueryManager<F>,
    url: &str,
    confirm: impl Future<Output = bool>,
) -> DeleteOutcome
where
    D: ItemDeleter,
    F: ListFetcher,
{
    if !confirm.await {
        return DeleteOutcome::Cancelled;
    }

    match deleter.delete_item(url).await {
        Ok(body) if body.get("success").and_then(Value::as_bool) == Some(true) => {
            list.fetch().await;
            list.clamp_to_last_page().await;
            DeleteOutcome::Deleted
        }
        Ok(body) => {
            log::warn!("Delete of {url} not confirmed by the server: {body}");
            DeleteOutcome::Rejected
        }
        Err(err) => {
            log::error!("Failed to delete {url}: {err}");
            DeleteOutcome::Failed
        }
    }
}
