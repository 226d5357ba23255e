//! Ownership scoping of list requests.

use serde_json::Value;

use crate::domain::types::RecordId;
use crate::list::params::RawListParams;
use crate::list::pipeline::Filter;

/// Which records are eligible before pagination, search and sort apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewType {
    #[default]
    All,
    /// Records created by the owner.
    Own,
    /// Only the owner's own record.
    SelfOnly,
}

impl ViewType {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("own") => ViewType::Own,
            Some("self") => ViewType::SelfOnly,
            _ => ViewType::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewType::All => "all",
            ViewType::Own => "own",
            ViewType::SelfOnly => "self",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilter {
    /// Scoping predicate, `None` when every record is eligible.
    pub filter: Option<Filter>,
    /// Owner id from the request, when it was identifier-shaped.
    pub owner_id: Option<RecordId>,
}

/// Derives the ownership filter from `viewType` and `ownerId`.
///
/// A malformed owner id is ignored: the request is served unscoped.
pub fn build_view_filter(params: &RawListParams) -> ViewFilter {
    let owner_id = params
        .owner_id
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| match RecordId::parse(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                log::debug!("Ignoring malformed ownerId `{raw}`");
                None
            }
        });

    let filter = owner_id.and_then(|owner| {
        let owner = Value::String(owner.to_string());
        match ViewType::parse(params.view_type.as_deref()) {
            ViewType::Own => Some(Filter::eq("createdBy", owner)),
            ViewType::SelfOnly => Some(Filter::eq("_id", owner)),
            ViewType::All => None,
        }
    });

    ViewFilter { filter, owner_id }
}
