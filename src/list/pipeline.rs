//! Store-agnostic aggregation pipelines.
//!
//! A pipeline is an ordered list of stages in the spirit of a document
//! database aggregation: filter, sort, window, count. Stores decide how to run
//! it; see [`crate::repository::DieselRepository`] for the SQLite compiler.

use serde_json::Value;

use crate::list::params::SortOrder;

/// Predicate over the fields of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the given scalar; `Value::Null` matches missing fields.
    Eq { field: String, value: Value },
    /// Field is present (`true`) or absent (`false`).
    Exists { field: String, exists: bool },
    /// Case-insensitive substring match.
    Contains { field: String, needle: String },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        Filter::Exists {
            field: field.into(),
            exists,
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    /// Conjunction that collapses to the single filter when only one is given.
    pub fn all(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::And(filters)
        }
    }
}

/// Matches `term` as a case-insensitive substring of any of `fields`.
///
/// Returns `None` for a blank term so callers can skip the stage entirely.
pub fn search_filter(fields: &[&str], term: &str) -> Option<Filter> {
    let term = term.trim();
    if term.is_empty() || fields.is_empty() {
        return None;
    }
    Some(Filter::Or(
        fields
            .iter()
            .map(|field| Filter::contains(*field, term))
            .collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Sort(SortSpec),
    Skip(usize),
    Limit(usize),
    /// Replaces the documents with a single `{name: count}` document, or with
    /// nothing when no document matched.
    Count(String),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "match",
            Stage::Sort(_) => "sort",
            Stage::Skip(_) => "skip",
            Stage::Limit(_) => "limit",
            Stage::Count(_) => "count",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn push(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn match_filter(self, filter: Filter) -> Self {
        self.push(Stage::Match(filter))
    }

    pub fn sort(self, field: impl Into<String>, order: SortOrder) -> Self {
        self.push(Stage::Sort(SortSpec {
            field: field.into(),
            order,
        }))
    }

    pub fn skip(self, count: usize) -> Self {
        self.push(Stage::Skip(count))
    }

    pub fn limit(self, count: usize) -> Self {
        self.push(Stage::Limit(count))
    }

    pub fn count(self, name: impl Into<String>) -> Self {
        self.push(Stage::Count(name.into()))
    }
}
