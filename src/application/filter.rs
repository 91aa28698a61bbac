//! Predicate chain applied to fetched records before pagination.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::entities::Listable;
use crate::domain::error::DomainError;
use crate::domain::types::StatusKey;

/// Status predicate; `All` is the sentinel that disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S: StatusKey> StatusFilter<S> {
    pub fn matches(&self, status: S) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }

    /// Parse `all` or a status key.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        S::parse_key(value).map(StatusFilter::Only)
    }

    pub fn key(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.key(),
        }
    }
}

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Keep the order the API returned.
    #[default]
    AsFetched,
    Newest,
    Oldest,
    Title,
}

impl SortOrder {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "as_fetched" | "as-fetched" | "none" => Ok(SortOrder::AsFetched),
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "title" => Ok(SortOrder::Title),
            other => Err(DomainError::validation(
                "sort",
                format!("unknown sort `{other}` (expected as_fetched, newest, oldest or title)"),
            )),
        }
    }

    /// Stable sort in place.
    pub fn apply<T: Listable>(self, items: &mut [T]) {
        match self {
            SortOrder::AsFetched => {}
            SortOrder::Newest => items.sort_by_key(|item| std::cmp::Reverse(item.created_at())),
            SortOrder::Oldest => items.sort_by_key(|item| item.created_at()),
            SortOrder::Title => items.sort_by(compare_titles),
        }
    }
}

fn compare_titles<T: Listable>(left: &T, right: &T) -> Ordering {
    left.title()
        .to_lowercase()
        .cmp(&right.title().to_lowercase())
}

/// Ephemeral filter inputs of one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState<S> {
    pub search: String,
    pub status: StatusFilter<S>,
    pub category: Option<String>,
}

impl<S> Default for FilterState<S> {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            category: None,
        }
    }
}

impl<S: StatusKey> FilterState<S> {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.status != StatusFilter::All
            || self.category.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Conjunction of the search, status and category predicates.
    pub fn matches<T: Listable<Status = S>>(&self, item: &T) -> bool {
        self.matches_search(item) && self.status.matches(item.status()) && self.matches_category(item)
    }

    fn matches_search<T: Listable>(&self, item: &T) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        item.search_fields()
            .iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_category<T: Listable>(&self, item: &T) -> bool {
        match self.category.as_deref() {
            None | Some("") => true,
            Some(wanted) => item.category() == Some(wanted),
        }
    }
}

/// Subset of `items` matching `filter`, in original order.
pub fn filter_items<T: Listable>(items: &[T], filter: &FilterState<T::Status>) -> Vec<T> {
    items
        .iter()
        .filter(|item| filter.matches(*item))
        .cloned()
        .collect()
}
