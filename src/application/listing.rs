//! List state reducer: filter inputs and page cursor in, visible rows out.

use std::num::NonZeroUsize;

use crate::domain::entities::Listable;
use crate::domain::types::StatusKey;

use super::filter::{FilterState, SortOrder, StatusFilter, filter_items};
use super::pagination::{effective_page, paginate, total_pages};

/// User input a list reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction<S> {
    SetSearch(String),
    SetStatus(StatusFilter<S>),
    SetCategory(Option<String>),
    SetSort(SortOrder),
    SetPage(usize),
    NextPage,
    PreviousPage,
    /// Clear all filters and return to the first page.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<S> {
    filter: FilterState<S>,
    sort: SortOrder,
    current_page: usize,
    page_size: NonZeroUsize,
}

impl<S: StatusKey> ListState<S> {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            filter: FilterState::default(),
            sort: SortOrder::default(),
            current_page: 1,
            page_size,
        }
    }

    pub fn filter(&self) -> &FilterState<S> {
        &self.filter
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Apply one action. Any change to filters or sort returns to page 1.
    pub fn reduce(&mut self, action: ListAction<S>) {
        match action {
            ListAction::SetSearch(search) => {
                if self.filter.search != search {
                    self.filter.search = search;
                    self.current_page = 1;
                }
            }
            ListAction::SetStatus(status) => {
                if self.filter.status != status {
                    self.filter.status = status;
                    self.current_page = 1;
                }
            }
            ListAction::SetCategory(category) => {
                let category = category.filter(|value| !value.is_empty());
                if self.filter.category != category {
                    self.filter.category = category;
                    self.current_page = 1;
                }
            }
            ListAction::SetSort(sort) => {
                if self.sort != sort {
                    self.sort = sort;
                    self.current_page = 1;
                }
            }
            ListAction::SetPage(page) => self.current_page = page.max(1),
            ListAction::NextPage => self.current_page = self.current_page.saturating_add(1),
            ListAction::PreviousPage => self.current_page = self.current_page.saturating_sub(1).max(1),
            ListAction::Reset => {
                self.filter = FilterState::default();
                self.sort = SortOrder::default();
                self.current_page = 1;
            }
        }
    }

    /// Return to the first page without touching filters, as after a reload.
    pub fn rewind(&mut self) {
        self.current_page = 1;
    }

    /// Derive the visible page from the full record set.
    pub fn view<T: Listable<Status = S>>(&self, items: &[T]) -> ListView<T> {
        self.view_scoped(items, |_| true)
    }

    /// Like [`ListState::view`], with an extra fixed predicate applied before the filters.
    pub fn view_scoped<T, P>(&self, items: &[T], scope: P) -> ListView<T>
    where
        T: Listable<Status = S>,
        P: Fn(&T) -> bool,
    {
        let scoped: Vec<T> = items.iter().filter(|item| scope(*item)).cloned().collect();
        let mut matching = filter_items(&scoped, &self.filter);
        self.sort.apply(&mut matching);

        let total_matches = matching.len();
        let total_pages = total_pages(total_matches, self.page_size);
        let current_page = effective_page(self.current_page, total_pages);
        let rows = paginate(&matching, current_page, self.page_size).to_vec();

        ListView {
            rows,
            current_page,
            total_pages,
            total_matches,
            total_items: scoped.len(),
            page_size: self.page_size.get(),
            filtered: self.filter.is_active(),
        }
    }
}

/// One rendered page of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView<T> {
    pub rows: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub total_items: usize,
    pub page_size: usize,
    /// Whether any filter narrowed the list; selects the empty-state wording.
    pub filtered: bool,
}

impl<T> ListView<T> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// 1-based index of the first row on this page, or 0 when empty.
    pub fn first_index(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            (self.current_page - 1) * self.page_size + 1
        }
    }
}
