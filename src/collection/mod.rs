//! Pure view-model over the prospect list: filtering, ordering, and the
//! derived stats the list header shows. No I/O; recomputed on read.

pub mod selection;

use std::cmp::Ordering;

use crate::prospects::types::{Prospect, ProspectStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    ContactEmail,
    Status,
    CreatedUtc,
}

impl SortField {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(SortField::Name),
            "contactEmail" => Some(SortField::ContactEmail),
            "status" => Some(SortField::Status),
            "createdUtc" => Some(SortField::CreatedUtc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::CreatedUtc,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Parse a `"field-direction"` option value, e.g. `"name-asc"`.
    pub fn parse(value: &str) -> Option<Self> {
        let (field, direction) = value.split_once('-')?;
        let field = SortField::parse(field)?;
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return None,
        };
        Some(Self { field, direction })
    }
}

/// One entry of the sort dropdown.
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub field: SortField,
    pub direction: SortDirection,
}

pub const SORT_OPTIONS: [SortOption; 8] = [
    SortOption {
        value: "name-asc",
        label: "Company name (A-Z)",
        field: SortField::Name,
        direction: SortDirection::Asc,
    },
    SortOption {
        value: "name-desc",
        label: "Company name (Z-A)",
        field: SortField::Name,
        direction: SortDirection::Desc,
    },
    SortOption {
        value: "status-asc",
        label: "Status (ascending)",
        field: SortField::Status,
        direction: SortDirection::Asc,
    },
    SortOption {
        value: "status-desc",
        label: "Status (descending)",
        field: SortField::Status,
        direction: SortDirection::Desc,
    },
    SortOption {
        value: "contactEmail-asc",
        label: "Contact email (A-Z)",
        field: SortField::ContactEmail,
        direction: SortDirection::Asc,
    },
    SortOption {
        value: "contactEmail-desc",
        label: "Contact email (Z-A)",
        field: SortField::ContactEmail,
        direction: SortDirection::Desc,
    },
    SortOption {
        value: "createdUtc-desc",
        label: "Newest first",
        field: SortField::CreatedUtc,
        direction: SortDirection::Desc,
    },
    SortOption {
        value: "createdUtc-asc",
        label: "Oldest first",
        field: SortField::CreatedUtc,
        direction: SortDirection::Asc,
    },
];

/// Predicate configuration for the list. Stages compose as logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Case-insensitive substring matched against the name and every
    /// email/website sub-field.
    pub search: String,
    /// Exact status match; `None` means any.
    pub status: Option<ProspectStatus>,
    /// Tri-state: `None` = any, `Some(true)` = must have an email address,
    /// `Some(false)` = must have none.
    pub has_email: Option<bool>,
    /// Tri-state over the same underlying condition as `has_email` (email
    /// presence), kept independently settable until business intent for
    /// other contact methods is settled.
    pub has_contact: Option<bool>,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.status.is_some()
            || self.has_email.is_some()
            || self.has_contact.is_some()
    }

    fn matches(&self, prospect: &Prospect) -> bool {
        let query = self.search.trim().to_lowercase();
        if !query.is_empty() && !matches_search(prospect, &query) {
            return false;
        }

        if let Some(status) = self.status {
            if prospect.status != status {
                return false;
            }
        }

        if let Some(want) = self.has_email {
            if prospect.has_email() != want {
                return false;
            }
        }

        if let Some(want) = self.has_contact {
            if prospect.has_email() != want {
                return false;
            }
        }

        true
    }
}

fn matches_search(prospect: &Prospect, query: &str) -> bool {
    if prospect.name.to_lowercase().contains(query) {
        return true;
    }
    if prospect.email_addresses.iter().any(|e| {
        e.address
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(query))
    }) {
        return true;
    }
    prospect.websites.iter().any(|w| {
        w.url
            .as_deref()
            .is_some_and(|u| u.to_lowercase().contains(query))
    })
}

/// Typed comparator per sort field. String fields compare case-insensitive;
/// a missing contact email sorts as the empty string.
fn comparator(field: SortField) -> fn(&Prospect, &Prospect) -> Ordering {
    match field {
        SortField::Name => |a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::ContactEmail => |a, b| {
            let a = a.primary_email().unwrap_or("").to_lowercase();
            let b = b.primary_email().unwrap_or("").to_lowercase();
            a.cmp(&b)
        },
        SortField::Status => |a, b| a.status.cmp(&b.status),
        SortField::CreatedUtc => |a, b| a.created_utc.cmp(&b.created_utc),
    }
}

/// Stable sort by the selected field; descending flips the comparator.
pub fn sort_prospects(mut prospects: Vec<Prospect>, sort: &SortState) -> Vec<Prospect> {
    let compare = comparator(sort.field);
    prospects.sort_by(|a, b| {
        let ordering = compare(a, b);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    prospects
}

/// Derived counters for the list header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub filtered: usize,
    pub is_filtered: bool,
    pub showing: usize,
}

/// Filter and sort state for one prospect list view.
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    pub filters: FilterState,
    pub sort: SortState,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source entries passing every filter stage, in source order.
    pub fn filtered(&self, source: &[Prospect]) -> Vec<Prospect> {
        source
            .iter()
            .filter(|p| self.filters.matches(p))
            .cloned()
            .collect()
    }

    /// The displayed list: filtered, then sorted.
    pub fn visible(&self, source: &[Prospect]) -> Vec<Prospect> {
        sort_prospects(self.filtered(source), &self.sort)
    }

    pub fn stats(&self, source: &[Prospect]) -> FilterStats {
        let filtered = self.filtered(source).len();
        FilterStats {
            total: source.len(),
            filtered,
            is_filtered: self.filters.is_active(),
            showing: filtered,
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filters.search = search.into();
    }

    pub fn set_status_filter(&mut self, status: Option<ProspectStatus>) {
        self.filters.status = status;
    }

    pub fn set_has_email_filter(&mut self, has_email: Option<bool>) {
        self.filters.has_email = has_email;
    }

    pub fn set_has_contact_filter(&mut self, has_contact: Option<bool>) {
        self.filters.has_contact = has_contact;
    }

    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.sort = SortState { field, direction };
    }

    /// Apply a `"field-direction"` dropdown value. Unknown values are
    /// ignored.
    pub fn set_sort_by_value(&mut self, value: &str) {
        if let Some(sort) = SortState::parse(value) {
            self.sort = sort;
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters = FilterState::default();
    }

    pub fn reset_sort(&mut self) {
        self.sort = SortState::default();
    }

    pub fn clear_all(&mut self) {
        self.clear_filters();
        self.reset_sort();
    }
}
