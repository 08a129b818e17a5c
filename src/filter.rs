//! Filter and sort state for a response feed.
//!
//! `FilterState` is plain data. Every setter reports whether it changed
//! anything so the controller can decide whether a new fetch generation is
//! needed. Only `page` may change without starting a new generation.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};

/// Number of responses requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Server-assigned theme identifier.
pub type ThemeId = String;

/// Demographic category to selected option values, in selection order.
pub type DemoFilters = BTreeMap<String, Vec<String>>;

/// How the backend interprets `search_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Keyword,
    Semantic,
}

enum_display_fromstr!(SearchMode, FeedError::InvalidSearchMode, {
    Keyword => "keyword", ["kw"];
    Semantic => "semantic";
});

/// Ordering applied by the backend to the theme list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSortKey {
    #[default]
    Frequency,
    Alphabetical,
}

enum_display_fromstr!(ThemeSortKey, FeedError::InvalidSortKey, {
    Frequency => "frequency", ["count", "mentions"];
    Alphabetical => "alphabetical", ["alpha", "title"];
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

enum_display_fromstr!(SortDirection, FeedError::InvalidSortDirection, {
    Ascending => "ascending", ["asc"];
    Descending => "descending", ["desc"];
});

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Insertion-ordered set of theme ids with an optional size bound.
///
/// When the bound is reached, adding a new id evicts the oldest one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeFilters {
    ids: VecDeque<ThemeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<usize>,
}

impl ThemeFilters {
    pub fn with_max(max: Option<usize>) -> Self {
        Self {
            ids: VecDeque::new(),
            max: max.filter(|m| *m > 0),
        }
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThemeId> {
        self.ids.iter()
    }

    /// Add an id. Returns the evicted id, if the bound forced one out.
    ///
    /// Adding an id that is already present leaves the set unchanged.
    pub fn insert(&mut self, id: ThemeId) -> Option<ThemeId> {
        if self.contains(&id) {
            return None;
        }
        let evicted = match self.max {
            Some(max) if self.ids.len() >= max => self.ids.pop_front(),
            _ => None,
        };
        self.ids.push_back(id);
        evicted
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    /// Replace the contents, applying the bound in order.
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ThemeId>,
    {
        self.ids.clear();
        for id in ids {
            self.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Complete filter, sort and paging state for one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    search_value: String,
    search_mode: SearchMode,
    theme_filters: ThemeFilters,
    demo_filters: DemoFilters,
    evidence_rich_only: bool,
    theme_sort_key: ThemeSortKey,
    theme_sort_direction: SortDirection,
    page: u32,
    page_size: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, None)
    }
}

impl FilterState {
    pub fn new(page_size: u32, max_theme_filters: Option<usize>) -> Self {
        Self {
            search_value: String::new(),
            search_mode: SearchMode::default(),
            theme_filters: ThemeFilters::with_max(max_theme_filters),
            demo_filters: BTreeMap::new(),
            evidence_rich_only: false,
            theme_sort_key: ThemeSortKey::default(),
            theme_sort_direction: SortDirection::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search_value(&self) -> &str {
        &self.search_value
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn theme_filters(&self) -> &ThemeFilters {
        &self.theme_filters
    }

    pub fn demo_filters(&self) -> &DemoFilters {
        &self.demo_filters
    }

    pub fn evidence_rich_only(&self) -> bool {
        self.evidence_rich_only
    }

    pub fn theme_sort_key(&self) -> ThemeSortKey {
        self.theme_sort_key
    }

    pub fn theme_sort_direction(&self) -> SortDirection {
        self.theme_sort_direction
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn set_search_value(&mut self, value: &str) -> bool {
        let trimmed = value.trim();
        if self.search_value == trimmed {
            return false;
        }
        self.search_value = trimmed.to_string();
        true
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) -> bool {
        replace_if_changed(&mut self.search_mode, mode)
    }

    pub fn set_theme_filters<I>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = ThemeId>,
    {
        let before = self.theme_filters.clone();
        self.theme_filters.replace(ids);
        self.theme_filters != before
    }

    pub fn add_theme_filter(&mut self, id: ThemeId) -> bool {
        if self.theme_filters.contains(&id) {
            return false;
        }
        self.theme_filters.insert(id);
        true
    }

    pub fn remove_theme_filter(&mut self, id: &str) -> bool {
        self.theme_filters.remove(id)
    }

    /// Replace all demographic selections. Repeated values keep their first
    /// position and empty selections are dropped.
    pub fn set_demo_filters(&mut self, filters: DemoFilters) -> bool {
        let cleaned: DemoFilters = filters
            .into_iter()
            .map(|(category, values)| {
                let mut unique: Vec<String> = Vec::with_capacity(values.len());
                for value in values {
                    if !unique.contains(&value) {
                        unique.push(value);
                    }
                }
                (category, unique)
            })
            .filter(|(_, values)| !values.is_empty())
            .collect();
        replace_if_changed(&mut self.demo_filters, cleaned)
    }

    /// Flip one option within a demographic category. A newly selected
    /// option goes after the existing ones.
    pub fn toggle_demo_filter(&mut self, category: &str, value: &str) {
        let values = self.demo_filters.entry(category.to_string()).or_default();
        match values.iter().position(|existing| existing == value) {
            Some(index) => {
                values.remove(index);
            }
            None => values.push(value.to_string()),
        }
        if values.is_empty() {
            self.demo_filters.remove(category);
        }
    }

    pub fn set_evidence_rich_only(&mut self, enabled: bool) -> bool {
        replace_if_changed(&mut self.evidence_rich_only, enabled)
    }

    pub fn set_theme_sort_key(&mut self, key: ThemeSortKey) -> bool {
        replace_if_changed(&mut self.theme_sort_key, key)
    }

    pub fn set_theme_sort_direction(&mut self, direction: SortDirection) -> bool {
        replace_if_changed(&mut self.theme_sort_direction, direction)
    }

    /// Drop every filter, keeping sort preferences and page size.
    pub fn clear_filters(&mut self) -> bool {
        let before = self.clone();
        self.search_value.clear();
        self.theme_filters.clear();
        self.demo_filters.clear();
        self.evidence_rich_only = false;
        *self != before
    }

    pub(crate) fn reset_page(&mut self) {
        self.page = 1;
    }

    pub(crate) fn advance_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Parse a `category:value` pair as given on the command line.
pub fn parse_demo_filter(s: &str) -> Result<(String, String)> {
    match s.split_once(':') {
        Some((category, value)) if !category.trim().is_empty() && !value.trim().is_empty() => {
            Ok((category.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(FeedError::InvalidDemoFilter(s.to_string())),
    }
}
