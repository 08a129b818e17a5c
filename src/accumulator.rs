//! Accumulation of fetched pages into one growing response list.

use std::sync::Arc;

use crate::api::{ResponsePage, ResponseRecord};

/// Append a page's records to an existing list, preserving arrival order.
///
/// Overlapping pages are not de-duplicated.
pub fn accumulate(
    mut existing: Vec<ResponseRecord>,
    new_records: impl IntoIterator<Item = ResponseRecord>,
) -> Vec<ResponseRecord> {
    existing.extend(new_records);
    existing
}

/// Response list and pagination state for the current filter generation.
#[derive(Debug, Clone)]
pub struct ResultAccumulator {
    records: Arc<Vec<ResponseRecord>>,
    has_more_pages: bool,
    filtered_total: u64,
    respondents_total: u64,
}

impl Default for ResultAccumulator {
    fn default() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            has_more_pages: true,
            filtered_total: 0,
            respondents_total: 0,
        }
    }
}

impl ResultAccumulator {
    /// Shared handle to the accumulated records.
    pub fn records(&self) -> Arc<Vec<ResponseRecord>> {
        Arc::clone(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    pub fn filtered_total(&self) -> u64 {
        self.filtered_total
    }

    pub fn respondents_total(&self) -> u64 {
        self.respondents_total
    }

    /// Start a new generation: empty list, more pages assumed.
    ///
    /// Totals are kept until the next page arrives so the last known counts
    /// stay visible while loading.
    pub fn reset(&mut self) {
        self.records = Arc::new(Vec::new());
        self.has_more_pages = true;
    }

    /// Append a page and record its totals and pagination flag.
    pub fn apply_page(&mut self, page: &mut ResponsePage) {
        let incoming = std::mem::take(&mut page.all_respondents);
        let records = Arc::make_mut(&mut self.records);
        let merged = accumulate(std::mem::take(records), incoming);
        *records = merged;

        self.has_more_pages = page.has_more_pages;
        self.filtered_total = page.filtered_total;
        self.respondents_total = page.respondents_total;
    }
}
