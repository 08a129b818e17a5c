//! Response feed controller.
//!
//! One controller backs one question screen. It owns the filter state, the
//! accumulated responses and the derived view models, and publishes a
//! [`FeedSnapshot`] through a `watch` channel after every change.
//!
//! Filter setters restart the feed: the list is cleared, the page is reset to
//! 1, the in-flight request is cancelled and a debounced fetch is scheduled.
//! `load_more` fetches the next page of the current generation immediately.
//!
//! Setters spawn onto the ambient tokio runtime and must be called from
//! within one.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::accumulator::ResultAccumulator;
use crate::api::{DemographicAggregations, DemographicOptions, ResponseRecord, ResponseSource};
use crate::config::Config;
use crate::error::Result;
use crate::filter::{DemoFilters, FilterState, SearchMode, SortDirection, ThemeId, ThemeSortKey};
use crate::orchestrator::{FetchOrchestrator, FetchOutcome, FetchStatus, FetchTicket};
use crate::query::{build_query, responses_path};
use crate::view::{
    ActiveTab, LoadMoreAffordance, ThemeSummary, derive_demo_data, derive_demo_options,
    derive_themes,
};

/// Tuning for a controller instance.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub max_theme_filters: Option<usize>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl FeedOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            request_timeout: config.request_timeout(),
            page_size: config.page_size,
            max_theme_filters: config.max_theme_filters,
        }
    }
}

/// Everything a presentation layer needs to render the feed.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub filters: FilterState,
    pub responses: Arc<Vec<ResponseRecord>>,
    pub themes: Vec<ThemeSummary>,
    pub demo_data: DemographicAggregations,
    pub demo_options: DemographicOptions,
    pub filtered_total: u64,
    pub respondents_total: u64,
    pub status: FetchStatus,
    pub has_more_pages: bool,
    pub load_more: LoadMoreAffordance,
    pub active_tab: ActiveTab,
    pub last_error: Option<String>,
}

impl FeedSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

struct FeedState {
    filters: FilterState,
    results: ResultAccumulator,
    themes: Vec<ThemeSummary>,
    demo_data: DemographicAggregations,
    demo_options: DemographicOptions,
    status: FetchStatus,
    active_tab: ActiveTab,
    last_error: Option<String>,
}

impl FeedState {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            filters: self.filters.clone(),
            responses: self.results.records(),
            themes: self.themes.clone(),
            demo_data: self.demo_data.clone(),
            demo_options: self.demo_options.clone(),
            filtered_total: self.results.filtered_total(),
            respondents_total: self.results.respondents_total(),
            status: self.status,
            has_more_pages: self.results.has_more_pages(),
            load_more: LoadMoreAffordance::derive(self.results.has_more_pages(), self.status),
            active_tab: self.active_tab,
            last_error: self.last_error.clone(),
        }
    }
}

struct Inner {
    source: Arc<dyn ResponseSource>,
    path: String,
    orchestrator: FetchOrchestrator,
    state: Mutex<FeedState>,
    snapshot_tx: watch::Sender<FeedSnapshot>,
}

/// Paginated, debounced, cancellable response feed for one question.
#[derive(Clone)]
pub struct ResponseFeedController {
    inner: Arc<Inner>,
}

impl ResponseFeedController {
    pub fn new(
        source: Arc<dyn ResponseSource>,
        consultation_slug: &str,
        question_slug: &str,
        options: FeedOptions,
    ) -> Self {
        let state = FeedState {
            filters: FilterState::new(options.page_size, options.max_theme_filters),
            results: ResultAccumulator::default(),
            themes: Vec::new(),
            demo_data: BTreeMap::new(),
            demo_options: BTreeMap::new(),
            status: FetchStatus::Idle,
            active_tab: ActiveTab::default(),
            last_error: None,
        };
        let (snapshot_tx, _) = watch::channel(state.snapshot());

        Self {
            inner: Arc::new(Inner {
                source,
                path: responses_path(consultation_slug, question_slug),
                orchestrator: FetchOrchestrator::new(options.debounce, options.request_timeout),
                state: Mutex::new(state),
                snapshot_tx,
            }),
        }
    }

    /// Subscribe to snapshots. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Wait until no fetch is pending and return the settled snapshot.
    pub async fn wait_until_settled(&self) -> FeedSnapshot {
        let mut rx = self.subscribe();
        match rx.wait_for(|snapshot| !snapshot.is_loading()).await {
            Ok(snapshot) => (*snapshot).clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Restart the feed from page 1 without debouncing. Used on mount and
    /// to retry after an error.
    pub fn refresh(&self) {
        let ticket = {
            let mut state = self.inner.state.lock();
            self.inner.restart(&mut state)
        };
        self.spawn_fetch(ticket, false);
    }

    pub fn set_search_value(&self, value: &str) -> bool {
        self.update_filters(|filters| filters.set_search_value(value))
    }

    pub fn set_search_mode(&self, mode: SearchMode) -> bool {
        self.update_filters(|filters| filters.set_search_mode(mode))
    }

    pub fn set_demo_filters(&self, demo_filters: DemoFilters) -> bool {
        self.update_filters(|filters| filters.set_demo_filters(demo_filters))
    }

    pub fn toggle_demo_filter(&self, category: &str, value: &str) -> bool {
        self.update_filters(|filters| {
            filters.toggle_demo_filter(category, value);
            true
        })
    }

    /// Replace the theme filter set.
    pub fn update_theme_filters<I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = ThemeId>,
    {
        self.update_filters(|filters| filters.set_theme_filters(ids))
    }

    pub fn add_theme_filter(&self, id: ThemeId) -> bool {
        self.update_filters(|filters| filters.add_theme_filter(id))
    }

    pub fn remove_theme_filter(&self, id: &str) -> bool {
        self.update_filters(|filters| filters.remove_theme_filter(id))
    }

    pub fn set_evidence_rich(&self, enabled: bool) -> bool {
        self.update_filters(|filters| filters.set_evidence_rich_only(enabled))
    }

    pub fn set_sort_type(&self, key: ThemeSortKey) -> bool {
        self.update_filters(|filters| filters.set_theme_sort_key(key))
    }

    pub fn set_sort_direction(&self, direction: SortDirection) -> bool {
        self.update_filters(|filters| filters.set_theme_sort_direction(direction))
    }

    pub fn clear_filters(&self) -> bool {
        self.update_filters(FilterState::clear_filters)
    }

    /// Show only responses tagged with one theme and switch to the
    /// responses tab.
    pub fn focus_theme(&self, id: ThemeId) {
        let ticket = {
            let mut state = self.inner.state.lock();
            state.active_tab = ActiveTab::Responses;
            if state.filters.set_theme_filters(std::iter::once(id)) {
                Some(self.inner.restart(&mut state))
            } else {
                self.inner.publish(&state);
                None
            }
        };
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket, true);
        }
    }

    pub fn set_active_tab(&self, tab: ActiveTab) {
        let mut state = self.inner.state.lock();
        if state.active_tab != tab {
            state.active_tab = tab;
            self.inner.publish(&state);
        }
    }

    /// Fetch the next page of the current generation.
    ///
    /// Returns `false` without issuing a request when the feed is exhausted
    /// or a request is already loading.
    pub fn load_more(&self) -> bool {
        let ticket = {
            let mut state = self.inner.state.lock();
            if !state.results.has_more_pages() || state.status == FetchStatus::Loading {
                trace!(
                    has_more_pages = state.results.has_more_pages(),
                    status = %state.status,
                    "load more ignored"
                );
                return false;
            }
            state.status = FetchStatus::Loading;
            state.last_error = None;
            let ticket = self.inner.orchestrator.begin();
            self.inner.publish(&state);
            ticket
        };
        self.spawn_fetch(ticket, false);
        true
    }

    /// Cancel any pending or in-flight request. The feed keeps its data.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        self.inner.orchestrator.cancel_active();
        if state.status == FetchStatus::Loading {
            state.status = FetchStatus::Idle;
            self.inner.publish(&state);
        }
    }

    fn update_filters<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut FilterState) -> bool,
    {
        let ticket = {
            let mut state = self.inner.state.lock();
            if !mutate(&mut state.filters) {
                return false;
            }
            self.inner.restart(&mut state)
        };
        self.spawn_fetch(ticket, true);
        true
    }

    fn spawn_fetch(&self, ticket: FetchTicket, debounced: bool) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.execute(ticket, debounced).await;
        });
    }
}

impl Inner {
    /// Start a new generation. Caller holds the state lock.
    fn restart(&self, state: &mut FeedState) -> FetchTicket {
        state.filters.reset_page();
        state.results.reset();
        state.status = FetchStatus::Loading;
        state.last_error = None;
        let ticket = self.orchestrator.begin();
        self.publish(state);
        ticket
    }

    fn publish(&self, state: &FeedState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    async fn execute(&self, ticket: FetchTicket, debounced: bool) {
        if debounced && !self.orchestrator.debounce(&ticket).await {
            trace!(generation = ticket.generation(), "debounced fetch superseded");
            return;
        }

        let query = {
            let state = self.state.lock();
            if !self.orchestrator.is_current(ticket.generation()) {
                return;
            }
            build_query(&state.filters)
        };

        debug!(
            path = %self.path,
            query = %query,
            generation = ticket.generation(),
            "fetching responses page"
        );

        match self
            .orchestrator
            .run(&ticket, self.source.as_ref(), &self.path, &query)
            .await
        {
            FetchOutcome::Cancelled => {
                trace!(generation = ticket.generation(), "fetch cancelled");
            }
            FetchOutcome::Completed(result) => self.apply(&ticket, result),
        }
    }

    fn apply(&self, ticket: &FetchTicket, result: Result<crate::api::ResponsePage>) {
        let mut state = self.state.lock();
        if !self.orchestrator.is_current(ticket.generation()) {
            trace!(
                generation = ticket.generation(),
                current = self.orchestrator.current_generation(),
                "discarding stale response"
            );
            return;
        }

        match result {
            Ok(mut page) => {
                state.themes = derive_themes(&page);
                state.demo_data = derive_demo_data(&page);
                state.demo_options = derive_demo_options(&page);
                state.results.apply_page(&mut page);
                state.filters.advance_page();
                state.status = FetchStatus::Idle;
                state.last_error = None;
                debug!(
                    accumulated = state.results.len(),
                    has_more_pages = state.results.has_more_pages(),
                    "responses page applied"
                );
            }
            Err(e) => {
                warn!(path = %self.path, "failed to fetch responses: {e}");
                state.status = FetchStatus::Error;
                state.last_error = Some(e.to_string());
            }
        }

        self.orchestrator.finish(ticket);
        self.publish(&state);
    }
}
