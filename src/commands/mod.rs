//! Command implementations for the CLI.

mod config;
mod favourite;
mod responses;
mod themes;

pub use config::{cmd_config_path, cmd_config_set, cmd_config_show};
pub use favourite::{cmd_favourite_ls, cmd_favourite_toggle};
pub use responses::cmd_responses;
pub use themes::cmd_themes;

use std::sync::Arc;

use serde_json::Value;

use crate::api::HttpResponseSource;
use crate::cli::{FilterArgs, OutputOptions};
use crate::config::Config;
use crate::controller::{FeedOptions, FeedSnapshot, ResponseFeedController};
use crate::error::{FeedError, Result};
use crate::filter::{DemoFilters, SearchMode};
use crate::orchestrator::FetchStatus;

/// Output produced by a command, printed as JSON or text.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        if output.json || self.text.is_none() {
            println!("{}", serde_json::to_string_pretty(&self.json)?);
        } else if let Some(text) = self.text {
            println!("{text}");
        }
        Ok(())
    }
}

/// How many pages a command should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Pages(u32),
    All,
}

impl PageLimit {
    fn allows(&self, loaded: u32) -> bool {
        match self {
            PageLimit::Pages(n) => loaded < *n,
            PageLimit::All => true,
        }
    }
}

/// Build a controller against the configured backend.
pub fn build_controller(
    config: &Config,
    consultation: &str,
    question: &str,
) -> Result<ResponseFeedController> {
    let source = HttpResponseSource::from_config(config)?;
    Ok(ResponseFeedController::new(
        Arc::new(source),
        consultation,
        question,
        FeedOptions::from_config(config),
    ))
}

/// Apply command-line filters to a controller.
pub fn apply_filters(controller: &ResponseFeedController, filters: &FilterArgs) {
    if let Some(search) = &filters.search {
        controller.set_search_value(search);
    }
    if filters.semantic {
        controller.set_search_mode(SearchMode::Semantic);
    }
    if !filters.themes.is_empty() {
        controller.update_theme_filters(filters.themes.iter().cloned());
    }
    if !filters.demo.is_empty() {
        let mut demo = DemoFilters::new();
        for (category, value) in &filters.demo {
            demo.entry(category.clone()).or_default().push(value.clone());
        }
        controller.set_demo_filters(demo);
    }
    if filters.evidence_rich {
        controller.set_evidence_rich(true);
    }
    if let Some(key) = filters.sort {
        controller.set_sort_type(key);
    }
    if let Some(direction) = filters.direction {
        controller.set_sort_direction(direction);
    }
}

/// Apply filters, fetch from page 1 and keep loading until the limit or the
/// end of the feed.
///
/// A failure on the first page is an error. A failure on a later page keeps
/// the pages already loaded: the returned snapshot has status `Error` and
/// callers report it with [`feed_error`] after printing what they have.
pub async fn load_feed(
    controller: &ResponseFeedController,
    filters: &FilterArgs,
    limit: PageLimit,
) -> Result<FeedSnapshot> {
    apply_filters(controller, filters);
    controller.refresh();

    let mut loaded = 0;
    loop {
        let snapshot = controller.wait_until_settled().await;
        if snapshot.status == FetchStatus::Error {
            if loaded == 0 {
                return Err(feed_error(&snapshot).unwrap_or_else(|| {
                    FeedError::Other("failed to load responses".to_string())
                }));
            }
            return Ok(snapshot);
        }
        loaded += 1;
        if !snapshot.has_more_pages || !limit.allows(loaded) || !controller.load_more() {
            return Ok(snapshot);
        }
    }
}

/// The error a settled snapshot ended with, if any.
pub fn feed_error(snapshot: &FeedSnapshot) -> Option<FeedError> {
    (snapshot.status == FetchStatus::Error).then(|| {
        FeedError::Other(
            snapshot
                .last_error
                .clone()
                .unwrap_or_else(|| "failed to load responses".to_string()),
        )
    })
}

/// Shorten text to at most `max` characters, marking the cut.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
