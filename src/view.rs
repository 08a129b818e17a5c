//! View models derived from the latest server payload.
//!
//! Derivations here are pure. Actions that follow from user interaction with
//! a derived item (such as focusing a theme) live on the controller.

use serde::Serialize;

use crate::api::{DemographicAggregations, DemographicOptions, ResponsePage, ThemeMapping};
use crate::filter::ThemeId;
use crate::orchestrator::FetchStatus;

/// A theme as shown in the theme list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeSummary {
    pub id: ThemeId,
    pub title: String,
    pub description: String,
    pub mention_count: u64,
}

impl From<&ThemeMapping> for ThemeSummary {
    fn from(mapping: &ThemeMapping) -> Self {
        Self {
            id: mapping.value.clone(),
            title: mapping.label.clone(),
            description: mapping.description.clone(),
            mention_count: mapping.count,
        }
    }
}

/// Map the payload's theme metadata 1:1, keeping server order.
pub fn derive_themes(page: &ResponsePage) -> Vec<ThemeSummary> {
    page.theme_mappings.iter().map(ThemeSummary::from).collect()
}

pub fn derive_demo_data(page: &ResponsePage) -> DemographicAggregations {
    page.demographic_aggregations.clone()
}

pub fn derive_demo_options(page: &ResponsePage) -> DemographicOptions {
    page.demographic_options.clone()
}

/// State of the "load more" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadMoreAffordance {
    pub visible: bool,
    pub enabled: bool,
}

impl LoadMoreAffordance {
    pub fn derive(has_more_pages: bool, status: FetchStatus) -> Self {
        Self {
            visible: has_more_pages,
            enabled: status != FetchStatus::Loading,
        }
    }
}

/// Which tab of the question detail screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveTab {
    #[default]
    QuestionSummary,
    Responses,
}

enum_display!(ActiveTab, {
    QuestionSummary => "question-summary",
    Responses => "responses",
});
