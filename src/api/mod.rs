//! Backend API types and the response source seam.
//!
//! The controller only talks to a [`ResponseSource`]. The production
//! implementation is [`HttpResponseSource`]; tests substitute scripted fakes.

pub mod http;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

pub use http::HttpResponseSource;

/// Respondent identifier. The backend sends either strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(transparent)]
pub struct RespondentId(String);

impl RespondentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RespondentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for RespondentId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => RespondentId(s),
            Raw::Number(n) => RespondentId(n.to_string()),
        })
    }
}

/// Theme attached to a single response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTheme {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

/// One respondent's answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub identifier: RespondentId,
    #[serde(default)]
    pub free_text_answer_text: String,
    #[serde(default)]
    pub themes: Vec<ResponseTheme>,
    #[serde(default)]
    pub multiple_choice_answer: Vec<String>,
    #[serde(default)]
    pub demographic_data: BTreeMap<String, serde_json::Value>,
    #[serde(default, alias = "evidenceRich")]
    pub evidence_rich: bool,
}

/// Theme metadata for the current filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeMapping {
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub count: u64,
}

/// Category to option to respondent count.
pub type DemographicAggregations = BTreeMap<String, BTreeMap<String, u64>>;

/// Category to the options available for filtering.
pub type DemographicOptions = BTreeMap<String, Vec<String>>;

/// One page of the responses endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResponsePage {
    #[serde(default)]
    pub all_respondents: Vec<ResponseRecord>,
    #[serde(default)]
    pub respondents_total: u64,
    #[serde(default)]
    pub filtered_total: u64,
    #[serde(default)]
    pub theme_mappings: Vec<ThemeMapping>,
    #[serde(default)]
    pub demographic_aggregations: DemographicAggregations,
    #[serde(default)]
    pub demographic_options: DemographicOptions,
    #[serde(default)]
    pub has_more_pages: bool,
}

/// Anything that can serve pages of the responses endpoint.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    /// Fetch one page. `path` is the endpoint path, `query` the encoded
    /// query string without the leading `?`.
    async fn fetch_page(&self, path: &str, query: &str) -> Result<ResponsePage>;
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RespondentId::deserialize(deserializer).map(|id| id.0)
}
