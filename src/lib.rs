#[macro_use]
mod macros;

pub mod accumulator;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod favourites;
pub mod filter;
pub mod orchestrator;
pub mod query;
pub mod table;
pub mod view;

pub use accumulator::{ResultAccumulator, accumulate};
pub use api::{
    HttpResponseSource, RespondentId, ResponsePage, ResponseRecord, ResponseSource, ThemeMapping,
};
pub use config::Config;
pub use controller::{FeedOptions, FeedSnapshot, ResponseFeedController};
pub use error::{FeedError, Result};
pub use favourites::{Favourites, FileStore, KeyValueStore, MemoryStore};
pub use filter::{
    DemoFilters, FilterState, SearchMode, SortDirection, ThemeFilters, ThemeSortKey,
};
pub use orchestrator::{FetchOrchestrator, FetchOutcome, FetchStatus, FetchTicket};
pub use query::{build_query, responses_path};
pub use table::{CellValue, SortKey, SortState, TableRow, sort_rows};
pub use view::{ActiveTab, LoadMoreAffordance, ThemeSummary};
