use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::str::FromStr;

use crate::filter::{SortDirection, ThemeSortKey, parse_demo_filter};

#[derive(Parser)]
#[command(name = "consult-feed")]
#[command(about = "Browse consultation responses and their themes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options shared by commands
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

/// Filters applied to the response feed
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Use semantic rather than keyword search
    #[arg(long)]
    pub semantic: bool,

    /// Theme id to filter by (repeatable)
    #[arg(short = 't', long = "theme")]
    pub themes: Vec<String>,

    /// Demographic filter as category:value (repeatable)
    #[arg(short = 'd', long = "demo", value_parser = parse_demo)]
    pub demo: Vec<(String, String)>,

    /// Only evidence-rich responses
    #[arg(long)]
    pub evidence_rich: bool,

    /// Theme ordering: frequency, alphabetical
    #[arg(long, value_parser = parse_sort_key)]
    pub sort: Option<ThemeSortKey>,

    /// Theme ordering direction: ascending, descending
    #[arg(long, value_parser = parse_direction)]
    pub direction: Option<SortDirection>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List responses to a question
    #[command(visible_alias = "r")]
    Responses {
        /// Consultation slug
        consultation: String,

        /// Question slug
        question: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Number of pages to load (default: 1)
        #[arg(short, long, default_value_t = 1, conflicts_with = "all")]
        pages: u32,

        /// Load every page
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the theme breakdown for a question
    Themes {
        /// Consultation slug
        consultation: String,

        /// Question slug
        question: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Column to sort by: id, theme, mentions. Repeat to add keys;
        /// repeating the leading column flips its direction.
        #[arg(long = "sort-by")]
        sort_by: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage favourite questions
    #[command(subcommand)]
    Favourite(FavouriteAction),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigAction),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum FavouriteAction {
    /// Add or remove a question from favourites
    Toggle {
        /// Question identifier
        question: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List favourite questions
    Ls {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a configuration value
    Set {
        /// Key: backend_url, auth.token, request_timeout, debounce_ms, page_size, max_theme_filters
        key: String,

        /// Value to set
        value: String,
    },

    /// Print the config file path
    Path,
}

fn parse_demo(s: &str) -> Result<(String, String), String> {
    parse_demo_filter(s).map_err(|e| e.to_string())
}

fn parse_sort_key(s: &str) -> Result<ThemeSortKey, String> {
    ThemeSortKey::from_str(s).map_err(|e| e.to_string())
}

fn parse_direction(s: &str) -> Result<SortDirection, String> {
    SortDirection::from_str(s).map_err(|e| e.to_string())
}

/// Write shell completions to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "consult-feed", &mut io::stdout());
}
