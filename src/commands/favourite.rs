use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::error::Result;
use crate::favourites::{Favourites, FileStore};

/// Add or remove a question from favourites
pub fn cmd_favourite_toggle(question: &str, output: OutputOptions) -> Result<()> {
    let store = FileStore::default_location()?;
    let mut favourites = Favourites::load(&store)?;
    let now_favourite = favourites.toggle(question)?;

    let text = if now_favourite {
        format!("Added {} to favourites", question.cyan())
    } else {
        format!("Removed {} from favourites", question.cyan())
    };

    CommandOutput::new(json!({
        "action": "favourite_toggle",
        "question": question,
        "favourite": now_favourite,
    }))
    .with_text(text)
    .print(output)
}

/// List favourite questions
pub fn cmd_favourite_ls(output: OutputOptions) -> Result<()> {
    let store = FileStore::default_location()?;
    let favourites = Favourites::load(&store)?;

    let text = if favourites.list().is_empty() {
        "No favourite questions".dimmed().to_string()
    } else {
        favourites.list().join("\n")
    };

    CommandOutput::new(json!(favourites.list()))
        .with_text(text)
        .print(output)
}
