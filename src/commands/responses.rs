use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{CommandOutput, PageLimit, build_controller, feed_error, load_feed, truncate};
use crate::cli::{FilterArgs, OutputOptions};
use crate::config::Config;
use crate::error::Result;

const ANSWER_WIDTH: usize = 80;

/// A row in the responses table
#[derive(Tabled)]
struct ResponseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Answer")]
    answer: String,
    #[tabled(rename = "Themes")]
    themes: String,
    #[tabled(rename = "Evidence")]
    evidence: String,
}

/// List responses to a question
pub async fn cmd_responses(
    consultation: &str,
    question: &str,
    filters: &FilterArgs,
    limit: PageLimit,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let controller = build_controller(&config, consultation, question)?;
    let snapshot = load_feed(&controller, filters, limit).await?;

    let json_output = json!({
        "consultation": consultation,
        "question": question,
        "query": crate::query::build_query(&snapshot.filters),
        "respondents_total": snapshot.respondents_total,
        "filtered_total": snapshot.filtered_total,
        "has_more_pages": snapshot.has_more_pages,
        "error": snapshot.last_error,
        "responses": snapshot.responses.as_ref(),
    });

    let mut text_output = String::new();
    if snapshot.responses.is_empty() {
        text_output.push_str("No matching responses found.");
    } else {
        let rows: Vec<ResponseRow> = snapshot
            .responses
            .iter()
            .map(|record| ResponseRow {
                id: record.identifier.to_string(),
                answer: truncate(&record.free_text_answer_text, ANSWER_WIDTH),
                themes: record
                    .themes
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                evidence: if record.evidence_rich {
                    "yes".to_string()
                } else {
                    String::new()
                },
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        text_output.push_str(&table.to_string());
    }

    text_output.push_str(&format!(
        "\n{}",
        format!(
            "Showing {} of {} matching responses ({} total)",
            snapshot.responses.len(),
            snapshot.filtered_total,
            snapshot.respondents_total
        )
        .dimmed()
    ));
    if snapshot.has_more_pages {
        text_output.push_str(&format!(
            "\n{}",
            "More pages available: use --pages or --all".cyan()
        ));
    }

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)?;

    // Pages loaded before a failure are printed above; the failure still
    // fails the command.
    match feed_error(&snapshot) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
