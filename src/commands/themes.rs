use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{CommandOutput, PageLimit, build_controller, load_feed, truncate};
use crate::cli::{FilterArgs, OutputOptions};
use crate::config::Config;
use crate::error::{FeedError, Result};
use crate::table::{CellValue, SortState, TableRow, sort_rows};
use crate::view::ThemeSummary;

const DESCRIPTION_WIDTH: usize = 60;

/// Columns that `--sort-by` accepts.
const SORT_COLUMNS: &[&str] = &["id", "theme", "mentions"];

#[derive(Tabled)]
struct ThemeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Theme")]
    theme: String,
    #[tabled(rename = "Mentions")]
    mentions: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Build table rows for the theme list plus a pinned total row.
fn theme_rows(themes: &[ThemeSummary], filtered_total: u64) -> Vec<TableRow> {
    let mut rows: Vec<TableRow> = themes
        .iter()
        .map(|theme| {
            TableRow::new()
                .cell("id", theme.id.as_str())
                .cell("theme", theme.title.as_str())
                .cell("mentions", theme.mention_count)
                .cell("description", theme.description.as_str())
        })
        .collect();

    rows.push(
        TableRow::new()
            .cell("id", CellValue::Other(serde_json::Value::Null))
            .cell("theme", "All matching responses")
            .cell("mentions", filtered_total)
            .cell("description", "")
            .pinned(),
    );
    rows
}

fn sort_state_from_clicks(clicks: &[String]) -> Result<SortState> {
    let mut state = SortState::default();
    for column in clicks {
        let column = column.trim().to_lowercase();
        if !SORT_COLUMNS.contains(&column.as_str()) {
            return Err(FeedError::Other(format!(
                "cannot sort by '{column}', expected one of: {}",
                SORT_COLUMNS.join(", ")
            )));
        }
        state.click(&column);
    }
    Ok(state)
}

fn cell_text(row: &TableRow, column: &str) -> String {
    row.get(column).map(CellValue::display).unwrap_or_default()
}

/// Show the theme breakdown for a question
pub async fn cmd_themes(
    consultation: &str,
    question: &str,
    filters: &FilterArgs,
    sort_by: &[String],
    output: OutputOptions,
) -> Result<()> {
    let sort_state = sort_state_from_clicks(sort_by)?;

    let config = Config::load()?;
    let controller = build_controller(&config, consultation, question)?;
    let snapshot = load_feed(&controller, filters, PageLimit::Pages(1)).await?;

    let rows = sort_rows(
        &theme_rows(&snapshot.themes, snapshot.filtered_total),
        &sort_state,
    );

    let json_output = json!({
        "consultation": consultation,
        "question": question,
        "filtered_total": snapshot.filtered_total,
        "sort": sort_state.keys(),
        "themes": rows
            .iter()
            .filter(|row| !row.pinned_bottom)
            .map(|row| json!({
                "id": cell_text(row, "id"),
                "title": cell_text(row, "theme"),
                "mention_count": row.get("mentions"),
                "description": cell_text(row, "description"),
            }))
            .collect::<Vec<_>>(),
        "demographics": snapshot.demo_data,
    });

    let table_rows: Vec<ThemeRow> = rows
        .iter()
        .map(|row| ThemeRow {
            id: cell_text(row, "id"),
            theme: cell_text(row, "theme"),
            mentions: cell_text(row, "mentions"),
            description: truncate(&cell_text(row, "description"), DESCRIPTION_WIDTH),
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());

    CommandOutput::new(json_output)
        .with_text(table.to_string())
        .print(output)
}
