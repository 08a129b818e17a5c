//! Configuration commands.
//!
//! - `config set`: Set a configuration value
//! - `config show`: Display current configuration
//! - `config path`: Print the config file location

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn or_unset(value: Option<String>) -> String {
    value.unwrap_or_else(|| "not configured".dimmed().to_string())
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let token = config.api_token();

    let json_output = json!({
        "backend_url": config.backend_url(),
        "auth": {
            "token_configured": token.is_some(),
        },
        "request_timeout": config.request_timeout,
        "debounce_ms": config.debounce_ms,
        "page_size": config.page_size,
        "max_theme_filters": config.max_theme_filters,
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));
    text_output.push_str(&format!(
        "{}: {}\n",
        "backend_url".cyan(),
        or_unset(config.backend_url())
    ));
    text_output.push_str(&format!(
        "{}: {}\n",
        "auth.token".cyan(),
        or_unset(token.as_deref().map(mask_sensitive_value))
    ));
    text_output.push_str(&format!(
        "{}: {}s\n",
        "request_timeout".cyan(),
        config.request_timeout
    ));
    text_output.push_str(&format!("{}: {}ms\n", "debounce_ms".cyan(), config.debounce_ms));
    text_output.push_str(&format!("{}: {}\n", "page_size".cyan(), config.page_size));
    text_output.push_str(&format!(
        "{}: {}\n",
        "max_theme_filters".cyan(),
        config
            .max_theme_filters
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    ));
    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set_value(key, value)?;
    config.save()?;

    let shown = if key == "auth.token" {
        mask_sensitive_value(value)
    } else {
        value.to_string()
    };
    println!("Set {} = {}", key.cyan(), shown);
    Ok(())
}

/// Print the config file path
pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path().display());
    Ok(())
}
