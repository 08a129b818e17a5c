use clap::Parser;
use std::process::ExitCode;

use consult_feed::cli::{Cli, Commands, ConfigAction, FavouriteAction, OutputOptions};
use consult_feed::commands::{
    PageLimit, cmd_config_path, cmd_config_set, cmd_config_show, cmd_favourite_ls,
    cmd_favourite_toggle, cmd_responses, cmd_themes,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Responses {
            consultation,
            question,
            filters,
            pages,
            all,
            json,
        } => {
            let limit = if all {
                PageLimit::All
            } else {
                PageLimit::Pages(pages.max(1))
            };
            cmd_responses(
                &consultation,
                &question,
                &filters,
                limit,
                OutputOptions { json },
            )
            .await
        }
        Commands::Themes {
            consultation,
            question,
            filters,
            sort_by,
            json,
        } => {
            cmd_themes(
                &consultation,
                &question,
                &filters,
                &sort_by,
                OutputOptions { json },
            )
            .await
        }
        Commands::Favourite(action) => match action {
            FavouriteAction::Toggle { question, json } => {
                cmd_favourite_toggle(&question, OutputOptions { json })
            }
            FavouriteAction::Ls { json } => cmd_favourite_ls(OutputOptions { json }),
        },
        Commands::Config(action) => match action {
            ConfigAction::Show { json } => cmd_config_show(OutputOptions { json }),
            ConfigAction::Set { key, value } => cmd_config_set(&key, &value),
            ConfigAction::Path => cmd_config_path(),
        },
        Commands::Completions { shell } => {
            consult_feed::cli::generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
