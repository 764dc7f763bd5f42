mod api;
mod cli;
mod config;
mod error;
mod menu;
mod roster;
mod store;

use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use log::debug;
use std::process::ExitCode;

use cli::{Cli, Command, handlers, output};
use config::Config;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let dotenv = config::load_dotenv();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_logging(cli.verbose);
    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(spreadsheet) = cli.spreadsheet {
        config.spreadsheet = spreadsheet;
    }
    if let Some(worksheet) = cli.worksheet {
        config.worksheet = worksheet;
    }

    let worksheet = api::open_worksheet(&config).await?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Add(args) => {
            handlers::handle_add(&worksheet, args).await?;
        }
        Command::AddBatch { file } => {
            handlers::handle_add_batch(&worksheet, file.as_deref()).await?;
        }
        Command::List { format } => {
            handlers::handle_list(&worksheet, format).await?;
        }
        Command::Search { id, format } => {
            handlers::handle_search(&worksheet, &id, format).await?;
        }
        Command::Update(args) => {
            handlers::handle_update(&worksheet, args).await?;
        }
        Command::Delete { id, yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("Delete student {}?", id))
                    .default(false)
                    .interact()?;
            if confirmed {
                handlers::handle_delete(&worksheet, &id).await?;
            } else {
                output::warning("Aborted");
            }
        }
        Command::Menu => menu::run_menu(&worksheet).await?,
    }

    Ok(())
}
