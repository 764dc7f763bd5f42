//! Command-line interface definitions

pub mod handlers;
pub mod output;

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

pub use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "roster",
    version,
    about = "Manage a student roster stored in a Google Sheets worksheet"
)]
pub struct Cli {
    /// Spreadsheet name (overrides ROSTER_SPREADSHEET)
    #[arg(long, global = true)]
    pub spreadsheet: Option<String>,

    /// Worksheet title (overrides ROSTER_WORKSHEET)
    #[arg(long, global = true)]
    pub worksheet: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a single student
    Add(AddArgs),

    /// Add students from `Name,Email,Grade,Notes` lines
    AddBatch {
        /// Read lines from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List all students
    List {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Look up a student by ID
    Search {
        id: String,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Overwrite fields of an existing student
    Update(UpdateArgs),

    /// Delete a student by ID
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive menu (default)
    Menu,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub grade: String,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Use this ID instead of assigning the next free one
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub grade: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}
