//! Error taxonomy for roster operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RosterError>;

#[derive(Debug, Error)]
pub enum RosterError {
    /// The OAuth client file could not be found. Fatal for the session.
    #[error("Client file '{}' not found. Check GOOGLE_CLIENT_FILE in your .env settings.", .0.display())]
    MissingClientConfig(PathBuf),

    #[error("Invalid client configuration: {0}")]
    ClientConfig(String),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Spreadsheet '{0}' not found")]
    SpreadsheetNotFound(String),

    /// The remote service answered with a non-success status
    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Student {0} not found")]
    NotFound(String),

    #[error("Worksheet header has no '{0}' column")]
    MissingColumn(String),

    #[error("Worksheet has no header row")]
    MissingHeader,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
