//! Runtime configuration
//!
//! Values come from the process environment. `main` loads a `.env` file from
//! the working directory first, and command-line flags override the
//! spreadsheet and worksheet names afterwards.

use log::debug;
use std::path::PathBuf;

pub const CLIENT_FILE_VAR: &str = "GOOGLE_CLIENT_FILE";
pub const TOKEN_FILE_VAR: &str = "ROSTER_TOKEN_FILE";
pub const SPREADSHEET_VAR: &str = "ROSTER_SPREADSHEET";
pub const WORKSHEET_VAR: &str = "ROSTER_WORKSHEET";

pub const DEFAULT_SPREADSHEET: &str = "Student2";
pub const DEFAULT_WORKSHEET: &str = "Sheet1";

#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth client JSON downloaded from the Google Cloud console
    pub client_file: Option<PathBuf>,
    /// Cached credential, reused across runs
    pub token_file: PathBuf,
    pub spreadsheet: String,
    pub worksheet: String,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        debug!("Configuration: {:?}", config);
        config
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            client_file: get(CLIENT_FILE_VAR).map(PathBuf::from),
            token_file: get(TOKEN_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(default_token_file),
            spreadsheet: get(SPREADSHEET_VAR).unwrap_or_else(|| DEFAULT_SPREADSHEET.to_string()),
            worksheet: get(WORKSHEET_VAR).unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
        }
    }
}

/// Load a `.env` file from the working directory into the process
/// environment. Returns its path when one was found.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Default token cache location (~/.config/roster-cli/token.json)
fn default_token_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roster-cli")
        .join("token.json")
}
