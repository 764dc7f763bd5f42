//! Google API access
//!
//! OAuth authorization plus a Sheets client whose worksheets implement the
//! tabular store contract.

pub mod auth;
pub mod models;
pub mod sheets;

pub use auth::AuthManager;
pub use sheets::{SheetsClient, Worksheet};

use log::info;

use crate::config::Config;
use crate::error::Result;

/// Authorize, open the configured spreadsheet and return its worksheet
pub async fn open_worksheet(config: &Config) -> Result<Worksheet> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("roster-cli/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let auth = AuthManager::new(
        http.clone(),
        config.client_file.clone(),
        config.token_file.clone(),
    );
    let token = auth.token().await?;

    let client = SheetsClient::new(http, token.access_token);
    let spreadsheet = client.open_by_name(&config.spreadsheet).await?;
    let worksheet = client.worksheet(&spreadsheet, &config.worksheet).await?;
    info!(
        "Using worksheet '{}' of '{}'",
        worksheet.title(),
        spreadsheet.name
    );

    Ok(worksheet)
}
