//! Google OAuth authorization
//!
//! Uses the installed-application flow: a loopback listener on an
//! OS-assigned port receives the redirect carrying the authorization code.
//! The resulting credential is cached as JSON and refreshed when it expires.

use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::models::{ClientSecrets, TokenErrorResponse, TokenInfo, TokenResponse};
use crate::error::{Result, RosterError};

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const SUCCESS_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

pub struct AuthManager {
    http: reqwest::Client,
    client_file: Option<PathBuf>,
    token_file: PathBuf,
}

impl AuthManager {
    pub fn new(http: reqwest::Client, client_file: Option<PathBuf>, token_file: PathBuf) -> Self {
        Self {
            http,
            client_file,
            token_file,
        }
    }

    /// Return a valid credential, refreshing or re-authorizing as needed
    pub async fn token(&self) -> Result<TokenInfo> {
        if let Some(cached) = load_token(&self.token_file) {
            if !cached.is_expired(Utc::now()) {
                debug!("Using cached token from {}", self.token_file.display());
                return Ok(cached);
            }

            if cached.refresh_token.is_some() {
                match self.refresh(&cached).await {
                    Ok(token) => {
                        save_token(&self.token_file, &token)?;
                        return Ok(token);
                    }
                    Err(e) => warn!("Token refresh failed, re-authorizing: {}", e),
                }
            }
        }

        let secrets = self.client_secrets()?;
        let token = self.authorize(&secrets).await?;
        save_token(&self.token_file, &token)?;
        Ok(token)
    }

    fn client_secrets(&self) -> Result<ClientSecrets> {
        let path = self
            .client_file
            .clone()
            .ok_or_else(|| RosterError::MissingClientConfig(PathBuf::from("<unset>")))?;
        ClientSecrets::load(&path)
    }

    async fn refresh(&self, token: &TokenInfo) -> Result<TokenInfo> {
        let secrets = token.secrets();
        let refresh_token = token.refresh_token.clone().unwrap_or_default();
        info!("Refreshing access token");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ];
        let response = self.request_token(&secrets.token_uri, &params).await?;

        Ok(TokenInfo::from_response(
            response,
            &secrets,
            Some(refresh_token),
            Utc::now(),
        ))
    }

    /// Run the browser consent flow and exchange the returned code
    async fn authorize(&self, secrets: &ClientSecrets) -> Result<TokenInfo> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let redirect_uri = format!("http://127.0.0.1:{}/", listener.local_addr()?.port());
        let state = uuid::Uuid::new_v4().simple().to_string();

        println!(
            "Please visit this URL to authorize this application:\n{}",
            consent_url(secrets, &redirect_uri, &state)
        );

        let code = wait_for_code(&listener, &state).await?;
        debug!("Received authorization code, exchanging for token");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ];
        let response = self.request_token(&secrets.token_uri, &params).await?;

        Ok(TokenInfo::from_response(response, secrets, None, Utc::now()))
    }

    async fn request_token(&self, token_uri: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self.http.post(token_uri).form(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned {}", status),
            };
            return Err(RosterError::Auth(message));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Build the consent page URL for the installed-app flow
pub fn consent_url(secrets: &ClientSecrets, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline",
        secrets.auth_uri,
        urlencoding::encode(&secrets.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&SCOPES.join(" ")),
        urlencoding::encode(state),
    )
}

/// Parse a URL query string, decoding `+` and percent escapes
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// What the browser brought back on the redirect
#[derive(Debug, PartialEq, Eq)]
pub enum Redirect {
    Code { code: String, state: Option<String> },
    Denied(String),
    /// Some other request, such as a favicon fetch
    Unrelated,
}

/// Interpret the request line of a redirect, e.g. `GET /?code=..&state=.. HTTP/1.1`
pub fn parse_redirect(request_line: &str) -> Redirect {
    let target = request_line.split_whitespace().nth(1).unwrap_or_default();
    let Some((_, query)) = target.split_once('?') else {
        return Redirect::Unrelated;
    };

    let mut params = parse_query(query);
    if let Some(error) = params.remove("error") {
        return Redirect::Denied(error);
    }
    match params.remove("code") {
        Some(code) => Redirect::Code {
            code,
            state: params.remove("state"),
        },
        None => Redirect::Unrelated,
    }
}

async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String> {
    loop {
        let (mut socket, peer) = listener.accept().await?;
        debug!("Redirect connection from {}", peer);

        let mut buf = vec![0u8; 8192];
        let mut len = 0;
        while len < buf.len() {
            let n = socket.read(&mut buf[len..]).await?;
            if n == 0 {
                break;
            }
            len += n;
            if buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let head = String::from_utf8_lossy(&buf[..len]);
        let request_line = head.lines().next().unwrap_or_default();

        let (status, body, outcome) = match parse_redirect(request_line) {
            Redirect::Unrelated => ("404 Not Found", "", None),
            Redirect::Denied(error) => (
                "200 OK",
                "Authorization was denied.",
                Some(Err(RosterError::Auth(error))),
            ),
            Redirect::Code { code, state } => {
                if state.as_deref() == Some(expected_state) {
                    ("200 OK", SUCCESS_PAGE, Some(Ok(code)))
                } else {
                    (
                        "400 Bad Request",
                        "State mismatch.",
                        Some(Err(RosterError::Auth(
                            "state mismatch in authorization response".to_string(),
                        ))),
                    )
                }
            }
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await?;
        socket.shutdown().await.ok();

        if let Some(outcome) = outcome {
            return outcome;
        }
    }
}

/// Read the cached credential. A missing or unreadable cache yields `None`.
pub fn load_token(path: &Path) -> Option<TokenInfo> {
    let json = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(token) => Some(token),
        Err(e) => {
            warn!("Ignoring unreadable token cache {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_token(path: &Path, token: &TokenInfo) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(token)?)?;
    debug!("Saved token to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn secrets() -> ClientSecrets {
        ClientSecrets::from_json(r#"{"installed":{"client_id":"my id","client_secret":"x"}}"#).unwrap()
    }

    #[test]
    fn test_consent_url() {
        let url = consent_url(&secrets(), "http://127.0.0.1:8765/", "abc");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?response_type=code"));
        assert!(url.contains("client_id=my%20id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8765%2F"));
        assert!(url.contains("auth%2Fspreadsheets%20https"));
        assert!(url.contains("state=abc"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn test_parse_query_decodes() {
        let params = parse_query("code=4%2F0Ab+c&state=xyz&flag");

        assert_eq!(params["code"], "4/0Ab c");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["flag"], "");
    }

    #[test]
    fn test_parse_redirect() {
        assert_eq!(
            parse_redirect("GET /?state=s1&code=4%2Fabc&scope=x HTTP/1.1"),
            Redirect::Code {
                code: "4/abc".to_string(),
                state: Some("s1".to_string()),
            }
        );
        assert_eq!(
            parse_redirect("GET /?error=access_denied&state=s1 HTTP/1.1"),
            Redirect::Denied("access_denied".to_string())
        );
        assert_eq!(parse_redirect("GET /favicon.ico HTTP/1.1"), Redirect::Unrelated);
        assert_eq!(parse_redirect(""), Redirect::Unrelated);
    }

    #[test]
    fn test_token_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let token = TokenInfo {
            access_token: "ya29.a".to_string(),
            refresh_token: Some("1//r".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
            scope: Some(SCOPES.join(" ")),
            client_id: "id".to_string(),
            client_secret: "x".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        };

        save_token(&path, &token).unwrap();
        assert_eq!(load_token(&path), Some(token));
    }

    #[test]
    fn test_corrupt_token_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(load_token(&path).is_none());
        assert!(load_token(&dir.path().join("absent.json")).is_none());
    }

    #[tokio::test]
    async fn test_missing_client_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let client_file = dir.path().join("client.json");
        let auth = AuthManager::new(
            reqwest::Client::new(),
            Some(client_file.clone()),
            dir.path().join("token.json"),
        );

        let err = auth.token().await.unwrap_err();
        assert!(matches!(err, RosterError::MissingClientConfig(p) if p == client_file));
    }
}
