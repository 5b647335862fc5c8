use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tracing::{debug, warn};

const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const TOKEN_URL: &str = "https://api.trakt.tv/oauth/token";
const AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";

pub fn create_trakt_client() -> Client {
    Client::builder()
        .user_agent(concat!("plexsync/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
}

impl TokenResponse {
    fn into_token_info(self) -> TokenInfo {
        // Renew a little before Trakt does
        let expires_at = Utc::now() + Duration::seconds(self.expires_in as i64 - 120);
        TokenInfo {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

#[derive(Debug)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Refresh with `refresh_token` when given, otherwise (or on refresh failure)
/// run the interactive device-less OAuth flow.
pub async fn authenticate(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: Option<&str>,
) -> Result<TokenInfo> {
    if let Some(refresh_token) = refresh_token {
        match refresh_access_token(client, client_id, client_secret, refresh_token).await {
            Ok(token_info) => return Ok(token_info),
            Err(e) => warn!("Trakt token refresh failed, authorizing again: {}", e),
        }
    }

    authorize_new(client, client_id, client_secret).await
}

async fn request_token(client: &Client, payload: serde_json::Value, what: &str) -> Result<TokenInfo> {
    let response = client
        .post(TOKEN_URL)
        .json(&payload)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow!("{} failed: {} - {}", what, status, error_text));
    }

    let token_response: TokenResponse = response.json().await?;
    Ok(token_response.into_token_info())
}

async fn refresh_access_token(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenInfo> {
    debug!("Refreshing Trakt access token");
    let payload = serde_json::json!({
        "refresh_token": refresh_token,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": REDIRECT_URI,
        "grant_type": "refresh_token"
    });
    request_token(client, payload, "Token refresh").await
}

pub fn authorization_url(client_id: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(REDIRECT_URI)
    )
}

async fn authorize_new(client: &Client, client_id: &str, client_secret: &str) -> Result<TokenInfo> {
    println!("\nPlease visit the following URL to authorize plexsync:");
    println!("{}\n", authorization_url(client_id));

    print!("Please enter the authorization code from the URL: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().read_line(&mut code)?;
    let code = code.trim();

    if code.is_empty() {
        return Err(anyhow!("Authorization code cannot be empty"));
    }

    let payload = serde_json::json!({
        "code": code,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": REDIRECT_URI,
        "grant_type": "authorization_code"
    });
    request_token(client, payload, "Authorization code exchange").await
}
