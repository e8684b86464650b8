use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::config::{Config, ConfigError};

/// How long after a refresh the access token is trusted. Tokens live for an
/// hour; this leaves five minutes of slack.
const TOKEN_LIFETIME_SECONDS: i64 = 3300;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to persist refreshed token: {0}")]
    Persist(#[from] ConfigError),
}

/// A freshly issued token pair.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub type DynAuthenticator = Arc<dyn Authenticator + Send + Sync>;

#[async_trait]
pub trait Authenticator {
    /// Get an access token that is valid right now, refreshing it first if
    /// necessary.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Whether the current access token can still be used.
    async fn is_valid(&self) -> bool;

    /// Exchange the refresh token for a new token pair and persist it.
    async fn refresh(&self) -> Result<TokenPair, AuthError>;
}

/// Refresh-token based OAuth against Intuit's token endpoint.
///
/// The config is held behind a mutex for the whole refresh so there is never
/// more than one refresh in flight, and the new tokens are written to the
/// config file before they are handed out.
pub struct OAuthAuthenticator {
    http: reqwest::Client,
    path: PathBuf,
    config: Mutex<Config>,
}

fn token_is_fresh(config: &Config, now: i64) -> bool {
    match (&config.access_token, config.last_update) {
        (Some(_), Some(last_update)) => now - last_update <= TOKEN_LIFETIME_SECONDS,
        _ => false,
    }
}

impl OAuthAuthenticator {
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            http: reqwest::Client::new(),
            path,
            config: Mutex::new(config),
        }
    }

    #[instrument(skip_all)]
    async fn refresh_locked(&self, config: &mut Config) -> Result<TokenPair, AuthError> {
        debug!(token_url = config.token_url(), "Refreshing access token.");

        let response = self
            .http
            .post(config.token_url())
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", config.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: TokenPair = response.json().await?;

        config.access_token = Some(tokens.access_token.clone());
        config.refresh_token = tokens.refresh_token.clone();
        config.last_update = Some(Utc::now().timestamp());
        config.save(&self.path).await?;

        info!(path = %self.path.display(), "Persisted refreshed token.");

        Ok(tokens)
    }
}

#[async_trait]
impl Authenticator for OAuthAuthenticator {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut config = self.config.lock().await;

        if let (true, Some(token)) = (
            token_is_fresh(&config, Utc::now().timestamp()),
            &config.access_token,
        ) {
            return Ok(token.clone());
        }

        Ok(self.refresh_locked(&mut config).await?.access_token)
    }

    async fn is_valid(&self) -> bool {
        let config = self.config.lock().await;

        token_is_fresh(&config, Utc::now().timestamp())
    }

    async fn refresh(&self) -> Result<TokenPair, AuthError> {
        let mut config = self.config.lock().await;

        self.refresh_locked(&mut config).await
    }
}
