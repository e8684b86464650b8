use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const PRODUCTION_API: &str = "https://quickbooks.api.intuit.com";
const SANDBOX_API: &str = "https://sandbox-quickbooks.api.intuit.com";
const TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The target's config file.
///
/// The file doubles as token storage: refreshed tokens are written back to it.
/// Keys this struct does not know about are kept in `extra` so rewriting the
/// file does not drop them.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(rename = "realmId")]
    pub realm_id: String,
    #[serde(default)]
    pub is_sandbox: bool,
    /// Unix timestamp of the last token refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
    /// Overrides the API host, mostly for tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Overrides the OAuth token endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?;

        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(self)?;

        tokio::fs::write(path, raw)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })
    }

    /// The company's API root, e.g. `https://quickbooks.api.intuit.com/v3/company/123`.
    pub fn api_base_url(&self) -> String {
        let host = match (&self.base_url, self.is_sandbox) {
            (Some(base_url), _) => base_url.trim_end_matches('/'),
            (None, true) => SANDBOX_API,
            (None, false) => PRODUCTION_API,
        };

        format!("{}/v3/company/{}", host, self.realm_id)
    }

    pub fn token_url(&self) -> &str {
        self.token_url.as_deref().unwrap_or(TOKEN_URL)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn config(value: Value) -> Config {
        serde_json::from_value(value).expect("config fixture")
    }

    #[test]
    fn base_url_by_environment() {
        let mut config = config(json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "refresh",
            "realmId": "123"
        }));

        assert_eq!(
            "https://quickbooks.api.intuit.com/v3/company/123",
            config.api_base_url()
        );

        config.is_sandbox = true;
        assert_eq!(
            "https://sandbox-quickbooks.api.intuit.com/v3/company/123",
            config.api_base_url()
        );

        config.base_url = Some("http://127.0.0.1:9999/".to_owned());
        assert_eq!("http://127.0.0.1:9999/v3/company/123", config.api_base_url());
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let config = config(json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "refresh",
            "realmId": "123",
            "flow_id": "abc"
        }));

        let value = serde_json::to_value(&config).expect("serialize config");

        assert_eq!(json!("abc"), value["flow_id"]);
        assert_eq!(json!("123"), value["realmId"]);
    }

    #[tokio::test]
    async fn save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        let mut want = config(json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "refresh",
            "realmId": "123"
        }));
        want.last_update = Some(1_700_000_000);

        want.save(&path).await.expect("save config");
        let got = Config::load(&path).await.expect("load config");

        assert_eq!(want, got);
    }

    #[tokio::test]
    async fn load_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");

        let err = Config::load(&dir.path().join("nope.json"))
            .await
            .expect_err("missing file");

        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
