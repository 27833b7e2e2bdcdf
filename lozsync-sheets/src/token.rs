//! OAuth token store — offline-access credential persisted between runs.
//!
//! Load order: the `GOOGLE_OAUTH_TOKEN` environment variable (JSON,
//! used in headless deployments) wins over the token file at
//! `<home>/.lozsync/google-token.json`. Saves use the atomic `.tmp` +
//! rename pattern.
//!
//! # API pattern
//!
//! Every function touching the store has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use lozsync_core::config::SheetsConfig;

use crate::error::{io_err, SheetsError};

/// Environment variable holding a serialized token (deployments without
/// a writable home directory).
pub const TOKEN_ENV: &str = "GOOGLE_OAUTH_TOKEN";

/// Google OAuth endpoints.
const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// OAuth scope granting spreadsheet read/write.
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Refresh this long before the recorded expiry to absorb clock skew.
const EXPIRY_MARGIN_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Stored token
// ---------------------------------------------------------------------------

/// The persisted OAuth credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access token, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Whether the access token is (about to be) expired at `now`.
    ///
    /// A token without a recorded expiry is assumed live; the API call
    /// itself is the arbiter then.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS),
            None => false,
        }
    }
}

/// Token endpoint response (boundary struct).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_stored(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            // Google omits the refresh token on refresh responses; keep
            // the one we already have.
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// `<home>/.lozsync/google-token.json`
pub fn token_path_at(home: &Path) -> PathBuf {
    home.join(".lozsync").join("google-token.json")
}

/// Load the stored token: environment variable first, then the file.
///
/// Returns `Ok(None)` when neither source holds a credential. A
/// malformed environment value falls through to the file with a
/// warning, matching an operator fixing one source at a time.
pub fn load_at(
    home: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<StoredToken>, SheetsError> {
    if let Some(raw) = lookup(TOKEN_ENV) {
        match serde_json::from_str::<StoredToken>(&raw) {
            Ok(token) => {
                tracing::debug!("loaded OAuth token from environment");
                return Ok(Some(token));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to parse {TOKEN_ENV}; falling back to token file");
            }
        }
    }

    let path = token_path_at(home);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let token = serde_json::from_str(&contents)?;
    tracing::debug!(path = %path.display(), "loaded OAuth token from file");
    Ok(Some(token))
}

/// `load_at` convenience wrapper over the home directory and process
/// environment.
pub fn load() -> Result<Option<StoredToken>, SheetsError> {
    let home = home()?;
    load_at(&home, |name| std::env::var(name).ok())
}

/// Save the token atomically (`.tmp` then rename).
pub fn save_at(home: &Path, token: &StoredToken) -> Result<(), SheetsError> {
    let path = token_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid token path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(token)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(token: &StoredToken) -> Result<(), SheetsError> {
    save_at(&home()?, token)
}

fn home() -> Result<PathBuf, SheetsError> {
    dirs::home_dir().ok_or_else(|| {
        io_err(
            "~",
            std::io::Error::other("cannot determine home directory; set $HOME or equivalent"),
        )
    })
}

// ---------------------------------------------------------------------------
// OAuth flow
// ---------------------------------------------------------------------------

/// Build the offline-access consent URL the operator opens in a browser.
pub fn auth_url(config: &SheetsConfig) -> String {
    let url = reqwest::Url::parse_with_params(
        AUTH_ENDPOINT,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SHEETS_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .expect("static auth endpoint URL");
    url.to_string()
}

/// Exchange an authorization code for a token.
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &SheetsConfig,
    code: &str,
) -> Result<StoredToken, SheetsError> {
    let response = client
        .post(TOKEN_ENDPOINT)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
        ])
        .send()
        .await?;

    let token: TokenResponse = read_token_response(response, "authorization code exchange").await?;
    Ok(token.into_stored(Utc::now(), None))
}

/// Mint a fresh access token from the stored refresh token.
pub async fn refresh(
    client: &reqwest::Client,
    config: &SheetsConfig,
    token: &StoredToken,
) -> Result<StoredToken, SheetsError> {
    let Some(refresh_token) = token.refresh_token.as_deref() else {
        return Err(SheetsError::Token {
            reason: "stored token has no refresh token; re-run `lozsync auth`".to_string(),
        });
    };

    let response = client
        .post(TOKEN_ENDPOINT)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?;

    let fresh: TokenResponse = read_token_response(response, "token refresh").await?;
    Ok(fresh.into_stored(Utc::now(), token.refresh_token.clone()))
}

async fn read_token_response(
    response: reqwest::Response,
    operation: &str,
) -> Result<TokenResponse, SheetsError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SheetsError::Token {
            reason: format!("{operation} returned HTTP {status}: {body}"),
        });
    }
    Ok(response.json().await?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token(access: &str) -> StoredToken {
        StoredToken {
            access_token: access.to_string(),
            refresh_token: Some("refresh".to_string()),
            expiry: None,
        }
    }

    #[test]
    fn load_returns_none_when_no_source() {
        let home = TempDir::new().unwrap();
        let loaded = load_at(home.path(), |_| None).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn roundtrip_save_load() {
        let home = TempDir::new().unwrap();
        let original = token("abc");
        save_at(home.path(), &original).unwrap();

        let loaded = load_at(home.path(), |_| None).unwrap().expect("token");
        assert_eq!(loaded, original);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let home = TempDir::new().unwrap();
        save_at(home.path(), &token("abc")).unwrap();
        let tmp = token_path_at(home.path()).with_extension("json.tmp");
        assert!(!tmp.exists(), "tmp file should be removed after rename");
    }

    #[test]
    fn env_token_wins_over_file() {
        let home = TempDir::new().unwrap();
        save_at(home.path(), &token("from-file")).unwrap();

        let env_json = serde_json::to_string(&token("from-env")).unwrap();
        let loaded = load_at(home.path(), move |name| {
            (name == TOKEN_ENV).then(|| env_json.clone())
        })
        .unwrap()
        .expect("token");
        assert_eq!(loaded.access_token, "from-env");
    }

    #[test]
    fn malformed_env_token_falls_back_to_file() {
        let home = TempDir::new().unwrap();
        save_at(home.path(), &token("from-file")).unwrap();

        let loaded = load_at(home.path(), |name| {
            (name == TOKEN_ENV).then(|| "{not json".to_string())
        })
        .unwrap()
        .expect("token");
        assert_eq!(loaded.access_token, "from-file");
    }

    #[test]
    fn expiry_check_honors_margin() {
        let now = Utc::now();
        let mut t = token("abc");

        t.expiry = Some(now + Duration::seconds(30));
        assert!(t.is_expired(now), "inside the refresh margin counts as expired");

        t.expiry = Some(now + Duration::seconds(3600));
        assert!(!t.is_expired(now));

        t.expiry = None;
        assert!(!t.is_expired(now), "unknown expiry is assumed live");
    }

    #[test]
    fn auth_url_carries_offline_access_and_scope() {
        let config = SheetsConfig {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost/callback".to_string(),
            spreadsheet_id: "sheet".to_string(),
        };
        let url = auth_url(&config);
        assert!(url.starts_with(AUTH_ENDPOINT));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("spreadsheets"));
        assert!(!url.contains("secret"), "client secret never goes in the URL");
    }
}
