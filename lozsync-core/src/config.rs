//! Run configuration: environment secrets + JSON settings file.
//!
//! # Sources
//!
//! Credentials and endpoints come from environment variables; search
//! parameters and overrides come from a JSON settings file (default
//! `lozsync.json`):
//!
//! ```text
//! {
//!   "spaceKey": "CS",
//!   "titleSearch": "Blueprint",
//!   "pageIds": ["123", "456"],        // optional — skips the search
//!   "exclusionTerms": ["Template"]    // optional — replaces the defaults
//! }
//! ```
//!
//! # API pattern
//!
//! `load_with(path, lookup)` takes an explicit key-lookup function so
//! tests never mutate process-global environment state; `load(path)` is
//! the thin `std::env::var` wrapper used by the CLI.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::PageId;

/// Title substrings that mark template/meta/generic pages and tabs.
///
/// Pages whose title contains any of these are excluded from the run,
/// and destination tabs whose name contains any of these are deleted.
pub const DEFAULT_EXCLUSION_TERMS: [&str; 6] = [
    "Generic",
    "Template",
    "Templates",
    "Client Summaries",
    "What are Blueprint MultiExcerpts",
    "Best Practice Templates",
];

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Confluence connection + page-selection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfluenceConfig {
    /// Site base URL, e.g. `https://yourcompany.atlassian.net`.
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub space_key: String,
    pub title_search: String,
    /// Explicit page-id override. Non-empty skips the title search.
    pub page_ids: Vec<PageId>,
}

/// Google Sheets OAuth + destination settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub spreadsheet_id: String,
}

/// Fully validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub confluence: ConfluenceConfig,
    pub sheets: SheetsConfig,
    pub exclusion_terms: Vec<String>,
}

// ---------------------------------------------------------------------------
// Settings file (boundary struct)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    space_key: Option<String>,
    #[serde(default)]
    title_search: Option<String>,
    #[serde(default)]
    page_ids: Option<Vec<String>>,
    #[serde(default)]
    exclusion_terms: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate configuration from `path` plus an explicit
/// key-lookup function for the environment part.
pub fn load_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let settings = read_settings(path)?;

    let page_ids: Vec<PageId> = settings
        .page_ids
        .unwrap_or_default()
        .into_iter()
        .map(PageId::from)
        .collect();

    // Search parameters are required unless an explicit page-id list
    // overrides the search.
    let space_key = settings.space_key.unwrap_or_default();
    let title_search = settings.title_search.unwrap_or_default();
    if page_ids.is_empty() {
        if space_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                name: "spaceKey",
                path: path.to_path_buf(),
            });
        }
        if title_search.trim().is_empty() {
            return Err(ConfigError::MissingField {
                name: "titleSearch",
                path: path.to_path_buf(),
            });
        }
    }

    let exclusion_terms = settings.exclusion_terms.unwrap_or_else(|| {
        DEFAULT_EXCLUSION_TERMS
            .iter()
            .map(|t| t.to_string())
            .collect()
    });

    Ok(Config {
        confluence: ConfluenceConfig {
            base_url: required_env(&lookup, "CONFLUENCE_BASE_URL")?,
            email: required_env(&lookup, "CONFLUENCE_EMAIL")?,
            api_token: required_env(&lookup, "CONFLUENCE_API_TOKEN")?,
            space_key,
            title_search,
            page_ids,
        },
        sheets: SheetsConfig {
            client_id: required_env(&lookup, "GOOGLE_CLIENT_ID")?,
            client_secret: required_env(&lookup, "GOOGLE_CLIENT_SECRET")?,
            redirect_uri: required_env(&lookup, "GOOGLE_REDIRECT_URI")?,
            spreadsheet_id: required_env(&lookup, "GOOGLE_SHEET_ID")?,
        },
        exclusion_terms,
    })
}

/// `load_with` convenience wrapper over the process environment.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    load_with(path, |name| std::env::var(name).ok())
}

/// Load only the Sheets OAuth settings from the environment.
///
/// The `auth` bootstrap command needs these before a settings file (or
/// any Confluence credential) exists.
pub fn sheets_config_with(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SheetsConfig, ConfigError> {
    Ok(SheetsConfig {
        client_id: required_env(&lookup, "GOOGLE_CLIENT_ID")?,
        client_secret: required_env(&lookup, "GOOGLE_CLIENT_SECRET")?,
        redirect_uri: required_env(&lookup, "GOOGLE_REDIRECT_URI")?,
        spreadsheet_id: required_env(&lookup, "GOOGLE_SHEET_ID")?,
    })
}

/// `sheets_config_with` convenience wrapper over the process environment.
pub fn sheets_config() -> Result<SheetsConfig, ConfigError> {
    sheets_config_with(|name| std::env::var(name).ok())
}

fn read_settings(path: &Path) -> Result<SettingsFile, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn required_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv { name }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("CONFLUENCE_BASE_URL", "https://example.atlassian.net"),
            ("CONFLUENCE_EMAIL", "ops@example.com"),
            ("CONFLUENCE_API_TOKEN", "token"),
            ("GOOGLE_CLIENT_ID", "client-id"),
            ("GOOGLE_CLIENT_SECRET", "client-secret"),
            ("GOOGLE_REDIRECT_URI", "http://localhost/callback"),
            ("GOOGLE_SHEET_ID", "sheet-id"),
        ])
    }

    fn write_settings(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("lozsync.json");
        fs::write(&path, json).expect("write settings");
        path
    }

    fn lookup_in<'a>(env: &'a HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| env.get(name).map(|v| v.to_string())
    }

    #[test]
    fn loads_full_config() {
        let dir = TempDir::new().expect("dir");
        let path = write_settings(&dir, r#"{"spaceKey":"CS","titleSearch":"Blueprint"}"#);
        let env = full_env();

        let config = load_with(&path, lookup_in(&env)).expect("load");
        assert_eq!(config.confluence.space_key, "CS");
        assert_eq!(config.confluence.title_search, "Blueprint");
        assert!(config.confluence.page_ids.is_empty());
        assert_eq!(config.sheets.spreadsheet_id, "sheet-id");
        assert_eq!(
            config.exclusion_terms.len(),
            DEFAULT_EXCLUSION_TERMS.len(),
            "defaults applied when the file carries no exclusionTerms"
        );
    }

    #[test]
    fn missing_env_var_names_the_variable() {
        let dir = TempDir::new().expect("dir");
        let path = write_settings(&dir, r#"{"spaceKey":"CS","titleSearch":"Blueprint"}"#);
        let mut env = full_env();
        env.remove("GOOGLE_CLIENT_SECRET");

        let err = load_with(&path, lookup_in(&env)).expect_err("should fail");
        match err {
            ConfigError::MissingEnv { name } => assert_eq!(name, "GOOGLE_CLIENT_SECRET"),
            other => panic!("expected MissingEnv, got {other:?}"),
        }
    }

    #[test]
    fn empty_env_var_counts_as_missing() {
        let dir = TempDir::new().expect("dir");
        let path = write_settings(&dir, r#"{"spaceKey":"CS","titleSearch":"Blueprint"}"#);
        let mut env = full_env();
        env.insert("CONFLUENCE_API_TOKEN", "  ");

        let err = load_with(&path, lookup_in(&env)).expect_err("should fail");
        assert!(matches!(
            err,
            ConfigError::MissingEnv {
                name: "CONFLUENCE_API_TOKEN"
            }
        ));
    }

    #[test]
    fn missing_space_key_is_fatal_without_page_ids() {
        let dir = TempDir::new().expect("dir");
        let path = write_settings(&dir, r#"{"titleSearch":"Blueprint"}"#);
        let env = full_env();

        let err = load_with(&path, lookup_in(&env)).expect_err("should fail");
        assert!(matches!(
            err,
            ConfigError::MissingField {
                name: "spaceKey",
                ..
            }
        ));
    }

    #[test]
    fn page_id_override_makes_search_fields_optional() {
        let dir = TempDir::new().expect("dir");
        let path = write_settings(&dir, r#"{"pageIds":["111","222"]}"#);
        let env = full_env();

        let config = load_with(&path, lookup_in(&env)).expect("load");
        assert_eq!(
            config.confluence.page_ids,
            vec![PageId::from("111"), PageId::from("222")]
        );
    }

    #[test]
    fn explicit_exclusion_terms_replace_defaults() {
        let dir = TempDir::new().expect("dir");
        let path = write_settings(
            &dir,
            r#"{"spaceKey":"CS","titleSearch":"Blueprint","exclusionTerms":["Sandbox"]}"#,
        );
        let env = full_env();

        let config = load_with(&path, lookup_in(&env)).expect("load");
        assert_eq!(config.exclusion_terms, vec!["Sandbox".to_string()]);
    }

    #[test]
    fn missing_settings_file_reports_path() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("nope.json");
        let env = full_env();

        let err = load_with(&path, lookup_in(&env)).expect_err("should fail");
        match err {
            ConfigError::NotFound { path: p } => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_settings_json_reports_parse_error() {
        let dir = TempDir::new().expect("dir");
        let path = write_settings(&dir, "{not json");
        let env = full_env();

        let err = load_with(&path, lookup_in(&env)).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
