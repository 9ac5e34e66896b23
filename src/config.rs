use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_PREFIX: &str = "google-objects";

const SCOPE_PREFIX: &str = "https://www.googleapis.com/auth/";

const API_KEY_VARS: &[&str] = &["GOOGLE_API_KEY", "GOOGLE_SHEETS_API_KEY"];
const SERVICE_ACCOUNT_VARS: &[&str] = &[
    "GOOGLE_SERVICE_ACCOUNT_CREDENTIALS",
    "GOOGLE_SERVICE_ACCOUNT",
];
const DELEGATED_USER_VAR: &str = "GOOGLE_DELEGATED_USER";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub google: GoogleConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GoogleConfig {
    /// Read-only access with an API key.
    pub api_key: Option<String>,
    /// Path to a service account JSON key file.
    pub service_account: Option<PathBuf>,
    /// User to impersonate with domain-wide delegation.
    pub delegated_user: Option<String>,
    /// Scope short names (`drive`) or full URLs.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// How requests are authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    ServiceAccount {
        key_path: PathBuf,
        delegated_user: Option<String>,
        scopes: Vec<String>,
    },
}

impl GoogleConfig {
    /// Fill unset values from the process environment.
    pub fn with_env(self) -> Self {
        self.with_lookup(|name| std::env::var(name).ok())
    }

    /// Fill unset values using `lookup` to read variables.
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(*name).filter(|v| !v.is_empty()))
        };

        if self.api_key.is_none() {
            self.api_key = first(API_KEY_VARS);
        }
        if self.service_account.is_none() {
            self.service_account = first(SERVICE_ACCOUNT_VARS).map(PathBuf::from);
        }
        if self.delegated_user.is_none() {
            self.delegated_user = first(&[DELEGATED_USER_VAR]);
        }

        self
    }

    /// Service account key file, with a leading `~` expanded.
    pub fn service_account_path(&self) -> Option<PathBuf> {
        self.service_account.as_deref().map(expand_home)
    }

    /// Pick credentials, preferring a service account over an API key.
    pub fn resolve(&self) -> Result<Credentials> {
        if let Some(key_path) = self.service_account_path() {
            return Ok(Credentials::ServiceAccount {
                key_path,
                delegated_user: self.delegated_user.clone(),
                scopes: self.scopes.iter().map(|s| scope_url(s)).collect(),
            });
        }

        if let Some(key) = &self.api_key {
            return Ok(Credentials::ApiKey(key.clone()));
        }

        Err(Error::MissingCredential(format!(
            "set an API key ({}) or a service account key file ({})",
            API_KEY_VARS.join(" or "),
            SERVICE_ACCOUNT_VARS.join(" or ")
        )))
    }
}

/// Expand a scope short name to its full URL.
pub fn scope_url(scope: &str) -> String {
    if scope.starts_with("https://") {
        scope.to_string()
    } else {
        format!("{}{}", SCOPE_PREFIX, scope)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

impl Config {
    /// Load the config file if present, then overlay the environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_file()?)?;
        config.google = config.google.with_env();
        Ok(config)
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))
    }
}
