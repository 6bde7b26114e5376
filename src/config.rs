use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use yup_oauth2::ApplicationSecret;

const CONFIG_DIR_PREFIX: &str = "trix";

pub const DEFAULT_SECRET_FILE: &str = "client_secret.json";
pub const DEFAULT_CACHE_DIR: &str = "./.credentials";
pub const DEFAULT_SHEET_NAME: &str = "RSVP";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Construction-time settings for a spreadsheet client.
///
/// Every field has a default, so a settings file only needs the keys it
/// overrides.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Installed-application OAuth client descriptor
    pub secret_file: PathBuf,
    /// Directory holding the cached credential
    pub cache_dir: PathBuf,
    /// Sheet that `append_row` writes into
    pub sheet_name: String,
    /// Columns that hold a row's data
    pub data_columns: ColumnSpan,
    pub scopes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secret_file: PathBuf::from(DEFAULT_SECRET_FILE),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            data_columns: ColumnSpan::default(),
            scopes: vec![SPREADSHEETS_SCOPE.to_string()],
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Settings file not found at {:?}",
                path
            )));
        }

        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;

        Ok(settings)
    }

    /// Load settings from the XDG config file, falling back to defaults when
    /// no file has been written.
    pub fn load_default() -> Result<Self> {
        let path = Self::config_file()?;
        match path.exists() {
            true => Self::load(&path),
            false => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheet_name.is_empty() {
            return Err(AppError::Config("sheet_name must not be empty".to_string()));
        }
        if self.scopes.is_empty() {
            return Err(AppError::Config(
                "At least one OAuth scope must be set".to_string(),
            ));
        }
        self.data_columns.validate()
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the settings file path
    pub fn config_file() -> Result<PathBuf> {
        Self::xdg_dirs()
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }
}

/// Inclusive span of sheet columns, e.g. `A`..`C`.
///
/// Only constructed through validation, including when deserialized.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "(String, String)")]
pub struct ColumnSpan(String, String);

impl TryFrom<(String, String)> for ColumnSpan {
    type Error = AppError;

    fn try_from((start, end): (String, String)) -> Result<Self> {
        Self::new(start, end)
    }
}

impl Default for ColumnSpan {
    fn default() -> Self {
        Self("A".to_string(), "C".to_string())
    }
}

impl ColumnSpan {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let span = Self(start.into(), end.into());
        span.validate()?;
        Ok(span)
    }

    pub fn start(&self) -> &str {
        &self.0
    }

    pub fn end(&self) -> &str {
        &self.1
    }

    pub fn validate(&self) -> Result<()> {
        let start = column_number(&self.0)?;
        let end = column_number(&self.1)?;
        if start > end {
            return Err(AppError::Config(format!(
                "Column span {}..{} is reversed",
                self.0, self.1
            )));
        }
        Ok(())
    }
}

/// 1-based column number for an A1-style column label.
fn column_number(label: &str) -> Result<u32> {
    if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Config(format!(
            "Invalid column label '{}'",
            label
        )));
    }

    Ok(label
        .to_ascii_uppercase()
        .bytes()
        .fold(0, |acc, b| acc * 26 + u32::from(b - b'A' + 1)))
}

/// OAuth client parameters parsed from the secret file.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub secret: ApplicationSecret,
    pub scopes: Vec<String>,
}

impl ClientConfig {
    pub fn load(path: &Path, scopes: &[String]) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Unable to read client secret file {:?}: {}", path, e))
        })?;
        Self::from_json(&contents, scopes)
    }

    pub fn from_json(contents: &str, scopes: &[String]) -> Result<Self> {
        let secret = yup_oauth2::parse_application_secret(contents).map_err(|e| {
            AppError::Config(format!("Unable to parse client secret file: {}", e))
        })?;

        if secret.client_id.is_empty() || secret.client_secret.is_empty() {
            return Err(AppError::Config(
                "client_id and client_secret must be set in client secret file".to_string(),
            ));
        }

        Ok(Self {
            secret,
            scopes: scopes.to_vec(),
        })
    }
}
