//! Helpers for reading and writing a single Google Sheets spreadsheet with an
//! installed-application OAuth2 credential cached on local disk.

pub mod auth;
pub mod config;
pub mod error;
pub mod sheets;

pub use config::Settings;
pub use error::{AppError, Result};
pub use sheets::SpreadsheetClient;
