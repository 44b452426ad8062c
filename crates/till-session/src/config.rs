//! # Session Configuration
//!
//! Settings for a till loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TILL_*`)
//! 2. Defaults (this file)
//!
//! Invalid environment values are logged and ignored.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use till_core::Cashier;

/// Brasília time, UTC-3.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

/// Till configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Store name, logged by `till-report` with each export
    pub store_name: String,

    /// Operator recorded on sales and movements.
    pub cashier_id: String,
    pub cashier_name: String,

    /// Store's offset from UTC in minutes. Report days are local days.
    pub utc_offset_minutes: i32,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    pub decimal_separator: char,
}

impl Default for SessionConfig {
    /// ## Default Values
    /// - Database: platform data directory, `till.db`
    /// - Store: "Till POS"
    /// - Cashier: `caixa-01` / "Caixa 01"
    /// - Offset: UTC-3
    /// - Currency: R$ with decimal comma
    fn default() -> Self {
        SessionConfig {
            db_path: default_database_path(),
            store_name: "Till POS".to_string(),
            cashier_id: "caixa-01".to_string(),
            cashier_name: "Caixa 01".to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            currency_symbol: "R$".to_string(),
            decimal_separator: ',',
        }
    }
}

impl SessionConfig {
    /// Creates a SessionConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TILL_DB_PATH`: Database file path
    /// - `TILL_STORE_NAME`: Store name
    /// - `TILL_CASHIER_ID` / `TILL_CASHIER_NAME`: Operator
    /// - `TILL_UTC_OFFSET_MINUTES`: e.g. `-180`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = SessionConfig::default();

        if let Some(path) = lookup("TILL_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(store_name) = lookup("TILL_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(id) = lookup("TILL_CASHIER_ID") {
            config.cashier_id = id;
        }

        if let Some(name) = lookup("TILL_CASHIER_NAME") {
            config.cashier_name = name;
        }

        if let Some(raw) = lookup("TILL_UTC_OFFSET_MINUTES") {
            match raw.trim().parse::<i32>() {
                Ok(minutes) if minutes.abs() < 24 * 60 => config.utc_offset_minutes = minutes,
                _ => warn!(value = %raw, "Ignoring invalid TILL_UTC_OFFSET_MINUTES"),
            }
        }

        config
    }

    pub fn cashier(&self) -> Cashier {
        Cashier::new(self.cashier_id.clone(), self.cashier_name.clone())
    }

    /// The store's UTC offset. Falls back to UTC if out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// The store's local date at `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.utc_offset()).date_naive()
    }

    /// Formats a centavo amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use till_session::SessionConfig;
    ///
    /// let config = SessionConfig::default();
    /// assert_eq!(config.format_currency(1234), "R$ 12,34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.unsigned_abs();

        format!(
            "{}{} {}{}{:02}",
            sign,
            self.currency_symbol,
            cents / 100,
            self.decimal_separator,
            cents % 100
        )
    }
}

/// Platform data directory for the database file.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/br.till.pos/till.db`
/// - **Windows**: `%APPDATA%\till\pos\data\till.db`
/// - **Linux**: `~/.local/share/pos/till.db`
///
/// Falls back to `./till.db` when no home directory is known.
pub fn default_database_path() -> PathBuf {
    ProjectDirs::from("br", "till", "pos")
        .map(|dirs| dirs.data_dir().join("till.db"))
        .unwrap_or_else(|| PathBuf::from("till.db"))
}
