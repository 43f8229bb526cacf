//! Process-wide settings loaded once from the environment.
//!
//! ```bash
//! export TWILIO_ACCOUNT_SID="AC..."
//! export TWILIO_AUTH_TOKEN="..."
//! export TWILIO_PHONE_NUMBER="+15005550006"
//! ```
//!
//! ## Optional Variables
//!
//! - `TWILIO_WHATSAPP_FROM` - WhatsApp sender (default: `+14155238886`, the sandbox number)
//! - `TWILIO_API_BASE` - API base URL (default: `https://api.twilio.com`)
//! - `PROVIDER_TIMEOUT_SECONDS` - per-request timeout (default: 30)
//! - `MESSAGE_DELAY_SECONDS` - pause between sends, fractions allowed (default: 1)
//! - `NATIONAL_NUMBER_LENGTH` - digits in a national number (default: 10)
//! - `CALLING_CODE` - regional calling code (default: `91`)
//! - `NUMBER_COLUMN` - sheet column holding numbers (default: `mobile`)
//! - `MAX_FILE_SIZE` - upload limit in bytes (default: 10 MiB)
//! - `RUST_LOG` - log filter (default: `info`)
//! - `LOG_FORMAT` - `text` or `json` (default: `text`)
//!
//! Blank values are treated as unset.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::DEFAULT_MESSAGE_DELAY;
use crate::domain::{CallingCode, NumberFormat};
use crate::table::{DEFAULT_COLUMN, DEFAULT_MAX_FILE_SIZE};

const DEFAULT_WHATSAPP_FROM: &str = "+14155238886";
const DEFAULT_API_BASE: &str = "https://api.twilio.com";
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err("expected 'text' or 'json'".to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    /// Sender for the SMS channel.
    pub sms_from: Option<String>,
    /// Sender for the WhatsApp channel.
    pub whatsapp_from: Option<String>,
    pub api_base: String,
    pub provider_timeout: Duration,
    pub message_delay: Duration,
    pub number_format: NumberFormat,
    pub number_column: String,
    pub max_file_size: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            sms_from: None,
            whatsapp_from: Some(DEFAULT_WHATSAPP_FROM.to_owned()),
            api_base: DEFAULT_API_BASE.to_owned(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            message_delay: DEFAULT_MESSAGE_DELAY,
            number_format: NumberFormat::default(),
            number_column: DEFAULT_COLUMN.to_owned(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            log_level: "info".to_owned(),
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Load settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value. Missing provider
    /// credentials are not an error here; see [`CredentialGate`](crate::CredentialGate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let message_delay = match get("MESSAGE_DELAY_SECONDS") {
            Some(raw) => parse_seconds("MESSAGE_DELAY_SECONDS", &raw)?,
            None => defaults.message_delay,
        };
        let provider_timeout = match get("PROVIDER_TIMEOUT_SECONDS") {
            Some(raw) => parse_seconds("PROVIDER_TIMEOUT_SECONDS", &raw)?,
            None => defaults.provider_timeout,
        };

        let calling_code = match get("CALLING_CODE") {
            Some(raw) => CallingCode::new(raw.as_str()).map_err(|err| ConfigError::Invalid {
                key: "CALLING_CODE",
                value: raw.clone(),
                reason: err.to_string(),
            })?,
            None => CallingCode::default(),
        };
        let national_length = match get("NATIONAL_NUMBER_LENGTH") {
            Some(raw) => parse_value("NATIONAL_NUMBER_LENGTH", &raw)?,
            None => NumberFormat::DEFAULT_NATIONAL_LENGTH,
        };
        let number_format =
            NumberFormat::new(calling_code, national_length).map_err(|err| ConfigError::Invalid {
                key: "NATIONAL_NUMBER_LENGTH",
                value: national_length.to_string(),
                reason: err.to_string(),
            })?;

        let max_file_size = match get("MAX_FILE_SIZE") {
            Some(raw) => parse_value("MAX_FILE_SIZE", &raw)?,
            None => defaults.max_file_size,
        };
        let log_format = match get("LOG_FORMAT") {
            Some(raw) => parse_value("LOG_FORMAT", &raw)?,
            None => defaults.log_format,
        };

        Ok(Self {
            account_sid: get("TWILIO_ACCOUNT_SID"),
            auth_token: get("TWILIO_AUTH_TOKEN"),
            sms_from: get("TWILIO_PHONE_NUMBER"),
            whatsapp_from: get("TWILIO_WHATSAPP_FROM").or(defaults.whatsapp_from),
            api_base: get("TWILIO_API_BASE").unwrap_or(defaults.api_base),
            provider_timeout,
            message_delay,
            number_format,
            number_column: get("NUMBER_COLUMN").unwrap_or(defaults.number_column),
            max_file_size,
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
        })
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_owned(),
        reason: err.to_string(),
    })
}

fn parse_seconds(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let seconds: f64 = parse_value(key, raw)?;
    Duration::try_from_secs_f64(seconds).map_err(|err| ConfigError::Invalid {
        key,
        value: raw.to_owned(),
        reason: err.to_string(),
    })
}
