use std::fmt;
use std::str::FromStr;

use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Provider account identifier (Twilio `AccountSid`).
///
/// Invariant: non-empty after trimming.
pub struct AccountSid(String);

impl AccountSid {
    /// Field name used in configuration and error messages.
    pub const FIELD: &'static str = "AccountSid";

    /// Create a validated [`AccountSid`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated account id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Provider secret (Twilio `AuthToken`).
///
/// Invariant: must not be empty. `Debug` output is redacted.
pub struct AuthToken(String);

impl AuthToken {
    /// Field name used in configuration and error messages.
    pub const FIELD: &'static str = "AuthToken";

    /// Create a validated [`AuthToken`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the secret as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Sender address handed to the provider (`From`).
///
/// Invariant: non-empty after trimming. The value must be enabled on the provider account.
pub struct SenderAddress(String);

impl SenderAddress {
    /// Form field name used by the provider (`From`).
    pub const FIELD: &'static str = "From";

    /// Create a validated [`SenderAddress`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated sender address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// This sender as addressed on `channel`.
    pub fn for_channel(&self, channel: Channel) -> Self {
        Self(channel.address(&self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Message text (`Body`).
///
/// Invariant: non-empty after trimming. The original value (including whitespace) is preserved.
pub struct MessageBody(String);

impl MessageBody {
    /// Form field name used by the provider (`Body`).
    pub const FIELD: &'static str = "Body";

    /// Create a validated message body.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Message id returned by the provider for an accepted send (Twilio `sid`).
///
/// Invariant: non-empty after trimming.
pub struct ProviderMessageId(String);

impl ProviderMessageId {
    pub const FIELD: &'static str = "sid";

    /// Create a validated [`ProviderMessageId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Canonical recipient: the national number as a fixed-length digit string.
///
/// Only [`NumberFormat`](crate::domain::NumberFormat) creates values of this type, so every
/// instance is digits-only and exactly the configured national length.
pub struct RecipientIdentifier(String);

impl RecipientIdentifier {
    pub(crate) fn from_normalized(digits: String) -> Self {
        Self(digits)
    }

    /// Borrow the normalized digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Regional calling code re-applied to every recipient before transport (`91` for India).
///
/// Invariant: 1 to 3 ASCII digits. A leading `+` is accepted on input and dropped.
pub struct CallingCode(String);

impl CallingCode {
    /// Longest calling code assigned by ITU-T E.164.
    pub const MAX_DIGITS: usize = 3;

    /// Create a validated calling code.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if digits.is_empty()
            || digits.len() > Self::MAX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ValidationError::InvalidCallingCode {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(digits.to_owned()))
    }

    /// Digits without the `+`.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// E.164 form of a recipient: `+<code><national>`.
    pub fn e164(&self, recipient: &RecipientIdentifier) -> String {
        format!("+{}{}", self.0, recipient.as_str())
    }
}

impl Default for CallingCode {
    fn default() -> Self {
        Self("91".to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Delivery channel offered by the provider.
pub enum Channel {
    #[default]
    Sms,
    WhatsApp,
}

impl Channel {
    const WHATSAPP_SCHEME: &'static str = "whatsapp:";

    /// Render an E.164 number (or a configured sender) as this channel's address.
    pub fn address(self, number: &str) -> String {
        match self {
            Self::Sms => number.to_owned(),
            Self::WhatsApp if number.starts_with(Self::WHATSAPP_SCHEME) => number.to_owned(),
            Self::WhatsApp => format!("{}{number}", Self::WHATSAPP_SCHEME),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::WhatsApp => "whatsapp",
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "whatsapp" => Ok(Self::WhatsApp),
            other => Err(format!("unknown channel `{other}` (expected sms or whatsapp)")),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
