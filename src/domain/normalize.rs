use std::borrow::Cow;
use std::fmt;

use crate::domain::validation::ValidationError;
use crate::domain::value::{CallingCode, RecipientIdentifier};

#[derive(Debug, Clone, PartialEq)]
/// A single spreadsheet cell as read from the source file.
pub enum RawCell {
    Text(String),
    /// Numeric storage. Leading zeros of the original entry are already gone.
    Number(f64),
    Empty,
}

impl RawCell {
    /// Build a text cell, mapping blank text to [`RawCell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Digits of an integral, non-negative number; `None` for anything else.
    fn integral_digits(value: f64) -> Option<String> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return None;
        }
        Some(format!("{value:.0}"))
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => match Self::integral_digits(*value) {
                Some(digits) => f.write_str(&digits),
                None => write!(f, "{value}"),
            },
            Self::Empty => Ok(()),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for RawCell {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<RawCell>> From<Option<T>> for RawCell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Deployment-wide numbering plan: one calling code and one fixed national length.
pub struct NumberFormat {
    calling_code: CallingCode,
    national_length: usize,
}

impl NumberFormat {
    pub const DEFAULT_NATIONAL_LENGTH: usize = 10;
    pub const MIN_NATIONAL_LENGTH: usize = 4;
    /// E.164 caps a full number at 15 digits.
    pub const MAX_NATIONAL_LENGTH: usize = 15;

    pub fn new(calling_code: CallingCode, national_length: usize) -> Result<Self, ValidationError> {
        if !(Self::MIN_NATIONAL_LENGTH..=Self::MAX_NATIONAL_LENGTH).contains(&national_length) {
            return Err(ValidationError::NationalLengthOutOfRange {
                min: Self::MIN_NATIONAL_LENGTH,
                max: Self::MAX_NATIONAL_LENGTH,
                actual: national_length,
            });
        }
        Ok(Self {
            calling_code,
            national_length,
        })
    }

    pub fn calling_code(&self) -> &CallingCode {
        &self.calling_code
    }

    pub fn national_length(&self) -> usize {
        self.national_length
    }

    /// Reduce a cell to a [`RecipientIdentifier`], or `None` if it cannot be reduced to
    /// exactly [`NumberFormat::national_length`] digits. Never fails.
    pub fn normalize(&self, cell: &RawCell) -> Option<RecipientIdentifier> {
        let text: Cow<'_, str> = match cell {
            RawCell::Empty => return None,
            RawCell::Text(value) => Cow::Borrowed(value.trim()),
            RawCell::Number(value) => Cow::Owned(RawCell::integral_digits(*value)?),
        };
        self.normalize_str(&text)
    }

    /// Text-only entry point used for single sends.
    pub fn normalize_str(&self, raw: &str) -> Option<RecipientIdentifier> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let national = self.national_part(&digits);
        if national.len() != self.national_length {
            return None;
        }
        Some(RecipientIdentifier::from_normalized(national.to_owned()))
    }

    fn national_part<'a>(&self, digits: &'a str) -> &'a str {
        let n = self.national_length;

        // Trunk prefix. A string already at canonical length keeps its zero.
        let digits = match digits.strip_prefix('0') {
            Some(rest) if digits.len() > n => rest,
            _ => digits,
        };

        // Redundant calling code: the national number is the trailing digits.
        if digits.len() > n && digits.starts_with(self.calling_code.digits()) {
            return &digits[digits.len() - n..];
        }

        digits
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            calling_code: CallingCode::default(),
            national_length: Self::DEFAULT_NATIONAL_LENGTH,
        }
    }
}
