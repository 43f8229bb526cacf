use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    InvalidCallingCode { input: String },
    NationalLengthOutOfRange { min: usize, max: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidCallingCode { input } => {
                write!(f, "invalid calling code: {input} (expected 1-3 digits)")
            }
            Self::NationalLengthOutOfRange { min, max, actual } => {
                write!(
                    f,
                    "national number length out of range: {actual} (expected {min}..={max})"
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
