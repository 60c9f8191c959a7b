//! Field-level validation shared by department and employee writes.

use crate::error::ErrorKind;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound, in characters, for names and positions.
pub const MAX_TEXT_CHARS: usize = 200;

/// Calendar date format accepted for `hired_at`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failure for a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Field is blank after trim.
    Empty { field: &'static str },
    /// Field exceeds the character limit.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Field is not a `YYYY-MM-DD` calendar date.
    InvalidDate { field: &'static str, value: String },
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max, actual } => write!(
                f,
                "{field} must be at most {max} characters, got {actual}"
            ),
            Self::InvalidDate { field, value } => write!(
                f,
                "invalid date format for {field} `{value}`, expected YYYY-MM-DD"
            ),
        }
    }
}

impl Error for FieldError {}

impl FieldError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Empty { .. } => ErrorKind::EmptyConstraint,
            Self::TooLong { .. } => ErrorKind::LengthConstraint,
            Self::InvalidDate { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// Trims `value` and checks it is non-empty and within [`MAX_TEXT_CHARS`].
pub fn normalize_text(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty { field });
    }
    let actual = trimmed.chars().count();
    if actual > MAX_TEXT_CHARS {
        return Err(FieldError::TooLong {
            field,
            max: MAX_TEXT_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FieldError> {
    let invalid = || FieldError::InvalidDate {
        field,
        value: value.to_string(),
    };
    // chrono tolerates padding, signs and single-digit fields; the wire format does not.
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}
