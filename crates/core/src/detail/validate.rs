//! Client-side validation run before anything is sent to the server.

use thiserror::Error;

/// Minimum comment length in characters (after trimming).
pub const COMMENT_MIN_CHARS: usize = 10;
/// Maximum comment length in characters.
pub const COMMENT_MAX_CHARS: usize = 2000;
/// Maximum status-change reason length in characters.
pub const REASON_MAX_CHARS: usize = 500;

/// Input rejected before any network call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("comment must be at least {min} characters (got {actual})")]
    CommentTooShort { min: usize, actual: usize },

    #[error("comment must be at most {max} characters (got {actual})")]
    CommentTooLong { max: usize, actual: usize },

    #[error("reason must be at most {max} characters (got {actual})")]
    ReasonTooLong { max: usize, actual: usize },

    #[error("no status selected")]
    NoStatusSelected,
}

/// Validate a comment and return its trimmed text.
pub fn validate_comment(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    let actual = trimmed.chars().count();
    if actual < COMMENT_MIN_CHARS {
        return Err(ValidationError::CommentTooShort {
            min: COMMENT_MIN_CHARS,
            actual,
        });
    }
    if actual > COMMENT_MAX_CHARS {
        return Err(ValidationError::CommentTooLong {
            max: COMMENT_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed)
}

/// Validate a status-change reason. Blank reasons become `None`.
pub fn validate_reason(reason: &str) -> Result<Option<&str>, ValidationError> {
    let trimmed = reason.trim();
    let actual = trimmed.chars().count();
    if actual > REASON_MAX_CHARS {
        return Err(ValidationError::ReasonTooLong {
            max: REASON_MAX_CHARS,
            actual,
        });
    }
    Ok((!trimmed.is_empty()).then_some(trimmed))
}
