use thiserror::Error;

use protectme_shared::constants::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Check a submitted report and return its trimmed title and description.
///
/// Lengths are counted in characters on the untrimmed input.
pub fn validate_report(title: &str, description: &str) -> Result<(String, String), ValidationError> {
    let title = check_field("Title", title, MAX_TITLE_LEN)?;
    let description = check_field("Description", description, MAX_DESCRIPTION_LEN)?;
    Ok((title, description))
}

fn check_field(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(trimmed.to_string())
}
