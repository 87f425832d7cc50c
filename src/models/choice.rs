// src/models/choice.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const CHOICE_COLUMNS: &str = "id, question_id, choice_text, option_code";

/// Represents the 'choices' table in the database.
/// `option_code` is unique within its question.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    /// Lowercase single-letter option code ("a", "b", ...).
    pub option_code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChoiceRequest {
    pub question_id: i64,
    #[validate(length(min = 1, max = 2000))]
    pub choice_text: String,
    #[validate(custom(function = validate_option_code))]
    pub option_code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateChoiceRequest {
    #[validate(length(min = 1, max = 2000))]
    pub choice_text: Option<String>,
    #[validate(custom(function = validate_option_code))]
    pub option_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceListParams {
    pub question_id: Option<i64>,
}

/// Option codes are a single ASCII letter.
fn validate_option_code(code: &str) -> Result<(), validator::ValidationError> {
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(()),
        _ => Err(validator::ValidationError::new("option_code_must_be_single_letter")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_code_accepts_single_letters_only() {
        assert!(validate_option_code("a").is_ok());
        assert!(validate_option_code("D").is_ok());
        assert!(validate_option_code("").is_err());
        assert!(validate_option_code("ab").is_err());
        assert!(validate_option_code("1").is_err());
    }
}
