//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted justification, counted in characters.
pub const JUSTIFICATION_MAX_CHARS: usize = 160;

/// Validates that a quest identifier is 1 to 64 lowercase alphanumeric or hyphen characters.
///
/// # Examples
///
/// ```ignore
/// validate_quest_id("stranded-expedition") // Ok
/// validate_quest_id("Stranded")            // Err - uppercase
/// validate_quest_id("")                    // Err - empty
/// ```
pub fn validate_quest_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > 64 {
        let mut err = ValidationError::new("quest_id_length");
        err.message =
            Some(format!("Quest ID must be 1 to 64 characters (got {})", id.len()).into());
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        let mut err = ValidationError::new("quest_id_format");
        err.message =
            Some("Quest ID must contain only lowercase alphanumerics and hyphens".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a country code is exactly two uppercase ASCII letters.
pub fn validate_country(code: &str) -> Result<(), ValidationError> {
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase()) {
        return Ok(());
    }

    let mut err = ValidationError::new("country_format");
    err.message = Some("Country must be a two-letter uppercase ISO 3166 code".into());
    Err(err)
}

/// Validates that a justification fits the character budget.
///
/// Length is counted in characters, not bytes, so multi-byte scripts get the
/// same budget as ASCII.
pub fn validate_justification(text: &str) -> Result<(), ValidationError> {
    let chars = text.chars().count();
    if chars > JUSTIFICATION_MAX_CHARS {
        let mut err = ValidationError::new("justification_length");
        err.message = Some(
            format!(
                "Justification must be at most {JUSTIFICATION_MAX_CHARS} characters (got {chars})"
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quest_id_valid() {
        assert!(validate_quest_id("stranded-expedition").is_ok());
        assert!(validate_quest_id("quest-2").is_ok());
        assert!(validate_quest_id("a").is_ok());
    }

    #[test]
    fn test_validate_quest_id_invalid() {
        assert!(validate_quest_id("").is_err()); // empty
        assert!(validate_quest_id("Stranded").is_err()); // uppercase
        assert!(validate_quest_id("quest one").is_err()); // space
        assert!(validate_quest_id(&"x".repeat(65)).is_err()); // too long
    }

    #[test]
    fn test_validate_country() {
        assert!(validate_country("FR").is_ok());
        assert!(validate_country("US").is_ok());
        assert!(validate_country("fr").is_err()); // lowercase
        assert!(validate_country("FRA").is_err()); // alpha-3
        assert!(validate_country("F1").is_err()); // digit
    }

    #[test]
    fn test_validate_justification_counts_characters() {
        assert!(validate_justification("").is_ok());
        assert!(validate_justification(&"x".repeat(160)).is_ok());
        assert!(validate_justification(&"x".repeat(161)).is_err());
        // 160 multi-byte characters stay within budget even at 480 bytes
        assert!(validate_justification(&"é".repeat(160)).is_ok());
    }
}
