//! Validation helpers for DTOs.

use validator::ValidationError;

/// Highest value a single Mölkky throw can score.
pub const MAX_THROW: u32 = 12;

/// Validates that a display name contains something other than whitespace.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that every throw of a history lies in `0..=MAX_THROW`.
pub fn validate_throws(scores: &[u32]) -> Result<(), ValidationError> {
    if let Some(invalid) = scores.iter().find(|&&score| score > MAX_THROW) {
        let mut err = ValidationError::new("throw_range");
        err.message =
            Some(format!("Throws must be between 0 and {MAX_THROW} (got {invalid})").into());
        return Err(err);
    }
    Ok(())
}

/// Validates that the reset score, when set, stays below the winning score.
///
/// # Examples
///
/// ```ignore
/// validate_reset_below_target(50, Some(25)) // Ok
/// validate_reset_below_target(50, None)     // Ok
/// validate_reset_below_target(50, Some(50)) // Err
/// ```
pub fn validate_reset_below_target(target: u32, reset: Option<u32>) -> Result<(), ValidationError> {
    match reset {
        Some(reset) if reset >= target => {
            let mut err = ValidationError::new("reset_not_below_target");
            err.message =
                Some(format!("Reset ({reset}) must be lower than the target ({target})").into());
            Err(err)
        }
        _ => Ok(()),
    }
}
