//! Identifier validation shared by the admin facilities.

use crate::domain::error::GateError;

/// Plugin and instance identifiers are restricted to non-empty ASCII
/// alphanumerics. Validation runs before any state is touched.
///
/// # Errors
///
/// `Validation` naming the offending identifier.
pub fn validate_admin_id(id: &str) -> Result<(), GateError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GateError::Validation(format!(
            "identifier must be non-empty alphanumeric: {id:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_admin_id;
    use crate::domain::error::GateError;

    #[test]
    fn accepts_alphanumeric_ids() {
        assert!(validate_admin_id("Foo").is_ok());
        assert!(validate_admin_id("log2").is_ok());
    }

    #[test]
    fn rejects_empty_and_punctuated_ids() {
        assert!(matches!(validate_admin_id(""), Err(GateError::Validation(_))));
        assert!(matches!(validate_admin_id("Foo!"), Err(GateError::Validation(_))));
        assert!(matches!(validate_admin_id("a b"), Err(GateError::Validation(_))));
        assert!(matches!(validate_admin_id("a.b"), Err(GateError::Validation(_))));
    }
}
