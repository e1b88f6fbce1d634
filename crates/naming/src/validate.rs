use lazy_static::lazy_static;
use regex::Regex;

use crate::error::NameError;

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap();
}

/// Enforces `^[a-z_][a-z0-9_]*$` on an already-sanitized name.
pub fn validate(name: &str) -> Result<(), NameError> {
    validate_with_context(name, "name")
}

pub fn validate_with_context(name: &str, context: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty {
            context: context.to_string(),
        });
    }
    if !IDENT_RE.is_match(name) {
        return Err(NameError::InvalidForm {
            context: context.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_identifiers() {
        assert!(validate("orders_hist").is_ok());
        assert!(validate("_internal").is_ok());
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(validate("2024_orders").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            validate(""),
            Err(NameError::Empty {
                context: "name".to_string()
            })
        );
    }

    #[test]
    fn rejects_uppercase() {
        assert!(validate("Orders").is_err());
    }
}
