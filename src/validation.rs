// src/validation.rs
use crate::error::{ClientError, Result};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_SYMBOL_LEN: usize = 10;

pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email.to_string())
    } else {
        Err(ClientError::validation("Please enter a valid email address"))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::validation("Name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Checks a ticker symbol and returns it upper-cased.
pub fn validate_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(ClientError::validation(format!(
            "Symbol must be 1 to {} characters",
            MAX_SYMBOL_LEN
        )));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ClientError::validation(format!(
            "Symbol '{}' contains invalid characters",
            symbol
        )));
    }
    Ok(symbol)
}

pub fn validate_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ClientError::validation("Quantity must be a positive number"));
    }
    Ok(quantity)
}

pub fn validate_search_query(query: &str) -> Result<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ClientError::validation("Enter a symbol or company name to search"));
    }
    Ok(query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert_eq!(validate_email(" jo@example.com ").unwrap(), "jo@example.com");
        assert!(validate_email("jo@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jo@@example.com").is_err());
        assert!(validate_email("jo doe@example.com").is_err());
        assert!(validate_email("jo@example.").is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn symbols_are_upper_cased() {
        assert_eq!(validate_symbol(" brk.b ").unwrap(), "BRK.B");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("AAPL!").is_err());
        assert!(validate_symbol("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn quantities() {
        assert_eq!(validate_quantity(1.5).unwrap(), 1.5);
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-2.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
    }

    #[test]
    fn names_and_queries() {
        assert!(validate_name("   ").is_err());
        assert_eq!(validate_search_query(" apple ").unwrap(), "apple");
        assert!(matches!(
            validate_search_query(""),
            Err(ClientError::Validation(_))
        ));
    }
}
