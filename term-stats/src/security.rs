//! Identifier and argument validation for generated query text.
//!
//! Column and dataset names end up interpolated into SQL. Quoted names may
//! hold any characters and have embedded quotes doubled; names placed in
//! query text unquoted must match a conservative identifier grammar.

use crate::error::{Result, StatsError};
use once_cell::sync::Lazy;
use regex::Regex;

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and escapes a single SQL identifier such as a column name.
    ///
    /// Applies the strict identifier grammar of [`SqlSecurity::validate_identifier`].
    ///
    /// # Examples
    /// ```rust
    /// use term_stats::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("age").unwrap(), "\"age\"");
    /// assert!(SqlSecurity::escape_identifier("id; DROP TABLE users--").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        Self::quote_identifier(identifier, '"')
    }

    /// Wraps a name in `quote` as a single identifier, doubling any embedded
    /// quote characters.
    ///
    /// Any characters are allowed inside the quotes, so names such as
    /// `unit price` or `Größe` survive; only empty, oversized and NUL-bearing
    /// names are rejected.
    pub fn quote_identifier(identifier: &str, quote: char) -> Result<String> {
        Self::validate_quotable(identifier)?;

        let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
        Ok(format!("{quote}{escaped}{quote}"))
    }

    /// Quotes a possibly qualified name (`schema.table`) segment by segment.
    pub fn quote_qualified(identifier: &str, quote: char) -> Result<String> {
        Self::validate_quotable(identifier)?;

        identifier
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(StatsError::Security(format!(
                        "Empty name segment in qualified identifier '{identifier}'"
                    )))
                } else {
                    Self::quote_identifier(segment, quote)
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(|segments| segments.join("."))
    }

    /// Checks the constraints a name must meet to be placed inside quotes.
    pub fn validate_quotable(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(StatsError::Security(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > 128 {
            return Err(StatsError::Security(
                "SQL identifier too long (max 128 characters)".to_string(),
            ));
        }

        if identifier.contains('\0') {
            return Err(StatsError::Security(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates a SQL identifier against the strict unquoted grammar.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        Self::validate_quotable(identifier)?;

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(StatsError::Security(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, underscores, and dots"
            )));
        }

        Ok(())
    }
}

/// Validation of numeric arguments supplied by callers.
pub struct InputValidator;

impl InputValidator {
    /// Validates that a percentile cut point is a finite value in `[0, 1]`.
    pub fn validate_percentile(value: f64) -> Result<()> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(StatsError::invalid_argument(format!(
                "percentile must be within [0, 1], got {value}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert_eq!(SqlSecurity::escape_identifier("age").unwrap(), "\"age\"");
        assert_eq!(
            SqlSecurity::escape_identifier("_private1").unwrap(),
            "\"_private1\""
        );
        assert!(SqlSecurity::validate_identifier("sales.orders").is_ok());
        assert_eq!(SqlSecurity::quote_identifier("age", '`').unwrap(), "`age`");
    }

    #[test]
    fn test_quote_identifier_accepts_free_form_names() {
        assert_eq!(
            SqlSecurity::quote_identifier("unit price", '"').unwrap(),
            "\"unit price\""
        );
        assert_eq!(SqlSecurity::quote_identifier("col-1", '`').unwrap(), "`col-1`");
        assert_eq!(SqlSecurity::quote_identifier("Größe", '"').unwrap(), "\"Größe\"");
        assert_eq!(
            SqlSecurity::quote_identifier("x\" FROM t; --", '"').unwrap(),
            "\"x\"\" FROM t; --\""
        );
        assert_eq!(SqlSecurity::quote_identifier("a`b", '`').unwrap(), "`a``b`");

        assert!(SqlSecurity::quote_identifier("", '"').is_err());
        assert!(SqlSecurity::quote_identifier("a\0b", '"').is_err());
        assert!(SqlSecurity::quote_identifier(&"x".repeat(129), '"').is_err());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(SqlSecurity::escape_identifier("").is_err());
        assert!(SqlSecurity::escape_identifier("   ").is_err());
        assert!(SqlSecurity::escape_identifier("1col").is_err());
        assert!(SqlSecurity::escape_identifier("a b").is_err());
        assert!(SqlSecurity::escape_identifier("a\0b").is_err());
        assert!(SqlSecurity::escape_identifier("x) FROM t; --").is_err());
        assert!(SqlSecurity::escape_identifier(&"long_name_".repeat(20)).is_err());
    }

    #[test]
    fn test_quote_qualified() {
        assert_eq!(
            SqlSecurity::quote_qualified("sales.orders", '"').unwrap(),
            "\"sales\".\"orders\""
        );
        assert_eq!(SqlSecurity::quote_qualified("orders", '`').unwrap(), "`orders`");
        assert!(SqlSecurity::quote_qualified("sales..orders", '"').is_err());
        assert_eq!(
            SqlSecurity::quote_qualified("my sales.Orders", '"').unwrap(),
            "\"my sales\".\"Orders\""
        );
    }

    #[test]
    fn test_validate_percentile() {
        assert!(InputValidator::validate_percentile(0.0).is_ok());
        assert!(InputValidator::validate_percentile(0.5).is_ok());
        assert!(InputValidator::validate_percentile(1.0).is_ok());
        assert!(InputValidator::validate_percentile(-0.1).is_err());
        assert!(InputValidator::validate_percentile(1.5).is_err());
        assert!(InputValidator::validate_percentile(f64::NAN).is_err());
        assert!(InputValidator::validate_percentile(f64::INFINITY).is_err());
    }
}
