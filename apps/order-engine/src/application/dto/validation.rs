//! Input validation for textual decimals.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::order_execution::pricing;
use crate::error::EngineError;

fn decimal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"^[0-9]{1,20}(\.[0-9]{1,20})?$").expect("valid regex"))
}

/// Parse a positive decimal written as plain digits with an optional
/// fraction (`"0.001"`, `"42"`).
///
/// # Errors
///
/// Returns a validation error for any other shape, or for zero.
pub fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, EngineError> {
    let raw = raw.trim();
    if !decimal_regex().is_match(raw) {
        return Err(EngineError::validation(format!(
            "{field} must be a decimal number, got '{raw}'"
        )));
    }
    let value = Decimal::from_str(raw)
        .map_err(|e| EngineError::validation(format!("{field}: {e}")))?;
    if value.is_zero() {
        return Err(EngineError::validation(format!("{field} must not be zero")));
    }
    Ok(value)
}

/// Parse a percentage in `(0, 100]`.
///
/// # Errors
///
/// Returns a validation error if malformed or out of range.
pub fn parse_percent(field: &str, raw: &str) -> Result<Decimal, EngineError> {
    let value = parse_decimal(field, raw)?;
    pricing::check_percent(field, value)?;
    Ok(value)
}

/// Parse an optional field; empty strings count as absent.
pub(crate) fn parse_optional(
    field: &str,
    raw: Option<&str>,
    parse: fn(&str, &str) -> Result<Decimal, EngineError>,
) -> Result<Option<Decimal>, EngineError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse(field, raw).map(Some),
    }
}
