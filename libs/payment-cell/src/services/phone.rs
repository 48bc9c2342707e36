use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PaymentError;

const COUNTRY_CODE: &str = "254";

static MSISDN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^254\d{9}$").expect("static pattern"));

/// Normalises a Kenyan mobile number to `254XXXXXXXXX`.
///
/// Whitespace, `+` and `-` are stripped. A leading `0` is replaced by the
/// country code, a number already starting with `254` is kept, and anything
/// else is prefixed with `254`.
pub fn normalize_phone(input: &str) -> Result<String, PaymentError> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '+' && *c != '-')
        .collect();

    let normalized = if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", COUNTRY_CODE, rest)
    } else if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    };

    if MSISDN_PATTERN.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(PaymentError::InvalidPhone(input.to_string()))
    }
}
