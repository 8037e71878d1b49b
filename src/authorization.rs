//! Card authorization validation
//!
//! Field-level validation, Luhn checksum, and brand detection for the
//! authorization form. Validation is resolved entirely client-side: the
//! record never reaches the network while the error map is non-empty. The
//! record itself is ephemeral and dropped right after the submission call.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex compiles");
    static ref EXPIRY_RE: Regex = Regex::new(r"^\d{2}/\d{2}$").expect("expiry regex compiles");
}

/// Card network detected from the leading digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardBrand {
    Visa,
    MasterCard,
    AmericanExpress,
    Discover,
    Unknown,
}

impl CardBrand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::MasterCard => "mastercard",
            CardBrand::AmericanExpress => "amex",
            CardBrand::Discover => "discover",
            CardBrand::Unknown => "unknown",
        }
    }

    /// CVV length the network expects
    pub fn cvv_length(&self) -> usize {
        match self {
            CardBrand::AmericanExpress => 4,
            _ => 3,
        }
    }
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strip grouping whitespace from a card number
pub fn sanitize_number(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Luhn checksum
///
/// Reading digits right-to-left, double every second digit, subtract 9 from
/// any doubled value exceeding 9, sum; valid iff the total is divisible by
/// 10. Lengths outside 13-19 digits are rejected outright.
pub fn luhn_valid(number: &str) -> bool {
    let cleaned = sanitize_number(number);
    if cleaned.len() < 13 || cleaned.len() > 19 {
        return false;
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let mut sum = 0u32;
    let mut double = false;
    for c in cleaned.chars().rev() {
        let mut digit = c.to_digit(10).unwrap_or(0);
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
    }

    sum % 10 == 0
}

/// Detect the card brand from its BIN prefix
pub fn detect_brand(number: &str) -> CardBrand {
    let cleaned = sanitize_number(number);
    if cleaned.starts_with('4') {
        CardBrand::Visa
    } else if matches!(cleaned.get(0..2), Some("51" | "52" | "53" | "54" | "55")) {
        CardBrand::MasterCard
    } else if matches!(cleaned.get(0..2), Some("34" | "37")) {
        CardBrand::AmericanExpress
    } else if cleaned.starts_with("6011") || cleaned.starts_with("65") {
        CardBrand::Discover
    } else {
        CardBrand::Unknown
    }
}

/// Parse an `MM/YY` expiry, rejecting anything not exactly in that shape
///
/// Returns (month, four-digit year).
pub fn parse_expiry(input: &str) -> Option<(u32, u32)> {
    if !EXPIRY_RE.is_match(input) {
        return None;
    }
    let (month_str, year_str) = input.split_once('/')?;
    let month: u32 = month_str.parse().ok()?;
    let year: u32 = year_str.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((month, 2000 + year))
}

/// Group a card number for display: 4-4-4-4, or 4-6-5 for Amex
pub fn format_card_number(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    let brand = detect_brand(&cleaned);

    let groups: &[usize] = match brand {
        CardBrand::AmericanExpress => &[4, 6, 5],
        _ => &[4, 4, 4, 4, 3],
    };

    let mut formatted = String::new();
    let mut rest = cleaned.as_str();
    for &len in groups {
        if rest.is_empty() {
            break;
        }
        let take = len.min(rest.len());
        if !formatted.is_empty() {
            formatted.push(' ');
        }
        formatted.push_str(&rest[..take]);
        rest = &rest[take..];
    }
    formatted
}

/// Auto-insert the slash while the user types an expiry
pub fn format_expiry(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(4)
        .collect();
    if cleaned.len() >= 2 {
        format!("{}/{}", &cleaned[..2], &cleaned[2..])
    } else {
        cleaned
    }
}

/// Ephemeral authorization form data; in-memory only, dropped after the
/// single submission call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardAuthorizationRecord {
    pub cardholder_name: String,
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: u32,
    pub cvv: String,
    pub billing_street: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_zip: String,
    pub billing_country: String,
    pub email: String,
    pub phone: String,
    pub signature_typed: String,
    pub ack_authorize: bool,
    pub ack_cardholder: bool,
    pub ack_non_refundable: bool,
    pub ack_passenger_info: bool,
    pub ack_terms: bool,
}

impl CardAuthorizationRecord {
    pub fn brand(&self) -> CardBrand {
        detect_brand(&self.card_number)
    }

    pub fn luhn_valid(&self) -> bool {
        luhn_valid(&self.card_number)
    }

    pub fn last4(&self) -> String {
        let cleaned = sanitize_number(&self.card_number);
        let start = cleaned.len().saturating_sub(4);
        cleaned[start..].to_string()
    }

    /// Uppercased cardholder name as sent to the backend
    pub fn normalized_holder(&self) -> String {
        self.cardholder_name.trim().to_uppercase()
    }
}

/// Validate the record, returning field-name → error-message for every
/// missing or malformed required field
///
/// Field names match the form's wire names; an empty map is the submission
/// gate.
pub fn validate(record: &CardAuthorizationRecord) -> BTreeMap<&'static str, String> {
    let mut errors = BTreeMap::new();

    if record.cardholder_name.trim().is_empty() {
        errors.insert("cardholderName", "Required".to_string());
    }

    let number = sanitize_number(&record.card_number);
    if number.len() < 13 {
        errors.insert("cardNumber", "Invalid card number".to_string());
    } else if !luhn_valid(&number) {
        errors.insert("cardNumber", "Invalid card number".to_string());
    }

    if !(1..=12).contains(&record.expiry_month) || record.expiry_year < 2000 {
        errors.insert("expiry", "Invalid".to_string());
    }

    let expected_cvv = record.brand().cvv_length();
    if record.cvv.len() != expected_cvv || !record.cvv.chars().all(|c| c.is_ascii_digit()) {
        errors.insert("cvv", "Invalid".to_string());
    }

    if record.billing_street.trim().is_empty() {
        errors.insert("billingStreet", "Required".to_string());
    }
    if record.billing_city.trim().is_empty() {
        errors.insert("billingCity", "Required".to_string());
    }
    if record.billing_state.trim().is_empty() {
        errors.insert("billingState", "Required".to_string());
    }
    if record.billing_zip.trim().is_empty() {
        errors.insert("billingZip", "Required".to_string());
    }

    if record.email.trim().is_empty() || !EMAIL_RE.is_match(record.email.trim()) {
        errors.insert("email", "Invalid email".to_string());
    }
    if record.phone.trim().is_empty() {
        errors.insert("phone", "Required".to_string());
    }
    if record.signature_typed.trim().is_empty() {
        errors.insert("signatureTyped", "Required".to_string());
    }

    if !record.ack_authorize {
        errors.insert("ackAuthorize", "Required".to_string());
    }
    if !record.ack_cardholder {
        errors.insert("ackCardholder", "Required".to_string());
    }
    if !record.ack_non_refundable {
        errors.insert("ackNonRefundable", "Required".to_string());
    }
    if !record.ack_passenger_info {
        errors.insert("ackPassengerInfo", "Required".to_string());
    }
    if !record.ack_terms {
        errors.insert("ackTerms", "Required".to_string());
    }

    errors
}
