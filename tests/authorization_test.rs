//! Authorization validator contract tests: Luhn vectors, brand detection,
//! expiry shape, and the submission gate.

use verishot::authorization::{
    detect_brand, luhn_valid, parse_expiry, validate, CardAuthorizationRecord, CardBrand,
};

fn filled_record() -> CardAuthorizationRecord {
    CardAuthorizationRecord {
        cardholder_name: "Jane Doe".to_string(),
        card_number: "4242424242424242".to_string(),
        expiry_month: 11,
        expiry_year: 2028,
        cvv: "123".to_string(),
        billing_street: "100 Main St".to_string(),
        billing_city: "Miami".to_string(),
        billing_state: "FL".to_string(),
        billing_zip: "33101".to_string(),
        billing_country: "US".to_string(),
        email: "jane@example.com".to_string(),
        phone: "+1 555 123 4567".to_string(),
        signature_typed: "Jane Doe".to_string(),
        ack_authorize: true,
        ack_cardholder: true,
        ack_non_refundable: true,
        ack_passenger_info: true,
        ack_terms: true,
    }
}

#[test]
fn test_luhn_accepts_valid_test_number() {
    assert!(luhn_valid("4242424242424242"));
}

#[test]
fn test_luhn_rejects_checksum_failure() {
    assert!(!luhn_valid("4111111111111112"));
}

#[test]
fn test_brand_detection_table() {
    assert_eq!(detect_brand("4242424242424242"), CardBrand::Visa);
    assert_eq!(detect_brand("5500000000000004"), CardBrand::MasterCard);
    assert_eq!(detect_brand("340000000000009"), CardBrand::AmericanExpress);
    assert_eq!(detect_brand("6011000000000004"), CardBrand::Discover);
    assert_eq!(detect_brand("1234567890123456"), CardBrand::Unknown);
}

#[test]
fn test_expiry_requires_exact_shape() {
    assert_eq!(parse_expiry("09/29"), Some((9, 2029)));
    assert_eq!(parse_expiry("9/29"), None);
    assert_eq!(parse_expiry("09-29"), None);
    assert_eq!(parse_expiry("09/2029"), None);
}

#[test]
fn test_complete_record_passes_the_gate() {
    assert!(validate(&filled_record()).is_empty());
}

#[test]
fn test_every_missing_acknowledgment_blocks() {
    for flag in 0..5 {
        let mut record = filled_record();
        match flag {
            0 => record.ack_authorize = false,
            1 => record.ack_cardholder = false,
            2 => record.ack_non_refundable = false,
            3 => record.ack_passenger_info = false,
            _ => record.ack_terms = false,
        }
        assert_eq!(validate(&record).len(), 1, "flag {} not enforced", flag);
    }
}

#[test]
fn test_short_card_number_blocks() {
    let mut record = filled_record();
    record.card_number = "424242424242".to_string(); // 12 digits
    assert!(validate(&record).contains_key("cardNumber"));
}

#[test]
fn test_cvv_length_follows_brand() {
    let mut record = filled_record();
    record.card_number = "370000000000002".to_string();
    record.cvv = "123".to_string();
    assert!(validate(&record).contains_key("cvv"));

    record.cvv = "4321".to_string();
    assert!(validate(&record).is_empty());
}

#[test]
fn test_record_helpers() {
    let record = filled_record();
    assert_eq!(record.brand(), CardBrand::Visa);
    assert!(record.luhn_valid());
    assert_eq!(record.last4(), "4242");
    assert_eq!(record.normalized_holder(), "JANE DOE");
}
