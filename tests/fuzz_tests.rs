//! Fuzz-style tests using proptest
//!
//! These provide fuzz-like coverage without requiring nightly Rust or
//! cargo-fuzz: the validators and formatters must never panic on arbitrary
//! input, and the Luhn check digit must behave like a checksum.

use proptest::prelude::*;

use verishot::authorization::{
    detect_brand, format_card_number, format_expiry, luhn_valid, parse_expiry, sanitize_number,
    CardBrand,
};
use verishot::quality::FrameQualityScorer;
use verishot::types::QualityLevel;

proptest! {
    /// Validators accept arbitrary garbage without panicking
    #[test]
    fn fuzz_luhn_never_panics(input in "\\PC*") {
        let _ = luhn_valid(&input);
    }

    #[test]
    fn fuzz_brand_detection_never_panics(input in "\\PC*") {
        let _ = detect_brand(&input);
    }

    #[test]
    fn fuzz_expiry_parse_never_panics(input in "\\PC*") {
        let _ = parse_expiry(&input);
    }

    #[test]
    fn fuzz_formatters_never_panic(input in "\\PC*") {
        let _ = format_card_number(&input);
        let _ = format_expiry(&input);
        let _ = sanitize_number(&input);
    }

    /// For any digit body, exactly one check digit completes a valid number
    #[test]
    fn luhn_has_exactly_one_check_digit(
        body in proptest::collection::vec(0u8..10, 12..=18)
    ) {
        let body: String = body.iter().map(|d| char::from(b'0' + d)).collect();
        let valid_count = (0..10)
            .filter(|d| luhn_valid(&format!("{}{}", body, d)))
            .count();
        prop_assert_eq!(valid_count, 1);
    }

    /// Grouping whitespace never changes the verdict
    #[test]
    fn luhn_ignores_grouping(
        body in proptest::collection::vec(0u8..10, 13..=19)
    ) {
        let plain: String = body.iter().map(|d| char::from(b'0' + d)).collect();
        let grouped: String = plain
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(luhn_valid(&plain), luhn_valid(&grouped));
    }

    /// Any number starting with 4 is Visa
    #[test]
    fn brand_four_prefix_is_visa(rest in "[0-9]{0,18}") {
        prop_assert_eq!(detect_brand(&format!("4{}", rest)), CardBrand::Visa);
    }

    /// Expiry formatting emits at most MM/YY
    #[test]
    fn expiry_format_is_bounded(input in "\\PC*") {
        let formatted = format_expiry(&input);
        prop_assert!(formatted.len() <= 5);
    }

    /// Every luminance classifies into a real level
    #[test]
    fn classification_is_total(luminance in 0.0f32..=255.0) {
        let scorer = FrameQualityScorer::default();
        let level = scorer.classify(luminance);
        prop_assert!(matches!(
            level,
            QualityLevel::Poor | QualityLevel::Good | QualityLevel::Perfect
        ));
    }
}
