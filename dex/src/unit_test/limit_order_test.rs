use amm_math::UDecimal;

use crate::limit_order::{
    decimal_sqrt, validate_commitment_hash, LimitOrderReveal,
};

fn reveal() -> LimitOrderReveal {
    LimitOrderReveal {
        owner: "client|user123".into(),
        selling_token: "GALA".into(),
        buying_token: "ETH".into(),
        selling_amount: UDecimal::new("100").unwrap(),
        buying_minimum: UDecimal::new("10").unwrap(),
        buying_to_selling_ratio: UDecimal::new("0.1").unwrap(),
        expires: 1234567890,
        commitment_nonce: "nonce123".into(),
    }
}

#[test]
fn commitment_string_is_the_documented_encoding() {
    assert_eq!(
        reveal().commitment_string(),
        "client|user123/GALA/ETH/100/10/0.1/1234567890/nonce123"
    );
}

#[test]
fn commitment_hash_is_deterministic_lowercase_hex() {
    let hash = reveal().commitment_hash();
    assert_eq!(
        hash,
        "03d7bf6cb2a6edfa5cfab96fac6e345bb5000e74d1364554da5a3d55c772d2aa"
    );
    // Stable across invocations.
    assert_eq!(hash, reveal().commitment_hash());
}

#[test]
fn every_field_feeds_the_hash() {
    let base = reveal().commitment_hash();
    let mut variants = Vec::new();

    let mut r = reveal();
    r.owner = "client|user124".into();
    variants.push(r.commitment_hash());
    let mut r = reveal();
    r.selling_amount = UDecimal::new("101").unwrap();
    variants.push(r.commitment_hash());
    let mut r = reveal();
    r.buying_to_selling_ratio = UDecimal::new("0.2").unwrap();
    variants.push(r.commitment_hash());
    let mut r = reveal();
    r.expires = 0;
    variants.push(r.commitment_hash());
    let mut r = reveal();
    r.commitment_nonce = "nonce124".into();
    variants.push(r.commitment_hash());

    for v in variants {
        assert_ne!(v, base);
    }
}

#[test]
fn amount_rendering_in_the_commitment_is_canonical() {
    // Trailing zeros and scale differences must not change the hash.
    let mut a = reveal();
    a.selling_amount = UDecimal::new("100.00").unwrap();
    assert_eq!(a.commitment_hash(), reveal().commitment_hash());
}

#[test]
fn hash_format_validation() {
    assert!(validate_commitment_hash(&reveal().commitment_hash()).is_ok());
    assert!(validate_commitment_hash("xyz").is_err());
    assert!(validate_commitment_hash(&"A".repeat(64)).is_err());
    assert!(validate_commitment_hash(&"0".repeat(63)).is_err());
}

#[test]
fn decimal_sqrt_of_perfect_squares() {
    assert_eq!(
        decimal_sqrt(&UDecimal::new("9").unwrap()).unwrap(),
        UDecimal::new("3").unwrap()
    );
    assert_eq!(
        decimal_sqrt(&UDecimal::new("0.25").unwrap()).unwrap(),
        UDecimal::new("0.5").unwrap()
    );
    assert!(decimal_sqrt(&UDecimal::zero()).unwrap().is_zero());
}

#[test]
fn decimal_sqrt_converges_at_twenty_places() {
    let two = decimal_sqrt(&UDecimal::new("2").unwrap()).unwrap();
    assert_eq!(two, UDecimal::new("1.41421356237309504880").unwrap());
    let ten = decimal_sqrt(&UDecimal::new("10").unwrap()).unwrap();
    assert_eq!(ten, UDecimal::new("3.16227766016837933200").unwrap());
}
