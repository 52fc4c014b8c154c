//! Input validation tests
//!
//! Tests for security-critical input validation in entitlement-api.

use fanforge_types::{
    validate_amount, AmountError, ContentUnitId, IdempotencyKey, TransactionKind, ViewerId,
    MAX_PPV_PRICE_MINOR_UNITS, MAX_TIP_MINOR_UNITS, MIN_CHARGE_MINOR_UNITS,
};

// ============================================================================
// Identifier Parsing
// ============================================================================

#[test]
fn test_valid_uuid_parses() {
    assert!(ContentUnitId::parse("c56a4180-65aa-42ec-a945-5fd21dec0538").is_ok());
    assert!(ViewerId::parse("c56a4180-65aa-42ec-a945-5fd21dec0538").is_ok());
}

#[test]
fn test_empty_id_rejected() {
    assert!(ContentUnitId::parse("").is_err());
}

#[test]
fn test_non_uuid_id_rejected() {
    assert!(ContentUnitId::parse("not-a-uuid").is_err());
    assert!(ContentUnitId::parse("12345").is_err());
}

#[test]
fn test_sql_injection_in_id_rejected() {
    assert!(ContentUnitId::parse("'; DROP TABLE content_units; --").is_err());
}

#[test]
fn test_overlong_id_rejected() {
    let long = "c56a4180-65aa-42ec-a945-5fd21dec0538".repeat(10);
    assert!(ContentUnitId::parse(&long).is_err());
}

#[test]
fn test_idempotency_key_must_be_uuid() {
    assert!(IdempotencyKey::parse("c56a4180-65aa-42ec-a945-5fd21dec0538").is_ok());
    assert!(IdempotencyKey::parse("retry-attempt-1").is_err());
}

// ============================================================================
// Amount Bounds - Server Is the Authority
// ============================================================================

#[test]
fn test_tip_at_bounds_accepted() {
    assert!(validate_amount(TransactionKind::Tip, MIN_CHARGE_MINOR_UNITS).is_ok());
    assert!(validate_amount(TransactionKind::Tip, MAX_TIP_MINOR_UNITS).is_ok());
}

#[test]
fn test_tip_below_minimum_rejected() {
    assert!(matches!(
        validate_amount(TransactionKind::Tip, MIN_CHARGE_MINOR_UNITS - 1),
        Err(AmountError::BelowMinimum { .. })
    ));
}

#[test]
fn test_tip_above_maximum_rejected() {
    assert!(matches!(
        validate_amount(TransactionKind::Tip, MAX_TIP_MINOR_UNITS + 1),
        Err(AmountError::AboveMaximum { .. })
    ));
}

#[test]
fn test_zero_and_negative_amounts_rejected() {
    assert!(validate_amount(TransactionKind::Tip, 0).is_err());
    assert!(validate_amount(TransactionKind::Tip, -100).is_err());
    assert!(validate_amount(TransactionKind::PpvPost, -1).is_err());
}

#[test]
fn test_ppv_at_bounds_accepted() {
    assert!(validate_amount(TransactionKind::PpvPost, MIN_CHARGE_MINOR_UNITS).is_ok());
    assert!(validate_amount(TransactionKind::PpvPost, MAX_PPV_PRICE_MINOR_UNITS).is_ok());
    assert!(validate_amount(TransactionKind::PpvMessage, MAX_PPV_PRICE_MINOR_UNITS).is_ok());
}

#[test]
fn test_ppv_above_maximum_rejected() {
    assert!(matches!(
        validate_amount(TransactionKind::PpvPost, MAX_PPV_PRICE_MINOR_UNITS + 1),
        Err(AmountError::AboveMaximum { .. })
    ));
}

#[test]
fn test_extreme_amounts_rejected() {
    assert!(validate_amount(TransactionKind::Tip, i64::MAX).is_err());
    assert!(validate_amount(TransactionKind::Tip, i64::MIN).is_err());
}

#[test]
fn test_subscription_takes_no_caller_amount() {
    assert!(matches!(
        validate_amount(TransactionKind::Subscription, 999),
        Err(AmountError::NotApplicable)
    ));
}
