//! Checkout request/response types and amount bounds

use serde::{Deserialize, Serialize};

use crate::{ContentUnitId, CreatorId, IdempotencyKey, TransactionId, TransactionKind};

/// Minimum charge in minor units ($1.00)
///
/// Below this, processing fees eat the transaction.
pub const MIN_CHARGE_MINOR_UNITS: i64 = 100;

/// Maximum tip in minor units ($500), fraud containment
pub const MAX_TIP_MINOR_UNITS: i64 = 50_000;

/// Maximum PPV price in minor units ($1000), fraud containment
pub const MAX_PPV_PRICE_MINOR_UNITS: i64 = 100_000;

/// Validate a charge amount for a transaction kind
///
/// The server is the authority on these bounds; any client-side check is a
/// UX courtesy, not a security boundary. Subscription amounts are priced by
/// the payment backend and carry no caller-supplied amount.
pub fn validate_amount(kind: TransactionKind, amount_minor_units: i64) -> Result<(), AmountError> {
    if amount_minor_units < MIN_CHARGE_MINOR_UNITS {
        return Err(AmountError::BelowMinimum {
            amount: amount_minor_units,
            min: MIN_CHARGE_MINOR_UNITS,
        });
    }
    let max = match kind {
        TransactionKind::Tip => MAX_TIP_MINOR_UNITS,
        TransactionKind::PpvPost | TransactionKind::PpvMessage => MAX_PPV_PRICE_MINOR_UNITS,
        TransactionKind::Subscription => return Err(AmountError::NotApplicable),
    };
    if amount_minor_units > max {
        return Err(AmountError::AboveMaximum {
            amount: amount_minor_units,
            max,
        });
    }
    Ok(())
}

/// Amount validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Amount below the processing-fee floor
    #[error("amount {amount} below minimum {min}")]
    BelowMinimum {
        /// Offered amount
        amount: i64,
        /// Minimum allowed
        min: i64,
    },

    /// Amount above the fraud-containment ceiling
    #[error("amount {amount} above maximum {max}")]
    AboveMaximum {
        /// Offered amount
        amount: i64,
        /// Maximum allowed
        max: i64,
    },

    /// Kind does not take a caller-supplied amount
    #[error("amount not applicable for this kind")]
    NotApplicable,
}

/// Target of a checkout: a creator, optionally a specific content unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTarget {
    /// Creator being paid
    pub creator_id: CreatorId,
    /// Content unit being purchased (PPV kinds)
    pub content_unit_id: Option<ContentUnitId>,
}

/// Checkout session request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// What is being purchased
    pub kind: TransactionKind,
    /// Who/what the purchase targets
    pub target: CheckoutTarget,
    /// Caller-supplied amount in minor units (tips only)
    pub amount_minor_units: Option<i64>,
    /// Idempotency key for this logical attempt
    pub idempotency_key: IdempotencyKey,
}

/// Outcome of a checkout initiation
///
/// `AlreadyUnlocked` is not an error: the caller treats it identically to a
/// successful unlock (skip payment UI, refresh content).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Redirect the viewer to the payment backend
    Redirect {
        /// Hosted checkout URL; the caller performs a full-page redirect
        checkout_url: String,
        /// Transaction created for this attempt
        transaction_id: TransactionId,
    },
    /// The target is already unlocked for this viewer
    AlreadyUnlocked,
}
