//! Payment transaction types

use serde::{Deserialize, Serialize};

/// What a transaction pays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Recurring subscription to a creator
    Subscription,
    /// Single-unit purchase of a PPV-locked post
    PpvPost,
    /// Single-unit purchase of a PPV-locked message attachment
    PpvMessage,
    /// One-off tip
    Tip,
}

impl TransactionKind {
    /// String form used in storage and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::PpvPost => "ppv_post",
            Self::PpvMessage => "ppv_message",
            Self::Tip => "tip",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(Self::Subscription),
            "ppv_post" => Ok(Self::PpvPost),
            "ppv_message" => Ok(Self::PpvMessage),
            "tip" => Ok(Self::Tip),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// Transaction lifecycle status
///
/// Created in `RequiresPayment` by the checkout initiator; reaches a
/// terminal state only via the payment backend's asynchronous notification,
/// never by direct client action. `Refunded`/`Disputed` are reachable only
/// from `Succeeded`, out of band of the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting payment confirmation from the backend
    RequiresPayment,
    /// Payment confirmed
    Succeeded,
    /// Checkout abandoned or session expired
    Canceled,
    /// Refunded after success
    Refunded,
    /// Disputed after success
    Disputed,
}

impl TransactionStatus {
    /// String form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiresPayment => "requires_payment",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Refunded => "refunded",
            Self::Disputed => "disputed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requires_payment" => Ok(Self::RequiresPayment),
            "succeeded" => Ok(Self::Succeeded),
            "canceled" => Ok(Self::Canceled),
            "refunded" => Ok(Self::Refunded),
            "disputed" => Ok(Self::Disputed),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}
