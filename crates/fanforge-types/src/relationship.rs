//! Viewer/creator relationship types

use serde::{Deserialize, Serialize};

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No subscription exists
    None,
    /// Subscription is active
    Active,
    /// In trial period
    Trialing,
    /// Payment is past due
    PastDue,
    /// Subscription was canceled
    Canceled,
}

impl SubscriptionStatus {
    /// Whether this status satisfies a subscribers-only gate
    ///
    /// Only `Active` and `Trialing` qualify. A canceled-but-not-yet-expired
    /// subscription still reports `Active` with `cancel_at_period_end` set,
    /// so it passes here until the backend flips the status at period end.
    pub fn satisfies_subscriber_gate(self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }

    /// String form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "active" => Ok(Self::Active),
            "trialing" => Ok(Self::Trialing),
            "past_due" => Ok(Self::PastDue),
            "canceled" => Ok(Self::Canceled),
            other => Err(format!("unknown subscription status: {other}")),
        }
    }
}

/// A viewer's relationship to a creator, recomputed on demand
///
/// Never cached beyond a single page view. Expiry of a pending cancellation
/// is a server-side fact; clients must not compute it from a cached
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerRelationship {
    /// Whether the viewer follows the creator
    pub is_following: bool,
    /// Subscription status between viewer and creator
    pub subscription_status: SubscriptionStatus,
    /// Whether an active subscription is set to cancel at period end
    pub subscription_cancel_at_period_end: bool,
}

impl ViewerRelationship {
    /// Relationship for an anonymous (unauthenticated) viewer
    pub fn anonymous() -> Self {
        Self {
            is_following: false,
            subscription_status: SubscriptionStatus::None,
            subscription_cancel_at_period_end: false,
        }
    }
}

impl Default for ViewerRelationship {
    fn default() -> Self {
        Self::anonymous()
    }
}
