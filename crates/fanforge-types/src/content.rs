//! Content gating types

use serde::{Deserialize, Serialize};

/// Audience a content unit is visible to
///
/// Fixed at content-creation time and immutable thereafter unless explicitly
/// edited by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentVisibility {
    /// Visible to everyone, including anonymous viewers
    Public,
    /// Visible to followers of the creator
    Followers,
    /// Visible to active subscribers of the creator
    Subscribers,
}

impl ContentVisibility {
    /// String form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Followers => "followers",
            Self::Subscribers => "subscribers",
        }
    }
}

impl std::fmt::Display for ContentVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContentVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "followers" => Ok(Self::Followers),
            "subscribers" => Ok(Self::Subscribers),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

/// Pay-per-view lock on a content unit
///
/// At most one per content unit. A unit with no lock is not individually
/// sold; its access is governed solely by [`ContentVisibility`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpvLock {
    /// Price in minor units (e.g. cents), strictly positive
    pub price_minor_units: i64,
    /// ISO 4217 currency code (lowercase, e.g. "usd")
    pub currency: String,
}

impl PpvLock {
    /// Create a new PPV lock
    pub fn new(price_minor_units: i64, currency: impl Into<String>) -> Self {
        Self {
            price_minor_units,
            currency: currency.into(),
        }
    }

    /// Validate the lock at content-creation time
    ///
    /// The entitlement resolver never validates; malformed locks are rejected
    /// here by the content-authoring path before they are stored.
    pub fn validate(&self) -> Result<(), PpvLockError> {
        if self.price_minor_units <= 0 {
            return Err(PpvLockError::NonPositivePrice(self.price_minor_units));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(PpvLockError::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

/// PPV lock validation error
#[derive(Debug, thiserror::Error)]
pub enum PpvLockError {
    /// Price must be strictly positive
    #[error("ppv price must be positive, got {0}")]
    NonPositivePrice(i64),

    /// Currency must be a lowercase ISO 4217 code
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),
}
