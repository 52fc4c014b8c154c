//! Entitlement decision types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContentUnitId, ViewerId};

/// Why a content unit is locked for a viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// Not locked
    None,
    /// Viewer must follow the creator
    FollowRequired,
    /// Viewer must subscribe to the creator
    SubscribeRequired,
    /// Viewer must purchase this specific unit
    PpvRequired,
}

/// Access decision for one (viewer, content unit) pair
///
/// Computed, never stored. Re-evaluated on every render; never memoized
/// across a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDecision {
    /// Whether the content is locked for this viewer
    pub locked: bool,
    /// Reason for the lock
    pub reason: LockReason,
}

impl LockDecision {
    /// An unlocked decision
    pub fn unlocked() -> Self {
        Self {
            locked: false,
            reason: LockReason::None,
        }
    }

    /// A locked decision with the given reason
    pub fn locked(reason: LockReason) -> Self {
        Self {
            locked: true,
            reason,
        }
    }
}

/// Proof that a viewer paid for a specific PPV-locked content unit
///
/// Append-only, at most one per (viewer, content unit). Presence of a
/// matching record is the only valid proof of a PPV unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRecord {
    /// Viewer who purchased access
    pub viewer_id: ViewerId,
    /// Content unit that was unlocked
    pub content_unit_id: ContentUnitId,
    /// When the purchase was confirmed
    pub purchased_at: DateTime<Utc>,
}

/// What the media-serving collaborator should serve for a decision
///
/// The core never handles media bytes; it only instructs the media service
/// whether to sign the original asset or a degraded preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaDirective {
    /// Serve the full asset
    Full,
    /// Serve an obscured/degraded preview
    Preview,
}

impl MediaDirective {
    /// Derive the directive from a lock decision
    pub fn for_decision(decision: &LockDecision) -> Self {
        if decision.locked {
            Self::Preview
        } else {
            Self::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_directive_follows_lock() {
        assert_eq!(
            MediaDirective::for_decision(&LockDecision::unlocked()),
            MediaDirective::Full
        );
        assert_eq!(
            MediaDirective::for_decision(&LockDecision::locked(LockReason::PpvRequired)),
            MediaDirective::Preview
        );
    }
}
