//! Fanforge Entitlement Core - Access decisions and reconciliation
//!
//! Decides, for a given viewer and a given piece of content, whether it may
//! be shown in full, and re-queries that decision after an asynchronous
//! payment until it reflects the purchase.
//!
//! # Example
//!
//! ```rust,ignore
//! use fanforge_entitlement_core::{resolve, EntitlementService};
//!
//! let service = EntitlementService::new(content, follows, subscriptions, unlocks);
//! let resolved = service.resolve_for(Some(viewer_id), content_unit_id).await?;
//! if resolved.decision.locked {
//!     // serve the preview, offer the purchase path in resolved.decision.reason
//! }
//! ```

pub mod error;
pub mod reconcile;
pub mod resolver;
pub mod service;

pub use error::EntitlementError;
pub use reconcile::{
    spawn_reconcile, EntitlementProbe, ReconcileConfig, ReconcileHandle, ReconcileOutcome,
    ReconcileState, ReconcileTarget,
};
pub use resolver::resolve;
pub use service::{EntitlementService, ResolvedEntitlement};
