//! Fanforge Types - Shared domain types
//!
//! This crate contains domain types used across fanforge services:
//! - Content gating rules (visibility, PPV locks)
//! - Viewer/creator relationships and subscriptions
//! - Entitlement decisions and unlock records
//! - Payment transactions and checkout contracts

pub mod checkout;
pub mod content;
pub mod entitlement;
pub mod ids;
pub mod relationship;
pub mod transaction;

pub use checkout::*;
pub use content::*;
pub use entitlement::*;
pub use ids::*;
pub use relationship::*;
pub use transaction::*;
