//! REST API handlers

pub mod checkout;
pub mod entitlement;
pub mod health;
pub mod webhook;

pub use checkout::*;
pub use entitlement::*;
pub use health::*;
pub use webhook::*;
