//! Stripe webhook handling
//!
//! Webhooks are the authoritative confirmation path: a transaction only
//! reaches `succeeded`, and an unlock record only exists, once the payment
//! backend has said so here. The success redirect proves nothing.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, info, instrument, warn};

use fanforge_db::{
    CreateSubscription, CreateUnlock, SubscriptionRepository, TransactionRepository,
    UnlockRepository,
};
use fanforge_types::{SubscriptionId, SubscriptionStatus, TransactionStatus};

use crate::error::BillingError;
use crate::stripe::StripeSubscription;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed (payment collected)
    CheckoutSessionCompleted,
    /// Checkout session expired without payment
    CheckoutSessionExpired,
    /// Customer subscription created
    CustomerSubscriptionCreated,
    /// Customer subscription updated
    CustomerSubscriptionUpdated,
    /// Customer subscription deleted
    CustomerSubscriptionDeleted,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "checkout.session.expired" => Self::CheckoutSessionExpired,
            "customer.subscription.created" => Self::CustomerSubscriptionCreated,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Event data
    pub data: WebhookEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Webhook event data
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session data
    CheckoutSession(CheckoutSessionData),
    /// Subscription data
    Subscription(SubscriptionData),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Checkout session event data
#[derive(Debug, Clone)]
pub struct CheckoutSessionData {
    /// Session ID
    pub session_id: String,
    /// Subscription ID, for subscription-mode sessions
    pub subscription_id: Option<String>,
}

/// Subscription event data
#[derive(Debug, Clone)]
pub struct SubscriptionData {
    /// Provider subscription ID
    pub subscription_id: String,
    /// Status as reported by the provider
    pub status: String,
    /// Current period start
    pub period_start: DateTime<Utc>,
    /// Current period end
    pub period_end: DateTime<Utc>,
    /// Whether it cancels at period end
    pub cancel_at_period_end: bool,
    /// Viewer from session metadata
    pub viewer_id: Option<String>,
    /// Creator from session metadata
    pub creator_id: Option<String>,
}

/// Webhook handler for verifying and parsing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify_signature(payload, signature)?;

        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        let data = Self::parse_event_data(&event_type, raw_event.data.object)?;

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Verify Stripe webhook signature
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), BillingError> {
        // Parse signature header: t=timestamp,v1=signature
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BillingError::WebhookError("Missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            BillingError::WebhookError("Missing signature".to_string())
        })?;

        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| BillingError::WebhookError("Invalid payload encoding".to_string()))?
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(BillingError::WebhookError(
                "Signature verification failed".to_string(),
            ));
        }

        // Check timestamp freshness (within 5 minutes)
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BillingError::WebhookError("Invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > 300 {
            warn!(timestamp = ts, now = now, "Webhook timestamp too old");
            return Err(BillingError::WebhookError("Timestamp too old".to_string()));
        }

        Ok(())
    }

    /// Parse event data based on type
    fn parse_event_data(
        event_type: &WebhookEventType,
        object: serde_json::Value,
    ) -> Result<WebhookEventData, BillingError> {
        match event_type {
            WebhookEventType::CheckoutSessionCompleted
            | WebhookEventType::CheckoutSessionExpired => {
                let session: RawCheckoutSession = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(WebhookEventData::CheckoutSession(CheckoutSessionData {
                    session_id: session.id,
                    subscription_id: session.subscription,
                }))
            }
            WebhookEventType::CustomerSubscriptionCreated
            | WebhookEventType::CustomerSubscriptionUpdated
            | WebhookEventType::CustomerSubscriptionDeleted => {
                let sub: RawSubscriptionObject = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(WebhookEventData::Subscription(SubscriptionData {
                    subscription_id: sub.base.id,
                    status: sub.base.status,
                    period_start: Utc
                        .timestamp_opt(sub.base.current_period_start, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    period_end: Utc
                        .timestamp_opt(sub.base.current_period_end, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    cancel_at_period_end: sub.base.cancel_at_period_end,
                    viewer_id: sub.metadata.viewer_id,
                    creator_id: sub.metadata.creator_id,
                }))
            }
            WebhookEventType::Unknown(_) => {
                info!("Received unknown webhook event type");
                Ok(WebhookEventData::Raw(object))
            }
        }
    }
}

/// Applies verified webhook events to transactions, unlocks, and
/// subscriptions.
///
/// Every apply path is idempotent; the provider retries deliveries and may
/// send the same event more than once.
pub struct WebhookProcessor {
    transactions: Arc<dyn TransactionRepository>,
    unlocks: Arc<dyn UnlockRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl WebhookProcessor {
    /// Create a new webhook processor
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        unlocks: Arc<dyn UnlockRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            transactions,
            unlocks,
            subscriptions,
        }
    }

    /// Apply a verified webhook event
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn process(&self, event: WebhookEvent) -> Result<(), BillingError> {
        match (&event.event_type, &event.data) {
            (
                WebhookEventType::CheckoutSessionCompleted,
                WebhookEventData::CheckoutSession(session),
            ) => self.apply_session_completed(session).await,
            (
                WebhookEventType::CheckoutSessionExpired,
                WebhookEventData::CheckoutSession(session),
            ) => self.apply_session_expired(session).await,
            (
                WebhookEventType::CustomerSubscriptionCreated
                | WebhookEventType::CustomerSubscriptionUpdated,
                WebhookEventData::Subscription(sub),
            ) => self.apply_subscription_upsert(sub).await,
            (
                WebhookEventType::CustomerSubscriptionDeleted,
                WebhookEventData::Subscription(sub),
            ) => self.apply_subscription_deleted(sub).await,
            (WebhookEventType::Unknown(name), _) => {
                debug!(event_type = %name, "ignoring unhandled webhook event");
                Ok(())
            }
            _ => {
                warn!("webhook event data did not match its type");
                Ok(())
            }
        }
    }

    async fn apply_session_completed(
        &self,
        session: &CheckoutSessionData,
    ) -> Result<(), BillingError> {
        let tx = match self
            .transactions
            .find_by_provider_session(&session.session_id)
            .await?
        {
            Some(tx) => tx,
            None => {
                warn!(session_id = %session.session_id, "completed session has no transaction");
                return Ok(());
            }
        };

        if tx.status == TransactionStatus::Succeeded.as_str() {
            debug!(transaction_id = %tx.id, "duplicate completion delivery, already succeeded");
            return Ok(());
        }

        self.transactions
            .update_status(tx.id, TransactionStatus::Succeeded.as_str())
            .await?;

        // PPV purchases mint the unlock record here. The insert is a no-op
        // on conflict, so a duplicate delivery cannot mint a second one.
        if let Some(content_unit_id) = tx.content_unit_id {
            self.unlocks
                .insert(CreateUnlock {
                    viewer_id: tx.viewer_id,
                    content_unit_id,
                    transaction_id: tx.id,
                    purchased_at: Utc::now(),
                })
                .await?;
            info!(transaction_id = %tx.id, content_unit_id = %content_unit_id, "ppv unlock recorded");
        } else {
            info!(transaction_id = %tx.id, kind = %tx.kind, "payment confirmed");
        }

        Ok(())
    }

    async fn apply_session_expired(
        &self,
        session: &CheckoutSessionData,
    ) -> Result<(), BillingError> {
        let tx = match self
            .transactions
            .find_by_provider_session(&session.session_id)
            .await?
        {
            Some(tx) => tx,
            None => return Ok(()),
        };

        // Only abandon sessions still awaiting payment; a completion that
        // raced ahead of the expiry delivery wins.
        if tx.status == TransactionStatus::RequiresPayment.as_str() {
            self.transactions
                .update_status(tx.id, TransactionStatus::Canceled.as_str())
                .await?;
            info!(transaction_id = %tx.id, "checkout session expired");
        }

        Ok(())
    }

    async fn apply_subscription_upsert(&self, sub: &SubscriptionData) -> Result<(), BillingError> {
        let status = map_provider_status(&sub.status);

        if let Some(existing) = self
            .subscriptions
            .find_by_provider_id(&sub.subscription_id)
            .await?
        {
            self.subscriptions
                .update_from_provider(
                    existing.id,
                    status.as_str(),
                    sub.period_start,
                    sub.period_end,
                    sub.cancel_at_period_end,
                )
                .await?;
            info!(subscription_id = %existing.id, status = %status, "subscription updated");
            return Ok(());
        }

        let (viewer_id, creator_id) = match (&sub.viewer_id, &sub.creator_id) {
            (Some(viewer), Some(creator)) => {
                let viewer = uuid::Uuid::parse_str(viewer).map_err(|_| {
                    BillingError::WebhookError("invalid viewer_id metadata".to_string())
                })?;
                let creator = uuid::Uuid::parse_str(creator).map_err(|_| {
                    BillingError::WebhookError("invalid creator_id metadata".to_string())
                })?;
                (viewer, creator)
            }
            _ => {
                warn!(provider_id = %sub.subscription_id, "subscription event missing metadata");
                return Ok(());
            }
        };

        let created = self
            .subscriptions
            .create(CreateSubscription {
                id: SubscriptionId::new().0,
                viewer_id,
                creator_id,
                status: status.as_str().to_string(),
                provider_subscription_id: Some(sub.subscription_id.clone()),
                current_period_start: sub.period_start,
                current_period_end: sub.period_end,
            })
            .await?;
        info!(subscription_id = %created.id, status = %status, "subscription created");

        Ok(())
    }

    async fn apply_subscription_deleted(&self, sub: &SubscriptionData) -> Result<(), BillingError> {
        match self
            .subscriptions
            .find_by_provider_id(&sub.subscription_id)
            .await?
        {
            Some(existing) => {
                self.subscriptions.cancel(existing.id).await?;
                info!(subscription_id = %existing.id, "subscription canceled");
            }
            None => {
                warn!(provider_id = %sub.subscription_id, "deleted subscription not found");
            }
        }
        Ok(())
    }
}

/// Map a provider subscription status to the stored status vocabulary.
///
/// Provider statuses with no entitlement meaning (incomplete, unpaid)
/// collapse to canceled: they must not satisfy the subscribers gate.
fn map_provider_status(status: &str) -> SubscriptionStatus {
    match status {
        "active" => SubscriptionStatus::Active,
        "trialing" => SubscriptionStatus::Trialing,
        "past_due" => SubscriptionStatus::PastDue,
        _ => SubscriptionStatus::Canceled,
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw Stripe event for parsing

#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSubscriptionObject {
    #[serde(flatten)]
    base: StripeSubscription,
    #[serde(default)]
    metadata: RawSubscriptionMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RawSubscriptionMetadata {
    viewer_id: Option<String>,
    creator_id: Option<String>,
}
