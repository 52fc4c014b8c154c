//! Checkout session initiation
//!
//! Every checkout attempt is re-validated server-side before the payment
//! backend is contacted: client state about locks and amounts is advisory.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use fanforge_db::{CreateTransaction, CreatorRepository, TransactionRepository, TransactionRow};
use fanforge_entitlement_core::{EntitlementError, EntitlementService, ResolvedEntitlement};
use fanforge_types::{
    validate_amount, CheckoutOutcome, CheckoutRequest, ContentUnitId, CreatorId, TransactionId,
    TransactionKind, TransactionStatus, ViewerId,
};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{CheckoutSessionParams, PaymentProvider};
use crate::rate_limit::CheckoutRateLimiter;

/// Entitlement checks the checkout flow depends on.
///
/// A seam over the entitlement read service so checkout tests can script
/// decisions without standing up repositories.
#[async_trait]
pub trait EntitlementGate: Send + Sync {
    /// Resolve entitlement for a viewer and content unit
    async fn resolve_for(
        &self,
        viewer: Option<ViewerId>,
        content_unit_id: ContentUnitId,
    ) -> Result<ResolvedEntitlement, EntitlementError>;

    /// Whether the viewer's subscription satisfies the subscribers gate
    async fn subscription_active(
        &self,
        viewer: ViewerId,
        creator: CreatorId,
    ) -> Result<bool, EntitlementError>;
}

#[async_trait]
impl<C, F, S, U> EntitlementGate for EntitlementService<C, F, S, U>
where
    C: fanforge_db::ContentRepository,
    F: fanforge_db::FollowRepository,
    S: fanforge_db::SubscriptionRepository,
    U: fanforge_db::UnlockRepository,
{
    async fn resolve_for(
        &self,
        viewer: Option<ViewerId>,
        content_unit_id: ContentUnitId,
    ) -> Result<ResolvedEntitlement, EntitlementError> {
        EntitlementService::resolve_for(self, viewer, content_unit_id).await
    }

    async fn subscription_active(
        &self,
        viewer: ViewerId,
        creator: CreatorId,
    ) -> Result<bool, EntitlementError> {
        EntitlementService::subscription_active(self, viewer, creator).await
    }
}

/// Priced checkout, resolved server-side from authoritative state
struct PricedCheckout {
    amount_minor_units: i64,
    currency: String,
    description: String,
    content_unit_id: Option<ContentUnitId>,
}

/// Checkout session initiation service
pub struct CheckoutService {
    entitlements: Arc<dyn EntitlementGate>,
    creators: Arc<dyn CreatorRepository>,
    transactions: Arc<dyn TransactionRepository>,
    provider: Arc<dyn PaymentProvider>,
    limiter: CheckoutRateLimiter,
    config: BillingConfig,
}

impl CheckoutService {
    /// Create a new checkout service
    pub fn new(
        entitlements: Arc<dyn EntitlementGate>,
        creators: Arc<dyn CreatorRepository>,
        transactions: Arc<dyn TransactionRepository>,
        provider: Arc<dyn PaymentProvider>,
        config: BillingConfig,
    ) -> Self {
        let limiter = CheckoutRateLimiter::new(config.checkout_attempts_per_minute);
        Self {
            entitlements,
            creators,
            transactions,
            provider,
            limiter,
            config,
        }
    }

    /// Initiate a checkout session for a viewer.
    ///
    /// Replays the stored outcome when the idempotency key has been seen
    /// before, so a network retry of the same attempt cannot create a second
    /// charge. Returns [`CheckoutOutcome::AlreadyUnlocked`] when the server
    /// determines the viewer already has access to the target.
    #[instrument(skip(self, request), fields(kind = %request.kind, creator_id = %request.target.creator_id))]
    pub async fn start_checkout(
        &self,
        viewer_id: ViewerId,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, BillingError> {
        self.limiter.check(viewer_id).await?;

        // Replay: one logical attempt maps to at most one transaction.
        if let Some(existing) = self
            .transactions
            .find_by_idempotency_key(viewer_id.0, request.idempotency_key.0)
            .await?
        {
            debug!(transaction_id = %existing.id, "replaying checkout for known idempotency key");
            return Self::replay(existing);
        }

        let priced = match request.kind {
            TransactionKind::PpvPost | TransactionKind::PpvMessage => {
                match self.price_ppv(viewer_id, &request).await? {
                    Some(priced) => priced,
                    None => return Ok(CheckoutOutcome::AlreadyUnlocked),
                }
            }
            TransactionKind::Subscription => {
                match self.price_subscription(viewer_id, &request).await? {
                    Some(priced) => priced,
                    None => return Ok(CheckoutOutcome::AlreadyUnlocked),
                }
            }
            TransactionKind::Tip => self.price_tip(&request).await?,
        };

        let success_url = self.success_url(request.target.creator_id, priced.content_unit_id);

        let params = CheckoutSessionParams {
            kind: request.kind,
            viewer_id,
            creator_id: request.target.creator_id,
            content_unit_id: priced.content_unit_id,
            amount_minor_units: priced.amount_minor_units,
            currency: priced.currency.clone(),
            description: priced.description.clone(),
            success_url,
            cancel_url: self.config.cancel_url.clone(),
            idempotency_key: request.idempotency_key,
        };

        // Nothing is persisted until the provider has a session: a failure
        // here leaves no transaction row behind and the viewer retries with
        // the same key.
        let session = self.provider.create_checkout_session(&params).await?;

        let transaction_id = TransactionId::new();
        let create = CreateTransaction {
            id: transaction_id.0,
            viewer_id: viewer_id.0,
            kind: request.kind.as_str().to_string(),
            amount_minor_units: priced.amount_minor_units,
            currency: priced.currency,
            creator_id: request.target.creator_id.0,
            content_unit_id: priced.content_unit_id.map(|id| id.0),
            idempotency_key: request.idempotency_key.0,
            provider_session_id: Some(session.session_id),
            checkout_url: Some(session.url.clone()),
        };

        match self.transactions.create(create).await {
            Ok(row) => {
                info!(transaction_id = %row.id, "checkout session created");
                Ok(CheckoutOutcome::Redirect {
                    checkout_url: session.url,
                    transaction_id,
                })
            }
            Err(e) => {
                // A concurrent retry with the same key may have won the
                // insert; fall back to its stored outcome.
                if let Some(existing) = self
                    .transactions
                    .find_by_idempotency_key(viewer_id.0, request.idempotency_key.0)
                    .await?
                {
                    warn!(transaction_id = %existing.id, "concurrent checkout with same key, replaying");
                    return Self::replay(existing);
                }
                Err(e.into())
            }
        }
    }

    fn replay(existing: TransactionRow) -> Result<CheckoutOutcome, BillingError> {
        if existing.status == TransactionStatus::Succeeded.as_str() {
            return Ok(CheckoutOutcome::AlreadyUnlocked);
        }
        match existing.checkout_url {
            Some(url) => Ok(CheckoutOutcome::Redirect {
                checkout_url: url,
                transaction_id: TransactionId(existing.id),
            }),
            None => Err(BillingError::Internal(
                "stored transaction has no checkout url".into(),
            )),
        }
    }

    /// Price a PPV purchase from the unit's stored lock.
    ///
    /// Returns `None` when the server finds the unit already open to this
    /// viewer, which the caller surfaces as `AlreadyUnlocked`.
    async fn price_ppv(
        &self,
        viewer_id: ViewerId,
        request: &CheckoutRequest,
    ) -> Result<Option<PricedCheckout>, BillingError> {
        let content_unit_id = request.target.content_unit_id.ok_or_else(|| {
            BillingError::InvalidTarget("pay-per-view checkout requires a content unit".into())
        })?;

        let resolved = self
            .entitlements
            .resolve_for(Some(viewer_id), content_unit_id)
            .await
            .map_err(|e| match e {
                EntitlementError::ContentNotFound => BillingError::ContentNotFound,
                other => other.into(),
            })?;

        if resolved.creator_id != request.target.creator_id {
            return Err(BillingError::InvalidTarget(
                "content unit does not belong to this creator".into(),
            ));
        }

        if !resolved.decision.locked {
            return Ok(None);
        }

        let lock = resolved.ppv_lock.ok_or_else(|| {
            BillingError::InvalidTarget("content unit is not individually sold".into())
        })?;

        validate_amount(request.kind, lock.price_minor_units)?;

        let description = match request.kind {
            TransactionKind::PpvMessage => "Unlock message".to_string(),
            _ => "Unlock post".to_string(),
        };

        Ok(Some(PricedCheckout {
            amount_minor_units: lock.price_minor_units,
            currency: lock.currency,
            description,
            content_unit_id: Some(content_unit_id),
        }))
    }

    /// Price a subscription from the creator's profile.
    ///
    /// Returns `None` when the viewer already holds a gate-satisfying
    /// subscription.
    async fn price_subscription(
        &self,
        viewer_id: ViewerId,
        request: &CheckoutRequest,
    ) -> Result<Option<PricedCheckout>, BillingError> {
        let creator_id = request.target.creator_id;

        if self
            .entitlements
            .subscription_active(viewer_id, creator_id)
            .await?
        {
            return Ok(None);
        }

        let creator = self
            .creators
            .find_by_id(creator_id.0)
            .await?
            .ok_or(BillingError::CreatorNotFound)?;

        Ok(Some(PricedCheckout {
            amount_minor_units: creator.subscription_price_minor_units,
            currency: creator.subscription_currency,
            description: format!("Subscribe to {}", creator.display_name),
            content_unit_id: None,
        }))
    }

    /// Price a tip from the caller-supplied amount, bounds-checked.
    async fn price_tip(&self, request: &CheckoutRequest) -> Result<PricedCheckout, BillingError> {
        let amount = request
            .amount_minor_units
            .ok_or(BillingError::MissingAmount)?;
        validate_amount(TransactionKind::Tip, amount)?;

        let creator = self
            .creators
            .find_by_id(request.target.creator_id.0)
            .await?
            .ok_or(BillingError::CreatorNotFound)?;

        Ok(PricedCheckout {
            amount_minor_units: amount,
            currency: creator.subscription_currency,
            description: format!("Tip for {}", creator.display_name),
            content_unit_id: None,
        })
    }

    /// Success URL carrying the purchase target, so the success page knows
    /// what entitlement to reconcile after the redirect back.
    fn success_url(&self, creator_id: CreatorId, content_unit_id: Option<ContentUnitId>) -> String {
        let mut url = format!("{}?creator_id={}", self.config.success_url, creator_id);
        if let Some(unit) = content_unit_id {
            url.push_str(&format!("&content_unit_id={unit}"));
        }
        url
    }
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService").finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;
    use dashmap::DashMap;
    use uuid::Uuid;

    use fanforge_db::{CreatorRow, DbResult};
    use fanforge_types::{
        CheckoutTarget, IdempotencyKey, LockDecision, LockReason, MediaDirective, PpvLock,
    };

    use crate::provider::ProviderSession;

    use super::*;

    struct ScriptedGate {
        resolution: Option<ResolvedEntitlement>,
        active_subscription: bool,
    }

    #[async_trait]
    impl EntitlementGate for ScriptedGate {
        async fn resolve_for(
            &self,
            _viewer: Option<ViewerId>,
            _content_unit_id: ContentUnitId,
        ) -> Result<ResolvedEntitlement, EntitlementError> {
            self.resolution
                .clone()
                .ok_or(EntitlementError::ContentNotFound)
        }

        async fn subscription_active(
            &self,
            _viewer: ViewerId,
            _creator: CreatorId,
        ) -> Result<bool, EntitlementError> {
            Ok(self.active_subscription)
        }
    }

    struct FakeCreatorRepository {
        creators: DashMap<Uuid, CreatorRow>,
    }

    #[async_trait]
    impl CreatorRepository for FakeCreatorRepository {
        async fn find_by_id(&self, id: Uuid) -> DbResult<Option<CreatorRow>> {
            Ok(self.creators.get(&id).map(|r| r.clone()))
        }
    }

    #[derive(Default)]
    struct FakeTransactionRepository {
        by_key: DashMap<(Uuid, Uuid), TransactionRow>,
    }

    #[async_trait]
    impl TransactionRepository for FakeTransactionRepository {
        async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>> {
            Ok(self
                .by_key
                .iter()
                .find(|e| e.value().id == id)
                .map(|e| e.value().clone()))
        }

        async fn find_by_idempotency_key(
            &self,
            viewer_id: Uuid,
            key: Uuid,
        ) -> DbResult<Option<TransactionRow>> {
            Ok(self.by_key.get(&(viewer_id, key)).map(|r| r.clone()))
        }

        async fn find_by_provider_session(
            &self,
            session_id: &str,
        ) -> DbResult<Option<TransactionRow>> {
            Ok(self
                .by_key
                .iter()
                .find(|e| e.value().provider_session_id.as_deref() == Some(session_id))
                .map(|e| e.value().clone()))
        }

        async fn create(&self, tx: CreateTransaction) -> DbResult<TransactionRow> {
            let now = Utc::now();
            let row = TransactionRow {
                id: tx.id,
                viewer_id: tx.viewer_id,
                kind: tx.kind,
                status: TransactionStatus::RequiresPayment.as_str().to_string(),
                amount_minor_units: tx.amount_minor_units,
                currency: tx.currency,
                creator_id: tx.creator_id,
                content_unit_id: tx.content_unit_id,
                idempotency_key: tx.idempotency_key,
                provider_session_id: tx.provider_session_id,
                checkout_url: tx.checkout_url,
                created_at: now,
                updated_at: now,
            };
            self.by_key
                .insert((tx.viewer_id, tx.idempotency_key), row.clone());
            Ok(row)
        }

        async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
            for mut entry in self.by_key.iter_mut() {
                if entry.value().id == id {
                    entry.value_mut().status = status.to_string();
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl PaymentProvider for CountingProvider {
        async fn create_checkout_session(
            &self,
            params: &CheckoutSessionParams,
        ) -> Result<ProviderSession, BillingError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ProviderSession {
                session_id: format!("cs_test_{n}"),
                url: format!("https://checkout.example/{}/{n}", params.idempotency_key),
            })
        }
    }

    struct Harness {
        service: CheckoutService,
        provider: Arc<CountingProvider>,
        creator_id: CreatorId,
    }

    fn harness(gate: ScriptedGate, attempts_per_minute: u32) -> Harness {
        let creator_id = CreatorId::new();
        let creators = FakeCreatorRepository {
            creators: DashMap::new(),
        };
        creators.creators.insert(
            creator_id.0,
            CreatorRow {
                id: creator_id.0,
                display_name: "ada".to_string(),
                subscription_price_minor_units: 999,
                subscription_currency: "usd".to_string(),
                created_at: Utc::now(),
            },
        );

        let provider = Arc::new(CountingProvider::default());
        let config = BillingConfig::new("sk_test", "whsec_test")
            .with_checkout_rate(attempts_per_minute);

        let service = CheckoutService::new(
            Arc::new(gate),
            Arc::new(creators),
            Arc::new(FakeTransactionRepository::default()),
            provider.clone(),
            config,
        );

        Harness {
            service,
            provider,
            creator_id,
        }
    }

    fn locked_ppv(creator_id: CreatorId, price: i64) -> ScriptedGate {
        let decision = LockDecision::locked(LockReason::PpvRequired);
        ScriptedGate {
            resolution: Some(ResolvedEntitlement {
                media: MediaDirective::for_decision(&decision),
                decision,
                creator_id,
                ppv_lock: Some(PpvLock::new(price, "usd")),
            }),
            active_subscription: false,
        }
    }

    fn ppv_request(creator_id: CreatorId) -> CheckoutRequest {
        CheckoutRequest {
            kind: TransactionKind::PpvPost,
            target: CheckoutTarget {
                creator_id,
                content_unit_id: Some(ContentUnitId::new()),
            },
            amount_minor_units: None,
            idempotency_key: IdempotencyKey::new(),
        }
    }

    #[tokio::test]
    async fn test_ppv_checkout_redirects() {
        let gate_creator = CreatorId::new();
        let h = harness(locked_ppv(gate_creator, 500), 10);

        let outcome = h
            .service
            .start_checkout(ViewerId::new(), ppv_request(gate_creator))
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Redirect { .. }));
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_key_twice_reuses_session() {
        let gate_creator = CreatorId::new();
        let h = harness(locked_ppv(gate_creator, 500), 10);

        let viewer = ViewerId::new();
        let request = ppv_request(gate_creator);

        let first = h
            .service
            .start_checkout(viewer, request.clone())
            .await
            .unwrap();
        let second = h.service.start_checkout(viewer, request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unlocked_ppv_returns_already_unlocked() {
        let gate_creator = CreatorId::new();
        let decision = LockDecision::unlocked();
        let gate = ScriptedGate {
            resolution: Some(ResolvedEntitlement {
                media: MediaDirective::for_decision(&decision),
                decision,
                creator_id: gate_creator,
                ppv_lock: Some(PpvLock::new(500, "usd")),
            }),
            active_subscription: false,
        };
        let h = harness(gate, 10);

        let outcome = h
            .service
            .start_checkout(ViewerId::new(), ppv_request(gate_creator))
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::AlreadyUnlocked);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_active_subscription_returns_already_unlocked() {
        let gate = ScriptedGate {
            resolution: None,
            active_subscription: true,
        };
        let h = harness(gate, 10);

        let request = CheckoutRequest {
            kind: TransactionKind::Subscription,
            target: CheckoutTarget {
                creator_id: h.creator_id,
                content_unit_id: None,
            },
            amount_minor_units: None,
            idempotency_key: IdempotencyKey::new(),
        };

        let outcome = h
            .service
            .start_checkout(ViewerId::new(), request)
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::AlreadyUnlocked);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscription_priced_from_creator_profile() {
        let gate = ScriptedGate {
            resolution: None,
            active_subscription: false,
        };
        let h = harness(gate, 10);

        let request = CheckoutRequest {
            kind: TransactionKind::Subscription,
            target: CheckoutTarget {
                creator_id: h.creator_id,
                content_unit_id: None,
            },
            amount_minor_units: None,
            idempotency_key: IdempotencyKey::new(),
        };

        let outcome = h
            .service
            .start_checkout(ViewerId::new(), request)
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Redirect { .. }));
    }

    #[tokio::test]
    async fn test_tip_requires_amount() {
        let gate = ScriptedGate {
            resolution: None,
            active_subscription: false,
        };
        let h = harness(gate, 10);

        let request = CheckoutRequest {
            kind: TransactionKind::Tip,
            target: CheckoutTarget {
                creator_id: h.creator_id,
                content_unit_id: None,
            },
            amount_minor_units: None,
            idempotency_key: IdempotencyKey::new(),
        };

        let err = h
            .service
            .start_checkout(ViewerId::new(), request)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::MissingAmount));
    }

    #[tokio::test]
    async fn test_tip_amount_bounds_enforced() {
        let gate = ScriptedGate {
            resolution: None,
            active_subscription: false,
        };
        let h = harness(gate, 10);

        for bad_amount in [99, 50_001] {
            let request = CheckoutRequest {
                kind: TransactionKind::Tip,
                target: CheckoutTarget {
                    creator_id: h.creator_id,
                    content_unit_id: None,
                },
                amount_minor_units: Some(bad_amount),
                idempotency_key: IdempotencyKey::new(),
            };

            let err = h
                .service
                .start_checkout(ViewerId::new(), request)
                .await
                .unwrap_err();
            assert!(matches!(err, BillingError::InvalidAmount(_)));
        }

        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ppv_without_content_unit_is_invalid() {
        let gate_creator = CreatorId::new();
        let h = harness(locked_ppv(gate_creator, 500), 10);

        let request = CheckoutRequest {
            kind: TransactionKind::PpvPost,
            target: CheckoutTarget {
                creator_id: gate_creator,
                content_unit_id: None,
            },
            amount_minor_units: None,
            idempotency_key: IdempotencyKey::new(),
        };

        let err = h
            .service
            .start_checkout(ViewerId::new(), request)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_excess_attempts() {
        let gate_creator = CreatorId::new();
        let h = harness(locked_ppv(gate_creator, 500), 2);

        let viewer = ViewerId::new();
        for _ in 0..2 {
            h.service
                .start_checkout(viewer, ppv_request(gate_creator))
                .await
                .unwrap();
        }

        let err = h
            .service
            .start_checkout(viewer, ppv_request(gate_creator))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::RateLimited));
    }

    #[tokio::test]
    async fn test_wrong_creator_for_unit_is_invalid() {
        let gate_creator = CreatorId::new();
        let h = harness(locked_ppv(gate_creator, 500), 10);

        // Request claims a different creator than the unit's owner.
        let request = ppv_request(CreatorId::new());

        let err = h
            .service
            .start_checkout(ViewerId::new(), request)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidTarget(_)));
    }
}
