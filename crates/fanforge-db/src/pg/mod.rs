//! PostgreSQL repository implementations

mod content;
mod creator;
mod follow;
mod subscription;
mod transaction;
mod unlock;

pub use content::PgContentRepository;
pub use creator::PgCreatorRepository;
pub use follow::PgFollowRepository;
pub use subscription::PgSubscriptionRepository;
pub use transaction::PgTransactionRepository;
pub use unlock::PgUnlockRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub creators: PgCreatorRepository,
    pub content: PgContentRepository,
    pub follows: PgFollowRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub unlocks: PgUnlockRepository,
    pub transactions: PgTransactionRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            creators: PgCreatorRepository::new(pool.clone()),
            content: PgContentRepository::new(pool.clone()),
            follows: PgFollowRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            unlocks: PgUnlockRepository::new(pool.clone()),
            transactions: PgTransactionRepository::new(pool),
        }
    }
}
