//! Fanforge DB - Database abstractions
//!
//! SQLx-based database layer for fanforge services.
//!
//! # Example
//!
//! ```rust,ignore
//! use fanforge_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/fanforge").await?;
//! let repos = Repositories::new(pool);
//!
//! let unit = repos.content.find_by_id(content_unit_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
