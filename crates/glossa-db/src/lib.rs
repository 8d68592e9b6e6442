//! # glossa-db
//!
//! PostgreSQL persistence layer for glossa.
//!
//! This crate provides:
//! - Connection pool management
//! - Entity records for glossaries, terms, users, classifications and tags
//! - The relationship edge table
//! - Tag usage rows with prefix rename and delete
//!
//! ## Example
//!
//! ```rust,ignore
//! use glossa_db::Database;
//!
//! let db = Database::connect("postgres://localhost/glossa").await?;
//! db.migrate().await?;
//! let stores = db.stores();
//! ```

pub mod entities;
pub mod pool;
pub mod relationships;
pub mod tag_usage;

// Test fixtures for integration tests
pub mod test_fixtures;

use std::sync::Arc;

// Re-export core types
pub use glossa_core::*;

pub use entities::PgEntityRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use relationships::PgRelationshipRepository;
pub use tag_usage::PgTagUsageRepository;

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in an FQN.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Entity records; also the term store.
    pub entities: PgEntityRepository,
    pub relationships: PgRelationshipRepository,
    pub tag_usage: PgTagUsageRepository,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            entities: PgEntityRepository::new(pool.clone()),
            relationships: PgRelationshipRepository::new(pool.clone()),
            tag_usage: PgTagUsageRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Store collaborators backed by this database.
    pub fn stores(&self) -> Stores {
        Stores {
            lookup: Arc::new(self.entities.clone()),
            terms: Arc::new(self.entities.clone()),
            relationships: Arc::new(self.relationships.clone()),
            tag_usage: Arc::new(self.tag_usage.clone()),
        }
    }
}

/// The store traits implemented by [`Database`], as shared trait objects.
#[derive(Clone)]
pub struct Stores {
    pub lookup: Arc<dyn EntityLookup>,
    pub terms: Arc<dyn TermStore>,
    pub relationships: Arc<dyn RelationshipStore>,
    pub tag_usage: Arc<dyn TagUsageStore>,
}
