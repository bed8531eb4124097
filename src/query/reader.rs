//! Read-only entity reader traits and the Postgres tree reader
//!
//! [`FilteredReader`] is the generic seam between the query engine and the
//! store: a reader knows how to fetch one entity by key, list a filtered page,
//! and count matches independently of fetching rows. It uses RPITIT (Rust
//! 1.75+) for async methods without `async_trait`. [`PgTreeReader`] is the
//! concrete instance for the denormalized tree dataset.

use std::future::Future;

use sqlx::PgPool;

use crate::error::{Result, StoreError, StoreOperation};
use crate::model::{Tree, TREES_TABLE};
use crate::query::filter::{ListFilter, Page, SortSpec, TreeKey};
use crate::query::sql;

/// Generic read-only reader over a filtered entity set
///
/// # Type Parameters
///
/// - `Key`: identity key type (may be a union of alternate keys)
/// - `Entity`: the enriched entity type returned from queries
/// - `Filter`: the listing predicate type
pub trait FilteredReader<Key, Entity, Filter>: Send + Sync {
    /// Fetch at most one entity by its identity key
    ///
    /// Returns `Ok(None)` when no visible row matches; mapping that to a
    /// not-found failure is the engine's decision, not the reader's.
    fn find(&self, key: &Key) -> impl Future<Output = Result<Option<Entity>>> + Send;

    /// Fetch one ordered, bounded page of entities matching the filter
    fn list(
        &self,
        filter: &Filter,
        sort: SortSpec,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Entity>>> + Send;

    /// Count entities matching the filter, independent of pagination
    fn count(&self, filter: &Filter) -> impl Future<Output = Result<u64>> + Send;
}

/// Reader for an externally configured featured entity list
pub trait FeaturedReader<Entity>: Send + Sync {
    /// Fetch the configured featured entities, unordered
    fn featured(&self) -> impl Future<Output = Result<Vec<Entity>>> + Send;
}

/// Postgres-backed reader for the denormalized tree dataset
#[derive(Debug, Clone)]
pub struct PgTreeReader {
    pool: PgPool,
}

impl PgTreeReader {
    /// Create a reader over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl FilteredReader<TreeKey, Tree, ListFilter> for PgTreeReader {
    async fn find(&self, key: &TreeKey) -> Result<Option<Tree>> {
        let mut qb = sql::find_by_key(key);
        let tree = qb
            .build_query_as::<Tree>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).add_context(TREES_TABLE))?;
        Ok(tree)
    }

    async fn list(&self, filter: &ListFilter, sort: SortSpec, page: Page) -> Result<Vec<Tree>> {
        let mut qb = sql::list_page(filter, sort, page);
        let trees = qb
            .build_query_as::<Tree>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).add_context(TREES_TABLE))?;
        Ok(trees)
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64> {
        let mut qb = sql::count_matches(filter);
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                StoreError::from(e)
                    .with_operation(StoreOperation::Count)
                    .add_context(TREES_TABLE)
            })?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

impl FeaturedReader<Tree> for PgTreeReader {
    async fn featured(&self) -> Result<Vec<Tree>> {
        let mut qb = sql::featured();
        let trees = qb
            .build_query_as::<Tree>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).add_context(TREES_TABLE))?;
        Ok(trees)
    }
}
