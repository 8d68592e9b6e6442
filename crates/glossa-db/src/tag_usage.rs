//! Tag usage repository.
//!
//! `source`, `label_type` and `state` are stored as their ordinals.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;

use glossa_core::{Error, Result, TagSource, TagUsage, TagUsageStore};

use crate::escape_like;

/// PostgreSQL implementation of [`TagUsageStore`].
#[derive(Clone)]
pub struct PgTagUsageRepository {
    pool: Pool<Postgres>,
}

impl PgTagUsageRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// LIKE pattern matching strict descendants of `fqn`.
fn descendants_of(fqn: &str) -> String {
    format!("{}.%", escape_like(fqn))
}

#[async_trait]
impl TagUsageStore for PgTagUsageRepository {
    async fn get_count(&self, source: TagSource, tag_fqn: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tag_usage WHERE source = $1 AND tag_fqn = $2")
                .bind(source.ordinal())
                .bind(tag_fqn)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    async fn get_target_fqns(&self, source: TagSource, tag_fqn: &str) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT target_fqn FROM tag_usage WHERE source = $1 AND tag_fqn = $2 ORDER BY target_fqn",
        )
        .bind(source.ordinal())
        .bind(tag_fqn)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn rename(&self, source: TagSource, old_prefix: &str, new_prefix: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // A usage already stored under the new key gives way to the renamed one
        let merged = sqlx::query(
            r#"DELETE FROM tag_usage existing
               USING tag_usage moving
               WHERE moving.source = $1
                 AND (moving.tag_fqn = $2 OR moving.tag_fqn LIKE $4 ESCAPE '\')
                 AND existing.source = moving.source
                 AND existing.target_fqn = moving.target_fqn
                 AND existing.tag_fqn = $3 || substr(moving.tag_fqn, char_length($2) + 1)
                 AND NOT (existing.tag_fqn = $2 OR existing.tag_fqn LIKE $4 ESCAPE '\')"#,
        )
        .bind(source.ordinal())
        .bind(old_prefix)
        .bind(new_prefix)
        .bind(descendants_of(old_prefix))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let result = sqlx::query(
            r#"UPDATE tag_usage
               SET tag_fqn = $3 || substr(tag_fqn, char_length($2) + 1)
               WHERE source = $1 AND (tag_fqn = $2 OR tag_fqn LIKE $4 ESCAPE '\')"#,
        )
        .bind(source.ordinal())
        .bind(old_prefix)
        .bind(new_prefix)
        .bind(descendants_of(old_prefix))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "tag_usage",
            op = "rename",
            source = %source,
            old_fqn = old_prefix,
            new_fqn = new_prefix,
            rows = result.rows_affected(),
            merged = merged.rows_affected(),
            "Tag usage renamed"
        );
        Ok(result.rows_affected())
    }

    async fn rename_targets(&self, old_prefix: &str, new_prefix: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            r#"DELETE FROM tag_usage existing
               USING tag_usage moving
               WHERE (moving.target_fqn = $1 OR moving.target_fqn LIKE $3 ESCAPE '\')
                 AND existing.source = moving.source
                 AND existing.tag_fqn = moving.tag_fqn
                 AND existing.target_fqn = $2 || substr(moving.target_fqn, char_length($1) + 1)
                 AND NOT (existing.target_fqn = $1 OR existing.target_fqn LIKE $3 ESCAPE '\')"#,
        )
        .bind(old_prefix)
        .bind(new_prefix)
        .bind(descendants_of(old_prefix))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let result = sqlx::query(
            r#"UPDATE tag_usage
               SET target_fqn = $2 || substr(target_fqn, char_length($1) + 1)
               WHERE target_fqn = $1 OR target_fqn LIKE $3 ESCAPE '\'"#,
        )
        .bind(old_prefix)
        .bind(new_prefix)
        .bind(descendants_of(old_prefix))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    async fn delete_by_source(&self, source: TagSource, tag_fqn: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"DELETE FROM tag_usage
               WHERE source = $1 AND (tag_fqn = $2 OR tag_fqn LIKE $3 ESCAPE '\')"#,
        )
        .bind(source.ordinal())
        .bind(tag_fqn)
        .bind(descendants_of(tag_fqn))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    async fn apply(&self, usage: &TagUsage) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO tag_usage (source, tag_fqn, target_fqn, label_type, state, count)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (source, tag_fqn, target_fqn) DO UPDATE SET
                   label_type = EXCLUDED.label_type,
                   state = EXCLUDED.state"#,
        )
        .bind(usage.source.ordinal())
        .bind(&usage.tag_fqn)
        .bind(&usage.target_fqn)
        .bind(usage.label_type.ordinal())
        .bind(usage.state.ordinal())
        .bind(usage.count)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete_by_target(
        &self,
        source: TagSource,
        tag_fqn: &str,
        target_fqn: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM tag_usage WHERE source = $1 AND tag_fqn = $2 AND target_fqn = $3",
        )
        .bind(source.ordinal())
        .bind(tag_fqn)
        .bind(target_fqn)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendant_pattern_escapes_wildcards() {
        assert_eq!(descendants_of("G.Fruit"), "G.Fruit.%");
        assert_eq!(descendants_of("G.100%_off"), "G.100\\%\\_off.%");
    }
}
