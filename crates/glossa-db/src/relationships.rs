//! Relationship edge repository.

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::trace;
use uuid::Uuid;

use glossa_core::{
    EntityRelationship, EntityRelationshipRecord, EntityType, Error, RelationshipStore, Result,
    Relationship,
};

pub(crate) const INSERT_EDGE: &str = r#"
    INSERT INTO entity_relationship (from_id, to_id, from_entity, to_entity, relation)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT DO NOTHING
"#;

pub(crate) const DELETE_EDGE: &str = r#"
    DELETE FROM entity_relationship
    WHERE from_id = $1 AND to_id = $2 AND from_entity = $3 AND to_entity = $4 AND relation = $5
"#;

/// PostgreSQL implementation of [`RelationshipStore`].
///
/// A bidirectional edge is stored as two directed rows written in one
/// transaction.
#[derive(Clone)]
pub struct PgRelationshipRepository {
    pool: Pool<Postgres>,
}

impl PgRelationshipRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn execute_pair(
        &self,
        sql: &str,
        edge: &EntityRelationship,
        bidirectional: bool,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut edges = vec![*edge];
        if bidirectional {
            edges.push(edge.reversed());
        }
        for e in &edges {
            execute_edge(&mut *tx, sql, e).await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}

/// Run an edge statement (`INSERT_EDGE` or `DELETE_EDGE`) for `edge` on `conn`.
pub(crate) async fn execute_edge(
    conn: &mut PgConnection,
    sql: &str,
    edge: &EntityRelationship,
) -> Result<()> {
    sqlx::query(sql)
        .bind(edge.from_id)
        .bind(edge.to_id)
        .bind(edge.from_type.to_string())
        .bind(edge.to_type.to_string())
        .bind(edge.relation.to_string())
        .execute(conn)
        .await
        .map_err(Error::Database)?;
    Ok(())
}

fn parse_type(value: &str) -> Result<EntityType> {
    value.parse().map_err(Error::Internal)
}

#[async_trait]
impl RelationshipStore for PgRelationshipRepository {
    async fn add_edge(&self, edge: &EntityRelationship, bidirectional: bool) -> Result<()> {
        trace!(
            subsystem = "db",
            component = "relationships",
            from_id = %edge.from_id,
            to_id = %edge.to_id,
            relation = %edge.relation,
            bidirectional,
            "Adding edge"
        );
        self.execute_pair(INSERT_EDGE, edge, bidirectional).await
    }

    async fn delete_edge(&self, edge: &EntityRelationship, bidirectional: bool) -> Result<()> {
        trace!(
            subsystem = "db",
            component = "relationships",
            from_id = %edge.from_id,
            to_id = %edge.to_id,
            relation = %edge.relation,
            bidirectional,
            "Deleting edge"
        );
        self.execute_pair(DELETE_EDGE, edge, bidirectional).await
    }

    async fn find_to(
        &self,
        from_id: Uuid,
        from_type: EntityType,
        relation: Relationship,
        to_type: EntityType,
    ) -> Result<Vec<EntityRelationshipRecord>> {
        let rows = sqlx::query(
            r#"SELECT to_id, to_entity FROM entity_relationship
               WHERE from_id = $1 AND from_entity = $2 AND relation = $3 AND to_entity = $4
               ORDER BY to_id"#,
        )
        .bind(from_id)
        .bind(from_type.to_string())
        .bind(relation.to_string())
        .bind(to_type.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| -> Result<EntityRelationshipRecord> {
                let entity: String = row.try_get("to_entity")?;
                Ok(EntityRelationshipRecord {
                    id: row.try_get("to_id")?,
                    entity_type: parse_type(&entity)?,
                })
            })
            .collect()
    }

    async fn find_from(
        &self,
        to_id: Uuid,
        to_type: EntityType,
        relation: Relationship,
        from_type: EntityType,
    ) -> Result<Vec<EntityRelationshipRecord>> {
        let rows = sqlx::query(
            r#"SELECT from_id, from_entity FROM entity_relationship
               WHERE to_id = $1 AND to_entity = $2 AND relation = $3 AND from_entity = $4
               ORDER BY from_id"#,
        )
        .bind(to_id)
        .bind(to_type.to_string())
        .bind(relation.to_string())
        .bind(from_type.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| -> Result<EntityRelationshipRecord> {
                let entity: String = row.try_get("from_entity")?;
                Ok(EntityRelationshipRecord {
                    id: row.try_get("from_id")?,
                    entity_type: parse_type(&entity)?,
                })
            })
            .collect()
    }

    async fn delete_all(&self, id: Uuid, entity_type: EntityType) -> Result<u64> {
        let result = sqlx::query(
            r#"DELETE FROM entity_relationship
               WHERE (from_id = $1 AND from_entity = $2) OR (to_id = $1 AND to_entity = $2)"#,
        )
        .bind(id)
        .bind(entity_type.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
