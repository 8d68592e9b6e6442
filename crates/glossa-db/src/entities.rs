//! Entity record repository.
//!
//! Every entity table keeps the serialized record in `json` next to the
//! `name`, `fqn` and `deleted` columns. The columns are authoritative: bulk
//! FQN rewrites and soft deletes touch only the columns, and decoding
//! overlays them onto the record.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Executor, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use glossa_core::{
    EdgeChanges, EntityLookup, EntityReference, EntityType, Error, Glossary, GlossaryTerm, Include,
    LabelScope, Result, TermStore,
};

use crate::escape_like;
use crate::relationships::{execute_edge, DELETE_EDGE, INSERT_EDGE};

/// Table holding records of `entity_type`.
pub(crate) fn table(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Glossary => "glossary_entity",
        EntityType::GlossaryTerm => "glossary_term_entity",
        EntityType::User => "user_entity",
        EntityType::Classification => "classification_entity",
        EntityType::Tag => "tag_entity",
    }
}

/// `AND deleted ...` filter for `include`.
pub(crate) fn deleted_filter(include: Include) -> &'static str {
    match include {
        Include::NonDeleted => "AND deleted = FALSE",
        Include::Deleted => "AND deleted = TRUE",
        Include::All => "",
    }
}

/// A decoded row: the record plus its authoritative columns.
struct EntityRow<T> {
    record: T,
    name: String,
    fqn: String,
    deleted: bool,
}

fn decode<T: DeserializeOwned>(row: &PgRow) -> Result<EntityRow<T>> {
    let json: JsonValue = row.try_get("json")?;
    Ok(EntityRow {
        record: serde_json::from_value(json)?,
        name: row.try_get("name")?,
        fqn: row.try_get("fqn")?,
        deleted: row.try_get("deleted")?,
    })
}

/// PostgreSQL implementation of [`EntityLookup`] and [`TermStore`].
#[derive(Clone)]
pub struct PgEntityRepository {
    pool: Pool<Postgres>,
}

impl PgEntityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_by_id<T: DeserializeOwned>(
        &self,
        entity_type: EntityType,
        id: Uuid,
        include: Include,
    ) -> Result<Option<EntityRow<T>>> {
        let sql = format!(
            "SELECT json, name, fqn, deleted FROM {} WHERE id = $1 {}",
            table(entity_type),
            deleted_filter(include)
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(decode).transpose()
    }

    async fn fetch_by_fqn<T: DeserializeOwned>(
        &self,
        entity_type: EntityType,
        fqn: &str,
        include: Include,
    ) -> Result<Option<EntityRow<T>>> {
        let sql = format!(
            "SELECT json, name, fqn, deleted FROM {} WHERE fqn = $1 {}",
            table(entity_type),
            deleted_filter(include)
        );
        let row = sqlx::query(&sql)
            .bind(fqn)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(decode).transpose()
    }

    async fn write(
        &self,
        entity_type: EntityType,
        id: Uuid,
        name: &str,
        fqn: &str,
        json: JsonValue,
        deleted: bool,
    ) -> Result<()> {
        write_record(&self.pool, entity_type, id, name, fqn, json, deleted).await
    }

    /// Insert or replace a glossary.
    pub async fn upsert_glossary(&self, glossary: &Glossary) -> Result<()> {
        self.write(
            EntityType::Glossary,
            glossary.id,
            &glossary.name,
            &glossary.fully_qualified_name,
            serde_json::to_value(glossary)?,
            glossary.deleted,
        )
        .await
    }

    /// Insert or replace a user.
    pub async fn upsert_user(&self, user: &EntityReference) -> Result<()> {
        self.write(
            EntityType::User,
            user.id,
            &user.name,
            &user.fully_qualified_name,
            serde_json::to_value(user)?,
            user.deleted,
        )
        .await
    }

    /// Insert or replace a classification or classification tag.
    pub async fn upsert_label_scope(&self, scope: &LabelScope) -> Result<()> {
        if !matches!(scope.entity_type, EntityType::Classification | EntityType::Tag) {
            return Err(Error::InvalidInput(format!(
                "[{}] is not a classification or tag",
                scope.fully_qualified_name
            )));
        }
        self.write(
            scope.entity_type,
            scope.id,
            &scope.name,
            &scope.fully_qualified_name,
            serde_json::to_value(scope)?,
            scope.deleted,
        )
        .await
    }
}

/// Insert or replace one entity row on `executor`.
async fn write_record<'e, E>(
    executor: E,
    entity_type: EntityType,
    id: Uuid,
    name: &str,
    fqn: &str,
    json: JsonValue,
    deleted: bool,
) -> Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"INSERT INTO {} (id, name, fqn, json, deleted, updated_at)
           VALUES ($1, $2, $3, $4, $5, NOW())
           ON CONFLICT (id) DO UPDATE SET
               name = EXCLUDED.name,
               fqn = EXCLUDED.fqn,
               json = EXCLUDED.json,
               deleted = EXCLUDED.deleted,
               updated_at = EXCLUDED.updated_at"#,
        table(entity_type)
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(name)
        .bind(fqn)
        .bind(json)
        .bind(deleted)
        .execute(executor)
        .await
        .map_err(Error::Database)?;
    Ok(())
}

fn glossary(row: EntityRow<Glossary>) -> Glossary {
    Glossary {
        name: row.name,
        fully_qualified_name: row.fqn,
        deleted: row.deleted,
        ..row.record
    }
}

fn term(row: EntityRow<GlossaryTerm>) -> GlossaryTerm {
    GlossaryTerm {
        name: row.name,
        fully_qualified_name: row.fqn,
        deleted: row.deleted,
        ..row.record
    }
}

fn label_scope(row: EntityRow<LabelScope>) -> LabelScope {
    LabelScope {
        name: row.name,
        fully_qualified_name: row.fqn,
        deleted: row.deleted,
        ..row.record
    }
}

fn term_scope(term: &GlossaryTerm) -> LabelScope {
    LabelScope {
        id: term.id,
        entity_type: EntityType::GlossaryTerm,
        name: term.name.clone(),
        fully_qualified_name: term.fully_qualified_name.clone(),
        display_name: term.display_name.clone(),
        description: term.description.clone(),
        mutually_exclusive: term.mutually_exclusive,
        deleted: term.deleted,
    }
}

fn glossary_scope(glossary: &Glossary) -> LabelScope {
    LabelScope {
        id: glossary.id,
        entity_type: EntityType::Glossary,
        name: glossary.name.clone(),
        fully_qualified_name: glossary.fully_qualified_name.clone(),
        display_name: glossary.display_name.clone(),
        description: glossary.description.clone(),
        mutually_exclusive: glossary.mutually_exclusive,
        deleted: glossary.deleted,
    }
}

#[async_trait]
impl EntityLookup for PgEntityRepository {
    async fn get_term(&self, id: Uuid, include: Include) -> Result<Option<GlossaryTerm>> {
        Ok(self
            .fetch_by_id(EntityType::GlossaryTerm, id, include)
            .await?
            .map(term))
    }

    async fn get_term_by_name(&self, fqn: &str, include: Include) -> Result<Option<GlossaryTerm>> {
        Ok(self
            .fetch_by_fqn(EntityType::GlossaryTerm, fqn, include)
            .await?
            .map(term))
    }

    async fn get_glossary(&self, id: Uuid, include: Include) -> Result<Option<Glossary>> {
        Ok(self
            .fetch_by_id(EntityType::Glossary, id, include)
            .await?
            .map(glossary))
    }

    async fn get_glossary_by_name(&self, name: &str, include: Include) -> Result<Option<Glossary>> {
        let sql = format!(
            "SELECT json, name, fqn, deleted FROM glossary_entity WHERE name = $1 {}",
            deleted_filter(include)
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(decode).transpose()?.map(glossary))
    }

    async fn get_reference(
        &self,
        entity_type: EntityType,
        id: Uuid,
        include: Include,
    ) -> Result<Option<EntityReference>> {
        let reference = match entity_type {
            EntityType::Glossary => self
                .get_glossary(id, include)
                .await?
                .map(|g| g.entity_reference()),
            EntityType::GlossaryTerm => self
                .get_term(id, include)
                .await?
                .map(|t| t.entity_reference()),
            EntityType::User => self
                .fetch_by_id::<EntityReference>(EntityType::User, id, include)
                .await?
                .map(|row| EntityReference {
                    name: row.name,
                    fully_qualified_name: row.fqn,
                    deleted: row.deleted,
                    ..row.record
                }),
            EntityType::Classification | EntityType::Tag => self
                .fetch_by_id(entity_type, id, include)
                .await?
                .map(label_scope)
                .map(|s| EntityReference {
                    display_name: s.display_name.clone(),
                    deleted: s.deleted,
                    ..EntityReference::new(s.id, s.entity_type, &s.name, &s.fully_qualified_name)
                }),
        };
        Ok(reference)
    }

    async fn get_label_scope(
        &self,
        entity_type: EntityType,
        fqn: &str,
        include: Include,
    ) -> Result<Option<LabelScope>> {
        let scope = match entity_type {
            EntityType::Glossary => self
                .fetch_by_fqn(EntityType::Glossary, fqn, include)
                .await?
                .map(glossary)
                .as_ref()
                .map(glossary_scope),
            EntityType::GlossaryTerm => self
                .get_term_by_name(fqn, include)
                .await?
                .as_ref()
                .map(term_scope),
            EntityType::Classification | EntityType::Tag => self
                .fetch_by_fqn(entity_type, fqn, include)
                .await?
                .map(label_scope),
            EntityType::User => None,
        };
        Ok(scope)
    }
}

#[async_trait]
impl TermStore for PgEntityRepository {
    async fn upsert(&self, term: &GlossaryTerm) -> Result<()> {
        let record = term.stripped();
        self.write(
            EntityType::GlossaryTerm,
            record.id,
            &record.name,
            &record.fully_qualified_name,
            serde_json::to_value(&record)?,
            record.deleted,
        )
        .await
    }

    async fn write_with_edges(&self, term: &GlossaryTerm, edges: &EdgeChanges) -> Result<()> {
        let record = term.stripped();
        let json = serde_json::to_value(&record)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        write_record(
            &mut *tx,
            EntityType::GlossaryTerm,
            record.id,
            &record.name,
            &record.fully_qualified_name,
            json,
            record.deleted,
        )
        .await?;
        for edge in &edges.removed {
            execute_edge(&mut *tx, DELETE_EDGE, edge).await?;
        }
        for edge in &edges.added {
            execute_edge(&mut *tx, INSERT_EDGE, edge).await?;
        }
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "entities",
            op = "write_with_edges",
            term_id = %record.id,
            added = edges.added.len(),
            removed = edges.removed.len(),
            "Term record and edges written"
        );
        Ok(())
    }

    async fn update_fqn_prefix(&self, old_prefix: &str, new_prefix: &str) -> Result<u64> {
        let pattern = format!("{}.%", escape_like(old_prefix));
        let result = sqlx::query(
            r#"UPDATE glossary_term_entity
               SET fqn = $2 || substr(fqn, char_length($1) + 1),
                   updated_at = NOW()
               WHERE fqn LIKE $3 ESCAPE '\'"#,
        )
        .bind(old_prefix)
        .bind(new_prefix)
        .bind(&pattern)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "entities",
            op = "update_fqn_prefix",
            old_fqn = old_prefix,
            new_fqn = new_prefix,
            rows = result.rows_affected(),
            "Descendant FQNs rewritten"
        );
        Ok(result.rows_affected())
    }

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE glossary_term_entity SET deleted = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(deleted)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TermNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM glossary_term_entity WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
