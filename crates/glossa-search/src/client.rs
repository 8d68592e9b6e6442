//! HTTP search client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use glossa_core::{EntityReference, Error, GlossaryTerm, Result, SearchClient};

use crate::config::SearchConfig;
use crate::document::term_document;

/// Script flagging embedded labels of a soft-deleted (or restored) term.
pub const LABEL_DELETED_SCRIPT: &str = "if (ctx._source.tags != null) { \
for (t in ctx._source.tags) { if (t.tagFQN == params.fqn) { t.deleted = params.deleted; } } }";

/// [`SearchClient`] over an Elasticsearch/OpenSearch compatible REST API.
pub struct HttpSearchClient {
    client: Client,
    config: SearchConfig,
}

impl HttpSearchClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Search(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "search",
            component = "client",
            url = %config.base_url,
            index = %config.index,
            alias = %config.alias,
            "Initializing search client"
        );
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SearchConfig::from_env())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("ApiKey {}", key)),
            None => request,
        }
    }

    async fn send(&self, op: &str, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| Error::Search(format!("{} request failed: {}", op, e)))?;
        Ok(response)
    }

    async fn check(op: &str, response: Response) -> Result<()> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Search(format!("{} returned {}: {}", op, status, body)))
    }

    /// Run `script` over every document on the alias whose `field_path`
    /// equals `fqn`.
    async fn update_by_query(
        &self,
        field_path: &str,
        fqn: &str,
        script: &str,
        params: Value,
    ) -> Result<()> {
        let body = json!({
            "query": { "term": { field_path: fqn } },
            "script": {
                "source": script,
                "lang": "painless",
                "params": params,
            }
        });
        let url = self.url(&format!("{}/_update_by_query?conflicts=proceed", self.config.alias));
        let response = self
            .send("update_by_query", self.client.post(url).json(&body))
            .await?;
        Self::check("update_by_query", response).await
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    #[instrument(skip(self, term), fields(subsystem = "search", component = "client", op = "update_entity", term_id = %term.id))]
    async fn update_entity(&self, term: &GlossaryTerm) -> Result<()> {
        let start = Instant::now();
        let doc = term_document(term)?;
        let url = self.url(&format!("{}/_doc/{}", self.config.index, term.id));
        let response = self.send("index", self.client.put(url).json(&doc)).await?;
        Self::check("index", response).await?;

        debug!(
            fqn = %term.fully_qualified_name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Term document indexed"
        );
        Ok(())
    }

    #[instrument(skip(self, entity), fields(subsystem = "search", component = "client", op = "soft_delete_or_restore", term_id = %entity.id))]
    async fn soft_delete_or_restore(
        &self,
        entity: &EntityReference,
        deleted: bool,
        field_path: &str,
    ) -> Result<()> {
        let url = self.url(&format!("{}/_update/{}", self.config.index, entity.id));
        let body = json!({ "doc": { "deleted": deleted } });
        let response = self.send("update", self.client.post(url).json(&body)).await?;
        Self::check("update", response).await?;

        self.update_by_query(
            field_path,
            &entity.fully_qualified_name,
            LABEL_DELETED_SCRIPT,
            json!({ "fqn": entity.fully_qualified_name, "deleted": deleted }),
        )
        .await?;

        debug!(fqn = %entity.fully_qualified_name, deleted, "Term document flagged");
        Ok(())
    }

    #[instrument(skip(self, entity, cleanup_script), fields(subsystem = "search", component = "client", op = "delete_and_clean_references", term_id = %entity.id))]
    async fn delete_and_clean_references(
        &self,
        entity: &EntityReference,
        cleanup_script: &str,
        field_path: &str,
    ) -> Result<()> {
        let url = self.url(&format!("{}/_doc/{}", self.config.index, entity.id));
        let response = self.send("delete", self.client.delete(url)).await?;
        // Already gone is fine
        if response.status() != StatusCode::NOT_FOUND {
            Self::check("delete", response).await?;
        }

        self.update_by_query(
            field_path,
            &entity.fully_qualified_name,
            cleanup_script,
            json!({ "fqn": entity.fully_qualified_name }),
        )
        .await?;

        debug!(fqn = %entity.fully_qualified_name, "Term document removed and references cleaned");
        Ok(())
    }
}
