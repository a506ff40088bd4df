//! Store adapter for a PostgREST-style remote table service.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use ecole_config::RestStoreConfig;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{Filter, Row, StoreAdapter, StoreError, StoreResult, Table};

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl RestStore {
    pub fn new(config: &RestStoreConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("failed to build store http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = self.authorised(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RestErrorBody>(&raw)
            .ok()
            .and_then(|body| body.message.or(body.details))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    raw
                }
            });

        Err(match status {
            StatusCode::CONFLICT => StoreError::Constraint(message),
            _ => StoreError::Rejected {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn rows(&self, request: RequestBuilder) -> StoreResult<Vec<Row>> {
        let response = self.send(request).await?;
        Ok(response.json::<Vec<Row>>().await?)
    }

    async fn single(&self, table: Table, id: &str, request: RequestBuilder) -> StoreResult<Row> {
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(table, id))
    }
}

fn filter_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn filter_operator(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        other => format!("eq.{}", filter_text(other)),
    }
}

#[async_trait]
impl StoreAdapter for RestStore {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn select_all(&self, table: Table) -> StoreResult<Vec<Row>> {
        debug!(%table, "rest select");
        let request = self.client.get(self.endpoint(table)).query(&[("select", "*")]);
        self.rows(request).await
    }

    async fn select_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Row>> {
        debug!(%table, column = %filter.column, "rest select where");
        let request = self.client.get(self.endpoint(table)).query(&[
            ("select", "*".to_string()),
            (filter.column.as_str(), filter_operator(&filter.value)),
        ]);
        self.rows(request).await
    }

    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row> {
        let id = row
            .get("id")
            .map(filter_text)
            .unwrap_or_default();
        debug!(%table, %id, "rest insert");
        let request = self
            .client
            .post(self.endpoint(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&vec![row]);
        self.single(table, &id, request).await
    }

    async fn update(&self, table: Table, id: &str, patch: Row) -> StoreResult<Row> {
        debug!(%table, %id, "rest update");
        let request = self
            .client
            .patch(self.endpoint(table))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);
        self.single(table, id, request).await
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        debug!(%table, %id, "rest delete");
        let request = self
            .client
            .delete(self.endpoint(table))
            .query(&[("id", format!("eq.{id}"))]);
        self.send(request).await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, key: &str, row: Row) -> StoreResult<Row> {
        let key_value = row.get(key).map(filter_text).unwrap_or_default();
        debug!(%table, key, value = %key_value, "rest upsert");
        let request = self
            .client
            .post(self.endpoint(table))
            .query(&[("on_conflict", key)])
            .header("Prefer", MERGE_DUPLICATES)
            .json(&vec![row]);
        self.single(table, &key_value, request).await
    }
}
