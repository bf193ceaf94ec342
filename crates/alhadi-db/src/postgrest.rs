use crate::records::Collection;
use crate::store::{stamp_updated_at, Filter, RecordError, RecordResult, RecordStore};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;

/// `RecordStore` backed by the Supabase REST (PostgREST) endpoint.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table_name())
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        self.client
            .request(method, self.collection_url(collection))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(builder: RequestBuilder) -> RecordResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| RecordError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or(body);
        Err(RecordError::Service { status, message })
    }

    async fn rows(response: Response) -> RecordResult<Vec<Value>> {
        let body = response
            .text()
            .await
            .map_err(|e| RecordError::Transport(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// PostgREST query parameters for a filter.
pub fn query_params(filter: &Filter) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for (column, value) in &filter.eq {
        params.push((column.clone(), format!("eq.{}", value)));
    }
    if let Some((column, ascending)) = &filter.order {
        let direction = if *ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", column, direction)));
    }
    if let Some(limit) = filter.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn id_param(id: &str) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{}", id))]
}

#[async_trait]
impl RecordStore for PostgrestStore {
    #[tracing::instrument(skip(self, filter), fields(db.table = %collection, db.operation = "select"))]
    async fn select(&self, collection: Collection, filter: &Filter) -> RecordResult<Vec<Value>> {
        let response = Self::send(
            self.request(Method::GET, collection)
                .query(&query_params(filter)),
        )
        .await?;
        Self::rows(response).await
    }

    #[tracing::instrument(skip(self, record), fields(db.table = %collection, db.operation = "insert"))]
    async fn insert(&self, collection: Collection, record: Value) -> RecordResult<Value> {
        if !record.is_object() {
            return Err(RecordError::InvalidRecord(
                "record must be a JSON object".to_string(),
            ));
        }
        let response = Self::send(
            self.request(Method::POST, collection)
                .header("Prefer", "return=representation")
                .json(&record),
        )
        .await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RecordError::InvalidRecord("insert returned no row".to_string()))
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = %collection, db.operation = "update", db.record_id = %id))]
    async fn update(&self, collection: Collection, id: &str, patch: Value) -> RecordResult<Value> {
        let patch = stamp_updated_at(patch)?;
        let response = Self::send(
            self.request(Method::PATCH, collection)
                .query(&id_param(id))
                .header("Prefer", "return=representation")
                .json(&patch),
        )
        .await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RecordError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    #[tracing::instrument(skip(self), fields(db.table = %collection, db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, collection: Collection, id: &str) -> RecordResult<()> {
        Self::send(self.request(Method::DELETE, collection).query(&id_param(id))).await?;
        Ok(())
    }
}
