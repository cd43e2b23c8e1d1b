use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::query::TableQuery;

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// Thin client over the Supabase REST (PostgREST) API.
///
/// Every call carries the project anon key and, when given, the caller's
/// access token so row-level security applies to the caller.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    fn prefer(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static(value));
        headers
    }

    /// All rows matching the query.
    pub async fn select<T>(&self, query: &TableQuery, auth_token: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, &query.to_path(), Some(auth_token), None)
            .await
    }

    /// The first matching row, or `None` when nothing matches.
    pub async fn select_one<T>(&self, query: &TableQuery, auth_token: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.select(query, auth_token).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts `body` (an object or an array of objects) and returns the stored rows.
    pub async fn insert<T>(&self, table: &str, body: Value, auth_token: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = TableQuery::table(table).to_path();
        self.request_with_headers(
            Method::POST,
            &path,
            Some(auth_token),
            Some(body),
            Some(Self::prefer(RETURN_REPRESENTATION)),
        )
        .await
    }

    /// Patches every row matching `query`. A query without filters is refused.
    pub async fn update<T>(&self, query: &TableQuery, body: Value, auth_token: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        if !query.has_filters() {
            return Err(anyhow!(
                "Refusing to update {} without a filter",
                query.table_name()
            ));
        }

        self.request_with_headers(
            Method::PATCH,
            &query.to_path(),
            Some(auth_token),
            Some(body),
            Some(Self::prefer(RETURN_REPRESENTATION)),
        )
        .await
    }

    /// Inserts or merges `body`, resolving duplicates on `on_conflict` when given
    /// (otherwise on the primary key).
    pub async fn upsert<T>(
        &self,
        table: &str,
        body: Value,
        on_conflict: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut query = TableQuery::table(table);
        if let Some(columns) = on_conflict {
            query = query.on_conflict(columns);
        }

        self.request_with_headers(
            Method::POST,
            &query.to_path(),
            Some(auth_token),
            Some(body),
            Some(Self::prefer(MERGE_DUPLICATES)),
        )
        .await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
