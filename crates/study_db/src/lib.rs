//! Data access for the study sets app.
//!
//! This crate provides:
//! - SupabaseConfig / SupabaseClient: the hosted database connection settings
//!   and a process-wide client handle built from them
//! - SelectQuery: PostgREST read queries
//! - RealtimeChannel: live change notifications over the realtime websocket

pub mod realtime;

use std::sync::OnceLock;

use gloo_net::http::Request;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use realtime::{
    ChangeFilter, ChangeKind, ChangeType, PostgresChange, RealtimeChannel, Subscription,
};
pub use study_types::*;

/// Environment variable holding the service URL.
pub const URL_VAR: &str = "SUPABASE_URL";

/// Environment variable holding the public anon key.
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Database client has not been initialized")]
    NotInitialized,

    #[error("HTTP request failed: {0}")]
    Http(#[from] gloo_net::Error),

    #[error("Request rejected ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Realtime error: {0}")]
    Realtime(String),
}

impl DbError {
    /// Build an API error from a non-2xx response body.
    ///
    /// PostgREST reports failures as `{code, message, details, hint}`; any
    /// other body is kept verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(err) => err.to_string(),
            Err(_) if body.trim().is_empty() => "empty response body".to_string(),
            Err(_) => body.trim().to_string(),
        };

        DbError::Api { status, message }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

/// Connection settings for the hosted database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Service endpoint, e.g. https://xyzcompany.supabase.co
    pub url: String,
    /// Public anon key sent with every request
    pub anon_key: String,
}

impl SupabaseConfig {
    /// Create a config from explicit values.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Read the config from the process environment, loading `.env` first.
    ///
    /// Missing variables become empty strings; the client rejects them
    /// when it is constructed.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            url: std::env::var(URL_VAR).unwrap_or_default(),
            anon_key: std::env::var(ANON_KEY_VAR).unwrap_or_default(),
        }
    }

    /// Read the config baked in at compile time.
    ///
    /// The WASM bundle has no process environment, so the values are taken
    /// from the build environment instead.
    pub fn from_build_env() -> Self {
        Self {
            url: option_env!("SUPABASE_URL").unwrap_or_default().to_string(),
            anon_key: option_env!("SUPABASE_ANON_KEY")
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Sort direction for ordered reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// Client for the hosted database.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a client, rejecting unusable settings.
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(DbError::Config(format!("{} is not set", URL_VAR)));
        }
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(DbError::Config(format!(
                "{} must be an http(s) URL, got {}",
                URL_VAR, base_url
            )));
        }
        if config.anon_key.trim().is_empty() {
            return Err(DbError::Config(format!("{} is not set", ANON_KEY_VAR)));
        }

        Ok(Self {
            base_url,
            anon_key: config.anon_key.trim().to_string(),
        })
    }

    /// Service endpoint without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a read query against a table.
    pub fn from(&self, table: &str) -> SelectQuery<'_> {
        SelectQuery {
            client: self,
            table: table.to_string(),
            columns: "*".to_string(),
            order: None,
        }
    }

    /// Create a realtime channel with the given name.
    pub fn channel(&self, name: &str) -> RealtimeChannel {
        RealtimeChannel::new(self.realtime_url(), self.anon_key.clone(), name)
    }

    /// Websocket endpoint of the realtime service.
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };

        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base,
            urlencoding::encode(&self.anon_key)
        )
    }
}

static SHARED: OnceLock<SupabaseClient> = OnceLock::new();

/// Build the process-wide client.
///
/// Only the first successful call constructs a client; later calls return
/// the existing one and ignore their config.
pub fn init(config: SupabaseConfig) -> Result<&'static SupabaseClient> {
    if let Some(client) = SHARED.get() {
        return Ok(client);
    }

    let client = SupabaseClient::new(config)?;
    tracing::debug!(url = %client.base_url, "database client initialized");
    Ok(SHARED.get_or_init(|| client))
}

/// The process-wide client, once [`init`] has succeeded.
pub fn shared() -> Result<&'static SupabaseClient> {
    SHARED.get().ok_or(DbError::NotInitialized)
}

/// A PostgREST read query.
#[derive(Debug, Clone)]
pub struct SelectQuery<'a> {
    client: &'a SupabaseClient,
    table: String,
    columns: String,
    order: Option<(String, Order)>,
}

impl SelectQuery<'_> {
    /// Columns to return (`*` for all).
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Sort the rows by a column.
    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    /// Full request URL for this query.
    pub fn url(&self) -> String {
        let mut params = vec![("select", self.columns.clone())];
        if let Some((column, order)) = &self.order {
            params.push(("order", format!("{}.{}", column, order.as_str())));
        }

        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();

        format!(
            "{}/rest/v1/{}?{}",
            self.client.base_url,
            self.table,
            query.join("&")
        )
    }

    /// Run the query and decode every returned row.
    pub async fn fetch<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let url = self.url();
        tracing::debug!(table = %self.table, %url, "select");

        let key = &self.client.anon_key;
        let response = Request::get(&url)
            .header("apikey", key)
            .header("Authorization", &format!("Bearer {}", key))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.ok() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DbError::from_response(status, &body));
        }

        let rows = response.json::<Vec<T>>().await?;
        tracing::debug!(table = %self.table, rows = rows.len(), "select complete");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig::new(
            "https://demo.supabase.co/",
            "public-anon-key",
        ))
        .unwrap()
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = test_client();
        assert_eq!(client.base_url(), "https://demo.supabase.co");
    }

    #[test]
    fn test_client_rejects_missing_url() {
        let err = SupabaseClient::new(SupabaseConfig::new("", "key")).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
        assert!(err.to_string().contains(URL_VAR));
    }

    #[test]
    fn test_client_rejects_non_http_url() {
        let err = SupabaseClient::new(SupabaseConfig::new("demo.supabase.co", "key")).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_client_rejects_missing_key() {
        let err =
            SupabaseClient::new(SupabaseConfig::new("https://demo.supabase.co", " ")).unwrap_err();
        assert!(err.to_string().contains(ANON_KEY_VAR));
    }

    #[test]
    fn test_study_sets_query_url() {
        let client = test_client();
        let url = client
            .from(STUDY_SETS_TABLE)
            .select("*")
            .order(CREATED_AT, Order::Descending)
            .url();

        assert_eq!(
            url,
            "https://demo.supabase.co/rest/v1/study_sets?select=%2A&order=created_at.desc"
        );
    }

    #[test]
    fn test_query_defaults_to_all_columns_unordered() {
        let client = test_client();
        let url = client.from("category_scores").url();

        assert_eq!(
            url,
            "https://demo.supabase.co/rest/v1/category_scores?select=%2A"
        );
    }

    #[test]
    fn test_query_encodes_column_list() {
        let client = test_client();
        let url = client
            .from(STUDY_SETS_TABLE)
            .select("id,name")
            .order("id", Order::Ascending)
            .url();

        assert!(url.ends_with("?select=id%2Cname&order=id.asc"));
    }

    #[test]
    fn test_realtime_url() {
        let client = test_client();
        assert_eq!(
            client.realtime_url(),
            "wss://demo.supabase.co/realtime/v1/websocket?apikey=public-anon-key&vsn=1.0.0"
        );

        let local =
            SupabaseClient::new(SupabaseConfig::new("http://localhost:54321", "key")).unwrap();
        assert!(local.realtime_url().starts_with("ws://localhost:54321/realtime/v1/"));
    }

    #[test]
    fn test_api_error_from_postgrest_body() {
        let body = r#"{"code":"42P01","message":"relation \"public.study_sets\" does not exist","details":null,"hint":null}"#;
        let err = DbError::from_response(404, body);

        match err {
            DbError::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("does not exist"));
                assert!(message.contains("42P01"));
            }
            other => panic!("Wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        let err = DbError::from_response(502, "Bad Gateway\n");
        assert_eq!(err.to_string(), "Request rejected (502): Bad Gateway");

        let empty = DbError::from_response(500, "");
        assert_eq!(empty.to_string(), "Request rejected (500): empty response body");
    }

    #[test]
    fn test_shared_client_is_built_once() {
        let first = init(SupabaseConfig::new("https://first.supabase.co", "key-1")).unwrap();
        let second = init(SupabaseConfig::new("https://second.supabase.co", "key-2")).unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(shared().unwrap().base_url(), first.base_url());
    }

    #[test]
    fn test_config_from_env() {
        // The only test touching these variables, so setting them is race-free.
        unsafe {
            std::env::set_var(URL_VAR, "https://env.supabase.co");
            std::env::set_var(ANON_KEY_VAR, "env-anon-key");
        }
        let config = SupabaseConfig::from_env();
        assert_eq!(config.url, "https://env.supabase.co");
        assert_eq!(config.anon_key, "env-anon-key");

        unsafe {
            std::env::remove_var(URL_VAR);
            std::env::remove_var(ANON_KEY_VAR);
        }
        let config = SupabaseConfig::from_env();
        assert_eq!(config, SupabaseConfig::new("", ""));
        assert!(matches!(
            SupabaseClient::new(config),
            Err(DbError::Config(_))
        ));
    }
}
