//! API client for communicating with the WalletCare REST API.
//!
//! This module provides the `ApiClient` struct for making requests
//! against a WalletCare server. All endpoints speak JSON except the PDF
//! report, which streams binary data.
//!
//! When a cache agent is attached, every GET goes through it
//! network-first, so previously-seen responses keep answering when the
//! network is away. Mutating requests always go straight to the server.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheAgent, Fetcher, HttpFetcher};
use crate::models::{
    AppConfig, ChatReply, ConfigPatch, DashboardSummary, Expense, ExpenseDraft, InvestmentOutlook,
};

use super::error::GENERIC_REJECTION;
use super::{ApiError, ExpenseApi};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow responses (PDF generation) while failing fast
/// enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Wire value the server uses to signal success in response envelopes.
const STATUS_SUCCESS: &str = "success";

/// Wraps a request body with the device identity the server partitions by.
#[derive(Serialize)]
struct DeviceScoped<'a, T: Serialize> {
    #[serde(flatten)]
    inner: &'a T,
    device_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ConfigEnvelope {
    status: String,
    #[serde(default)]
    config: Option<AppConfig>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpenseEnvelope {
    status: String,
    #[serde(rename = "gasto", default)]
    expense: Option<Expense>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResetEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// API client for the WalletCare service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient<F = HttpFetcher> {
    client: Client,
    base_url: String,
    cache: Option<Arc<Mutex<CacheAgent<F>>>>,
}

impl ApiClient<HttpFetcher> {
    /// Create a new API client against the given origin.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: None,
        })
    }
}

impl<F: Fetcher> ApiClient<F> {
    /// Attach a cache agent; from here on every GET is served through it.
    pub fn with_cache(mut self, agent: CacheAgent<F>) -> Self {
        self.cache = Some(Arc::new(Mutex::new(agent)));
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET raw bytes. With a cache agent attached the request goes
    /// through it under the agent's policy, so the last good response
    /// keeps answering when the server is unreachable.
    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url(path);

        if let Some(cache) = &self.cache {
            let response = cache.lock().await.handle(&url).await?;
            if !(200..300).contains(&response.status) {
                let status = reqwest::StatusCode::from_u16(response.status)
                    .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                let body = String::from_utf8_lossy(&response.body);
                return Err(ApiError::from_status(status, &body).into());
            }
            return Ok(response.body);
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok(bytes.to_vec())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let bytes = self.get_bytes(path).await?;
        serde_json::from_slice(&bytes).with_context(|| {
            format!("Failed to parse JSON response from {}{}", self.base_url, path)
        })
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

}

/// Convert a `{status, ...}` envelope into the payload it carries, or
/// the server's own rejection message.
fn unwrap_envelope<T>(status: &str, payload: Option<T>, message: Option<String>) -> Result<T> {
    if status == STATUS_SUCCESS {
        payload.ok_or_else(|| {
            ApiError::InvalidResponse("success envelope without payload".to_string()).into()
        })
    } else {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_REJECTION.to_string());
        Err(ApiError::Rejected(message).into())
    }
}

impl<F: Fetcher> ExpenseApi for ApiClient<F> {
    async fn fetch_config(&self, device_id: &str) -> Result<AppConfig> {
        self.get(&format!("/api/config?device_id={}", device_id))
            .await
    }

    async fn save_config(&self, device_id: &str, patch: &ConfigPatch) -> Result<AppConfig> {
        let body = DeviceScoped {
            inner: patch,
            device_id,
        };
        let envelope: ConfigEnvelope = self.post("/api/config", &body).await?;
        debug!(status = %envelope.status, "Config save response received");
        unwrap_envelope(&envelope.status, envelope.config, envelope.message)
    }

    async fn fetch_expenses(&self, device_id: &str) -> Result<Vec<Expense>> {
        self.get(&format!("/api/gastos?device_id={}", device_id))
            .await
    }

    async fn save_expense(&self, device_id: &str, draft: &ExpenseDraft) -> Result<Expense> {
        let body = DeviceScoped {
            inner: draft,
            device_id,
        };
        let envelope: ExpenseEnvelope = self.post("/api/gastos", &body).await?;
        debug!(status = %envelope.status, "Expense save response received");
        unwrap_envelope(&envelope.status, envelope.expense, envelope.message)
    }

    async fn fetch_dashboard(&self) -> Result<DashboardSummary> {
        self.get("/api/dashboard").await
    }

    async fn send_chat(&self, message: &str) -> Result<ChatReply> {
        let body = serde_json::json!({ "mensagem": message });
        self.post("/api/chat", &body).await
    }

    async fn fetch_report_pdf(&self) -> Result<Vec<u8>> {
        let bytes = self.get_bytes("/api/relatorio/pdf").await?;
        debug!(size = bytes.len(), "PDF report downloaded");
        Ok(bytes)
    }

    async fn fetch_investments(&self) -> Result<InvestmentOutlook> {
        self.get("/api/investimentos").await
    }

    async fn reset_expenses(&self, device_id: &str) -> Result<()> {
        let body = serde_json::json!({ "device_id": device_id });
        let envelope: ResetEnvelope = self.post("/api/reset-gastos", &body).await?;
        debug!(status = %envelope.status, "Reset response received");
        unwrap_envelope(&envelope.status, Some(()), envelope.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FetchPolicy, FetchedResponse};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

    const ORIGIN: &str = "http://localhost:5000";

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "walletcare-client-test-{}-{}",
            std::process::id(),
            TEST_DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    /// Scripted fetcher; clones share state so tests can take the
    /// network away mid-run.
    #[derive(Clone, Default)]
    struct ScriptedFetcher {
        responses: Rc<RefCell<HashMap<String, FetchedResponse>>>,
    }

    impl ScriptedFetcher {
        fn serve_json(&self, url: &str, status: u16, body: &str) {
            self.responses.borrow_mut().insert(
                url.to_string(),
                FetchedResponse {
                    status,
                    content_type: Some("application/json".to_string()),
                    body: body.as_bytes().to_vec(),
                    final_url: url.to_string(),
                },
            );
        }

        fn forget(&self, url: &str) {
            self.responses.borrow_mut().remove(url);
        }
    }

    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedResponse> {
            self.responses
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection refused: {}", url))
        }
    }

    fn cached_client(fetcher: ScriptedFetcher, dir: PathBuf) -> ApiClient<ScriptedFetcher> {
        ApiClient {
            client: Client::new(),
            base_url: ORIGIN.to_string(),
            cache: None,
        }
        .with_cache(CacheAgent::new(fetcher, ORIGIN, dir).with_policy(FetchPolicy::NetworkFirst))
    }

    #[tokio::test]
    async fn test_cached_get_survives_network_loss() {
        let dir = temp_dir();
        let fetcher = ScriptedFetcher::default();
        let url = format!("{}/api/dashboard", ORIGIN);
        fetcher.serve_json(&url, 200, r#"{"total_gasto": 120.5, "renda_mensal": 2000.0}"#);
        let client = cached_client(fetcher.clone(), dir.clone());

        let online = client.fetch_dashboard().await.expect("network is up");
        assert_eq!(online.total_spent, 120.5);

        // Server goes away; the previously-seen response answers
        fetcher.forget(&url);
        let offline = client.fetch_dashboard().await.expect("served from cache");
        assert_eq!(offline.total_spent, 120.5);
        assert_eq!(offline.monthly_income, 2000.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_cached_get_maps_error_statuses() {
        let dir = temp_dir();
        let fetcher = ScriptedFetcher::default();
        let url = format!("{}/api/gastos?device_id=device_x", ORIGIN);
        fetcher.serve_json(&url, 400, r#"{"error": "device_id obrigatório"}"#);
        let client = cached_client(fetcher, dir.clone());

        let err = client
            .fetch_expenses("device_x")
            .await
            .expect_err("bad request must fail");
        assert_eq!(err.to_string(), "device_id obrigatório");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_device_scoped_body_flattens() {
        let patch = ConfigPatch::income(1500.0);
        let body = DeviceScoped {
            inner: &patch,
            device_id: "device_123_abc",
        };
        let value = serde_json::to_value(&body).expect("body should serialize");
        assert_eq!(value["renda_mensal"], 1500.0);
        assert_eq!(value["device_id"], "device_123_abc");
        // Unpopulated patch fields stay off the wire
        assert!(value.get("tema").is_none());
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let config = unwrap_envelope("success", Some(AppConfig::default()), None)
            .expect("success envelope should unwrap");
        assert_eq!(config.monthly_income, 0.0);
    }

    #[test]
    fn test_unwrap_envelope_surfaces_server_message() {
        let err = unwrap_envelope::<()>(
            "error",
            None,
            Some("Gastos resetados com sucesso".to_string()),
        )
        .expect_err("non-success status should fail");
        assert_eq!(err.to_string(), "Gastos resetados com sucesso");
    }

    #[test]
    fn test_unwrap_envelope_generic_fallback() {
        let err =
            unwrap_envelope::<()>("error", None, None).expect_err("should fail");
        assert_eq!(err.to_string(), GENERIC_REJECTION);
    }

    #[test]
    fn test_expense_envelope_parses() {
        let json = r#"{"status": "success", "gasto": {"id": 3, "valor": 12.0, "categoria": "bebidas", "descricao": "suco", "eh_impulsivo": false, "data": "2025-06-01T09:00:00"}}"#;
        let envelope: ExpenseEnvelope = serde_json::from_str(json).expect("envelope should parse");
        assert_eq!(envelope.status, "success");
        let expense = envelope.expense.expect("expense present");
        assert_eq!(expense.id, Some(3));
    }
}
