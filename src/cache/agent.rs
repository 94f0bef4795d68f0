//! Cache agent: lifecycle and fetch interception.
//!
//! The agent sits between the client and the network. On startup it runs
//! an install phase that precaches the application shell manifest
//! all-or-nothing, then an activate phase that sweeps stale cache
//! generations. After that every fetch goes through `handle`, which
//! answers from cache or network according to the configured policy.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use futures::future;
use tracing::{debug, info, warn};

use super::store::{CacheStore, CachedResponse, CACHE_GENERATION};

// ============================================================================
// Constants
// ============================================================================

/// Application shell manifest precached during install. Relative entries
/// resolve against the configured origin; absolute entries are CDN
/// assets cached as-is.
pub const CACHE_MANIFEST: &[&str] = &[
    "/",
    "/static/style.css",
    "/static/main.js",
    "/static/icon-192.png",
    "/static/icon-512.png",
    "/manifest.json",
    "https://cdn.jsdelivr.net/npm/chart.js",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
];

/// Timeout for precache and passthrough fetches.
const FETCH_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Fetcher seam
// ============================================================================

/// A response as it came off the network, before any cache decision.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// URL after redirects. Equals the request URL when none occurred.
    pub final_url: String,
}

/// Network access seam so the agent's cache logic runs in tests without
/// touching a socket.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResponse>;
}

/// Production fetcher backed by reqwest.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?
            .to_vec();

        Ok(FetchedResponse {
            status,
            content_type,
            body,
            final_url,
        })
    }
}

// ============================================================================
// Agent
// ============================================================================

/// Lifecycle phases. Fetch handling is only meaningful once active, but
/// a failed install leaves the agent serving network-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    Installed,
    Active,
}

/// How `handle` orders cache and network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Serve from cache when present, hit the network only on a miss.
    CacheFirst,
    /// Try the network, fall back to cache when it fails.
    NetworkFirst,
}

pub struct CacheAgent<F> {
    fetcher: F,
    origin: String,
    cache_dir: PathBuf,
    generation: String,
    policy: FetchPolicy,
    state: LifecycleState,
    store: Option<CacheStore>,
}

impl<F: Fetcher> CacheAgent<F> {
    pub fn new(fetcher: F, origin: &str, cache_dir: PathBuf) -> Self {
        Self {
            fetcher,
            origin: origin.trim_end_matches('/').to_string(),
            cache_dir,
            generation: CACHE_GENERATION.to_string(),
            policy: FetchPolicy::CacheFirst,
            state: LifecycleState::Installing,
            store: None,
        }
    }

    /// Override the default cache-first policy. Fronting live API reads
    /// wants network-first with an offline fallback.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Resolve a manifest or request URL against the origin.
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.origin, url)
        }
    }

    fn same_origin(&self, url: &str) -> bool {
        url.starts_with(&self.origin)
    }

    /// A passthrough response may be cached only when it is a clean 200,
    /// was not redirected, and came from our own origin.
    fn is_cacheable(&self, requested: &str, response: &FetchedResponse) -> bool {
        response.status == 200 && response.final_url == requested && self.same_origin(requested)
    }

    fn entry(response: &FetchedResponse) -> CachedResponse {
        CachedResponse {
            status: response.status,
            content_type: response.content_type.clone(),
            body: response.body.clone(),
            final_url: response.final_url.clone(),
            cached_at: Utc::now(),
        }
    }

    fn from_entry(entry: &CachedResponse) -> FetchedResponse {
        FetchedResponse {
            status: entry.status,
            content_type: entry.content_type.clone(),
            body: entry.body.clone(),
            final_url: entry.final_url.clone(),
        }
    }

    fn ensure_store(&mut self) -> Result<&mut CacheStore> {
        if self.store.is_none() {
            self.store = Some(CacheStore::open(&self.cache_dir, &self.generation)?);
        }
        Ok(self.store.as_mut().expect("store opened above"))
    }

    /// Precache the application shell. All-or-nothing: every manifest
    /// entry must fetch with status 200 before anything is persisted, so
    /// a failed install never leaves a partially populated generation.
    pub async fn install(&mut self) -> Result<()> {
        info!(generation = %self.generation, "Cache install started");

        let fetcher = &self.fetcher;
        let fetched = future::try_join_all(CACHE_MANIFEST.iter().map(|url| {
            let resolved = self.resolve(url);
            async move {
                let response = fetcher
                    .fetch(&resolved)
                    .await
                    .with_context(|| format!("Precache fetch failed for {}", resolved))?;

                if response.status != 200 {
                    bail!(
                        "Precache fetch for {} returned status {}",
                        resolved,
                        response.status
                    );
                }

                debug!(url = %resolved, bytes = response.body.len(), "Precached");
                Ok((resolved, response))
            }
        }))
        .await?;

        let staged: HashMap<String, CachedResponse> = fetched
            .into_iter()
            .map(|(resolved, response)| {
                (
                    CacheStore::request_key("GET", &resolved),
                    Self::entry(&response),
                )
            })
            .collect();

        let count = staged.len();
        self.ensure_store()?.put_all(staged)?;
        self.state = LifecycleState::Installed;
        info!(entries = count, "Cache install complete");
        Ok(())
    }

    /// Take ownership of fetch handling: sweep every stale generation
    /// from disk, keeping only the current one.
    pub async fn activate(&mut self) -> Result<()> {
        for name in CacheStore::list_generations(&self.cache_dir)? {
            if name != self.generation {
                info!(generation = %name, "Sweeping stale cache generation");
                CacheStore::delete_generation(&self.cache_dir, &name)?;
            }
        }

        self.ensure_store()?;
        self.state = LifecycleState::Active;
        info!(generation = %self.generation, "Cache agent active");
        Ok(())
    }

    /// Answer a GET request according to the configured policy.
    pub async fn handle(&mut self, url: &str) -> Result<FetchedResponse> {
        let resolved = self.resolve(url);
        match self.policy {
            FetchPolicy::CacheFirst => self.cache_first(&resolved).await,
            FetchPolicy::NetworkFirst => self.network_first(&resolved).await,
        }
    }

    async fn cache_first(&mut self, url: &str) -> Result<FetchedResponse> {
        let key = CacheStore::request_key("GET", url);

        if let Some(entry) = self.ensure_store()?.get(&key) {
            debug!(url, "Cache hit");
            return Ok(Self::from_entry(entry));
        }

        debug!(url, "Cache miss, fetching");
        let response = self.fetcher.fetch(url).await?;
        if self.is_cacheable(url, &response) {
            self.ensure_store()?.put(key, Self::entry(&response))?;
        }
        Ok(response)
    }

    async fn network_first(&mut self, url: &str) -> Result<FetchedResponse> {
        let key = CacheStore::request_key("GET", url);

        match self.fetcher.fetch(url).await {
            Ok(response) => {
                if self.is_cacheable(url, &response) {
                    self.ensure_store()?.put(key.clone(), Self::entry(&response))?;
                }
                Ok(response)
            }
            Err(e) => {
                warn!(url, error = %e, "Network fetch failed, trying cache");
                if let Some(entry) = self.ensure_store()?.get(&key) {
                    return Ok(Self::from_entry(entry));
                }
                Err(e)
            }
        }
    }
}
