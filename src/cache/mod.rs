//! Offline response cache for the WalletCare client.
//!
//! Split into the persistent store (`store`) holding cached responses on
//! disk, one file per cache generation, and the agent (`agent`) that
//! owns the install/activate lifecycle and answers fetches from cache or
//! network according to the configured policy.

pub mod agent;
pub mod store;

pub use agent::{CacheAgent, FetchPolicy, Fetcher, FetchedResponse, HttpFetcher, LifecycleState};
pub use store::{CacheStore, CachedResponse, CACHE_GENERATION};
