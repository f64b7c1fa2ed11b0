// crates.io
use moka::future::Cache;
// self
use crate::{_prelude::*, config::CacheConfig, session::ApiResponse};

/// In-memory cache of successful `GET` responses keyed by full request URL.
///
/// Clones share storage. Entries expire after the configured TTL and are dropped wholesale
/// whenever the session's credentials change.
#[derive(Clone)]
pub struct ResponseCache {
	inner: Cache<String, ApiResponse>,
}
impl ResponseCache {
	/// Creates a cache with the given limits.
	pub fn new(config: &CacheConfig) -> Self {
		tracing::info!(
			ttl_seconds = config.ttl.as_secs(),
			max_capacity = config.max_capacity,
			"Response cache enabled."
		);

		Self {
			inner: Cache::builder()
				.time_to_live(config.ttl)
				.max_capacity(config.max_capacity)
				.build(),
		}
	}

	/// Creates a cache only when caching is enabled.
	pub fn from_config(config: &CacheConfig) -> Option<Self> {
		config.enabled.then(|| Self::new(config))
	}

	/// Returns the cached response for `url`.
	pub async fn get(&self, url: &str) -> Option<ApiResponse> {
		self.inner.get(url).await
	}

	/// Stores a response.
	pub async fn insert(&self, url: String, response: ApiResponse) {
		self.inner.insert(url, response).await;
	}

	/// Drops every entry.
	pub fn invalidate_all(&self) {
		self.inner.invalidate_all();
	}
}
impl Debug for ResponseCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResponseCache").field("entries", &self.inner.entry_count()).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderMap;
	// self
	use super::*;

	#[tokio::test]
	async fn stores_and_invalidates() {
		let cache = ResponseCache::new(&CacheConfig { enabled: true, ..CacheConfig::default() });
		let url = "https://api.example.org/v2/titles?api_key=k";
		let response = ApiResponse {
			status: 200,
			url: Url::parse(url).expect("Cache key fixture should parse."),
			headers: HeaderMap::new(),
			body: "{}".into(),
		};

		cache.insert(url.into(), response).await;

		assert_eq!(cache.get(url).await.map(|r| r.status), Some(200));

		cache.invalidate_all();

		assert!(cache.get(url).await.is_none());
		assert!(ResponseCache::from_config(&CacheConfig::default()).is_none());
	}
}
