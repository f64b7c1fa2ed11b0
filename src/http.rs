//! Outbound HTTP connection to the API host.
//!
//! A [`Connection`] bundles a configured reqwest client (bearer header, timeouts, redirect
//! limit), the retry policy, and an optional [`ResponseCache`]. Connections are cheap to clone
//! and never observe session state after they are built; a token change means building a new
//! one.

mod cache;

pub use cache::ResponseCache;

// crates.io
use rand::Rng;
use reqwest::{
	Response,
	header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
	redirect::Policy,
};
// self
use crate::{
	_prelude::*,
	config::{ApiConfig, RetryPolicy},
	endpoint::ApiParams,
	error::{ConfigError, ServiceKind, TransportError},
	service::SoftFailureDetector,
	session::{ApiResponse, Verb},
};

const USER_AGENT: &str = concat!("bookshare-api/", env!("CARGO_PKG_VERSION"));

/// Configured HTTP client bound to one base URL.
#[derive(Clone)]
pub struct Connection {
	client: ReqwestClient,
	base_url: Url,
	retry: Arc<RetryPolicy>,
	cache: Option<ResponseCache>,
	authorized: bool,
}
impl Connection {
	/// Builds a connection targeting `base_url`.
	///
	/// `token` becomes the `Authorization: Bearer` default header.
	pub fn build(
		config: &ApiConfig,
		base_url: Url,
		token: Option<&str>,
		cache: Option<ResponseCache>,
	) -> Result<Self, ConfigError> {
		let mut headers = HeaderMap::new();

		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		if let Some(token) = token {
			let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
				.map_err(|_| ConfigError::InvalidHeader { header: "authorization" })?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		let client = ReqwestClient::builder()
			.default_headers(headers)
			.user_agent(USER_AGENT)
			.timeout(config.timeout)
			.connect_timeout(config.open_timeout)
			.redirect(Policy::limited(config.redirect_limit))
			.danger_accept_invalid_certs(config.accept_invalid_certs)
			.build()?;

		tracing::debug!(
			base_url = %base_url,
			authorized = token.is_some(),
			cached = cache.is_some(),
			"Built API connection."
		);

		Ok(Self {
			client,
			base_url,
			retry: Arc::new(config.retry.clone()),
			cache,
			authorized: token.is_some(),
		})
	}

	/// Base URL requests are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Returns `true` when the connection sends a bearer token.
	pub fn is_authorized(&self) -> bool {
		self.authorized
	}

	/// Appends percent-encoded path segments to the base URL.
	pub fn url_for<S>(&self, segments: &[S]) -> Url
	where
		S: AsRef<str>,
	{
		join_segments(&self.base_url, segments)
	}

	/// Sends one request, retrying idempotent verbs on transient failures.
	///
	/// Non-mutating verbs carry `params` as a flat query string; mutating verbs send them as a
	/// JSON body. Responses with a retryable status are returned as-is once retries run out.
	/// Only successful `GET` responses that `detector` accepts are cached.
	pub async fn send(
		&self,
		service: ServiceKind,
		verb: Verb,
		mut url: Url,
		params: &ApiParams,
		detector: &dyn SoftFailureDetector,
	) -> Result<ApiResponse, TransportError> {
		if !verb.is_mutating() {
			let pairs = params.query_pairs();

			if !pairs.is_empty() {
				url.query_pairs_mut().extend_pairs(pairs);
			}
		}

		let cache = self.cache.as_ref().filter(|_| verb == Verb::Get);

		if let Some(cache) = cache {
			if let Some(hit) = cache.get(url.as_str()).await {
				tracing::debug!(path = url.path(), "Serving cached response.");

				return Ok(hit);
			}
		}

		let attempts = if verb.is_idempotent() { self.retry.max_retries + 1 } else { 1 };
		let mut retry = 0;

		loop {
			let mut request = self.client.request(verb.method(), url.clone());

			if verb.is_mutating() {
				request = request.json(params);
			}

			tracing::debug!(attempt = retry + 1, %verb, path = url.path(), "Sending request.");

			let can_retry = retry + 1 < attempts;

			match request.send().await {
				Ok(response) => {
					let status = response.status().as_u16();

					tracing::debug!(attempt = retry + 1, status, "Received response.");

					if can_retry && self.retry.retries_status(status) {
						retry += 1;
						tracing::warn!(retry, status, path = url.path(), "Retrying request.");
						self.backoff(retry).await;

						continue;
					}

					let response = buffer(response)
						.await
						.map_err(|e| TransportError::from_reqwest(service, e))?;

					let cacheable =
						response.is_success() && !detector.is_soft_failure(&response);

					if let Some(cache) = cache.filter(|_| cacheable) {
						cache.insert(url.to_string(), response.clone()).await;
					}

					return Ok(response);
				},
				Err(e) => {
					if can_retry && should_retry_error(&e) {
						retry += 1;
						tracing::warn!(retry, error = %e, path = url.path(), "Retrying request.");
						self.backoff(retry).await;

						continue;
					}

					return Err(TransportError::from_reqwest(service, e));
				},
			}
		}
	}

	async fn backoff(&self, retry: u32) {
		let jitter = rand::rng().random_range(-1.0..=1.0);
		let delay = self.retry.delay(retry, jitter);

		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
	}
}
impl Debug for Connection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connection")
			.field("base_url", &self.base_url.as_str())
			.field("authorized", &self.authorized)
			.field("retry", &self.retry)
			.field("cached", &self.cache.is_some())
			.finish()
	}
}

/// Appends percent-encoded path segments to `base`.
pub fn join_segments<S>(base: &Url, segments: &[S]) -> Url
where
	S: AsRef<str>,
{
	let mut url = base.clone();

	if let Ok(mut path) = url.path_segments_mut() {
		path.pop_if_empty().extend(segments.iter().map(AsRef::as_ref));
	}

	url
}

async fn buffer(response: Response) -> Result<ApiResponse, ReqwestError> {
	let status = response.status().as_u16();
	let url = response.url().clone();
	let headers = response.headers().clone();
	let body = response.text().await?;

	Ok(ApiResponse { status, url, headers, body })
}

fn should_retry_error(e: &ReqwestError) -> bool {
	e.is_timeout() || e.is_connect() || e.is_request()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> ApiConfig {
		ApiConfig::builder()
			.base_url(Url::parse("https://api.example.org/v2").expect("Base URL should parse."))
			.api_key("key")
			.build()
	}

	#[test]
	fn url_segments_are_percent_encoded() {
		let config = config();
		let connection = Connection::build(&config, config.base_url.clone(), None, None)
			.expect("Connection should build.");
		let url = connection.url_for(&["titles", "a b/c"]);

		assert_eq!(url.as_str(), "https://api.example.org/v2/titles/a%20b%2Fc");
		assert!(!connection.is_authorized());
	}

	#[test]
	fn token_becomes_authorization_header() {
		let config = config();
		let connection =
			Connection::build(&config, config.base_url.clone(), Some("tok-123"), None)
				.expect("Connection should build.");

		assert!(connection.is_authorized());
		assert!(!format!("{connection:?}").contains("tok-123"));
	}

	#[test]
	fn control_characters_in_tokens_are_rejected() {
		let config = config();
		let err = Connection::build(&config, config.base_url.clone(), Some("bad\ntoken"), None)
			.expect_err("Header-breaking tokens should be rejected.");

		assert!(matches!(err, ConfigError::InvalidHeader { header: "authorization" }));
	}
}
