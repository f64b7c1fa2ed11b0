//! Explicit service configuration.
//!
//! Nothing in the crate reads the environment on its own. [`ApiConfig::from_env`] is the
//! single place that does, and everything downstream receives an [`ApiConfig`] (usually
//! behind an `Arc`) through its constructor.

// self
use crate::{_prelude::*, error::ConfigError, oauth::TestUserTokens};

/// API version segment every base URL is anchored under.
pub const API_VERSION: &str = "v2";
/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.bookshare.org/v2";
/// Production OAuth host.
pub const DEFAULT_AUTH_URL: &str = "https://auth.bookshare.org";

/// Exponential backoff settings applied by the connection's retry loop.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
	/// Maximum number of retries after the first attempt.
	pub max_retries: u32,
	/// Delay before the first retry.
	pub interval: StdDuration,
	/// Fraction of each delay that is randomized (`0.5` means ±50%).
	pub randomness: f64,
	/// Multiplier applied to the delay after every retry.
	pub backoff_factor: f64,
	/// Upper bound for a single delay.
	pub max_interval: StdDuration,
	/// HTTP statuses that are retried like transport failures.
	pub retry_statuses: Vec<u16>,
}
impl RetryPolicy {
	/// Disables retries entirely.
	pub fn none() -> Self {
		Self { max_retries: 0, ..Self::default() }
	}

	/// Overrides the retry limit.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the initial interval.
	pub fn with_interval(mut self, interval: StdDuration) -> Self {
		self.interval = interval;

		self
	}

	/// Returns `true` when the status should be retried.
	pub fn retries_status(&self, status: u16) -> bool {
		self.retry_statuses.contains(&status)
	}

	/// Delay before retry number `retry` (1-based), given a jitter sample in `[-1.0, 1.0]`.
	pub fn delay(&self, retry: u32, jitter: f64) -> StdDuration {
		let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
		let base = self.interval.as_secs_f64() * self.backoff_factor.powi(exponent);
		let randomized = base * (1.0 + self.randomness * jitter.clamp(-1.0, 1.0));
		let capped = randomized.clamp(0.0, self.max_interval.as_secs_f64());

		StdDuration::from_secs_f64(capped)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 2,
			interval: StdDuration::from_millis(50),
			randomness: 0.5,
			backoff_factor: 2.0,
			max_interval: StdDuration::from_secs(2),
			retry_statuses: vec![429, 502, 503, 504],
		}
	}
}

/// Response caching settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
	/// Enables the GET response cache.
	pub enabled: bool,
	/// Time-to-live for cached responses.
	pub ttl: StdDuration,
	/// Maximum number of cached responses.
	pub max_capacity: u64,
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self { enabled: false, ttl: StdDuration::from_secs(300), max_capacity: 1_000 }
	}
}

/// Problems found by [`ApiConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigIssue {
	/// No API key was configured.
	#[error("No API key is configured.")]
	MissingApiKey,
	/// The base URL has no host.
	#[error("The base URL has no host.")]
	MissingBaseUrl,
	/// The auth URL has no host.
	#[error("The auth URL has no host.")]
	MissingAuthUrl,
	/// A URL does not use HTTPS.
	#[error("The {field} URL does not use HTTPS: {url}.")]
	InsecureUrl {
		/// Configuration field.
		field: &'static str,
		/// Offending URL.
		url: String,
	},
}

/// Immutable configuration shared by every session built from it.
#[derive(Clone)]
pub struct ApiConfig {
	/// API base URL, always ending in the version segment.
	pub base_url: Url,
	/// OAuth host.
	pub auth_url: Url,
	/// API key sent with every request and used as the OAuth client id.
	pub api_key: String,
	/// Optional OAuth client secret.
	pub client_secret: Option<String>,
	/// Redirect URI registered for the authorization-code and implicit flows.
	pub redirect_uri: Option<Url>,
	/// Whole-request timeout.
	pub timeout: StdDuration,
	/// Connection-open timeout.
	pub open_timeout: StdDuration,
	/// Maximum number of redirects followed per request.
	pub redirect_limit: usize,
	/// Retry policy.
	pub retry: RetryPolicy,
	/// Response cache settings.
	pub cache: CacheConfig,
	/// Adds a PKCE challenge to authorization-code requests.
	pub use_pkce: bool,
	/// Pre-generated tokens for known test accounts.
	pub test_users: TestUserTokens,
	/// Allows [`ApiConfig::test_users`] to short-circuit the OAuth flow.
	pub allow_test_users: bool,
	/// Skips TLS certificate verification; only for self-signed test servers.
	pub accept_invalid_certs: bool,
}
impl ApiConfig {
	/// Creates a builder seeded with production defaults.
	pub fn builder() -> ApiConfigBuilder {
		ApiConfigBuilder::default()
	}

	/// Loads configuration from `BOOKSHARE_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads configuration through an arbitrary key lookup.
	///
	/// Missing values fall back to defaults and are logged; malformed values are errors.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let number = |key: &'static str| -> Result<Option<u64>, ConfigError> {
			get(key)
				.map(|v| v.parse().map_err(|_| ConfigError::InvalidNumber { field: key, value: v }))
				.transpose()
		};
		let flag = |key: &str| {
			get(key).is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
		};
		let mut builder = Self::builder();

		match get("BOOKSHARE_BASE_URL") {
			Some(raw) => builder = builder.base_url(normalize_base_url(&raw)?),
			None => tracing::error!("BOOKSHARE_BASE_URL is not set; using {DEFAULT_BASE_URL}."),
		}
		match get("BOOKSHARE_AUTH_URL") {
			Some(raw) => builder = builder.auth_url(normalize_auth_url(&raw)?),
			None => tracing::error!("BOOKSHARE_AUTH_URL is not set; using {DEFAULT_AUTH_URL}."),
		}
		match get("BOOKSHARE_API_KEY") {
			Some(key) => builder = builder.api_key(key),
			None => tracing::error!("BOOKSHARE_API_KEY is not set."),
		}

		if let Some(secret) = get("BOOKSHARE_CLIENT_SECRET") {
			builder = builder.client_secret(secret);
		}
		if let Some(raw) = get("BOOKSHARE_REDIRECT_URI") {
			let uri = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
				field: "redirect",
				value: raw.clone(),
				source,
			})?;

			builder = builder.redirect_uri(uri);
		}
		if let Some(secs) = number("BOOKSHARE_TIMEOUT")? {
			builder = builder.timeout(StdDuration::from_secs(secs));
		}
		if let Some(secs) = number("BOOKSHARE_OPEN_TIMEOUT")? {
			builder = builder.open_timeout(StdDuration::from_secs(secs));
		}
		if let Some(limit) = number("BOOKSHARE_RETRY_LIMIT")? {
			let limit = u32::try_from(limit).map_err(|_| ConfigError::InvalidNumber {
				field: "BOOKSHARE_RETRY_LIMIT",
				value: limit.to_string(),
			})?;

			builder = builder.retry(RetryPolicy::default().with_max_retries(limit));
		}
		if let Some(users) = get("BOOKSHARE_TEST_USERS") {
			builder = builder.test_users(TestUserTokens::parse(&users));
		}

		let config = builder
			.cache(CacheConfig { enabled: flag("BOOKSHARE_CACHE"), ..CacheConfig::default() })
			.allow_test_users(flag("BOOKSHARE_ALLOW_TEST_USERS"))
			.build();

		config.validate();

		Ok(config)
	}

	/// Checks for misconfiguration, logging every issue at ERROR.
	///
	/// Issues never prevent construction; requests made with a broken configuration fail at
	/// the transport layer instead.
	pub fn validate(&self) -> Vec<ConfigIssue> {
		let mut issues = Vec::new();

		if self.api_key.trim().is_empty() {
			issues.push(ConfigIssue::MissingApiKey);
		}
		if self.base_url.host_str().is_none_or(str::is_empty) {
			issues.push(ConfigIssue::MissingBaseUrl);
		} else if self.base_url.scheme() != "https" {
			issues.push(ConfigIssue::InsecureUrl { field: "base", url: self.base_url.to_string() });
		}
		if self.auth_url.host_str().is_none_or(str::is_empty) {
			issues.push(ConfigIssue::MissingAuthUrl);
		} else if self.auth_url.scheme() != "https" {
			issues.push(ConfigIssue::InsecureUrl { field: "auth", url: self.auth_url.to_string() });
		}

		for issue in &issues {
			tracing::error!(%issue, "Bookshare API misconfiguration.");
		}

		issues
	}

	/// Path of the version segment (`/v2`), taken from the base URL.
	pub fn version_path(&self) -> &str {
		self.base_url.path().trim_end_matches('/')
	}
}
impl Debug for ApiConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiConfig")
			.field("base_url", &self.base_url.as_str())
			.field("auth_url", &self.auth_url.as_str())
			.field("api_key_set", &!self.api_key.is_empty())
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri.as_ref().map(Url::as_str))
			.field("timeout", &self.timeout)
			.field("open_timeout", &self.open_timeout)
			.field("redirect_limit", &self.redirect_limit)
			.field("retry", &self.retry)
			.field("cache", &self.cache)
			.field("use_pkce", &self.use_pkce)
			.field("test_users", &self.test_users.len())
			.field("allow_test_users", &self.allow_test_users)
			.field("accept_invalid_certs", &self.accept_invalid_certs)
			.finish()
	}
}

/// Builder for [`ApiConfig`].
#[derive(Debug)]
pub struct ApiConfigBuilder {
	base_url: Option<Url>,
	auth_url: Option<Url>,
	api_key: String,
	client_secret: Option<String>,
	redirect_uri: Option<Url>,
	timeout: StdDuration,
	open_timeout: StdDuration,
	redirect_limit: usize,
	retry: RetryPolicy,
	cache: CacheConfig,
	use_pkce: bool,
	test_users: TestUserTokens,
	allow_test_users: bool,
	accept_invalid_certs: bool,
}
impl Default for ApiConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			auth_url: None,
			api_key: String::new(),
			client_secret: None,
			redirect_uri: None,
			timeout: StdDuration::from_secs(30),
			open_timeout: StdDuration::from_secs(10),
			redirect_limit: 5,
			retry: RetryPolicy::default(),
			cache: CacheConfig::default(),
			use_pkce: false,
			test_users: TestUserTokens::default(),
			allow_test_users: false,
			accept_invalid_certs: false,
		}
	}
}
impl ApiConfigBuilder {
	/// Sets the API base URL; a missing version segment is appended.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(with_version_segment(url));

		self
	}

	/// Sets the OAuth host.
	pub fn auth_url(mut self, url: Url) -> Self {
		self.auth_url = Some(url);

		self
	}

	/// Sets the API key.
	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = key.into();

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the OAuth redirect URI.
	pub fn redirect_uri(mut self, uri: Url) -> Self {
		self.redirect_uri = Some(uri);

		self
	}

	/// Sets the whole-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Sets the connection-open timeout.
	pub fn open_timeout(mut self, timeout: StdDuration) -> Self {
		self.open_timeout = timeout;

		self
	}

	/// Sets the redirect limit.
	pub fn redirect_limit(mut self, limit: usize) -> Self {
		self.redirect_limit = limit;

		self
	}

	/// Replaces the retry policy.
	pub fn retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Replaces the cache settings.
	pub fn cache(mut self, cache: CacheConfig) -> Self {
		self.cache = cache;

		self
	}

	/// Enables PKCE for authorization-code requests.
	pub fn use_pkce(mut self, enabled: bool) -> Self {
		self.use_pkce = enabled;

		self
	}

	/// Sets the test-user token table.
	pub fn test_users(mut self, users: TestUserTokens) -> Self {
		self.test_users = users;

		self
	}

	/// Allows the test-user table to bypass OAuth.
	pub fn allow_test_users(mut self, allow: bool) -> Self {
		self.allow_test_users = allow;

		self
	}

	/// Accepts any TLS certificate, e.g. the self-signed one `httpmock` serves.
	pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
		self.accept_invalid_certs = accept;

		self
	}

	/// Builds the configuration, filling unset URLs with production defaults.
	pub fn build(self) -> ApiConfig {
		ApiConfig {
			base_url: self.base_url.unwrap_or_else(default_base_url),
			auth_url: self.auth_url.unwrap_or_else(default_auth_url),
			api_key: self.api_key,
			client_secret: self.client_secret,
			redirect_uri: self.redirect_uri,
			timeout: self.timeout,
			open_timeout: self.open_timeout,
			redirect_limit: self.redirect_limit,
			retry: self.retry,
			cache: self.cache,
			use_pkce: self.use_pkce,
			test_users: self.test_users,
			allow_test_users: self.allow_test_users,
			accept_invalid_certs: self.accept_invalid_certs,
		}
	}
}

/// Normalizes a configured base URL to `https://host[/prefix]/v2`.
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
	Ok(with_version_segment(parse_https(raw, "base")?))
}

/// Normalizes a configured OAuth host to `https://host`.
pub fn normalize_auth_url(raw: &str) -> Result<Url, ConfigError> {
	parse_https(raw, "auth")
}

fn parse_https(raw: &str, field: &'static str) -> Result<Url, ConfigError> {
	let trimmed = raw.trim().trim_end_matches('/');
	let with_scheme = match trimmed.split_once("://") {
		Some((_, rest)) => format!("https://{rest}"),
		None => format!("https://{trimmed}"),
	};

	Url::parse(&with_scheme).map_err(|source| ConfigError::InvalidUrl {
		field,
		value: raw.to_owned(),
		source,
	})
}

fn with_version_segment(mut url: Url) -> Url {
	let path = url.path().trim_end_matches('/').to_owned();
	let last = path.rsplit('/').next().unwrap_or_default();
	let versioned = last.len() > 1
		&& last.starts_with('v')
		&& last[1..].chars().all(|c| c.is_ascii_digit());

	if versioned {
		url.set_path(&path);
	} else {
		url.set_path(&format!("{path}/{API_VERSION}"));
	}

	url.set_query(None);
	url.set_fragment(None);

	url
}

fn default_base_url() -> Url {
	Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!("default base URL is valid"))
}

fn default_auth_url() -> Url {
	Url::parse(DEFAULT_AUTH_URL).unwrap_or_else(|_| unreachable!("default auth URL is valid"))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_is_forced_to_https_with_version() {
		let cases = [
			("api.bookshare.org", "https://api.bookshare.org/v2"),
			("http://api.bookshare.org/", "https://api.bookshare.org/v2"),
			("https://api.bookshare.org/v2/", "https://api.bookshare.org/v2"),
			("https://qa.example.org/proxy/v3", "https://qa.example.org/proxy/v3"),
		];

		for (raw, expected) in cases {
			let url = normalize_base_url(raw).expect("Base URL fixture should normalize.");

			assert_eq!(url.as_str(), expected, "normalizing {raw}");
		}
	}

	#[test]
	fn lookup_reads_every_setting() {
		let config = ApiConfig::from_lookup(|key| {
			let value = match key {
				"BOOKSHARE_BASE_URL" => Some("api.example.org"),
				"BOOKSHARE_AUTH_URL" => Some("auth.example.org"),
				"BOOKSHARE_API_KEY" => Some("key-123"),
				"BOOKSHARE_TIMEOUT" => Some("12"),
				"BOOKSHARE_RETRY_LIMIT" => Some("4"),
				"BOOKSHARE_CACHE" => Some("true"),
				"BOOKSHARE_TEST_USERS" => Some("alice@example.org=tok-a"),
				_ => None,
			};

			value.map(str::to_owned)
		})
		.expect("Lookup fixture should produce a configuration.");

		assert_eq!(config.base_url.as_str(), "https://api.example.org/v2");
		assert_eq!(config.auth_url.as_str(), "https://auth.example.org/");
		assert_eq!(config.api_key, "key-123");
		assert_eq!(config.timeout, StdDuration::from_secs(12));
		assert_eq!(config.retry.max_retries, 4);
		assert!(config.cache.enabled);
		assert!(!config.allow_test_users);
		assert_eq!(config.test_users.len(), 1);
		assert_eq!(config.version_path(), "/v2");
	}

	#[test]
	fn lookup_rejects_malformed_numbers() {
		let err = ApiConfig::from_lookup(|key| {
			(key == "BOOKSHARE_TIMEOUT").then(|| "soon".to_owned())
		})
		.expect_err("Non-numeric timeouts should be rejected.");

		assert!(matches!(err, ConfigError::InvalidNumber { field: "BOOKSHARE_TIMEOUT", .. }));
	}

	#[test]
	fn validate_reports_missing_key_without_failing() {
		let config = ApiConfig::builder().build();

		assert_eq!(config.validate(), vec![ConfigIssue::MissingApiKey]);
	}

	#[test]
	fn retry_delay_grows_and_caps() {
		let policy = RetryPolicy::default();

		assert_eq!(policy.delay(1, 0.0), StdDuration::from_millis(50));
		assert_eq!(policy.delay(2, 0.0), StdDuration::from_millis(100));
		assert_eq!(policy.delay(3, 1.0), StdDuration::from_millis(300));
		assert_eq!(policy.delay(30, 0.0), StdDuration::from_secs(2));
	}

	#[test]
	fn certificates_are_verified_unless_opted_out() {
		assert!(!ApiConfig::builder().build().accept_invalid_certs);
		assert!(ApiConfig::builder().danger_accept_invalid_certs(true).build().accept_invalid_certs);
	}

	#[test]
	fn debug_redacts_credentials() {
		let config = ApiConfig::builder().api_key("secret-key").client_secret("secret").build();
		let rendered = format!("{config:?}");

		assert!(!rendered.contains("secret-key"));
		assert!(rendered.contains("api_key_set: true"));
	}
}
