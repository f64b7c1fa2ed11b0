//! The request executor.
//!
//! [`ApiService`] owns one [`ServiceSession`] and the connection built for it. Every call goes
//! through [`ApiService::api`] (or a declared endpoint via [`ApiService::call`]), which always
//! leaves the session describing that call and nothing else:
//!
//! | Outcome | Returns | `response` | `exception` |
//! | --- | --- | --- | --- |
//! | 2xx with data | `Ok(Some(_))` | set | `None` |
//! | 2xx error page (soft failure) | `Ok(None)` | set | `None` |
//! | unfollowed 3xx | `Ok(None)` | set | `None` |
//! | 4xx/5xx | `Ok(None)` | set | set |
//! | network failure | `Err(_)` | `None` | set |
//! | other transport failure | `Ok(None)` | `None` | set |

mod soft_failure;

pub use soft_failure::*;

// self
use crate::{
	_prelude::*,
	classify::{self, ErrorDomain},
	config::ApiConfig,
	endpoint::{API_KEY_PARAM, ApiCall, ApiParams, EndpointSpec, registry},
	error::{ApiFailure, ErrorKind, ServiceKind, ValidationError},
	http::{self, Connection, ResponseCache},
	oauth::{self, TokenClient, TokenState},
	obs::{self, CallOutcome, CallSpan},
	session::{ApiResponse, ServiceSession, Verb},
};

/// Client for the remote API bound to a single session.
///
/// One instance serves one logical caller (a request or a job). Calls that touch the session
/// take `&mut self`, so an instance cannot be used by two calls at once.
pub struct ApiService {
	config: Arc<ApiConfig>,
	session: ServiceSession,
	connection: Option<Connection>,
	cache: Option<ResponseCache>,
	token_client: Option<Arc<TokenClient>>,
	soft_failure: Arc<dyn SoftFailureDetector>,
}
impl ApiService {
	/// Creates an anonymous service.
	pub fn new(config: impl Into<Arc<ApiConfig>>) -> Self {
		let config = config.into();
		let cache = ResponseCache::from_config(&config.cache);

		Self {
			config,
			session: ServiceSession::default(),
			connection: None,
			cache,
			token_client: None,
			soft_failure: Arc::new(PageNotFound),
		}
	}

	/// Creates a service acting for `user`.
	///
	/// When test-user tokens are enabled and `user` has one, the token is installed right away.
	pub fn for_user(config: impl Into<Arc<ApiConfig>>, user: impl Into<String>) -> Self {
		let mut service = Self::new(config);

		service.session = ServiceSession::for_user(user);

		if let Some(token) = oauth::test_user_token(&service.config, service.session.user.as_deref())
		{
			service.replace_token(Some(TokenState::from(&token)));
		}

		service
	}

	/// Replaces the soft-failure predicate.
	pub fn with_soft_failure_detector<D>(mut self, detector: D) -> Self
	where
		D: SoftFailureDetector,
	{
		self.soft_failure = Arc::new(detector);

		self
	}

	/// Shared configuration.
	pub fn config(&self) -> &ApiConfig {
		&self.config
	}

	/// Session state describing the last call.
	pub fn session(&self) -> &ServiceSession {
		&self.session
	}

	/// Raw response of the last call.
	pub fn response(&self) -> Option<&ApiResponse> {
		self.session.response.as_ref()
	}

	/// Failure recorded for the last call.
	pub fn exception(&self) -> Option<&ApiFailure> {
		self.session.exception.as_ref()
	}

	/// Memoized connection, built on first use.
	pub fn connection(&mut self) -> Result<&Connection> {
		let connection = match self.connection.take() {
			Some(connection) => connection,
			None => self.make_connection(None)?,
		};

		Ok(self.connection.insert(connection))
	}

	/// Builds a fresh connection to `url` (the configured base URL by default).
	pub fn make_connection(&self, url: Option<&Url>) -> Result<Connection> {
		let base_url = url.unwrap_or(&self.config.base_url).clone();

		Ok(Connection::build(&self.config, base_url, self.session.access_token(), self.cache.clone())?)
	}

	/// Starts a call to a declared endpoint.
	pub fn call(&mut self, spec: &'static EndpointSpec) -> ApiCall<'_> {
		ApiCall::new(self, spec)
	}

	/// Starts a call to the endpoint registered as `name`.
	pub fn call_by_name(&mut self, name: &str) -> Result<ApiCall<'_>, ValidationError> {
		let spec =
			registry::lookup(name).ok_or_else(|| ValidationError::UnknownEndpoint { name: name.into() })?;

		Ok(self.call(spec))
	}

	/// Executes one request.
	///
	/// `path` segments are split on `/` and anchored under the version segment, so
	/// `&["titles", "abc123"]`, `&["/titles/abc123"]`, and `&["v2/titles/abc123"]` all reach
	/// `/v2/titles/abc123`. The configured API key is always added to `params`.
	pub async fn api(
		&mut self,
		verb: Verb,
		path: &[&str],
		params: ApiParams,
	) -> Result<Option<ApiResponse>> {
		let version = self.config.base_url.path_segments().and_then(|mut s| s.next_back());
		let mut segments = path
			.iter()
			.flat_map(|part| part.split('/'))
			.filter(|segment| !segment.is_empty())
			.map(str::to_owned)
			.collect::<Vec<_>>();

		if segments.first().map(String::as_str) == version {
			segments.remove(0);
		}

		self.dispatch(ServiceKind::Api, verb, &segments, params).await
	}

	pub(crate) async fn dispatch(
		&mut self,
		service: ServiceKind,
		verb: Verb,
		segments: &[String],
		mut params: ApiParams,
	) -> Result<Option<ApiResponse>> {
		params.insert(API_KEY_PARAM, self.config.api_key.clone());

		let url = http::join_segments(&self.config.base_url, segments);
		let action = url.path().to_owned();

		self.session.begin(service, verb, action.clone(), params.clone());
		obs::record_call_outcome(verb, CallOutcome::Attempt);

		let connection = match self.connection() {
			Ok(connection) => connection.clone(),
			Err(e) => {
				tracing::error!(%verb, %action, error = %e, "Could not build API connection.");

				self.session.exception = Some(ApiFailure::new(ErrorKind::Request, e.to_string()));
				obs::record_call_outcome(verb, CallOutcome::Failure);

				return Err(e);
			},
		};
		let detector = self.soft_failure.clone();
		let span = CallSpan::api(verb, &action);
		let outcome =
			span.instrument(connection.send(service, verb, url, &params, detector.as_ref())).await;

		match outcome {
			Ok(response) => Ok(self.accept(verb, response)),
			Err(e) => {
				self.session.exception = Some(ApiFailure::from(&e));
				obs::record_call_outcome(verb, CallOutcome::Failure);

				if e.kind.is_network() {
					tracing::error!(%verb, %action, kind = %e.kind, error = %e, "API unreachable.");

					Err(e.into())
				} else {
					tracing::error!(%verb, %action, kind = %e.kind, error = %e, "API request failed.");

					Ok(None)
				}
			},
		}
	}

	fn accept(&mut self, verb: Verb, response: ApiResponse) -> Option<ApiResponse> {
		let action = self.session.action.as_deref().unwrap_or_default();

		if response.is_redirect() {
			tracing::warn!(
				%verb,
				action,
				status = response.status,
				location = ?response.header("location"),
				"API answered with a redirect that was not followed."
			);

			self.session.response = Some(response);
			obs::record_call_outcome(verb, CallOutcome::Failure);

			return None;
		}
		if !response.is_success() {
			let failure = failure_from_response(&response);

			tracing::warn!(%verb, action, status = response.status, message = %failure.message, "API returned an error status.");

			self.session.exception = Some(failure);
			self.session.response = Some(response);
			obs::record_call_outcome(verb, CallOutcome::Failure);

			return None;
		}
		if self.soft_failure.is_soft_failure(&response) {
			tracing::warn!(%verb, action, status = response.status, "API returned an error page.");

			self.session.response = Some(response);
			obs::record_call_outcome(verb, CallOutcome::SoftFailure);

			return None;
		}

		tracing::debug!(%verb, action, status = response.status, "API request succeeded.");
		obs::record_call_outcome(verb, CallOutcome::Success);

		self.session.response = Some(response.clone());

		Some(response)
	}

	/// Raises the domain error describing the last call.
	///
	/// Always returns `Err`; the type parameter lets it end any fallible method.
	pub fn raise_exception<T>(&self, method: &str, domain: &ErrorDomain) -> Result<T> {
		Err(domain
			.classify(
				self.session.service,
				method,
				self.session.response.as_ref(),
				self.session.exception.as_ref(),
			)
			.into())
	}

	/// Accepts the last response when it is a 2xx with a non-empty body.
	pub fn validate_response(&self, method: &str, domain: &ErrorDomain) -> Result<&ApiResponse> {
		match self.session.response.as_ref() {
			Some(response) if response.is_success() && !response.is_blank() => Ok(response),
			_ => self.raise_exception(method, domain),
		}
	}

	/// Token-endpoint client, built on first use and kept for the service's lifetime.
	pub(crate) fn token_client(&mut self) -> Result<Arc<TokenClient>> {
		if let Some(client) = &self.token_client {
			return Ok(client.clone());
		}

		let client = Arc::new(TokenClient::new(&self.config)?);

		self.token_client = Some(client.clone());

		Ok(client)
	}

	pub(crate) fn session_mut(&mut self) -> &mut ServiceSession {
		&mut self.session
	}

	/// Installs or clears the token, dropping anything built with the old credentials.
	pub(crate) fn replace_token(&mut self, token: Option<TokenState>) {
		self.session.token = token;
		self.connection = None;

		if let Some(cache) = &self.cache {
			cache.invalidate_all();
		}
	}
}
impl Debug for ApiService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiService")
			.field("config", &self.config)
			.field("session", &self.session)
			.field("connected", &self.connection.is_some())
			.field("cache", &self.cache)
			.field("token_client", &self.token_client.is_some())
			.finish()
	}
}

fn failure_from_response(response: &ApiResponse) -> ApiFailure {
	let kind = ErrorKind::Response;
	let description = serde_json::from_str::<Value>(&response.body).ok().and_then(|body| {
		body.get("error_description").and_then(Value::as_str).map(|s| s.trim().to_owned())
	});

	match description.filter(|d| !d.is_empty()) {
		Some(description) => ApiFailure::new(kind, description).with_status(response.status),
		None => {
			let extracted = classify::extract(Some(response));
			let message = if extracted.from_body {
				extracted.message
			} else {
				kind.default_message().to_owned()
			};

			ApiFailure::new(kind, message)
				.with_status(response.status)
				.with_body(response.body.clone())
		},
	}
}
