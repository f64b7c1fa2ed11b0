//! Token-endpoint transport.
//!
//! Grants run through the `oauth2` crate, which drives requests via an
//! [`AsyncHttpClient`]. [`InstrumentedHandle`] implements that trait over reqwest and records
//! the status of every response in a [`ResponseMetadataSlot`], so refused grants can be
//! reported with the HTTP status the token endpoint answered with.

// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, HttpRequest, HttpResponse, RedirectUrl, RequestTokenError, TokenResponse,
	TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse},
};
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	config::ApiConfig,
	error::{ConfigError, ErrorKind, ServiceKind, TransportError},
	oauth::{GrantType, OauthToken, OauthTokenError, TokenOutcome, TokenSecret},
};

/// Path of the authorization endpoint on the auth host.
pub const AUTHORIZE_PATH: &str = "oauth/authorize";
/// Path of the token endpoint on the auth host.
pub const TOKEN_PATH: &str = "oauth/token";

pub(crate) type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Metadata captured from the most recent token-endpoint response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response arrived.
	pub status: Option<u16>,
}

/// Thread-safe slot shared between the transport handle and the grant that created it.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// reqwest-backed [`AsyncHttpClient`] that records response metadata.
#[derive(Clone)]
pub struct InstrumentedHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
impl InstrumentedHandle {
	/// Wraps `client`, recording into `slot`.
	pub fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self { client, slot }
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let response =
				self.client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			self.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// `oauth2` client plus the HTTP client it runs on, configured for the auth host.
pub(crate) struct TokenClient {
	pub(crate) oauth: ConfiguredBasicClient,
	http: ReqwestClient,
}
impl TokenClient {
	pub(crate) fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
		let auth_url = AuthUrl::from_url(endpoint(config, "auth", AUTHORIZE_PATH)?);
		let token_url = TokenUrl::from_url(endpoint(config, "auth", TOKEN_PATH)?);
		let mut oauth = BasicClient::new(ClientId::new(config.api_key.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = &config.client_secret {
			oauth = oauth.set_client_secret(ClientSecret::new(secret.clone()));
		}
		if let Some(redirect) = &config.redirect_uri {
			oauth = oauth.set_redirect_uri(RedirectUrl::from_url(redirect.clone()));
		}

		// Token endpoints answer directly; redirects are never followed.
		let http = ReqwestClient::builder()
			.timeout(config.timeout)
			.connect_timeout(config.open_timeout)
			.redirect(Policy::none())
			.danger_accept_invalid_certs(config.accept_invalid_certs)
			.build()?;

		Ok(Self { oauth, http })
	}

	pub(crate) fn handle(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.http.clone(), slot)
	}
}

/// Joins `path` onto the configured auth host.
pub(crate) fn endpoint(
	config: &ApiConfig,
	field: &'static str,
	path: &str,
) -> Result<Url, ConfigError> {
	let mut base = config.auth_url.clone();

	if !base.path().ends_with('/') {
		let with_slash = format!("{}/", base.path());

		base.set_path(&with_slash);
	}

	base.join(path).map_err(|source| ConfigError::InvalidUrl {
		field,
		value: format!("{base}{path}"),
		source,
	})
}

/// Converts a token response into an [`OauthToken`].
pub(crate) fn map_token_response(
	grant: GrantType,
	response: &BasicTokenResponse,
	now: OffsetDateTime,
) -> OauthToken {
	let expires_at = response
		.expires_in()
		.and_then(|d| Duration::try_from(d).ok())
		.and_then(|d| now.checked_add(d));
	let scope = response
		.scopes()
		.map(|scopes| scopes.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" "))
		.filter(|s| !s.is_empty());

	OauthToken {
		access_token: TokenSecret::new(response.access_token().secret().to_owned()),
		token_type: response.token_type().as_ref().to_owned(),
		refresh_token: response.refresh_token().map(|t| TokenSecret::new(t.secret().to_owned())),
		scope,
		expires_at,
		grant: Some(grant),
	}
}

/// Splits a failed grant into a typed error outcome or, for network failures, an `Err`.
pub(crate) fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Result<TokenOutcome> {
	let status = meta.and_then(|m| m.status);
	let error = match err {
		RequestTokenError::ServerResponse(response) => OauthTokenError {
			error: response.error().as_ref().to_owned(),
			error_description: response.error_description().cloned(),
			status,
		},
		RequestTokenError::Request(error) => {
			let transport = match error {
				HttpClientError::Reqwest(inner) =>
					TransportError::from_reqwest(ServiceKind::Api, *inner),
				HttpClientError::Io(inner) =>
					TransportError::new(ServiceKind::Api, ErrorKind::Comm, inner.to_string()),
				HttpClientError::Http(inner) =>
					TransportError::new(ServiceKind::Api, ErrorKind::Request, inner.to_string()),
				other => TransportError::new(ServiceKind::Api, ErrorKind::Comm, other.to_string()),
			};

			if transport.kind.is_network() {
				return Err(transport.into());
			}

			OauthTokenError {
				error: "request_failed".into(),
				error_description: Some(transport.message),
				status,
			}
		},
		RequestTokenError::Parse(error, _body) => OauthTokenError {
			error: "invalid_response".into(),
			error_description: Some(format!("Token response could not be decoded: {error}.")),
			status,
		},
		RequestTokenError::Other(message) => OauthTokenError {
			error: "invalid_response".into(),
			error_description: Some(format!(
				"Token endpoint returned an unexpected response: {message}."
			)),
			status,
		},
	};

	Ok(TokenOutcome::Error(error))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoints_join_under_the_auth_host() {
		let config = ApiConfig::builder()
			.auth_url(Url::parse("https://auth.example.org/base").expect("Auth URL should parse."))
			.api_key("key")
			.build();

		assert_eq!(
			endpoint(&config, "auth", TOKEN_PATH).expect("Token URL should join.").as_str(),
			"https://auth.example.org/base/oauth/token"
		);
		assert!(TokenClient::new(&config).is_ok());
	}

	#[test]
	fn slot_take_consumes_metadata() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401) });

		assert_eq!(slot.take().and_then(|m| m.status), Some(401));
		assert!(slot.take().is_none());
	}
}
