//! OAuth token manager.
//!
//! [`OauthApi`] runs the grant flows against the auth host and keeps the session's
//! [`TokenState`] current. Refused grants are returned as [`TokenOutcome::Error`] values, not
//! as `Err`; only unreachable hosts and local misconfiguration surface as errors.
//!
//! ```no_run
//! # async fn demo(service: &mut bookshare_api::ApiService) -> bookshare_api::Result<()> {
//! use bookshare_api::oauth::TokenGrant;
//!
//! let outcome = service
//! 	.oauth()
//! 	.generate_token(TokenGrant::Password { user: "reader@example.org", password: "secret" })
//! 	.await?;
//!
//! if let Some(error) = outcome.error() {
//! 	eprintln!("login refused: {}", error.message());
//! }
//! # Ok(())
//! # }
//! ```

mod authorize;
mod bypass;
mod token;
mod transport;

pub use oauth2;

pub(crate) use self::transport::TokenClient;

pub use self::{
	authorize::AuthorizationRequest,
	bypass::*,
	token::*,
	transport::{
		AUTHORIZE_PATH, InstrumentedHandle, ResponseMetadata, ResponseMetadataSlot, TOKEN_PATH,
	},
};

// crates.io
use oauth2::{
	AuthorizationCode, PkceCodeVerifier, RefreshToken, ResourceOwnerPassword,
	ResourceOwnerUsername,
};
// self
use crate::{
	_prelude::*,
	classify::ErrorDomain,
	endpoint::ApiParams,
	error::{ApiFailure, ErrorKind, ServiceKind},
	obs::{self, CallOutcome, CallSpan},
	service::ApiService,
	session::Verb,
};

/// Error tables for the auth domain.
pub static AUTH_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::Auth)
		.response_pattern("expired", r"(?i)access\s+token\s+expired")
		.message("expired", "Your session has expired; please sign in again")
		.message("default", "Authorization failed")
		.build()
});

/// Grant types understood by the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization-code exchange.
	AuthorizationCode,
	/// Resource-owner password grant.
	Password,
	/// Refresh-token grant.
	RefreshToken,
}
impl GrantType {
	/// Returns the wire value of `grant_type`.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::Password => "password",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// `response_type` of an authorization request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseType {
	/// Authorization-code flow.
	Code,
	/// Implicit flow; the token arrives in the redirect fragment.
	Token,
}
impl ResponseType {
	/// Returns the wire value.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResponseType::Code => "code",
			ResponseType::Token => "token",
		}
	}
}

/// Credentials presented to the token endpoint.
#[derive(Clone, Copy)]
pub enum TokenGrant<'a> {
	/// Exchange an authorization code.
	AuthorizationCode {
		/// Code from the redirect.
		code: &'a str,
		/// PKCE verifier, when the authorization request carried a challenge.
		verifier: Option<&'a str>,
	},
	/// Exchange a username and password.
	Password {
		/// Account identifier.
		user: &'a str,
		/// Account password.
		password: &'a str,
	},
	/// Renew an access token.
	RefreshToken {
		/// Refresh token from an earlier grant.
		refresh: &'a str,
	},
}
impl TokenGrant<'_> {
	/// Grant type this request uses.
	pub const fn grant_type(&self) -> GrantType {
		match self {
			TokenGrant::AuthorizationCode { .. } => GrantType::AuthorizationCode,
			TokenGrant::Password { .. } => GrantType::Password,
			TokenGrant::RefreshToken { .. } => GrantType::RefreshToken,
		}
	}

	fn user(&self) -> Option<&str> {
		match self {
			TokenGrant::Password { user, .. } => Some(*user),
			_ => None,
		}
	}
}
impl Debug for TokenGrant<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			TokenGrant::AuthorizationCode { verifier, .. } => f
				.debug_struct("AuthorizationCode")
				.field("code", &"<redacted>")
				.field("pkce", &verifier.is_some())
				.finish(),
			TokenGrant::Password { user, .. } =>
				f.debug_struct("Password").field("user", user).field("password", &"<redacted>").finish(),
			TokenGrant::RefreshToken { .. } =>
				f.debug_struct("RefreshToken").field("refresh", &"<redacted>").finish(),
		}
	}
}

impl ApiService {
	/// OAuth operations bound to this service's session.
	pub fn oauth(&mut self) -> OauthApi<'_> {
		OauthApi { service: self }
	}
}

/// OAuth operations for one session.
#[derive(Debug)]
pub struct OauthApi<'a> {
	service: &'a mut ApiService,
}
impl OauthApi<'_> {
	/// Builds the browser redirect for the code or implicit flow.
	pub fn get_authorization(
		&self,
		response_type: ResponseType,
		state: Option<&str>,
	) -> Result<AuthorizationRequest> {
		Ok(authorize::authorization_request(self.service.config(), response_type, state)?)
	}

	/// Runs one grant.
	///
	/// A granted token replaces the session's token. A refused grant leaves the token alone and
	/// records the refusal as the session's exception.
	pub async fn get_token(&mut self, grant: TokenGrant<'_>) -> Result<TokenOutcome> {
		let grant_type = grant.grant_type();
		let params = ApiParams::new().with("grant_type", grant_type.as_str());

		self.service.session_mut().begin(
			ServiceKind::Api,
			Verb::Post,
			format!("/{TOKEN_PATH}"),
			params,
		);
		obs::record_oauth_outcome(grant_type, CallOutcome::Attempt);

		let span = CallSpan::oauth(grant_type);
		let outcome = match self.service.token_client() {
			Ok(client) => span.instrument(request_token(&client, grant)).await,
			Err(e) => Err(e),
		};

		match &outcome {
			Ok(TokenOutcome::Token(token)) => {
				tracing::info!(grant = %grant_type, "Token granted.");
				obs::record_oauth_outcome(grant_type, CallOutcome::Success);

				self.service.replace_token(Some(TokenState::from(token)));
			},
			Ok(TokenOutcome::Error(error)) => {
				tracing::warn!(grant = %grant_type, status = ?error.status, %error, "Token grant refused.");
				obs::record_oauth_outcome(grant_type, CallOutcome::Failure);

				let mut failure = ApiFailure::new(ErrorKind::Response, error.message());

				failure.status = error.status;
				self.service.session_mut().exception = Some(failure);
			},
			Err(e) => {
				tracing::error!(grant = %grant_type, error = %e, "Token endpoint unreachable.");
				obs::record_oauth_outcome(grant_type, CallOutcome::Failure);

				let kind = e.kind().unwrap_or(ErrorKind::Comm);

				self.service.session_mut().exception = Some(ApiFailure::new(kind, e.to_string()));
			},
		}

		outcome
	}

	/// Obtains a token, honoring the test-user override and renewing an expired token once.
	///
	/// When the grant is refused because the access token expired and the session holds a
	/// refresh token, a single refresh grant follows. Its outcome is returned as is; a second
	/// failure is logged and never retried.
	pub async fn generate_token(&mut self, grant: TokenGrant<'_>) -> Result<TokenOutcome> {
		let user = grant.user().or(self.service.session().user.as_deref());

		if let Some(token) = bypass::test_user_token(self.service.config(), user) {
			self.service.replace_token(Some(TokenState::from(&token)));

			return Ok(TokenOutcome::Token(token));
		}

		let outcome = self.get_token(grant).await?;
		let expired = outcome.error().is_some_and(OauthTokenError::is_expired);

		if !expired || grant.grant_type() == GrantType::RefreshToken {
			return Ok(outcome);
		}

		let Some(refresh) = self.service.session().refresh_token().map(str::to_owned) else {
			tracing::warn!(
				grant = %grant.grant_type(),
				"Access token expired and no refresh token is held."
			);

			return Ok(outcome);
		};

		tracing::info!("Access token expired; refreshing once.");

		let retried = self.get_token(TokenGrant::RefreshToken { refresh: &refresh }).await?;

		if let TokenOutcome::Error(error) = &retried {
			tracing::error!(%error, "Token refresh failed; not retrying.");
		}

		Ok(retried)
	}

	/// Installs a token from a token-endpoint body.
	///
	/// The session's token changes only when the body carries one.
	pub fn set_token(&mut self, input: TokenInput<'_>) -> TokenOutcome {
		let outcome = token::parse_token_body(input, OffsetDateTime::now_utc());

		match &outcome {
			TokenOutcome::Token(token) => self.service.replace_token(Some(TokenState::from(token))),
			TokenOutcome::Error(error) => tracing::warn!(%error, "Token body rejected."),
		}

		outcome
	}

	/// Installs the token carried by an implicit-flow redirect.
	pub fn parse_implicit_redirect(&mut self, redirect: &Url) -> TokenOutcome {
		let raw = redirect.fragment().or_else(|| redirect.query()).unwrap_or_default();

		self.set_token(TokenInput::Raw(raw))
	}

	/// Forgets the session's token and everything built with it.
	pub fn clear_token(&mut self) {
		tracing::debug!("Clearing OAuth token.");

		self.service.replace_token(None);
	}

	/// Raises the auth-domain error describing the last grant.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &AUTH_ERRORS)
	}
}

async fn request_token(client: &TokenClient, grant: TokenGrant<'_>) -> Result<TokenOutcome> {
	let slot = ResponseMetadataSlot::default();
	let handle = client.handle(slot.clone());
	let response = match grant {
		TokenGrant::AuthorizationCode { code, verifier } => {
			let mut request = client.oauth.exchange_code(AuthorizationCode::new(code.to_owned()));

			if let Some(verifier) = verifier {
				request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
			}

			request.request_async(&handle).await
		},
		TokenGrant::Password { user, password } => {
			let user = ResourceOwnerUsername::new(user.to_owned());
			let password = ResourceOwnerPassword::new(password.to_owned());

			client.oauth.exchange_password(&user, &password).request_async(&handle).await
		},
		TokenGrant::RefreshToken { refresh } => {
			let refresh = RefreshToken::new(refresh.to_owned());

			client.oauth.exchange_refresh_token(&refresh).request_async(&handle).await
		},
	};

	match response {
		Ok(response) => Ok(TokenOutcome::Token(transport::map_token_response(
			grant.grant_type(),
			&response,
			OffsetDateTime::now_utc(),
		))),
		Err(e) => transport::map_request_error(slot.take(), e),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet;

	fn service() -> ApiService {
		_preludet::build_test_service("https://api.example.org")
	}

	#[test]
	fn grant_debug_hides_secrets() {
		let grant = TokenGrant::Password { user: "reader@example.org", password: "hunter2" };
		let rendered = format!("{grant:?}");

		assert!(rendered.contains("reader@example.org"));
		assert!(!rendered.contains("hunter2"));
		assert_eq!(grant.grant_type().as_str(), "password");
	}

	#[test]
	fn set_token_only_installs_successful_bodies() {
		let mut service = service();
		let refused = service.oauth().set_token(TokenInput::Raw("error=access_denied"));

		assert!(!refused.is_token());
		assert!(service.session().token().is_none());

		let granted = service.oauth().set_token(TokenInput::Raw("access_token=a&refresh_token=r"));

		assert!(granted.is_token());
		assert_eq!(service.session().access_token(), Some("a"));
		assert_eq!(service.session().refresh_token(), Some("r"));

		service.oauth().clear_token();

		assert!(service.session().token().is_none());
	}

	#[test]
	fn implicit_redirect_reads_the_fragment() {
		let mut service = service();
		let redirect = Url::parse("https://app.example.org/cb#access_token=imp&token_type=bearer")
			.expect("Redirect fixture should parse.");

		assert!(service.oauth().parse_implicit_redirect(&redirect).is_token());
		assert_eq!(service.session().access_token(), Some("imp"));
	}

	#[test]
	fn auth_errors_use_the_expiry_template() {
		let failure = ApiFailure::new(ErrorKind::Response, "Access token expired").with_status(401);
		let error = AUTH_ERRORS.classify(ServiceKind::Api, "get_token", None, Some(&failure));

		assert_eq!(error.kind, ErrorKind::Auth);
		assert_eq!(
			error.message,
			"Your session has expired; please sign in again: Access token expired"
		);
		assert_eq!(error.status, Some(401));
	}
}
