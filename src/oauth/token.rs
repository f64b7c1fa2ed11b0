//! Token values, grant outcomes, and token-body parsing.

// self
use crate::{_prelude::*, oauth::GrantType};

const EXPIRED_SIGNATURE: &str = "access token expired";

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Credentials the session currently authenticates with.
///
/// Replaced wholesale whenever a grant succeeds and cleared on logout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenState {
	/// Bearer token sent with every API request.
	pub access_token: TokenSecret,
	/// Token used to renew `access_token`.
	pub refresh_token: Option<TokenSecret>,
	/// Grant that produced the token, when known.
	pub grant: Option<GrantType>,
	/// Expiry instant, when the server reported one.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenState {
	/// Bare bearer token with no refresh capability.
	pub fn bearer(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			grant: None,
			expires_at: None,
		}
	}

	/// Returns `true` once the reported expiry has passed.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}
}
impl From<&OauthToken> for TokenState {
	fn from(token: &OauthToken) -> Self {
		Self {
			access_token: token.access_token.clone(),
			refresh_token: token.refresh_token.clone(),
			grant: token.grant,
			expires_at: token.expires_at,
		}
	}
}

/// Successful token response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OauthToken {
	/// Access token.
	pub access_token: TokenSecret,
	/// Token type, normally `bearer`.
	pub token_type: String,
	/// Refresh token.
	pub refresh_token: Option<TokenSecret>,
	/// Space-delimited scope granted.
	pub scope: Option<String>,
	/// Expiry instant derived from `expires_in`.
	pub expires_at: Option<OffsetDateTime>,
	/// Grant that produced the token.
	pub grant: Option<GrantType>,
}
impl OauthToken {
	/// Bearer token with no refresh capability or expiry.
	pub fn bearer(access_token: TokenSecret) -> Self {
		Self {
			access_token,
			token_type: "bearer".into(),
			refresh_token: None,
			scope: None,
			expires_at: None,
			grant: None,
		}
	}
}

/// Error response from the token endpoint (or an unusable token body).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{error}: {}", .error_description.as_deref().unwrap_or("no description"))]
pub struct OauthTokenError {
	/// OAuth error code.
	pub error: String,
	/// Human-readable description.
	pub error_description: Option<String>,
	/// HTTP status, when the error came from a response.
	pub status: Option<u16>,
}
impl OauthTokenError {
	/// Creates an error without HTTP context.
	pub fn new(error: impl Into<String>, description: Option<String>) -> Self {
		Self { error: error.into(), error_description: description, status: None }
	}

	/// Returns `true` when the server reported an expired access token.
	///
	/// This matches the upstream's wording; a change there silently disables refresh.
	pub fn is_expired(&self) -> bool {
		self.error_description
			.as_deref()
			.is_some_and(|d| d.to_lowercase().contains(EXPIRED_SIGNATURE))
	}

	/// Description, falling back to the error code.
	pub fn message(&self) -> &str {
		self.error_description.as_deref().unwrap_or(&self.error)
	}
}

/// Result of one grant: a token or a typed error, never an exception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenOutcome {
	/// Grant succeeded.
	Token(OauthToken),
	/// Grant was refused or the response was unusable.
	Error(OauthTokenError),
}
impl TokenOutcome {
	/// Token, if the grant succeeded.
	pub fn token(&self) -> Option<&OauthToken> {
		match self {
			Self::Token(token) => Some(token),
			Self::Error(_) => None,
		}
	}

	/// Error, if the grant failed.
	pub fn error(&self) -> Option<&OauthTokenError> {
		match self {
			Self::Token(_) => None,
			Self::Error(error) => Some(error),
		}
	}

	/// Returns `true` when the grant succeeded.
	pub fn is_token(&self) -> bool {
		matches!(self, Self::Token(_))
	}
}

/// Token body handed to [`set_token`](crate::oauth::OauthApi::set_token).
#[derive(Clone, Copy, Debug)]
pub enum TokenInput<'a> {
	/// Already-decoded JSON object.
	Decoded(&'a serde_json::Map<String, Value>),
	/// Raw body: a JSON object or `key=value&...` form encoding.
	Raw(&'a str),
}

/// Parses a token body into an outcome.
pub fn parse_token_body(input: TokenInput, now: OffsetDateTime) -> TokenOutcome {
	let fields = match input {
		TokenInput::Decoded(map) => map
			.iter()
			.map(|(k, v)| (k.clone(), crate::endpoint::params::scalar_text(v)))
			.collect::<BTreeMap<_, _>>(),
		TokenInput::Raw(raw) => {
			let raw = raw.trim().trim_start_matches(['#', '?']);

			if raw.starts_with('{') {
				match serde_json::from_str::<serde_json::Map<String, Value>>(raw) {
					Ok(map) => return parse_token_body(TokenInput::Decoded(&map), now),
					Err(e) => {
						return TokenOutcome::Error(OauthTokenError::new(
							"invalid_response",
							Some(format!("Token body is not valid JSON: {e}.")),
						));
					},
				}
			}

			url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
		},
	};
	let get = |key: &str| fields.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

	if let Some(error) = get("error") {
		return TokenOutcome::Error(OauthTokenError::new(
			error,
			get("error_description").map(str::to_owned),
		));
	}

	let Some(access_token) = get("access_token") else {
		return TokenOutcome::Error(OauthTokenError::new(
			"invalid_response",
			Some("Token body carried no access token.".into()),
		));
	};
	let expires_at = get("expires_in")
		.and_then(|v| v.parse::<i64>().ok())
		.and_then(|secs| now.checked_add(Duration::seconds(secs)));

	TokenOutcome::Token(OauthToken {
		access_token: TokenSecret::new(access_token),
		token_type: get("token_type").unwrap_or("bearer").to_owned(),
		refresh_token: get("refresh_token").map(TokenSecret::new),
		scope: get("scope").map(str::to_owned),
		expires_at,
		grant: None,
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const NOW: OffsetDateTime = datetime!(2026-01-01 00:00 UTC);

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn form_encoded_bodies_parse() {
		let outcome = parse_token_body(
			TokenInput::Raw("#access_token=abc&token_type=bearer&expires_in=60&scope=basic"),
			NOW,
		);
		let token = outcome.token().expect("Form body should yield a token.");

		assert_eq!(token.access_token.expose(), "abc");
		assert_eq!(token.scope.as_deref(), Some("basic"));
		assert_eq!(token.expires_at, Some(datetime!(2026-01-01 00:01 UTC)));
		assert!(token.refresh_token.is_none());
	}

	#[test]
	fn json_and_decoded_bodies_parse() {
		let raw = r#"{"access_token":"a","refresh_token":"r","expires_in":3600}"#;
		let outcome = parse_token_body(TokenInput::Raw(raw), NOW);

		assert_eq!(
			outcome.token().and_then(|t| t.refresh_token.as_ref()).map(TokenSecret::expose),
			Some("r")
		);

		let map = serde_json::json!({ "error": "invalid_grant", "error_description": "Bad code" });
		let map = map.as_object().expect("Fixture should be an object.");
		let outcome = parse_token_body(TokenInput::Decoded(map), NOW);

		assert_eq!(outcome.error().map(OauthTokenError::message), Some("Bad code"));
	}

	#[test]
	fn bodies_without_tokens_are_errors() {
		let outcome = parse_token_body(TokenInput::Raw("state=xyz"), NOW);

		assert_eq!(outcome.error().map(|e| e.error.as_str()), Some("invalid_response"));
	}

	#[test]
	fn expiry_detection_is_case_insensitive() {
		let expired =
			OauthTokenError::new("invalid_token", Some("ACCESS TOKEN EXPIRED: abc".into()));
		let other = OauthTokenError::new("invalid_token", Some("Token revoked".into()));

		assert!(expired.is_expired());
		assert!(!other.is_expired());
		assert_eq!(other.to_string(), "invalid_token: Token revoked");
	}
}
