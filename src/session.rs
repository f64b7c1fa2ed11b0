//! Per-instance call state.
//!
//! A [`ServiceSession`] remembers exactly one call: the verb, action path, and parameters of
//! the most recent request plus whatever it produced. Starting a new call wipes the previous
//! outcome, so no history is ever retained.

// crates.io
use reqwest::{Method, header::HeaderMap};
// self
use crate::{
	_prelude::*,
	endpoint::ApiParams,
	error::{ApiFailure, ServiceKind},
	oauth::TokenState,
};

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Verb {
	/// Returns the lowercase verb name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Verb::Get => "get",
			Verb::Post => "post",
			Verb::Put => "put",
			Verb::Patch => "patch",
			Verb::Delete => "delete",
		}
	}

	/// Verbs whose parameters travel as a JSON body.
	pub const fn is_mutating(self) -> bool {
		matches!(self, Verb::Post | Verb::Put | Verb::Patch)
	}

	/// Verbs that may be retried safely.
	pub const fn is_idempotent(self) -> bool {
		matches!(self, Verb::Get | Verb::Put | Verb::Delete)
	}

	/// Converts to the reqwest method.
	pub fn method(self) -> Method {
		match self {
			Verb::Get => Method::GET,
			Verb::Post => Method::POST,
			Verb::Put => Method::PUT,
			Verb::Patch => Method::PATCH,
			Verb::Delete => Method::DELETE,
		}
	}
}
impl Display for Verb {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully buffered HTTP response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Final request URL.
	pub url: Url,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body text.
	pub body: String,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for 3xx statuses.
	pub fn is_redirect(&self) -> bool {
		(300..400).contains(&self.status)
	}

	/// Returns `true` when the body is empty or whitespace.
	pub fn is_blank(&self) -> bool {
		self.body.trim().is_empty()
	}

	/// Returns `true` when the body is (or claims to be) an HTML document.
	pub fn is_html(&self) -> bool {
		let declared = self
			.headers
			.get(reqwest::header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.starts_with("text/html"));

		declared || self.body.trim_start().starts_with('<')
	}

	/// Response header value as text.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Decodes the body as JSON, reporting the path of the first mismatch.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_str(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}
}

/// Mutable state of one logical connection to the remote API.
#[derive(Clone, Default)]
pub struct ServiceSession {
	/// Verb of the last call.
	pub verb: Option<Verb>,
	/// Action path of the last call (`/v2/...`).
	pub action: Option<String>,
	/// Parameters sent with the last call, API key included.
	pub params: ApiParams,
	/// Service targeted by the last call.
	pub service: ServiceKind,
	/// Raw response of the last call, when one was received.
	pub response: Option<ApiResponse>,
	/// Failure recorded for the last call.
	pub exception: Option<ApiFailure>,
	/// Authenticated principal.
	pub user: Option<String>,
	pub(crate) token: Option<TokenState>,
}
impl ServiceSession {
	/// Creates a session bound to a principal.
	pub fn for_user(user: impl Into<String>) -> Self {
		Self { user: Some(user.into()), ..Self::default() }
	}

	/// Current OAuth token state.
	pub fn token(&self) -> Option<&TokenState> {
		self.token.as_ref()
	}

	/// Current access token text, if any.
	pub fn access_token(&self) -> Option<&str> {
		self.token.as_ref().map(|token| token.access_token.expose())
	}

	/// Current refresh token text, if any.
	pub fn refresh_token(&self) -> Option<&str> {
		self.token.as_ref().and_then(|token| token.refresh_token.as_ref()).map(|t| t.expose())
	}

	/// Starts a new call, discarding everything the previous call left behind.
	pub(crate) fn begin(
		&mut self,
		service: ServiceKind,
		verb: Verb,
		action: String,
		params: ApiParams,
	) {
		self.service = service;
		self.verb = Some(verb);
		self.action = Some(action);
		self.params = params;
		self.response = None;
		self.exception = None;
	}
}
impl Debug for ServiceSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ServiceSession")
			.field("verb", &self.verb)
			.field("action", &self.action)
			.field("params", &self.params.redacted())
			.field("service", &self.service)
			.field("status", &self.response.as_ref().map(|r| r.status))
			.field("exception", &self.exception)
			.field("user", &self.user)
			.field("token", &self.token)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse {
			status,
			url: Url::parse("https://api.bookshare.org/v2/titles")
				.expect("Response URL fixture should parse."),
			headers: HeaderMap::new(),
			body: body.into(),
		}
	}

	#[test]
	fn begin_discards_previous_outcome() {
		let mut session = ServiceSession::for_user("reader@example.org");

		session.response = Some(response(500, "{}"));
		session.exception =
			Some(ApiFailure::new(crate::error::ErrorKind::Response, "boom").with_status(500));
		session.begin(ServiceKind::Api, Verb::Get, "/v2/me".into(), ApiParams::new());

		assert_eq!(session.verb, Some(Verb::Get));
		assert_eq!(session.action.as_deref(), Some("/v2/me"));
		assert!(session.response.is_none());
		assert!(session.exception.is_none());
		assert_eq!(session.user.as_deref(), Some("reader@example.org"));
	}

	#[test]
	fn html_detection_uses_body_or_header() {
		assert!(response(200, "  <html><body>Oops</body></html>").is_html());
		assert!(!response(200, "{\"ok\":true}").is_html());
		assert!(response(204, " ").is_blank());
	}

	#[test]
	fn verbs_know_their_body_encoding() {
		assert!(Verb::Put.is_mutating());
		assert!(!Verb::Delete.is_mutating());
		assert!(!Verb::Post.is_idempotent());
		assert_eq!(Verb::Patch.method(), Method::PATCH);
	}
}
