//! Service-level error types shared by the executor, classifier, endpoint modules, and OAuth.
//!
//! Failures are tagged with a closed [`ErrorKind`] instead of one exception type per failure
//! key, so callers discriminate by category (`err.kind().is_transport()`) or by domain
//! (`ErrorKind::Title`) without matching on message text.

// self
use crate::_prelude::*;

/// Service-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Call rejected before dispatch.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Classified failure raised on behalf of an endpoint domain.
	#[error(transparent)]
	Api(#[from] ApiError),
}
impl Error {
	/// Returns the failure category, when the error carries one.
	pub fn kind(&self) -> Option<ErrorKind> {
		match self {
			Self::Transport(e) => Some(e.kind),
			Self::Api(e) => Some(e.kind),
			Self::Config(_) | Self::Validation(_) => None,
		}
	}
}

/// Which remote service produced a failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
	/// Catalog and account API.
	#[default]
	Api,
	/// Artifact download endpoints.
	Download,
}
impl ServiceKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Api => "api",
			Self::Download => "download",
		}
	}
}
impl Display for ServiceKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Closed set of failure categories.
///
/// The first group names endpoint domains (used when a classified failure is raised for a
/// domain module); the second group names transport and protocol failure modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Account endpoints.
	Account,
	/// User agreement endpoints.
	Agreement,
	/// Title catalog endpoints.
	Title,
	/// Periodical endpoints.
	Periodical,
	/// Organization endpoints.
	Organization,
	/// Subscription endpoints.
	Subscription,
	/// Reading list endpoints.
	ReadingList,
	/// Proof-of-disability endpoints.
	ProofOfDisability,
	/// OAuth grant flows.
	Auth,
	/// Generic communication failure.
	Comm,
	/// Connection could not be opened.
	Connect,
	/// Request or connection timed out.
	Timeout,
	/// Request could not be transmitted.
	Xmit,
	/// Response could not be received.
	Recv,
	/// Response body could not be decoded.
	Parse,
	/// Request could not be constructed.
	Request,
	/// Nothing was available to process.
	NoInput,
	/// Upstream returned a non-success status.
	Response,
	/// Upstream returned an empty body.
	EmptyResult,
	/// Upstream returned an HTML page instead of data.
	HtmlResult,
	/// Upstream answered with a redirect.
	Redirection,
	/// Too many redirects were followed.
	RedirectLimit,
}
impl ErrorKind {
	/// Returns a stable label suitable for log or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Account => "account",
			Self::Agreement => "agreement",
			Self::Title => "title",
			Self::Periodical => "periodical",
			Self::Organization => "organization",
			Self::Subscription => "subscription",
			Self::ReadingList => "reading_list",
			Self::ProofOfDisability => "proof_of_disability",
			Self::Auth => "auth",
			Self::Comm => "comm",
			Self::Connect => "connect",
			Self::Timeout => "timeout",
			Self::Xmit => "xmit",
			Self::Recv => "recv",
			Self::Parse => "parse",
			Self::Request => "request",
			Self::NoInput => "no_input",
			Self::Response => "response",
			Self::EmptyResult => "empty_result",
			Self::HtmlResult => "html_result",
			Self::Redirection => "redirection",
			Self::RedirectLimit => "redirect_limit",
		}
	}

	/// Returns `true` for endpoint-domain kinds.
	pub const fn is_domain(self) -> bool {
		matches!(
			self,
			Self::Account
				| Self::Agreement
				| Self::Title
				| Self::Periodical
				| Self::Organization
				| Self::Subscription
				| Self::ReadingList
				| Self::ProofOfDisability
				| Self::Auth
		)
	}

	/// Returns `true` for transport and protocol kinds.
	pub const fn is_transport(self) -> bool {
		!self.is_domain()
	}

	/// Returns `true` when the failure means the service could not be reached at all.
	///
	/// The executor re-raises these instead of recording them silently.
	pub const fn is_network(self) -> bool {
		matches!(self, Self::Comm | Self::Connect | Self::Timeout | Self::Xmit | Self::Recv)
	}

	/// Fallback human-readable description.
	pub const fn default_message(self) -> &'static str {
		match self {
			Self::Comm => "Communication failure.",
			Self::Connect => "Could not connect to the service.",
			Self::Timeout => "The service did not respond in time.",
			Self::Xmit => "The request could not be sent.",
			Self::Recv => "The response could not be received.",
			Self::Parse => "The response could not be decoded.",
			Self::Request => "The request could not be built.",
			Self::NoInput => "There was nothing to process.",
			Self::Response => "The service reported a failure.",
			Self::EmptyResult => "The service returned an empty result.",
			Self::HtmlResult => "The service returned a web page instead of data.",
			Self::Redirection => "The service redirected the request.",
			Self::RedirectLimit => "Too many redirects.",
			_ => "The request failed.",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Classified failure raised for an endpoint domain.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// Service that produced the failure.
	pub service: ServiceKind,
	/// Domain (or transport) category.
	pub kind: ErrorKind,
	/// Endpoint method the failure belongs to.
	pub method: String,
	/// Final human-readable message.
	pub message: String,
	/// HTTP status of the last response, when one was received.
	pub status: Option<u16>,
	/// Upstream error code, when the body carried one.
	pub code: Option<String>,
}

/// Recorded outcome of a failed call.
///
/// This is what the session keeps as its last exception and what error-carrying DTOs hold.
/// Unlike [`Error`] it is cheap to clone and never owns a live transport error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
	/// Failure category.
	pub kind: ErrorKind,
	/// Human-readable description.
	pub message: String,
	/// HTTP status, when a response was received.
	pub status: Option<u16>,
	/// Raw response body, unless it was replaced by a sanitized description.
	pub body: Option<String>,
}
impl ApiFailure {
	/// Creates a failure with no HTTP context.
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into(), status: None, body: None }
	}

	/// Attaches an HTTP status.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Attaches the raw response body.
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());

		self
	}
}
impl Display for ApiFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.status {
			Some(status) => write!(f, "{} (HTTP {status}): {}", self.kind, self.message),
			None => write!(f, "{}: {}", self.kind, self.message),
		}
	}
}
impl From<&TransportError> for ApiFailure {
	fn from(e: &TransportError) -> Self {
		Self::new(e.kind, e.message.clone())
	}
}

/// Configuration and construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid: {value}.")]
	InvalidUrl {
		/// Configuration field that failed.
		field: &'static str,
		/// Raw value that failed to parse.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured number cannot be parsed.
	#[error("The {field} setting must be a number: {value}.")]
	InvalidNumber {
		/// Configuration field that failed.
		field: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
	/// A default header value contains characters HTTP does not allow.
	#[error("The {header} header value is invalid.")]
	InvalidHeader {
		/// Header name.
		header: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures detected before a request is sent.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// One or more required parameters were absent or blank.
	#[error("{method}: missing required {} {}", plural(.missing.len()), .missing.join(", "))]
	MissingParameters {
		/// Endpoint method being validated.
		method: String,
		/// Missing parameter names, in declaration order.
		missing: Vec<String>,
	},
	/// No endpoint table declares the requested method.
	#[error("Unknown endpoint `{name}`.")]
	UnknownEndpoint {
		/// Requested method name.
		name: String,
	},
}

fn plural(count: usize) -> &'static str {
	if count == 1 { "parameter" } else { "parameters" }
}

/// Transport-level failure surfaced by the connection.
#[derive(Debug, ThisError)]
#[error("{service} {kind} failure: {message}")]
pub struct TransportError {
	/// Service that was being called.
	pub service: ServiceKind,
	/// Transport failure category.
	pub kind: ErrorKind,
	/// Human-readable description.
	pub message: String,
	/// Underlying transport error.
	#[source]
	pub source: Option<BoxError>,
}
impl TransportError {
	/// Creates a transport failure without an underlying source.
	pub fn new(service: ServiceKind, kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { service, kind, message: message.into(), source: None }
	}

	/// Classifies a reqwest failure.
	pub fn from_reqwest(service: ServiceKind, e: ReqwestError) -> Self {
		let kind = if e.is_timeout() {
			ErrorKind::Timeout
		} else if e.is_connect() {
			ErrorKind::Connect
		} else if e.is_redirect() {
			ErrorKind::RedirectLimit
		} else if e.is_builder() {
			ErrorKind::Request
		} else if e.is_request() {
			ErrorKind::Xmit
		} else if e.is_body() || e.is_decode() {
			ErrorKind::Recv
		} else {
			ErrorKind::Comm
		};

		Self { service, kind, message: e.to_string(), source: Some(Box::new(e)) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_parameters_message_pluralizes() {
		let one = ValidationError::MissingParameters {
			method: "get_title".into(),
			missing: vec!["bookshareId".into()],
		};
		let many = ValidationError::MissingParameters {
			method: "create_subscription".into(),
			missing: vec!["startDate".into(), "subscriptionType".into()],
		};

		assert_eq!(one.to_string(), "get_title: missing required parameter bookshareId");
		assert_eq!(
			many.to_string(),
			"create_subscription: missing required parameters startDate, subscriptionType"
		);
	}

	#[test]
	fn kinds_split_into_domain_and_transport() {
		assert!(ErrorKind::Title.is_domain());
		assert!(ErrorKind::Auth.is_domain());
		assert!(ErrorKind::HtmlResult.is_transport());
		assert!(ErrorKind::Connect.is_network());
		assert!(!ErrorKind::RedirectLimit.is_network());
	}

	#[test]
	fn failure_display_includes_status() {
		let failure = ApiFailure::new(ErrorKind::Response, "Not authorized").with_status(401);

		assert_eq!(failure.to_string(), "response (HTTP 401): Not authorized");
	}
}
