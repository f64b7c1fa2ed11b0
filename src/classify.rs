//! Failure classification.
//!
//! Each endpoint domain owns an [`ErrorDomain`]: an ordered response table that maps a
//! symbolic key (`no_items`, `failed`, ...) to a [`Matcher`], and a message table that maps
//! the same keys to message templates. Domain entries are merged over the shared defaults once,
//! when the domain is built.

// crates.io
use regex::Regex;
// self
use crate::{
	_prelude::*,
	error::{ApiError, ApiFailure, ErrorKind, ServiceKind},
	session::ApiResponse,
};

/// Key of the fallback template.
pub const DEFAULT_KEY: &str = "default";

/// Fallback message when no response was received.
pub const NO_RESULT: &str = "no HTTP result";
/// Fallback message when the response body was blank.
pub const EMPTY_RESULT: &str = "empty HTTP result body";
/// Fallback message when the body carried no usable description.
pub const UNKNOWN_FAILURE: &str = "unknown failure";

/// Predicate over an extracted failure message.
#[derive(Clone, Debug)]
pub enum Matcher {
	/// Matches everything.
	Always,
	/// Case-insensitive substring match.
	Substring(String),
	/// Regular expression match.
	Pattern(Regex),
}
impl Matcher {
	/// Case-insensitive substring matcher.
	pub fn substring(needle: impl Into<String>) -> Self {
		Self::Substring(needle.into().to_lowercase())
	}

	/// Regular expression matcher.
	pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
		Regex::new(pattern).map(Self::Pattern)
	}

	/// Returns `true` when `message` matches.
	pub fn matches(&self, message: &str) -> bool {
		match self {
			Self::Always => true,
			Self::Substring(needle) => message.to_lowercase().contains(needle.as_str()),
			Self::Pattern(re) => re.is_match(message),
		}
	}
}

/// Ordered key-to-matcher table; the first match wins.
pub type ResponseTable = Vec<(String, Matcher)>;
/// Key-to-template table.
pub type MessageTable = BTreeMap<String, String>;

/// Code and message extracted from a failed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extracted {
	/// Upstream error code.
	pub code: Option<String>,
	/// Upstream message or a fallback.
	pub message: String,
	/// Whether the message came from the upstream body.
	pub from_body: bool,
}

/// Classification tables for one endpoint domain.
#[derive(Clone, Debug)]
pub struct ErrorDomain {
	/// Kind raised for this domain.
	pub kind: ErrorKind,
	responses: ResponseTable,
	messages: MessageTable,
}
impl ErrorDomain {
	/// Starts a domain whose tables extend the shared defaults.
	pub fn builder(kind: ErrorKind) -> ErrorDomainBuilder {
		ErrorDomainBuilder { kind, responses: Vec::new(), messages: MessageTable::new() }
	}

	/// Domain using only the shared defaults.
	pub fn defaults(kind: ErrorKind) -> Self {
		Self::builder(kind).build()
	}

	/// Merged response table.
	pub fn responses(&self) -> &ResponseTable {
		&self.responses
	}

	/// Merged message table.
	pub fn messages(&self) -> &MessageTable {
		&self.messages
	}

	/// Builds the error raised for `method` from the last call's outcome.
	pub fn classify(
		&self,
		service: ServiceKind,
		method: &str,
		response: Option<&ApiResponse>,
		failure: Option<&ApiFailure>,
	) -> ApiError {
		let extracted = match (response, failure) {
			(None, Some(failure)) => Extracted {
				code: None,
				message: failure.message.clone(),
				from_body: false,
			},
			_ => extract(response),
		};

		log_extracted(method, &extracted, response);

		ApiError {
			service,
			kind: self.kind,
			method: method.to_owned(),
			message: compose(&self.responses, &self.messages, &extracted.message),
			status: response.map(|r| r.status).or_else(|| failure.and_then(|f| f.status)),
			code: extracted.code,
		}
	}
}

/// Builder for [`ErrorDomain`].
#[derive(Debug)]
pub struct ErrorDomainBuilder {
	kind: ErrorKind,
	responses: ResponseTable,
	messages: MessageTable,
}
impl ErrorDomainBuilder {
	/// Adds or replaces a response matcher.
	pub fn response(mut self, key: impl Into<String>, matcher: Matcher) -> Self {
		let key = key.into();

		self.responses.retain(|(existing, _)| *existing != key);
		self.responses.push((key, matcher));

		self
	}

	/// Adds a regex response matcher; invalid patterns are logged and skipped.
	pub fn response_pattern(self, key: &str, pattern: &str) -> Self {
		match Matcher::pattern(pattern) {
			Ok(matcher) => self.response(key, matcher),
			Err(e) => {
				tracing::error!(key, pattern, error = %e, "Ignoring invalid response pattern.");

				self
			},
		}
	}

	/// Adds or replaces a message template.
	pub fn message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
		self.messages.insert(key.into(), template.into());

		self
	}

	/// Merges the shared defaults under the domain's own entries.
	pub fn build(self) -> ErrorDomain {
		let Self { kind, mut responses, mut messages } = self;

		for (key, matcher) in default_responses() {
			if !responses.iter().any(|(existing, _)| *existing == key) {
				responses.push((key, matcher));
			}
		}
		for (key, template) in default_messages() {
			messages.entry(key).or_insert(template);
		}

		ErrorDomain { kind, responses, messages }
	}
}

/// Produces the final human-readable message for a failed call.
pub fn request_error_message(
	method: &str,
	responses: &ResponseTable,
	messages: &MessageTable,
	response: Option<&ApiResponse>,
) -> String {
	let extracted = extract(response);

	log_extracted(method, &extracted, response);

	compose(responses, messages, &extracted.message)
}

/// Extracts an error code and message from a response body.
pub fn extract(response: Option<&ApiResponse>) -> Extracted {
	let Some(response) = response else {
		return Extracted { code: None, message: NO_RESULT.into(), from_body: false };
	};

	if response.is_blank() {
		return Extracted { code: None, message: EMPTY_RESULT.into(), from_body: false };
	}

	let Ok(Value::Object(body)) = serde_json::from_str::<Value>(&response.body) else {
		return Extracted { code: None, message: UNKNOWN_FAILURE.into(), from_body: false };
	};
	let code = ["code", "key", "error"]
		.iter()
		.find_map(|field| body.get(*field).and_then(Value::as_str))
		.map(str::to_owned);
	let message =
		["message", "messages", "error_description"].iter().find_map(|field| match body.get(*field) {
			Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
			Some(Value::Array(items)) if !items.is_empty() => Some(
				items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; "),
			),
			_ => None,
		});

	match message {
		Some(message) => Extracted { code, message, from_body: true },
		None => Extracted { code, message: UNKNOWN_FAILURE.into(), from_body: false },
	}
}

/// Selects the template for `message` and combines the two.
pub fn compose(responses: &ResponseTable, messages: &MessageTable, message: &str) -> String {
	let key = responses
		.iter()
		.find(|(_, matcher)| matcher.matches(message))
		.map_or(DEFAULT_KEY, |(key, _)| key.as_str());
	let template = messages
		.get(key)
		.or_else(|| messages.get(DEFAULT_KEY))
		.map(String::as_str)
		.filter(|t| !t.trim().is_empty());

	match template {
		None => message.to_owned(),
		Some(template) if template.contains("%s") => template.replace("%s", message),
		Some(template) => format!("{template}: {message}"),
	}
}

fn log_extracted(method: &str, extracted: &Extracted, response: Option<&ApiResponse>) {
	let status = response.map(|r| r.status);
	let body = response.map(|r| r.body.as_str()).unwrap_or_default();
	let code = extracted.code.as_deref().unwrap_or_default();

	if extracted.from_body {
		tracing::warn!(method, code, ?status, body, message = %extracted.message, "API request failed.");
	} else {
		tracing::error!(method, code, ?status, body, message = %extracted.message, "API request failed.");
	}
}

fn default_responses() -> ResponseTable {
	let mut table = Vec::with_capacity(2);

	match Matcher::pattern(r"(?i)\bno\s+items?\b") {
		Ok(matcher) => table.push(("no_items".to_owned(), matcher)),
		Err(_) => table.push(("no_items".to_owned(), Matcher::substring("no items"))),
	}

	table.push(("failed".to_owned(), Matcher::substring("failed")));

	table
}

fn default_messages() -> MessageTable {
	[
		("no_items", "There were no items to process"),
		("failed", "The request could not be completed"),
		(DEFAULT_KEY, "Bookshare API request failed"),
	]
	.into_iter()
	.map(|(k, v)| (k.to_owned(), v.to_owned()))
	.collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderMap;
	// self
	use super::*;

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse {
			status,
			url: Url::parse("https://api.example.org/v2/titles")
				.expect("Response URL fixture should parse."),
			headers: HeaderMap::new(),
			body: body.into(),
		}
	}

	fn domain() -> ErrorDomain {
		ErrorDomain::builder(ErrorKind::Title)
			.message("no_items", "No titles matched")
			.message("expired", "Session expired (%s)")
			.response("expired", Matcher::substring("Expired"))
			.build()
	}

	#[test]
	fn fallbacks_cover_missing_and_blank_bodies() {
		assert_eq!(extract(None).message, NO_RESULT);
		assert_eq!(extract(Some(&response(500, "  "))).message, EMPTY_RESULT);
		assert_eq!(extract(Some(&response(500, "<html>"))).message, UNKNOWN_FAILURE);
		assert_eq!(extract(Some(&response(500, "{\"other\":1}"))).message, UNKNOWN_FAILURE);
	}

	#[test]
	fn extraction_reads_code_and_message_fields() {
		let extracted =
			extract(Some(&response(422, r#"{"key":"NO_ITEMS","messages":["no items","x"]}"#)));

		assert_eq!(extracted.code.as_deref(), Some("NO_ITEMS"));
		assert_eq!(extracted.message, "no items; x");
		assert!(extracted.from_body);
	}

	#[test]
	fn domain_entries_take_precedence_over_defaults() {
		let domain = domain();
		let keys = domain.responses().iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();

		assert_eq!(keys, vec!["expired", "no_items", "failed"]);
		assert_eq!(domain.messages().get("no_items").map(String::as_str), Some("No titles matched"));
		assert_eq!(
			domain.messages().get("failed").map(String::as_str),
			Some("The request could not be completed")
		);
	}

	#[test]
	fn templates_concatenate_or_interpolate() {
		let domain = domain();

		assert_eq!(
			compose(domain.responses(), domain.messages(), "No items found"),
			"No titles matched: No items found"
		);
		assert_eq!(
			compose(domain.responses(), domain.messages(), "token expired"),
			"Session expired (token expired)"
		);
		assert_eq!(
			compose(domain.responses(), domain.messages(), "something odd"),
			"Bookshare API request failed: something odd"
		);
		assert_eq!(compose(&Vec::new(), &MessageTable::new(), "raw"), "raw");
	}

	#[test]
	fn percent_signs_without_placeholder_keep_the_message() {
		let messages = MessageTable::from([(DEFAULT_KEY.to_owned(), "Quota at 100%".to_owned())]);

		assert_eq!(compose(&Vec::new(), &messages, "limit reached"), "Quota at 100%: limit reached");
	}

	#[test]
	fn classify_prefers_response_over_recorded_failure() {
		let domain = domain();
		let failure = ApiFailure::new(ErrorKind::Connect, "connection refused");
		let from_failure = domain.classify(ServiceKind::Api, "get_title", None, Some(&failure));
		let from_response = domain.classify(
			ServiceKind::Api,
			"get_titles",
			Some(&response(422, r#"{"code":"422","message":"no items"}"#)),
			Some(&failure),
		);

		assert_eq!(from_failure.message, "Bookshare API request failed: connection refused");
		assert_eq!(from_failure.status, None);
		assert_eq!(from_response.kind, ErrorKind::Title);
		assert_eq!(from_response.message, "No titles matched: no items");
		assert_eq!(from_response.status, Some(422));
		assert_eq!(from_response.code.as_deref(), Some("422"));
	}

	#[test]
	fn request_error_message_uses_given_tables() {
		let responses = vec![("gone".to_owned(), Matcher::Always)];
		let messages = MessageTable::from([("gone".to_owned(), "Gone".to_owned())]);
		let message = request_error_message(
			"remove_user_pod",
			&responses,
			&messages,
			Some(&response(404, r#"{"error_description":"No such record"}"#)),
		);

		assert_eq!(message, "Gone: No such record");
	}
}
