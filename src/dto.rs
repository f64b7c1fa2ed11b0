//! Response records.
//!
//! Endpoint methods never fail because a body could not be mapped: they return an
//! [`ApiRecord`] whose `error` field explains what went wrong, so callers branch on data
//! rather than on exceptions.

// self
use crate::{
	_prelude::*,
	error::{ApiFailure, ErrorKind},
	session::{ApiResponse, ServiceSession},
};

/// Decoded response body or the failure that prevented it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiRecord<T> {
	/// Decoded body.
	pub data: Option<T>,
	/// Failure, when the call or the decode did not succeed.
	pub error: Option<ApiFailure>,
}
impl<T> ApiRecord<T> {
	/// Successful record.
	pub fn ok(data: T) -> Self {
		Self { data: Some(data), error: None }
	}

	/// Error-carrying record.
	pub fn failed(error: ApiFailure) -> Self {
		Self { data: None, error: Some(error) }
	}

	/// Returns `true` when the record carries data and no error.
	pub fn is_ok(&self) -> bool {
		self.error.is_none() && self.data.is_some()
	}

	/// Borrowed data.
	pub fn data(&self) -> Option<&T> {
		self.data.as_ref()
	}

	/// Converts into a plain result.
	pub fn into_result(self) -> std::result::Result<T, ApiFailure> {
		match (self.data, self.error) {
			(Some(data), None) => Ok(data),
			(_, Some(error)) => Err(error),
			(None, None) => Err(ApiFailure::new(ErrorKind::NoInput, ErrorKind::NoInput.default_message())),
		}
	}
}
impl<T> ApiRecord<T>
where
	T: DeserializeOwned,
{
	/// Builds a record from a response and/or a recorded failure. Never fails.
	pub fn new(response: Option<&ApiResponse>, error: Option<ApiFailure>) -> Self {
		match (response, error) {
			(_, Some(error)) => Self::failed(error),
			(Some(response), None) => Self::decode(response),
			(None, None) => Self::failed(ApiFailure::new(
				ErrorKind::NoInput,
				ErrorKind::NoInput.default_message(),
			)),
		}
	}

	/// Builds a record from what the executor returned and what the session recorded.
	///
	/// A response recorded in the session but not returned by the executor is a soft failure.
	pub fn from_session(returned: Option<&ApiResponse>, session: &ServiceSession) -> Self {
		if let Some(error) = &session.exception {
			return Self::failed(error.clone());
		}

		match (returned, session.response.as_ref()) {
			(Some(response), _) => Self::decode(response),
			(None, Some(response)) => {
				let kind = if response.is_redirect() {
					ErrorKind::Redirection
				} else if response.is_html() {
					ErrorKind::HtmlResult
				} else {
					ErrorKind::Response
				};

				Self::failed(ApiFailure::new(kind, kind.default_message()).with_status(response.status))
			},
			(None, None) => Self::new(None, None),
		}
	}

	/// Decodes a response body.
	pub fn decode(response: &ApiResponse) -> Self {
		if response.is_blank() {
			return match serde_json::from_str::<T>("null") {
				Ok(data) if response.status == 204 => Self::ok(data),
				_ => Self::failed(
					ApiFailure::new(ErrorKind::EmptyResult, ErrorKind::EmptyResult.default_message())
						.with_status(response.status),
				),
			};
		}

		match response.json::<T>() {
			Ok(data) => Self::ok(data),
			Err(e) => {
				let path = e.path().to_string();

				tracing::warn!(%path, error = %e.inner(), "Response body did not match the expected shape.");

				Self::failed(
					ApiFailure::new(ErrorKind::Parse, format!("{path}: {}", e.inner()))
						.with_status(response.status)
						.with_body(response.body.clone()),
				)
			},
		}
	}
}
impl<T> Default for ApiRecord<T> {
	fn default() -> Self {
		Self { data: None, error: None }
	}
}

/// Status body returned by mutating endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
	/// Status key.
	#[serde(default)]
	pub key: Option<String>,
	/// Human-readable messages.
	#[serde(default)]
	pub messages: Vec<String>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Hypermedia link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
	/// Relation name.
	pub rel: String,
	/// Target URL.
	pub href: String,
}

/// Paging fields shared by list responses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
	/// Opaque cursor for the next page.
	#[serde(default)]
	pub next: Option<String>,
	/// Page size.
	#[serde(default)]
	pub limit: Option<u64>,
	/// Total matches.
	#[serde(default)]
	pub total_results: Option<u64>,
	/// Operations the caller may perform on the list.
	#[serde(default)]
	pub allows: Vec<String>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
	// self
	use super::*;
	use crate::{endpoint::ApiParams, error::ServiceKind, session::Verb};

	#[derive(Debug, PartialEq, Deserialize)]
	#[serde(rename_all = "camelCase")]
	struct Sample {
		bookshare_id: String,
		title: String,
	}

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse {
			status,
			url: Url::parse("https://api.example.org/v2/titles/abc123")
				.expect("Response URL fixture should parse."),
			headers: HeaderMap::new(),
			body: body.into(),
		}
	}

	#[test]
	fn decodes_matching_body() {
		let record = ApiRecord::<Sample>::decode(&response(
			200,
			r#"{"bookshareId":"abc123","title":"Sample"}"#,
		));

		assert!(record.is_ok());
		assert_eq!(record.data().map(|s| s.bookshare_id.as_str()), Some("abc123"));
	}

	#[test]
	fn decode_failure_reports_path() {
		let record = ApiRecord::<Sample>::decode(&response(200, r#"{"bookshareId":7,"title":"x"}"#));
		let error = record.error.expect("Mismatched body should produce an error.");

		assert_eq!(error.kind, ErrorKind::Parse);
		assert!(error.message.starts_with("bookshareId"), "{}", error.message);
	}

	#[test]
	fn blank_bodies_are_empty_results_unless_no_content() {
		let empty = ApiRecord::<Sample>::decode(&response(200, ""));
		let no_content = ApiRecord::<Option<Sample>>::decode(&response(204, ""));

		assert_eq!(empty.error.map(|e| e.kind), Some(ErrorKind::EmptyResult));
		assert_eq!(no_content.data, Some(None));
	}

	#[test]
	fn session_outcomes_map_to_records() {
		let mut session = ServiceSession::default();

		session.begin(ServiceKind::Api, Verb::Get, "/v2/titles".into(), ApiParams::new());

		let nothing = ApiRecord::<Sample>::from_session(None, &session);

		assert_eq!(nothing.error.map(|e| e.kind), Some(ErrorKind::NoInput));

		let mut page = response(200, "<html>Page Not Found</html>");

		page.headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
		session.response = Some(page);

		let soft = ApiRecord::<Sample>::from_session(None, &session);

		assert_eq!(soft.error.map(|e| e.kind), Some(ErrorKind::HtmlResult));

		session.exception = Some(ApiFailure::new(ErrorKind::Response, "Not found").with_status(404));

		let failed = ApiRecord::<Sample>::from_session(None, &session);

		assert_eq!(failed.error.and_then(|e| e.status), Some(404));
	}
}
