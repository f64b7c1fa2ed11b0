// self
use crate::session::ApiResponse;

/// Signature of the upstream's HTML error page.
pub const PAGE_NOT_FOUND: &str = "page not found";

const INSPECTED_CHARS: usize = 64;

/// Decides whether a success response is really an error page.
pub trait SoftFailureDetector
where
	Self: 'static + Send + Sync,
{
	/// Returns `true` when `response` carries no usable data despite its status.
	fn is_soft_failure(&self, response: &ApiResponse) -> bool;
}
impl<F> SoftFailureDetector for F
where
	F: 'static + Send + Sync + Fn(&ApiResponse) -> bool,
{
	fn is_soft_failure(&self, response: &ApiResponse) -> bool {
		self(response)
	}
}

/// Default detector: a 2xx whose first 64 characters mention "page not found", in any case.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageNotFound;
impl SoftFailureDetector for PageNotFound {
	fn is_soft_failure(&self, response: &ApiResponse) -> bool {
		if !response.is_success() {
			return false;
		}

		let prefix = response.body.chars().take(INSPECTED_CHARS).collect::<String>();

		prefix.to_lowercase().contains(PAGE_NOT_FOUND)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderMap;
	// self
	use super::*;
	use crate::_prelude::*;

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse {
			status,
			url: Url::parse("https://api.example.org/v2/titles").expect("URL should parse."),
			headers: HeaderMap::new(),
			body: body.into(),
		}
	}

	#[test]
	fn matches_only_near_the_start() {
		let late = format!("{}Page Not Found", " ".repeat(INSPECTED_CHARS));

		assert!(PageNotFound.is_soft_failure(&response(200, "<h1>PAGE NOT FOUND</h1>")));
		assert!(!PageNotFound.is_soft_failure(&response(200, &late)));
		assert!(!PageNotFound.is_soft_failure(&response(404, "Page not found")));
		assert!(!PageNotFound.is_soft_failure(&response(200, "{\"title\":\"Found\"}")));
	}

	#[test]
	fn closures_are_detectors() {
		let detector = |r: &ApiResponse| r.body.starts_with("<!DOCTYPE");

		assert!(detector.is_soft_failure(&response(200, "<!DOCTYPE html>")));
	}
}
