// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	config::ApiConfig,
	error::ConfigError,
	oauth::{ResponseType, transport},
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Browser redirect for the first leg of the code or implicit flow.
#[derive(Clone)]
pub struct AuthorizationRequest {
	/// URL the user agent should be sent to.
	pub url: Url,
	/// Opaque state echoed back on the redirect.
	pub state: String,
	/// PKCE verifier to hand back with the authorization code.
	pub pkce_verifier: Option<String>,
	/// Flow the request starts.
	pub response_type: ResponseType,
}
impl AuthorizationRequest {
	/// Returns `true` when the echoed `state` matches the one sent.
	pub fn state_matches(&self, echoed: &str) -> bool {
		self.state == echoed
	}
}
impl Debug for AuthorizationRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationRequest")
			.field("url", &self.url.as_str())
			.field("state", &self.state)
			.field("pkce", &self.pkce_verifier.is_some())
			.field("response_type", &self.response_type)
			.finish()
	}
}

pub(crate) fn authorization_request(
	config: &ApiConfig,
	response_type: ResponseType,
	state: Option<&str>,
) -> Result<AuthorizationRequest, ConfigError> {
	let mut url = transport::endpoint(config, "auth", transport::AUTHORIZE_PATH)?;
	let state = state.map_or_else(|| random_string(STATE_LEN), str::to_owned);
	let pkce_verifier = (config.use_pkce && response_type == ResponseType::Code)
		.then(|| random_string(PKCE_VERIFIER_LEN));
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", response_type.as_str());
	pairs.append_pair("client_id", &config.api_key);

	if let Some(redirect) = &config.redirect_uri {
		pairs.append_pair("redirect_uri", redirect.as_str());
	}

	pairs.append_pair("state", &state);

	if let Some(verifier) = &pkce_verifier {
		pairs.append_pair("code_challenge", &pkce_challenge(verifier));
		pairs.append_pair("code_challenge_method", "S256");
	}

	drop(pairs);

	Ok(AuthorizationRequest { url, state, pkce_verifier, response_type })
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(use_pkce: bool) -> ApiConfig {
		ApiConfig::builder()
			.auth_url(Url::parse("https://auth.example.org").expect("Auth URL should parse."))
			.api_key("client-key")
			.redirect_uri(Url::parse("https://app.example.org/cb").expect("Redirect should parse."))
			.use_pkce(use_pkce)
			.build()
	}

	fn query(url: &Url) -> BTreeMap<String, String> {
		url.query_pairs().into_owned().collect()
	}

	#[test]
	fn code_requests_carry_pkce_when_enabled() {
		let request = authorization_request(&config(true), ResponseType::Code, Some("xyz"))
			.expect("Authorization request should build.");
		let pairs = query(&request.url);
		let verifier = request.pkce_verifier.as_deref().expect("PKCE verifier should be generated.");

		assert_eq!(request.url.path(), "/oauth/authorize");
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-key"));
		assert_eq!(pairs.get("redirect_uri").map(String::as_str), Some("https://app.example.org/cb"));
		assert_eq!(pairs.get("state").map(String::as_str), Some("xyz"));
		assert_eq!(pairs.get("code_challenge"), Some(&pkce_challenge(verifier)));
		assert_eq!(verifier.len(), PKCE_VERIFIER_LEN);
		assert!(request.state_matches("xyz"));
	}

	#[test]
	fn implicit_requests_never_use_pkce() {
		let request = authorization_request(&config(true), ResponseType::Token, None)
			.expect("Authorization request should build.");
		let pairs = query(&request.url);

		assert_eq!(pairs.get("response_type").map(String::as_str), Some("token"));
		assert!(!pairs.contains_key("code_challenge"));
		assert!(request.pkce_verifier.is_none());
		assert_eq!(request.state.len(), STATE_LEN);
	}

	#[test]
	fn challenge_matches_rfc_7636_example() {
		assert_eq!(
			pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
		);
	}
}
