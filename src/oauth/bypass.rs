//! Test-user token override.
//!
//! Some non-production accounts cannot complete the upstream OAuth flow reliably. When
//! [`ApiConfig::allow_test_users`] is set, a user listed in [`ApiConfig::test_users`] receives
//! the pre-generated token from the table and no grant request is made. Production
//! configurations leave the flag off, which makes the table inert.

// self
use crate::{
	_prelude::*,
	config::ApiConfig,
	oauth::{OauthToken, TokenSecret},
};

/// Pre-generated bearer tokens keyed by user identifier.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TestUserTokens(BTreeMap<String, TokenSecret>);
impl TestUserTokens {
	/// Parses `user=token` pairs separated by commas; malformed pairs are logged and skipped.
	pub fn parse(raw: &str) -> Self {
		let mut tokens = Self::default();

		for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
			match pair.split_once('=') {
				Some((user, token)) if !user.trim().is_empty() && !token.trim().is_empty() => {
					tokens.insert(user.trim(), token.trim());
				},
				_ => tracing::error!(pair_len = pair.len(), "Ignoring malformed test-user entry."),
			}
		}

		tokens
	}

	/// Adds or replaces a user's token.
	pub fn insert(&mut self, user: impl Into<String>, token: impl Into<String>) {
		self.0.insert(user.into().to_lowercase(), TokenSecret::new(token));
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with(mut self, user: impl Into<String>, token: impl Into<String>) -> Self {
		self.insert(user, token);

		self
	}

	/// Token for `user`, matched case-insensitively.
	pub fn get(&self, user: &str) -> Option<&TokenSecret> {
		self.0.get(&user.to_lowercase())
	}

	/// Number of listed users.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no users are listed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TestUserTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.0.keys()).finish()
	}
}

/// Returns the override token for `user`, when test users are allowed and `user` is listed.
pub fn test_user_token(config: &ApiConfig, user: Option<&str>) -> Option<OauthToken> {
	if !config.allow_test_users {
		return None;
	}

	let user = user?;
	let secret = config.test_users.get(user)?;

	tracing::warn!(user, "Using a pre-generated test-user token instead of OAuth.");

	Some(OauthToken::bearer(secret.clone()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_skips_malformed_pairs() {
		let tokens = TestUserTokens::parse(" Alice@Example.org = tok-a , broken, =x, bob=tok-b");

		assert_eq!(tokens.len(), 2);
		assert_eq!(tokens.get("alice@example.org").map(TokenSecret::expose), Some("tok-a"));
		assert_eq!(format!("{tokens:?}"), r#"{"alice@example.org", "bob"}"#);
	}

	#[test]
	fn bypass_requires_the_flag() {
		let users = TestUserTokens::default().with("alice", "tok-a");
		let disabled = ApiConfig::builder().test_users(users.clone()).build();
		let enabled = ApiConfig::builder().test_users(users).allow_test_users(true).build();

		assert!(test_user_token(&disabled, Some("alice")).is_none());
		assert!(test_user_token(&enabled, None).is_none());
		assert!(test_user_token(&enabled, Some("carol")).is_none());
		assert_eq!(
			test_user_token(&enabled, Some("ALICE")).map(|t| t.access_token.expose().to_owned()),
			Some("tok-a".into())
		);
	}
}
