#![allow(dead_code)]

// std
use std::time::Duration;
// crates.io
use httpmock::MockServer;
// self
use bookshare_api::{
	ApiConfig, ApiService,
	config::{ApiConfigBuilder, RetryPolicy},
	url::Url,
};

pub const API_KEY: &str = "it-api-key";

/// Builder pointing the API and the auth host at the mock server, trusting its self-signed
/// certificate.
pub fn config_builder(server: &MockServer) -> ApiConfigBuilder {
	let url = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	ApiConfig::builder()
		.base_url(url.clone())
		.auth_url(url)
		.api_key(API_KEY)
		.retry(RetryPolicy::default().with_interval(Duration::from_millis(1)))
		.danger_accept_invalid_certs(true)
}

/// Anonymous service against the mock server.
pub fn service(server: &MockServer) -> ApiService {
	ApiService::new(config_builder(server).build())
}
