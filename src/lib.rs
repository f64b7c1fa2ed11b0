//! Typed access layer for the Bookshare API: pooled connections with retry and backoff,
//! declarative endpoint tables with fail-fast parameter validation, OAuth 2.0 grant flows,
//! and structured error classification.
//!
//! An [`ApiService`] serves one caller and remembers the outcome of its last call. Domain
//! facades (`service.title()`, `service.account()`, ...) wrap each operation's response in an
//! [`ApiRecord`](dto::ApiRecord), which carries either the decoded body or the failure.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod classify;
pub mod config;
pub mod dto;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod service;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{ApiConfig, RetryPolicy},
		service::ApiService,
	};

	/// API key used by test configurations.
	pub const TEST_API_KEY: &str = "test-api-key";

	/// Configuration pointing both the API and the auth host at `server_url` (typically an
	/// `httpmock` server), with short retry intervals.
	pub fn test_config(server_url: &str) -> ApiConfig {
		let url = Url::parse(server_url).expect("Mock server URL should parse.");

		ApiConfig::builder()
			.base_url(url.clone())
			.auth_url(url)
			.api_key(TEST_API_KEY)
			.retry(RetryPolicy::default().with_interval(StdDuration::from_millis(1)))
			.danger_accept_invalid_certs(true)
			.build()
	}

	/// Anonymous service built from [`test_config`].
	pub fn build_test_service(server_url: &str) -> ApiService {
		ApiService::new(test_config(server_url))
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::{Arc, LazyLock},
		time::Duration as StdDuration,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;

pub use crate::{
	config::ApiConfig,
	dto::ApiRecord,
	endpoint::ApiParams,
	error::{ApiError, ApiFailure, Error, ErrorKind, Result},
	service::ApiService,
	session::{ApiResponse, Verb},
};

#[cfg(test)] use httpmock as _;
