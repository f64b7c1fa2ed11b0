mod common;

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
// self
use bookshare_api::{
	ApiParams, ErrorKind, Verb, api::title::TitleMetadata, config::CacheConfig, dto::ApiRecord,
	oauth::TokenInput,
};
use common::API_KEY;

const TITLE_BODY: &str = r#"{"bookshareId":"abc123","title":"Sample"}"#;

#[tokio::test]
async fn get_title_decodes_the_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/titles/abc123").query_param("api_key", API_KEY);
			then.status(200).header("content-type", "application/json").body(TITLE_BODY);
		})
		.await;
	let mut service = common::service(&server);
	let record = service
		.title()
		.get_title("abc123", ApiParams::new())
		.await
		.expect("Reachable API should not raise.");

	mock.assert_calls_async(1).await;

	assert!(record.error.is_none());

	let title = record.data.expect("Title should decode.");

	assert_eq!(title.bookshare_id, "abc123");
	assert_eq!(title.title, "Sample");
	assert_eq!(service.session().verb, Some(Verb::Get));
	assert_eq!(service.session().action.as_deref(), Some("/v2/titles/abc123"));
	assert!(service.exception().is_none());
}

#[tokio::test]
async fn error_pages_are_soft_failures_for_every_verb() {
	let server = MockServer::start_async().await;
	let page = "<html><body><h1>Page Not Found</h1></body></html>";

	server
		.mock_async(|when, then| {
			when.path("/v2/lists/missing");
			then.status(200).header("content-type", "text/html").body(page);
		})
		.await;

	let mut service = common::service(&server);

	for verb in [Verb::Get, Verb::Post, Verb::Put, Verb::Delete] {
		let response = service
			.api(verb, &["lists", "missing"], ApiParams::new())
			.await
			.expect("Soft failures should not raise.");

		assert!(response.is_none(), "{verb} should return nothing");
		assert!(service.exception().is_none(), "{verb} should record no exception");
		assert_eq!(service.response().map(|r| r.status), Some(200));
	}

	let record = service
		.reading_list()
		.get_reading_list("missing")
		.await
		.expect("Soft failures should not raise.");

	assert_eq!(record.error.map(|e| e.kind), Some(ErrorKind::HtmlResult));
}

#[tokio::test]
async fn api_key_travels_in_query_or_body() {
	let server = MockServer::start_async().await;
	let read = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/myaccount").query_param("api_key", API_KEY);
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let write = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v2/mylists")
				.header("content-type", "application/json")
				.body_includes(format!("\"api_key\":\"{API_KEY}\""))
				.body_includes("\"name\":\"Summer\"");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"readingListId":"rl-1","name":"Summer"}"#);
		})
		.await;
	let mut service = common::service(&server);
	let summary = service.account().get_my_account().await.expect("Read should not raise.");
	let list = service
		.reading_list()
		.create_reading_list("Summer", "private", ApiParams::new())
		.await
		.expect("Write should not raise.");

	read.assert_calls_async(1).await;
	write.assert_calls_async(1).await;

	assert!(summary.is_ok());
	assert_eq!(list.data.map(|l| l.reading_list_id), Some("rl-1".to_owned()));
	assert_eq!(service.session().params.get_str("api_key"), Some(API_KEY));
}

#[tokio::test]
async fn multi_valued_filters_repeat_in_the_query() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v2/titles")
				.query_param("formats", "DAISY")
				.query_param("formats", "EPUB3")
				.query_param("title", "moby dick");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"titles":[],"totalResults":0,"limit":10}"#);
		})
		.await;
	let mut service = common::service(&server);
	let record = service
		.title()
		.get_titles(ApiParams::new().with("fmt", "DAISY,EPUB3").with("title", "moby dick"))
		.await
		.expect("Search should not raise.");

	mock.assert_calls_async(1).await;

	let list = record.data.expect("Search results should decode.");

	assert_eq!(list.paging.total_results, Some(0));
	assert_eq!(list.paging.limit, Some(10));
}

#[tokio::test]
async fn retryable_statuses_retry_only_idempotent_verbs() {
	let server = MockServer::start_async().await;
	let get = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/me");
			then.status(503).body("unavailable");
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/mylists");
			then.status(503).body("unavailable");
		})
		.await;
	let mut service = common::service(&server);
	let max_retries = service.config().retry.max_retries as usize;

	let response = service
		.api(Verb::Get, &["me"], ApiParams::new())
		.await
		.expect("Error statuses should not raise.");

	assert!(response.is_none());

	get.assert_calls_async(max_retries + 1).await;

	let exception = service.exception().expect("Exhausted retries should record a failure.");

	assert_eq!(exception.kind, ErrorKind::Response);
	assert_eq!(exception.status, Some(503));

	let response = service
		.api(Verb::Post, &["mylists"], ApiParams::new())
		.await
		.expect("Error statuses should not raise.");

	assert!(response.is_none());

	post.assert_calls_async(1).await;
}

#[tokio::test]
async fn unreachable_hosts_raise_after_retries() {
	let server = MockServer::start_async().await;
	let builder = common::config_builder(&server)
		.base_url("http://127.0.0.1:9/v2".parse().expect("Closed-port URL should parse."));
	let mut service = bookshare_api::ApiService::new(builder.build());
	let err = service
		.api(Verb::Get, &["me"], ApiParams::new())
		.await
		.expect_err("Connection failures should raise.");

	assert!(err.kind().is_some_and(ErrorKind::is_network), "{err:?}");
	assert!(service.response().is_none());
	assert!(service.exception().is_some_and(|e| e.kind.is_network()));
}

#[tokio::test]
async fn sessions_do_not_share_state() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/titles/abc123");
			then.status(200).header("content-type", "application/json").body(TITLE_BODY);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/titles/gone");
			then.status(404)
				.header("content-type", "application/json")
				.body(r#"{"key":"NOT_FOUND","messages":["Title not found"]}"#);
		})
		.await;

	let mut first = common::service(&server);
	let mut second = common::service(&server);
	let found = first
		.title()
		.get_title("abc123", ApiParams::new())
		.await
		.expect("First session should not raise.");
	let missing = second
		.title()
		.get_title("gone", ApiParams::new())
		.await
		.expect("Second session should not raise.");

	assert!(found.is_ok());
	assert!(first.exception().is_none());
	assert_eq!(first.session().params.get_str("bookshareId"), None);
	assert_eq!(first.session().action.as_deref(), Some("/v2/titles/abc123"));
	assert_eq!(missing.error.as_ref().and_then(|e| e.status), Some(404));
	assert_eq!(second.exception().map(|e| e.message.as_str()), Some("Title not found"));
	assert_eq!(second.session().action.as_deref(), Some("/v2/titles/gone"));
	assert_eq!(first.response().map(|r| r.status), Some(200));
}

#[tokio::test]
async fn cached_reads_skip_the_network_until_the_token_changes() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/titles/abc123");
			then.status(200).header("content-type", "application/json").body(TITLE_BODY);
		})
		.await;
	let config = common::config_builder(&server)
		.cache(CacheConfig { enabled: true, ..CacheConfig::default() })
		.build();
	let mut service = bookshare_api::ApiService::new(config);

	for _ in 0..2 {
		let record: ApiRecord<TitleMetadata> = service
			.title()
			.get_title("abc123", ApiParams::new())
			.await
			.expect("Cached read should not raise.");

		assert!(record.is_ok());
	}

	mock.assert_calls_async(1).await;

	service.oauth().set_token(TokenInput::Raw("access_token=fresh"));
	service
		.title()
		.get_title("abc123", ApiParams::new())
		.await
		.expect("Uncached read should not raise.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn bearer_token_is_sent_once_installed() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/me").header("authorization", "Bearer tok-123");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"username":"reader@example.org"}"#);
		})
		.await;
	let mut service = common::service(&server);

	assert!(service.oauth().set_token(TokenInput::Raw("access_token=tok-123")).is_token());

	let identity = service.account().get_user_identity().await.expect("Identity should load.");

	mock.assert_calls_async(1).await;

	assert_eq!(identity.data.map(|i| i.username), Some("reader@example.org".to_owned()));
}

#[tokio::test]
async fn error_pages_are_never_cached() {
	let server = MockServer::start_async().await;
	let page = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/titles/abc123");
			then.status(200)
				.header("content-type", "text/html")
				.body("<html>Page Not Found</html>");
		})
		.await;
	let config = common::config_builder(&server)
		.cache(CacheConfig { enabled: true, ..CacheConfig::default() })
		.build();
	let mut service = bookshare_api::ApiService::new(config);
	let record = service
		.title()
		.get_title("abc123", ApiParams::new())
		.await
		.expect("Soft failures should not raise.");

	assert_eq!(record.error.map(|e| e.kind), Some(ErrorKind::HtmlResult));

	page.assert_calls_async(1).await;
	page.delete_async().await;

	let recovered = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/titles/abc123");
			then.status(200).header("content-type", "application/json").body(TITLE_BODY);
		})
		.await;
	let record = service
		.title()
		.get_title("abc123", ApiParams::new())
		.await
		.expect("Recovered upstream should not raise.");

	recovered.assert_calls_async(1).await;

	assert!(record.is_ok());
}

#[tokio::test]
async fn timeouts_retry_only_idempotent_verbs() {
	let server = MockServer::start_async().await;
	let get = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/me");
			then.status(200).body("{}").delay(Duration::from_millis(500));
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/mylists");
			then.status(200).body("{}").delay(Duration::from_millis(500));
		})
		.await;
	let config = common::config_builder(&server).timeout(Duration::from_millis(100)).build();
	let mut service = bookshare_api::ApiService::new(config);
	let max_retries = service.config().retry.max_retries as usize;
	let err = service
		.api(Verb::Get, &["me"], ApiParams::new())
		.await
		.expect_err("Timed-out reads should raise.");

	assert_eq!(err.kind(), Some(ErrorKind::Timeout), "{err:?}");

	get.assert_calls_async(max_retries + 1).await;

	let err = service
		.api(Verb::Post, &["mylists"], ApiParams::new())
		.await
		.expect_err("Timed-out writes should raise.");

	assert_eq!(err.kind(), Some(ErrorKind::Timeout), "{err:?}");

	post.assert_calls_async(1).await;
}
