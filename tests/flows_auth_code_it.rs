#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
// self
use gmail_relay::{
	_preludet::*,
	auth::ScopeSet,
	error::{Error, UpstreamError, ValidationError},
	flows::ConsentPrompt,
	store::TokenStore,
};

const TOKEN_BODY: &str = "{\"access_token\":\"access-success\",\"refresh_token\":\"refresh-success\",\"token_type\":\"Bearer\",\"expires_in\":3599,\"scope\":\"https://www.googleapis.com/auth/gmail.send https://www.googleapis.com/auth/gmail.readonly\"}";

#[tokio::test]
async fn authorization_url_requests_offline_access_with_forced_consent() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(test_descriptor(&server.base_url()));
	let url = broker.start_authorization();
	let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

	assert_eq!(url.path(), "/authorize");
	assert_eq!(pairs.get("response_type"), Some(&"code".into()));
	assert_eq!(pairs.get("client_id"), Some(&TEST_CLIENT_ID.into()));
	assert_eq!(pairs.get("redirect_uri"), Some(&TEST_REDIRECT_URI.into()));
	assert_eq!(pairs.get("access_type"), Some(&"offline".into()));
	assert_eq!(pairs.get("prompt"), Some(&"consent".into()));
	assert_eq!(pairs.get("scope"), Some(&ScopeSet::gmail_default().normalized()));
	assert!(!pairs.contains_key("state"));

	let reuse = broker.with_consent(ConsentPrompt::Reuse).start_authorization();

	assert!(reuse.query_pairs().all(|(key, _)| key != "prompt"));
}

#[tokio::test]
async fn exchange_stores_credentials_from_token_endpoint() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(test_descriptor(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "valid-code")
				.form_urlencoded_tuple("redirect_uri", TEST_REDIRECT_URI)
				.form_urlencoded_tuple("client_id", TEST_CLIENT_ID)
				.form_urlencoded_tuple("client_secret", TEST_CLIENT_SECRET);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let credentials =
		broker.exchange_code("valid-code").await.expect("Code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(credentials.access_token().expose(), "access-success");
	assert_eq!(
		credentials.refresh_token().map(|secret| secret.expose()),
		Some("refresh-success")
	);
	assert_eq!(credentials.scope(), &ScopeSet::gmail_default());
	assert_eq!(credentials.expires_at() - credentials.issued_at(), Duration::seconds(3599));

	let stored = store.get().expect("Exchange should fill the slot.");

	assert_eq!(stored.access_token().expose(), "access-success");
}

#[tokio::test]
async fn exchange_replaces_existing_credentials() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(test_descriptor(&server.base_url()));

	store.set(credential_fixture("old-access", Some("old-refresh")));
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	broker.exchange_code("second-code").await.expect("Reconnecting should succeed.");

	let stored = store.get().expect("Slot should stay filled.");

	assert_eq!(stored.access_token().expose(), "access-success");
	assert_eq!(stored.refresh_token().map(|secret| secret.expose()), Some("refresh-success"));
}

#[tokio::test]
async fn failed_exchange_leaves_the_slot_untouched() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(test_descriptor(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Bad Request\"}");
		})
		.await;
	let err = broker.exchange_code("stale-code").await.expect_err("Stale codes must fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Upstream(UpstreamError::InvalidGrant { .. })));
	assert!(store.get().is_none());

	let seeded = credential_fixture("kept-access", Some("kept-refresh"));

	store.set(seeded.clone());

	broker.exchange_code("stale-code").await.expect_err("Stale codes must fail again.");

	assert_eq!(store.get(), Some(seeded));
}

#[tokio::test]
async fn unrepresentable_expiry_fails_the_exchange_without_touching_the_slot() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(test_descriptor(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-forever\",\"token_type\":\"Bearer\",\"expires_in\":9000000000000000}",
			);
		})
		.await;
	let err = broker.exchange_code("valid-code").await.expect_err("Absurd lifetimes must fail.");

	assert!(matches!(err, Error::Upstream(UpstreamError::TokenEndpoint { .. })));
	assert!(store.get().is_none());

	let seeded = credential_fixture("kept-access", Some("kept-refresh"));

	store.set(seeded.clone());

	broker.exchange_code("valid-code").await.expect_err("Absurd lifetimes must fail again.");

	mock.assert_calls_async(2).await;

	assert_eq!(store.get(), Some(seeded));
}

#[tokio::test]
async fn empty_codes_never_reach_the_provider() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(test_descriptor(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let err = broker.exchange_code("  ").await.expect_err("Blank codes must be rejected.");

	assert!(matches!(
		err,
		Error::Validation(ValidationError::MissingQueryParameter { name: "code" })
	));
	assert!(store.get().is_none());

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn exchange_without_refresh_token_still_connects() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(test_descriptor(&server.base_url()));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-only\",\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;

	let credentials =
		broker.exchange_code("reused-consent").await.expect("Exchange should succeed.");

	assert!(credentials.refresh_token().is_none());
	assert!(store.state().is_authenticated());
}
