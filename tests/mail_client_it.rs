#![cfg(feature = "test")]

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use serde_json::json;
// self
use gmail_relay::{
	_preludet::*,
	error::{Error, UpstreamError},
	mail::{GmailClient, OutgoingMessage},
};

const MESSAGES_PATH: &str = "/gmail/v1/users/me/messages";

fn gmail_client(server: &MockServer) -> GmailClient {
	let base = Url::parse(&format!("{}/gmail/v1", server.base_url()))
		.expect("Mock Gmail base should parse successfully.");

	GmailClient::new(test_http_client(), base).expect("Loopback Gmail base should validate.")
}

fn message_path(id: &str) -> String {
	format!("{MESSAGES_PATH}/{id}")
}

#[tokio::test]
async fn send_posts_the_encoded_message_with_bearer_auth() {
	let server = MockServer::start_async().await;
	let gmail = gmail_client(&server);
	let credentials = credential_fixture("access-send", Some("refresh-send"));
	let message = OutgoingMessage::new("a@example.com", "Hi", "Hello")
		.expect("Complete fields should validate.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(message_path("send"))
				.header("authorization", "Bearer access-send")
				.json_body(json!({ "raw": message.to_raw() }));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "18c0ffee", "threadId": "18c0ffee", "labelIds": ["SENT"] }));
		})
		.await;
	let id = gmail.send(&credentials, &message).await.expect("Send should succeed.");

	mock.assert_async().await;

	assert_eq!(id, "18c0ffee");

	let decoded = URL_SAFE_NO_PAD.decode(message.to_raw()).expect("Raw message should decode.");

	assert_eq!(
		String::from_utf8(decoded).expect("Raw message should be UTF-8."),
		"To: a@example.com\r\nContent-Type: text/plain; charset=utf-8\r\nSubject: Hi\r\n\r\nHello"
	);
}

#[tokio::test]
async fn send_surfaces_mail_api_rejections() {
	let server = MockServer::start_async().await;
	let gmail = gmail_client(&server);
	let credentials = credential_fixture("access-expired", None);
	let message = OutgoingMessage::new("a@example.com", "Hi", "Hello")
		.expect("Complete fields should validate.");

	server
		.mock_async(|when, then| {
			when.method(POST).path(message_path("send"));
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":{\"code\":401,\"message\":\"Request had invalid authentication credentials.\"}}");
		})
		.await;

	let err = gmail.send(&credentials, &message).await.expect_err("A 401 must fail the send.");

	match err {
		Error::Upstream(UpstreamError::MailApi { operation, status, body_preview }) => {
			assert_eq!(operation, "send");
			assert_eq!(status, 401);
			assert!(body_preview.contains("invalid authentication credentials"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn list_unread_truncates_to_the_limit_and_keeps_provider_order() {
	let server = MockServer::start_async().await;
	let gmail = gmail_client(&server);
	let credentials = credential_fixture("access-list", None);
	let ids = (1..=12).map(|n| format!("m{n}")).collect::<Vec<_>>();
	let listing = json!({
		"messages": ids.iter().map(|id| json!({ "id": id, "threadId": id })).collect::<Vec<_>>(),
		"resultSizeEstimate": 12
	});
	let list_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(MESSAGES_PATH)
				.header("authorization", "Bearer access-list")
				.query_param("q", "is:unread")
				.query_param("maxResults", "10");
			then.status(200).header("content-type", "application/json").json_body(listing);
		})
		.await;
	let mut detail_mocks = Vec::new();

	for id in &ids {
		let mock = server
			.mock_async(|when, then| {
				when.method(GET)
					.path(message_path(id))
					.query_param("format", "metadata")
					.query_param("metadataHeaders", "Subject");
				then.status(200).header("content-type", "application/json").json_body(json!({
					"id": id,
					"snippet": format!("snippet {id}"),
					"payload": { "headers": [
						{ "name": "From", "value": "Ann <ann@example.com>" },
						{ "name": "Subject", "value": format!("Subject {id}") },
						{ "name": "Date", "value": "Mon, 10 Nov 2025 12:00:00 +0000" }
					]}
				}));
			})
			.await;

		detail_mocks.push(mock);
	}

	let summaries =
		gmail.list_unread(&credentials, 10).await.expect("Listing unread messages should succeed.");

	list_mock.assert_async().await;

	assert_eq!(
		summaries.iter().map(|summary| summary.id.as_str()).collect::<Vec<_>>(),
		ids[..10].iter().map(String::as_str).collect::<Vec<_>>()
	);
	assert_eq!(summaries[0].from, "Ann <ann@example.com>");
	assert_eq!(summaries[0].subject, "Subject m1");
	assert_eq!(summaries[0].date, "Mon, 10 Nov 2025 12:00:00 +0000");
	assert_eq!(summaries[9].snippet, "snippet m10");

	for (index, mock) in detail_mocks.iter().enumerate() {
		mock.assert_calls_async(usize::from(index < 10)).await;
	}
}

#[tokio::test]
async fn empty_mailbox_lists_nothing() {
	let server = MockServer::start_async().await;
	let gmail = gmail_client(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path(MESSAGES_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "resultSizeEstimate": 0 }));
		})
		.await;

	let summaries = gmail
		.list_unread(&credential_fixture("access-empty", None), 10)
		.await
		.expect("An empty listing should succeed.");

	assert!(summaries.is_empty());
}

#[tokio::test]
async fn failed_detail_fetch_aborts_the_listing() {
	let server = MockServer::start_async().await;
	let gmail = gmail_client(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path(MESSAGES_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "messages": [{ "id": "gone" }, { "id": "never" }] }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(message_path("gone"));
			then.status(404).body("{\"error\":{\"code\":404,\"message\":\"Not Found\"}}");
		})
		.await;

	let later = server
		.mock_async(|when, then| {
			when.method(GET).path(message_path("never"));
			then.status(200).json_body(json!({ "id": "never" }));
		})
		.await;
	let err = gmail
		.list_unread(&credential_fixture("access-abort", None), 10)
		.await
		.expect_err("A failed detail fetch must fail the listing.");

	assert!(matches!(err, Error::Upstream(UpstreamError::MailApi { status: 404, .. })));

	later.assert_calls_async(0).await;
}

#[tokio::test]
async fn get_message_decodes_the_plain_text_part() {
	let server = MockServer::start_async().await;
	let gmail = gmail_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(message_path("m1"))
				.header("authorization", "Bearer access-get")
				.query_param("format", "full");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"id": "m1",
				"threadId": "t1",
				"snippet": "Hello there",
				"payload": {
					"mimeType": "multipart/alternative",
					"parts": [
						{ "mimeType": "text/plain", "body": { "data": URL_SAFE_NO_PAD.encode("Hello there, friend.") } },
						{ "mimeType": "text/html", "body": { "data": URL_SAFE_NO_PAD.encode("<p>Hello</p>") } }
					]
				}
			}));
		})
		.await;
	let message = gmail
		.get_message(&credential_fixture("access-get", None), "m1")
		.await
		.expect("Fetching a message should succeed.");

	mock.assert_async().await;

	assert_eq!(message.id, "m1");
	assert_eq!(message.thread_id, "t1");
	assert_eq!(message.snippet, "Hello there");
	assert_eq!(message.body, "Hello there, friend.");
}

#[tokio::test]
async fn malformed_mail_responses_are_parse_errors() {
	let server = MockServer::start_async().await;
	let gmail = gmail_client(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path(message_path("m1"));
			then.status(200).header("content-type", "application/json").body("{\"threadId\":\"t1\"}");
		})
		.await;

	let err = gmail
		.get_message(&credential_fixture("access-parse", None), "m1")
		.await
		.expect_err("A message without an id must not parse.");

	assert!(matches!(err, Error::Upstream(UpstreamError::MailResponseParse { operation: "get", .. })));
}
