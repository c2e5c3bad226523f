//! Bearer-authenticated Gmail REST v1 client.

// crates.io
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::CredentialSet,
	error::{ConfigError, UpstreamError},
	http::ReqwestHttpClient,
	mail::{GmailMessage, MessageBody, MessageList, MessageSummary, OutgoingMessage, SentMessage},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{self, truncate_preview},
};

/// Production Gmail REST v1 base URL.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

const BODY_PREVIEW_LIMIT: usize = 512;
const UNREAD_QUERY: &str = "is:unread";
const SUMMARY_HEADERS: [&str; 3] = ["From", "Subject", "Date"];

/// Stateless client for the three mail operations; credentials are passed per call.
#[derive(Clone, Debug)]
pub struct GmailClient {
	http_client: ReqwestHttpClient,
	base: Url,
}
impl GmailClient {
	/// Creates a client rooted at `base` (for example [`GMAIL_API_BASE`]).
	pub fn new(http_client: ReqwestHttpClient, base: Url) -> Result<Self, ConfigError> {
		provider::validate_endpoint("gmail", &base)?;

		if base.cannot_be_a_base() {
			return Err(ConfigError::OpaqueBaseUrl { endpoint: "gmail", url: base.to_string() });
		}

		Ok(Self { http_client, base })
	}

	/// Sends `message` from the connected mailbox and returns the provider message id.
	pub async fn send(
		&self,
		credentials: &CredentialSet,
		message: &OutgoingMessage,
	) -> Result<String> {
		const KIND: FlowKind = FlowKind::SendMessage;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<String> = span
			.instrument(async move {
				let url = self.endpoint(&["send"])?;
				let request = self
					.http_client
					.post(url)
					.bearer_auth(credentials.access_token().expose())
					.json(&serde_json::json!({ "raw": message.to_raw() }));
				let sent = self.execute::<SentMessage>("send", request).await?;

				tracing::info!(id = %sent.id, "Sent message.");

				Ok(sent.id)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Lists up to `limit` unread messages in provider order, with sender, subject, and date.
	///
	/// Details are fetched one message at a time; the first failed fetch aborts the listing.
	pub async fn list_unread(
		&self,
		credentials: &CredentialSet,
		limit: u32,
	) -> Result<Vec<MessageSummary>> {
		const KIND: FlowKind = FlowKind::ListUnread;

		let span = FlowSpan::new(KIND, "list_unread");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<Vec<MessageSummary>> = span
			.instrument(async move {
				let url = self.endpoint(&[])?;
				let request = self
					.http_client
					.get(url)
					.bearer_auth(credentials.access_token().expose())
					.query(&[("q", UNREAD_QUERY.to_owned()), ("maxResults", limit.to_string())]);
				let listing = self.execute::<MessageList>("list", request).await?;
				let mut summaries = Vec::with_capacity(listing.messages.len().min(limit as usize));

				for reference in listing.messages.into_iter().take(limit as usize) {
					let metadata = self.fetch(credentials, &reference.id, "metadata").await?;

					summaries.push(MessageSummary::from_metadata(reference.id, &metadata));
				}

				tracing::debug!(count = summaries.len(), "Listed unread messages.");

				Ok(summaries)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Fetches one message with its plain-text body decoded.
	pub async fn get_message(&self, credentials: &CredentialSet, id: &str) -> Result<MessageBody> {
		const KIND: FlowKind = FlowKind::GetMessage;

		let span = FlowSpan::new(KIND, "get_message");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<MessageBody> = span
			.instrument(async move {
				let message = self.fetch(credentials, id, "full").await?;

				Ok(MessageBody::from(message))
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn fetch(
		&self,
		credentials: &CredentialSet,
		id: &str,
		format: &'static str,
	) -> Result<GmailMessage> {
		let url = self.endpoint(&[id])?;
		let mut query = vec![("format", format)];

		if format == "metadata" {
			query.extend(SUMMARY_HEADERS.iter().map(|header| ("metadataHeaders", *header)));
		}

		let request = self
			.http_client
			.get(url)
			.bearer_auth(credentials.access_token().expose())
			.query(&query);

		self.execute("get", request).await
	}

	/// `{base}/users/me/messages/{segments..}`, with each segment percent-encoded.
	fn endpoint(&self, segments: &[&str]) -> Result<Url, ConfigError> {
		let mut url = self.base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::OpaqueBaseUrl {
				endpoint: "gmail",
				url: self.base.to_string(),
			})?
			.pop_if_empty()
			.extend(["users", "me", "messages"])
			.extend(segments);

		Ok(url)
	}

	async fn execute<T>(&self, operation: &'static str, request: RequestBuilder) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = request.send().await?;

		decode_response(operation, response).await
	}
}

async fn decode_response<T>(operation: &'static str, response: Response) -> Result<T>
where
	T: DeserializeOwned,
{
	let status = response.status();
	let bytes = response.bytes().await?;

	if !status.is_success() {
		let body_preview =
			truncate_preview(String::from_utf8_lossy(&bytes).into_owned(), BODY_PREVIEW_LIMIT);

		tracing::warn!(operation, status = status.as_u16(), %body_preview, "Mail API call failed.");

		return Err(
			UpstreamError::MailApi { operation, status: status.as_u16(), body_preview }.into()
		);
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| UpstreamError::MailResponseParse { operation, source }.into())
}
