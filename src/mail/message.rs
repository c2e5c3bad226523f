//! Gmail message resources as received, and the trimmed shapes returned to callers.

// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::_prelude::*;

const LENIENT: GeneralPurposeConfig =
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// `users.messages.list` response.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
	/// Message references in provider order; absent when nothing matches.
	#[serde(default)]
	pub messages: Vec<MessageRef>,
	/// Provider estimate of the total match count.
	pub result_size_estimate: Option<u64>,
}

/// Identifier pair returned by listings.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
	/// Message identifier.
	pub id: String,
	/// Conversation identifier.
	pub thread_id: Option<String>,
}

/// `users.messages.send` response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
	/// Identifier assigned to the sent message.
	pub id: String,
	/// Conversation the message joined.
	pub thread_id: Option<String>,
}

/// `users.messages.get` response for the `metadata` and `full` formats.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
	/// Message identifier.
	pub id: String,
	/// Conversation identifier.
	#[serde(default)]
	pub thread_id: String,
	/// Short plain-text excerpt.
	pub snippet: Option<String>,
	/// Root of the MIME part tree.
	pub payload: Option<MessagePart>,
}

/// One node of the MIME part tree.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
	/// Part identifier within the message.
	pub part_id: Option<String>,
	/// MIME type such as `text/plain` or `multipart/alternative`.
	pub mime_type: Option<String>,
	/// Part headers.
	#[serde(default)]
	pub headers: Vec<Header>,
	/// Inline body of a leaf part.
	pub body: Option<MessagePartBody>,
	/// Child parts of a multipart node.
	#[serde(default)]
	pub parts: Vec<MessagePart>,
}
impl MessagePart {
	/// Case-insensitive header lookup; the first match wins.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|header| header.name.eq_ignore_ascii_case(name))
			.map(|header| header.value.as_str())
	}

	/// Base64url body data carried directly by this part.
	pub fn body_data(&self) -> Option<&str> {
		self.body.as_ref().and_then(|body| body.data.as_deref())
	}

	fn is_text_plain(&self) -> bool {
		self.mime_type
			.as_deref()
			.and_then(|mime| mime.split(';').next())
			.is_some_and(|essence| essence.trim().eq_ignore_ascii_case("text/plain"))
	}
}

/// A single message header.
#[derive(Clone, Debug, Deserialize)]
pub struct Header {
	/// Header name.
	pub name: String,
	/// Header value.
	pub value: String,
}

/// Body of a message part.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartBody {
	/// Attachment handle for bodies not returned inline.
	pub attachment_id: Option<String>,
	/// Body size in bytes.
	pub size: Option<u64>,
	/// Base64url-encoded content.
	pub data: Option<String>,
}

/// Depth-first search for the first `text/plain` part in document order.
///
/// The root itself qualifies when it is `text/plain`.
pub fn find_text_part(part: &MessagePart) -> Option<&MessagePart> {
	if part.is_text_plain() {
		return Some(part);
	}

	part.parts.iter().find_map(find_text_part)
}

/// Decodes Gmail body data.
///
/// Gmail uses the URL-safe alphabet with optional padding; the standard alphabet is accepted
/// as a fallback. Invalid UTF-8 is replaced rather than rejected.
pub fn decode_body_data(data: &str) -> Option<String> {
	let bytes = URL_SAFE_LENIENT.decode(data).or_else(|_| STANDARD_LENIENT.decode(data)).ok()?;

	Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Plain-text body of a message: the first `text/plain` part, else the root's own data.
pub fn extract_text_body(payload: &MessagePart) -> String {
	let Some(data) = find_text_part(payload).unwrap_or(payload).body_data() else {
		return String::new();
	};

	decode_body_data(data).unwrap_or_else(|| {
		tracing::warn!("Message body data is not valid base64; returning an empty body.");

		String::new()
	})
}

/// Listing entry returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
	/// Message identifier.
	pub id: String,
	/// `From` header, or empty.
	pub from: String,
	/// `Subject` header, or empty.
	pub subject: String,
	/// `Date` header, or empty.
	pub date: String,
	/// Provider excerpt, or empty.
	pub snippet: String,
}
impl MessageSummary {
	/// Builds a summary from a `metadata`-format message; the listing supplies the id.
	pub fn from_metadata(id: String, message: &GmailMessage) -> Self {
		let header = |name| {
			message
				.payload
				.as_ref()
				.and_then(|payload| payload.header(name))
				.unwrap_or_default()
				.to_owned()
		};

		Self {
			from: header("From"),
			subject: header("Subject"),
			date: header("Date"),
			snippet: message.snippet.clone().unwrap_or_default(),
			id,
		}
	}
}

/// Full message returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
	/// Message identifier.
	pub id: String,
	/// Conversation identifier.
	pub thread_id: String,
	/// Provider excerpt, or empty.
	pub snippet: String,
	/// Decoded plain-text body, or empty.
	pub body: String,
}
impl From<GmailMessage> for MessageBody {
	fn from(message: GmailMessage) -> Self {
		let body = message.payload.as_ref().map(extract_text_body).unwrap_or_default();

		Self {
			id: message.id,
			thread_id: message.thread_id,
			snippet: message.snippet.unwrap_or_default(),
			body,
		}
	}
}
