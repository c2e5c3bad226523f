//! Outgoing RFC 5322 message construction.

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
// self
use crate::{_prelude::*, error::ValidationError};

// Raw bytes per encoded word; 45 bytes become 60 base64 characters, keeping each word under
// the 75-character limit once the `=?UTF-8?B?` framing is added.
const ENCODED_WORD_BYTES: usize = 45;

/// A validated plain-text message ready to be handed to the mail API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
	to: String,
	subject: String,
	text: String,
}
impl OutgoingMessage {
	/// Validates the three send fields.
	///
	/// Every field must be non-empty, and the header-bound fields must not carry line breaks.
	pub fn new(
		to: impl Into<String>,
		subject: impl Into<String>,
		text: impl Into<String>,
	) -> Result<Self, ValidationError> {
		let (to, subject, text) = (to.into(), subject.into(), text.into());
		let missing = [("to", &to), ("subject", &subject), ("message", &text)]
			.into_iter()
			.filter(|(_, value)| value.is_empty())
			.map(|(name, _)| name)
			.collect::<Vec<_>>();

		if !missing.is_empty() {
			return Err(ValidationError::MissingSendFields { missing });
		}

		reject_line_breaks("to", &to)?;
		reject_line_breaks("subject", &subject)?;

		Ok(Self { to, subject, text })
	}

	/// Recipient header value.
	pub fn to(&self) -> &str {
		&self.to
	}

	/// Subject as supplied by the caller.
	pub fn subject(&self) -> &str {
		&self.subject
	}

	/// Plain-text body.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Renders the message with CRLF line endings.
	pub fn to_rfc5322(&self) -> String {
		[
			format!("To: {}", self.to),
			"Content-Type: text/plain; charset=utf-8".to_owned(),
			format!("Subject: {}", encode_header_value(&self.subject)),
			String::new(),
			self.text.clone(),
		]
		.join("\r\n")
	}

	/// The `raw` field expected by `users.messages.send`: base64url without padding.
	pub fn to_raw(&self) -> String {
		URL_SAFE_NO_PAD.encode(self.to_rfc5322())
	}
}

fn reject_line_breaks(field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.contains(['\r', '\n']) {
		Err(ValidationError::LineBreakInHeader { field })
	} else {
		Ok(())
	}
}

/// ASCII values pass through untouched; anything else becomes RFC 2047 encoded words.
fn encode_header_value(value: &str) -> String {
	if value.is_ascii() {
		return value.to_owned();
	}

	let mut words = Vec::new();
	let mut chunk = String::new();

	for ch in value.chars() {
		if chunk.len() + ch.len_utf8() > ENCODED_WORD_BYTES {
			words.push(encoded_word(&chunk));
			chunk.clear();
		}

		chunk.push(ch);
	}
	if !chunk.is_empty() {
		words.push(encoded_word(&chunk));
	}

	words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
	format!("=?UTF-8?B?{}?=", STANDARD.encode(chunk))
}
