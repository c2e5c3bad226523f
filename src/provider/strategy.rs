//! Token-endpoint error classification.
//!
//! The classifier prefers structured OAuth fields (`error`, `error_description`), then falls
//! back to body text hints, and finally the HTTP status code.

// self
use crate::_prelude::*;

/// Canonical provider error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization grant (bad code or refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Anything else the token endpoint reported.
	Other,
}

/// Primitive data describing a failed token request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a truncated body preview.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into(), Self::BODY_PREVIEW_LIMIT));

		self
	}

	/// Classifies the failure.
	pub fn classify(&self) -> ProviderErrorKind {
		self.oauth_error
			.as_deref()
			.and_then(match_exact_value)
			.or_else(|| self.error_description.as_deref().and_then(match_exact_value))
			.or_else(|| classify_body(self.error_description.as_deref()))
			.or_else(|| classify_body(self.body_preview.as_deref()))
			.unwrap_or_else(|| classify_status(self.http_status))
	}
}

/// Truncates `body` to `limit` characters, marking the cut with an ellipsis.
pub(crate) fn truncate_preview(body: String, limit: usize) -> String {
	if body.chars().count() <= limit {
		return body;
	}

	let mut buf = body.chars().take(limit).collect::<String>();

	buf.push('…');

	buf
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	if lowered.contains("invalid_grant") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if lowered.contains("invalid_client") {
		Some(ProviderErrorKind::InvalidClient)
	} else {
		None
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(401) => ProviderErrorKind::InvalidClient,
		_ => ProviderErrorKind::Other,
	}
}
