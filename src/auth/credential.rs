//! The credential bundle held by the token store, its redacting secret wrapper, and builder.

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Errors produced by [`CredentialSetBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialBuildError {
	/// No access token, or an empty one, was provided.
	#[error("A non-empty access token is required.")]
	MissingAccessToken,
	/// No expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// The expiry does not fit in a timestamp.
	#[error("Expiry is outside the representable range.")]
	ExpiryOutOfRange,
}

/// Access grant for the single connected mailbox.
///
/// A value of this type is always complete: the builder refuses to produce one without a
/// non-empty access token and an expiry, so "partially authenticated" cannot be represented.
/// Fields are read through accessors; the builder is the only way to construct one.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
	access_token: TokenSecret,
	refresh_token: Option<TokenSecret>,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
	scope: ScopeSet,
}
impl CredentialSet {
	/// Returns a builder for the provided granted scopes.
	pub fn builder(scope: ScopeSet) -> CredentialSetBuilder {
		CredentialSetBuilder::new(scope)
	}

	/// Short-lived bearer token presented to the mail API.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Long-lived token for minting new access tokens; absent without offline access.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref()
	}

	/// Instant the provider issued the access token.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Instant after which the access token is no longer valid.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Capabilities the provider granted.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Returns true when the access token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for CredentialSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialSet")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.finish()
	}
}

/// Builder for [`CredentialSet`].
#[derive(Clone, Debug)]
pub struct CredentialSetBuilder {
	scope: ScopeSet,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialSetBuilder {
	fn new(scope: ScopeSet) -> Self {
		Self {
			scope,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Carries over an already-wrapped refresh token, if any.
	pub fn maybe_refresh_token(mut self, token: Option<TokenSecret>) -> Self {
		self.refresh_token = token;

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`CredentialSet`].
	pub fn build(self) -> Result<CredentialSet, CredentialBuildError> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(CredentialBuildError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(CredentialBuildError::ExpiryOutOfRange)?,
			(None, None) => return Err(CredentialBuildError::MissingExpiry),
		};
		let refresh_token = self.refresh_token.filter(|token| !token.is_empty());

		Ok(CredentialSet { access_token, refresh_token, issued_at, expires_at, scope: self.scope })
	}
}
