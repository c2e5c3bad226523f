//! Relay-level error taxonomy shared across the gate, flows, mail client, and HTTP surface.
//!
//! Callers discriminate on [`Error`] variants instead of message strings: admission and
//! validation failures are caller-remediable and carry a human-readable reason, while
//! upstream failures keep provider detail for server-side logs only.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No usable credentials; the operator must run the authorization flow.
	#[error(transparent)]
	Admission(#[from] AdmissionError),
	/// A required request field is missing or malformed; nothing was sent upstream.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// The identity provider or the mail API call faulted.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns `true` for admission rejections.
	pub fn is_admission(&self) -> bool {
		matches!(self, Self::Admission(_))
	}

	/// Returns `true` for request validation failures.
	pub fn is_validation(&self) -> bool {
		matches!(self, Self::Validation(_))
	}

	/// Returns `true` for identity or mail provider faults.
	pub fn is_upstream(&self) -> bool {
		matches!(self, Self::Upstream(_))
	}
}

/// Admission failures; remediated by re-running the authorization flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum AdmissionError {
	/// The credential slot is empty.
	#[error("Not authenticated. Open /auth in a browser and connect Gmail first.")]
	AuthRequired,
	/// The held credentials cannot be refreshed because no refresh token was granted.
	#[error("No refresh token was granted. Open /auth in a browser and reconnect Gmail.")]
	RefreshTokenMissing,
}

/// Request validation failures raised before any upstream call.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// One or more send fields are absent or empty.
	#[error("Missing to, subject, or message field")]
	MissingSendFields {
		/// Names of the absent fields, in request order.
		missing: Vec<&'static str>,
	},
	/// A required query parameter is absent or empty.
	#[error("Missing {name} query parameter")]
	MissingQueryParameter {
		/// Parameter name.
		name: &'static str,
	},
	/// A header-bound field carries a line break.
	#[error("The {field} field must not contain line breaks")]
	LineBreakInHeader {
		/// Offending field name.
		field: &'static str,
	},
}

/// Faults raised by the identity provider or the mail API.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Provider rejected the grant (bad, expired, or reused code or refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed at the token endpoint.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Token endpoint answered with an unexpected or unusable response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint issued credentials the relay cannot hold.
	#[error("Token endpoint issued unusable credentials.")]
	UnusableCredentials(#[from] crate::auth::CredentialBuildError),
	/// Mail API answered with a non-success status.
	#[error("Mail API {operation} failed with HTTP {status}: {body_preview}")]
	MailApi {
		/// Mail operation label.
		operation: &'static str,
		/// HTTP status code.
		status: u16,
		/// Truncated response body kept for logs.
		body_preview: String,
	},
	/// Mail API responded with JSON that could not be parsed.
	#[error("Mail API {operation} returned malformed JSON.")]
	MailResponseParse {
		/// Mail operation label.
		operation: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Network failure (DNS, TCP, TLS, timeout).
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// I/O failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl UpstreamError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for UpstreamError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		UpstreamError::from(e).into()
	}
}

/// Configuration and validation failures raised while assembling the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required environment variable is absent or empty.
	#[error("Missing required configuration variable {name}.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable holds a value that cannot be used.
	#[error("Configuration variable {name} is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// An endpoint URL cannot be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A base URL cannot carry path segments.
	#[error("The {endpoint} endpoint cannot be used as a base URL: {url}.")]
	OpaqueBaseUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
