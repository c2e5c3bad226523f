//! Validated endpoint pair for the identity provider.

// self
use crate::{_prelude::*, error::ConfigError};

/// Google's OAuth 2.0 authorization endpoint.
pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Authorization and token endpoints used by every flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint the operator's browser is redirected to for consent.
	pub authorization: Url,
	/// Endpoint used for code exchanges and refreshes.
	pub token: Url,
}
impl ProviderDescriptor {
	/// Validates and wraps an endpoint pair.
	pub fn new(authorization: Url, token: Url) -> Result<Self, ConfigError> {
		validate_endpoint("authorization", &authorization)?;
		validate_endpoint("token", &token)?;

		Ok(Self { authorization, token })
	}
}

/// Parses an endpoint URL, tagging failures with the endpoint name.
pub(crate) fn parse_endpoint(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint: name, source })
}

/// Endpoints must use HTTPS; plain HTTP is tolerated only for loopback hosts.
pub(crate) fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}
