//! Environment-driven relay configuration.
//!
//! Values come from process environment variables, optionally seeded from a `.env` file.
//! Missing or malformed required values abort startup.

// std
use std::net::{IpAddr, SocketAddr};
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ConfigError,
	flows::ConsentPrompt,
	mail::GMAIL_API_BASE,
	provider::{self, GOOGLE_AUTHORIZATION_ENDPOINT, GOOGLE_TOKEN_ENDPOINT, ProviderDescriptor},
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_UNREAD_LIMIT: u32 = 10;
const MAX_UNREAD_LIMIT: u32 = 500;

/// Fully validated relay configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Redirect URI registered with the provider; must route to `/oauth2callback`.
	pub redirect_uri: Url,
	/// Listener address.
	pub listen: SocketAddr,
	/// Scopes requested during consent.
	pub scope: ScopeSet,
	/// Maximum number of unread summaries returned per listing.
	pub unread_limit: u32,
	/// Consent directive sent with every redirect.
	pub consent: ConsentPrompt,
	/// Identity-provider endpoints.
	pub provider: ProviderDescriptor,
	/// Gmail REST v1 base URL.
	pub gmail_api_base: Url,
}
impl Config {
	/// Loads `.env` when present, then reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		match dotenvy::dotenv() {
			Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file."),
			Err(err) if err.not_found() => {},
			Err(err) => {
				return Err(ConfigError::InvalidVar { name: ".env", reason: err.to_string() });
			},
		}

		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the configuration from an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &'static str| {
			lookup(name).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
		};
		let required = |name: &'static str| var(name).ok_or(ConfigError::MissingVar { name });
		let client_id = required("CLIENT_ID")?;
		let client_secret = required("CLIENT_SECRET")?;
		let redirect_uri = parse_url("REDIRECT_URI", &required("REDIRECT_URI")?)?;
		let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
		let host = host.parse::<IpAddr>().map_err(|err| ConfigError::InvalidVar {
			name: "HOST",
			reason: err.to_string(),
		})?;
		let port = match var("PORT") {
			Some(raw) => raw
				.parse::<u16>()
				.map_err(|err| ConfigError::InvalidVar { name: "PORT", reason: err.to_string() })?,
			None => DEFAULT_PORT,
		};
		let scope = match var("GMAIL_SCOPES") {
			Some(raw) => raw.parse::<ScopeSet>()?,
			None => ScopeSet::gmail_default(),
		};
		let unread_limit = match var("UNREAD_LIMIT") {
			Some(raw) => parse_unread_limit(&raw)?,
			None => DEFAULT_UNREAD_LIMIT,
		};
		let consent = match var("FORCE_CONSENT") {
			Some(raw) => ConsentPrompt::from_force(parse_bool("FORCE_CONSENT", &raw)?),
			None => ConsentPrompt::Force,
		};
		let authorization = var("GOOGLE_AUTH_URL")
			.unwrap_or_else(|| GOOGLE_AUTHORIZATION_ENDPOINT.to_owned());
		let token = var("GOOGLE_TOKEN_URL").unwrap_or_else(|| GOOGLE_TOKEN_ENDPOINT.to_owned());
		let provider = ProviderDescriptor::new(
			provider::parse_endpoint("authorization", &authorization)?,
			provider::parse_endpoint("token", &token)?,
		)?;
		let gmail_api_base = provider::parse_endpoint(
			"gmail",
			&var("GMAIL_API_BASE").unwrap_or_else(|| GMAIL_API_BASE.to_owned()),
		)?;

		Ok(Self {
			client_id,
			client_secret,
			redirect_uri,
			listen: SocketAddr::new(host, port),
			scope,
			unread_limit,
			consent,
			provider,
			gmail_api_base,
		})
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("listen", &self.listen)
			.field("scope", &self.scope)
			.field("unread_limit", &self.unread_limit)
			.field("consent", &self.consent)
			.field("provider", &self.provider)
			.field("gmail_api_base", &self.gmail_api_base.as_str())
			.finish()
	}
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|err| ConfigError::InvalidVar { name, reason: err.to_string() })
}

fn parse_unread_limit(raw: &str) -> Result<u32, ConfigError> {
	let reason = format!("expected an integer between 1 and {MAX_UNREAD_LIMIT}");

	match raw.parse::<u32>() {
		Ok(limit) if (1..=MAX_UNREAD_LIMIT).contains(&limit) => Ok(limit),
		_ => Err(ConfigError::InvalidVar { name: "UNREAD_LIMIT", reason }),
	}
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
	match raw.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidVar { name, reason: format!("expected a boolean, got {raw}") }),
	}
}
