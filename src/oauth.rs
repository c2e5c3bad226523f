//! Internal facade over the `oauth2` crate for the token endpoint grants the relay uses.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialSet, ScopeSet},
	error::{ConfigError, UpstreamError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{ProviderDescriptor, ProviderErrorContext, ProviderErrorKind},
};

/// Longest access-token lifetime accepted from the provider (one year).
const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 60 * 60;

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Token endpoint client configured with the relay's confidential credentials.
pub(crate) struct BasicFacade {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
}
impl BasicFacade {
	/// Google authenticates confidential clients with body parameters, so the secret travels
	/// in the form rather than a Basic header.
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		redirect_uri: &Url,
		http_client: ReqwestHttpClient,
	) -> Self {
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_token_uri(TokenUrl::from_url(descriptor.token.clone()))
			.set_redirect_uri(RedirectUrl::from_url(redirect_uri.clone()))
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}

		Self { oauth_client, http_client }
	}

	/// Exchanges an authorization code for a full credential set.
	pub(crate) async fn exchange_code(
		&self,
		code: &str,
		requested_scope: &ScopeSet,
	) -> Result<CredentialSet> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(requested_scope, response)
	}

	/// Exchanges a refresh token for new credentials.
	///
	/// The returned set carries a refresh token only when the provider rotated it.
	pub(crate) async fn refresh(
		&self,
		refresh_token: &str,
		requested_scope: &ScopeSet,
	) -> Result<CredentialSet> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

		for scope in requested_scope.iter() {
			request = request.add_scope(Scope::new(scope.to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(requested_scope, response)
	}
}

fn map_token_response(
	requested_scope: &ScopeSet,
	response: BasicTokenResponse,
) -> Result<CredentialSet> {
	let expires_in = response
		.expires_in()
		.ok_or_else(|| token_endpoint_error("Token response omitted expires_in"))?
		.as_secs();
	let expires_in = i64::try_from(expires_in)
		.ok()
		.filter(|secs| (1..=MAX_EXPIRES_IN_SECS).contains(secs))
		.ok_or_else(|| token_endpoint_error("Token response carried an unusable expires_in"))?;
	// Granular consent can narrow the grant, so trust what the provider echoes back.
	let scope = match response.scopes() {
		Some(scopes) => ScopeSet::new(scopes.iter().map(|scope| scope.as_str())).map_err(|err| {
			token_endpoint_error(format!("Token response scope is invalid: {err}"))
		})?,
		None => requested_scope.clone(),
	};
	let mut builder = CredentialSet::builder(scope)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in));

	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| UpstreamError::from(err).into())
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		RequestTokenError::Parse(source, body) => {
			let mut ctx = ProviderErrorContext::default()
				.with_body_preview(String::from_utf8_lossy(&body).into_owned());

			if let Some(code) = status {
				ctx = ctx.with_http_status(code);
			}

			// Error bodies that are not OAuth JSON can still name the grant failure.
			let reason = ctx.body_preview.clone().unwrap_or_default();

			match ctx.classify() {
				ProviderErrorKind::InvalidGrant => UpstreamError::InvalidGrant { reason }.into(),
				ProviderErrorKind::InvalidClient => UpstreamError::InvalidClient { reason }.into(),
				ProviderErrorKind::Other =>
					UpstreamError::TokenResponseParse { source, status }.into(),
			}
		},
		RequestTokenError::Other(message) =>
			UpstreamError::TokenEndpoint { message, status }.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let mut ctx =
		ProviderErrorContext::default().with_oauth_error(response.error().as_ref().to_owned());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(code) = status {
		ctx = ctx.with_http_status(code);
	}

	let reason = response
		.error_description()
		.cloned()
		.unwrap_or_else(|| response.error().as_ref().to_owned());

	match ctx.classify() {
		ProviderErrorKind::InvalidGrant => UpstreamError::InvalidGrant { reason }.into(),
		ProviderErrorKind::InvalidClient => UpstreamError::InvalidClient { reason }.into(),
		ProviderErrorKind::Other =>
			UpstreamError::TokenEndpoint { message: format!("OAuth error: {reason}"), status }
				.into(),
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>, status: Option<u16>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => UpstreamError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => UpstreamError::Io(inner).into(),
		HttpClientError::Other(message) => UpstreamError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status,
		}
		.into(),
		_ => UpstreamError::TokenEndpoint { message: "HTTP client error".into(), status }.into(),
	}
}

fn token_endpoint_error(message: impl Into<String>) -> Error {
	UpstreamError::TokenEndpoint { message: message.into(), status: None }.into()
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::{AccessToken, EmptyExtraTokenFields, basic::BasicTokenType};
	// self
	use super::*;

	fn token_response(expires_in: Option<u64>) -> BasicTokenResponse {
		let mut response = BasicTokenResponse::new(
			AccessToken::new("tok1".into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		);

		response.set_expires_in(expires_in.map(std::time::Duration::from_secs).as_ref());

		response
	}

	#[test]
	fn token_responses_without_expiry_are_rejected() {
		let err = map_token_response(&ScopeSet::gmail_default(), token_response(None))
			.expect_err("Missing expires_in must be rejected.");

		assert!(matches!(err, Error::Upstream(UpstreamError::TokenEndpoint { .. })));
	}

	#[test]
	fn token_responses_with_unbounded_expiry_are_rejected() {
		for expires_in in [0, 9_000_000_000_000_000, u64::MAX] {
			let err = map_token_response(&ScopeSet::gmail_default(), token_response(Some(expires_in)))
				.expect_err("Unusable expires_in must be rejected.");

			assert!(matches!(err, Error::Upstream(UpstreamError::TokenEndpoint { .. })));
		}

		map_token_response(
			&ScopeSet::gmail_default(),
			token_response(Some(MAX_EXPIRES_IN_SECS as u64)),
		)
		.expect("A one-year lifetime is accepted.");
	}

	#[test]
	fn token_responses_fall_back_to_requested_scope() {
		let credentials =
			map_token_response(&ScopeSet::gmail_default(), token_response(Some(3599)))
				.expect("A complete token response should map.");

		assert_eq!(credentials.access_token().expose(), "tok1");
		assert_eq!(credentials.scope(), &ScopeSet::gmail_default());
		assert!(credentials.refresh_token().is_none());
		assert_eq!(credentials.expires_at() - credentials.issued_at(), Duration::seconds(3599));
	}
}
