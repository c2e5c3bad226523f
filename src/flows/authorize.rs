//! Consent redirect construction.

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	flows::Broker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
};

/// Freshness directive sent with the consent redirect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsentPrompt {
	/// Always show the consent screen (`prompt=consent`), which makes the provider issue a
	/// refresh token even for a previously approved client.
	#[default]
	Force,
	/// Let the provider reuse an earlier approval.
	Reuse,
}
impl ConsentPrompt {
	/// Maps a boolean "force consent" flag onto the directive.
	pub fn from_force(force: bool) -> Self {
		if force { Self::Force } else { Self::Reuse }
	}
}

/// Parameters of a single consent redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Where the provider sends the operator back to.
	pub redirect_uri: Url,
	/// Capabilities requested.
	pub scope: ScopeSet,
	/// Freshness directive.
	pub consent: ConsentPrompt,
}
impl AuthorizationRequest {
	/// Builds the provider URL for this request.
	///
	/// Offline access is always requested so the grant carries a refresh token.
	pub fn authorization_url(&self, descriptor: &ProviderDescriptor, client_id: &str) -> Url {
		let mut url = descriptor.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", client_id);
		pairs.append_pair("redirect_uri", self.redirect_uri.as_str());

		if !self.scope.is_empty() {
			pairs.append_pair("scope", &self.scope.normalized());
		}

		pairs.append_pair("access_type", "offline");

		if matches!(self.consent, ConsentPrompt::Force) {
			pairs.append_pair("prompt", "consent");
		}

		drop(pairs);

		url
	}
}

impl Broker {
	/// Parameters the next consent redirect will carry.
	pub fn authorization_request(&self) -> AuthorizationRequest {
		AuthorizationRequest {
			redirect_uri: self.redirect_uri.clone(),
			scope: self.scope.clone(),
			consent: self.consent,
		}
	}

	/// Builds the URL the operator's browser should be redirected to.
	pub fn start_authorization(&self) -> Url {
		const KIND: FlowKind = FlowKind::Authorize;

		let _guard = FlowSpan::new(KIND, "start_authorization").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let url = self.authorization_request().authorization_url(&self.descriptor, &self.client_id);

		tracing::info!(consent = ?self.consent, "Redirecting operator to the consent screen.");
		obs::record_flow_outcome(KIND, FlowOutcome::Success);

		url
	}
}
