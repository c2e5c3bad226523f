//! Credential lifecycle flows: consent redirect, code exchange, refresh, and logout.

pub mod authorize;
pub mod exchange;
pub mod refresh;

pub use authorize::*;

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	http::ReqwestHttpClient,
	oauth::BasicFacade,
	provider::ProviderDescriptor,
	store::{AuthState, TokenStore},
};

/// Coordinates the OAuth lifecycle of the single connected mailbox.
///
/// The broker owns the provider descriptor, the confidential client registration, and a handle
/// to the shared token store. Flows never touch the store except through the documented
/// transitions: a successful exchange sets it, a successful refresh swaps it, logout clears it.
#[derive(Clone)]
pub struct Broker {
	/// Slot shared with the gate and the HTTP surface.
	pub store: Arc<dyn TokenStore>,
	/// Identity-provider endpoints.
	pub descriptor: ProviderDescriptor,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested during consent.
	pub scope: ScopeSet,
	/// Whether consent is forced on every authorization.
	pub consent: ConsentPrompt,
	client_secret: Option<String>,
	http_client: ReqwestHttpClient,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl Broker {
	/// Creates a broker requesting the default Gmail scopes with forced consent.
	pub fn new(
		store: Arc<dyn TokenStore>,
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		redirect_uri: Url,
		http_client: ReqwestHttpClient,
	) -> Self {
		Self {
			store,
			descriptor,
			client_id: client_id.into(),
			redirect_uri,
			scope: ScopeSet::gmail_default(),
			consent: ConsentPrompt::default(),
			client_secret: None,
			http_client,
			refresh_guard: Default::default(),
		}
	}

	/// Sets or replaces the confidential client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Overrides the requested scopes.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the consent directive.
	pub fn with_consent(mut self, consent: ConsentPrompt) -> Self {
		self.consent = consent;

		self
	}

	/// Current authentication state.
	pub fn state(&self) -> AuthState {
		self.store.state()
	}

	/// De-authorizes the relay by emptying the slot. Idempotent.
	pub fn logout(&self) {
		let was_authenticated = self.store.state().is_authenticated();

		self.store.clear();

		tracing::info!(was_authenticated, "Cleared held credentials.");
	}

	fn facade(&self) -> BasicFacade {
		BasicFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret.as_deref(),
			&self.redirect_uri,
			self.http_client.clone(),
		)
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("scope", &self.scope)
			.field("consent", &self.consent)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{build_test_broker, credential_fixture, test_descriptor};

	#[test]
	fn logout_is_idempotent() {
		let (broker, store) = build_test_broker(test_descriptor("https://idp.test"));

		broker.logout();

		assert_eq!(broker.state(), AuthState::Unauthenticated);

		store.set(credential_fixture("tok1", Some("r1")));
		broker.logout();
		broker.logout();

		assert!(!broker.state().is_authenticated());
	}

	#[test]
	fn debug_hides_the_client_secret() {
		let (broker, _) = build_test_broker(test_descriptor("https://idp.test"));
		let rendered = format!("{broker:?}");

		assert!(rendered.contains("client_secret_set: true"));
		assert!(!rendered.contains(crate::_preludet::TEST_CLIENT_SECRET));
	}
}
