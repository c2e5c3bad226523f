//! HTTP surface: an axum router over the flows, the gate, and the mail client.
//!
//! Public routes drive the consent lifecycle. Gated routes extract [`Admitted`] first, so an
//! unauthenticated request is rejected before its body or query is looked at and before any
//! upstream call.

pub mod admission;
pub mod failure;
pub mod routes;

pub use admission::Admitted;
pub use failure::{Failure, Operation};

// crates.io
use axum::{
	Router,
	routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	config::Config,
	error::ConfigError,
	flows::Broker,
	gate::AuthGate,
	http::ReqwestHttpClient,
	mail::GmailClient,
	store::{MemoryTokenStore, TokenStore},
};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	/// OAuth lifecycle coordinator.
	pub broker: Broker,
	/// Admission check for gated routes.
	pub gate: AuthGate,
	/// Mail API client.
	pub gmail: GmailClient,
	/// Maximum number of unread summaries per listing.
	pub unread_limit: u32,
}
impl AppState {
	/// Builds the production state: a fresh in-memory slot and the default transport.
	pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
		Self::with_store(config, Arc::new(MemoryTokenStore::default()), ReqwestHttpClient::new()?)
	}

	/// Builds state around a caller-provided slot and transport.
	pub fn with_store(
		config: &Config,
		store: Arc<dyn TokenStore>,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		let gmail = GmailClient::new(http_client.clone(), config.gmail_api_base.clone())?;
		let broker = Broker::new(
			store.clone(),
			config.provider.clone(),
			config.client_id.clone(),
			config.redirect_uri.clone(),
			http_client,
		)
		.with_client_secret(config.client_secret.clone())
		.with_scope(config.scope.clone())
		.with_consent(config.consent);

		Ok(Self { broker, gate: AuthGate::new(store), gmail, unread_limit: config.unread_limit })
	}
}

/// Route table.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(routes::index))
		.route("/healthz", get(routes::healthz))
		.route("/auth", get(routes::authorize))
		.route("/oauth2callback", get(routes::oauth_callback))
		.route("/logout", get(routes::logout))
		.route("/sendEmail", post(routes::send_email))
		.route("/listUnread", get(routes::list_unread))
		.route("/getEmail", get(routes::get_email))
		.route("/refresh", get(routes::refresh))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Serves the relay on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
	F: 'static + Send + Future<Output = ()>,
{
	axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await
}
