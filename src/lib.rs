//! Single-tenant Gmail relay: one interactive OAuth consent, an in-memory credential slot, and
//! admission-gated send/list/read endpoints for tool-calling agents.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod gate;
pub mod http;
pub mod mail;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// std
	use std::net::SocketAddr;
	// crates.io
	use tokio::net::TcpListener;
	// self
	use crate::{
		api::{self, AppState},
		auth::{CredentialSet, ScopeSet},
		config::Config,
		flows::Broker,
		http::ReqwestHttpClient,
		provider::ProviderDescriptor,
		store::{MemoryTokenStore, TokenStore},
	};

	/// Client identifier used by every test fixture.
	pub const TEST_CLIENT_ID: &str = "relay-client";
	/// Client secret used by every test fixture.
	pub const TEST_CLIENT_SECRET: &str = "relay-secret";
	/// Redirect URI used by every test fixture.
	pub const TEST_REDIRECT_URI: &str = "https://relay.example.com/oauth2callback";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Descriptor whose authorization and token endpoints live under `base`.
	pub fn test_descriptor(base: &str) -> ProviderDescriptor {
		ProviderDescriptor::new(
			Url::parse(&format!("{base}/authorize"))
				.expect("Mock authorization endpoint should parse successfully."),
			Url::parse(&format!("{base}/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.expect("Loopback descriptor should validate.")
	}

	/// Constructs a [`Broker`] backed by a fresh in-memory store.
	pub fn build_test_broker(descriptor: ProviderDescriptor) -> (Broker, Arc<MemoryTokenStore>) {
		let backend = Arc::new(MemoryTokenStore::default());
		let store: Arc<dyn TokenStore> = backend.clone();
		let redirect_uri =
			Url::parse(TEST_REDIRECT_URI).expect("Redirect URI fixture should parse successfully.");
		let broker = Broker::new(store, descriptor, TEST_CLIENT_ID, redirect_uri, test_http_client())
			.with_client_secret(TEST_CLIENT_SECRET);

		(broker, backend)
	}

	/// Credential fixture valid for one hour from a fixed instant.
	pub fn credential_fixture(access: &str, refresh: Option<&str>) -> CredentialSet {
		let issued = time::macros::datetime!(2025-11-10 12:00 UTC);
		let mut builder = CredentialSet::builder(ScopeSet::gmail_default())
			.access_token(access)
			.issued_at(issued)
			.expires_in(Duration::hours(1));

		if let Some(value) = refresh {
			builder = builder.refresh_token(value);
		}

		builder.build().expect("Credential fixture should build successfully.")
	}

	/// Configuration pointing the identity provider at `idp_base` and Gmail at `gmail_base`.
	pub fn test_config(idp_base: &str, gmail_base: &str) -> Config {
		let vars = HashMap::from([
			("CLIENT_ID", TEST_CLIENT_ID.to_owned()),
			("CLIENT_SECRET", TEST_CLIENT_SECRET.to_owned()),
			("REDIRECT_URI", TEST_REDIRECT_URI.to_owned()),
			("HOST", "127.0.0.1".to_owned()),
			("PORT", "0".to_owned()),
			("GOOGLE_AUTH_URL", format!("{idp_base}/authorize")),
			("GOOGLE_TOKEN_URL", format!("{idp_base}/token")),
			("GMAIL_API_BASE", format!("{gmail_base}/gmail/v1")),
		]);

		Config::from_lookup(|key| vars.get(key).cloned())
			.expect("Test configuration should load successfully.")
	}

	/// Serves the relay on an ephemeral loopback port and returns its base URL plus the
	/// backing store so tests can seed or inspect credentials.
	pub async fn spawn_test_app(config: &Config) -> (Url, Arc<MemoryTokenStore>) {
		let backend = Arc::new(MemoryTokenStore::default());
		let store: Arc<dyn TokenStore> = backend.clone();
		let state = AppState::with_store(config, store, test_http_client())
			.expect("Application state should build from the test configuration.");
		let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
			.await
			.expect("Loopback listener should bind.");
		let addr = listener.local_addr().expect("Listener should expose its local address.");

		tokio::spawn(async move {
			let _ = api::serve(listener, state, std::future::pending()).await;
		});

		let base = Url::parse(&format!("http://{addr}")).expect("Listener URL should parse.");

		(base, backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;

// crates.io
use color_eyre as _;
#[cfg(test)] use httpmock as _;
