//! Admission as an extractor.

// crates.io
use axum::{extract::FromRequestParts, http::request::Parts};
// self
use crate::{
	_prelude::*,
	api::{AppState, Failure},
	auth::CredentialSet,
};

/// Credentials furnished by the gate; extracting this rejects unauthenticated requests.
#[derive(Clone, Debug)]
pub struct Admitted(pub CredentialSet);
impl FromRequestParts<AppState> for Admitted {
	type Rejection = Failure;

	async fn from_request_parts(
		_parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		state.gate.admit().map(Self).map_err(Failure::admission)
	}
}
