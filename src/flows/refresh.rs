//! Refresh-token rotation guarded by a singleflight lock and a compare-and-swap on the slot.
//!
//! The swap is keyed on the access token the refresh started from. A concurrent logout makes
//! the refresh report [`AdmissionError::AuthRequired`]; a concurrent exchange wins over the
//! refreshed credentials.

// self
use crate::{
	_prelude::*,
	auth::CredentialSet,
	error::{AdmissionError, UpstreamError},
	flows::Broker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::SwapOutcome,
};

impl Broker {
	/// Mints a new access token from the held refresh token and swaps it into the slot.
	///
	/// When the provider does not rotate the refresh token, the previous one is carried over.
	/// A failed refresh leaves the slot untouched.
	pub async fn refresh(&self) -> Result<CredentialSet> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<CredentialSet> = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;
				let current = self.store.get().ok_or(AdmissionError::AuthRequired)?;
				let refresh_token =
					current.refresh_token().cloned().ok_or(AdmissionError::RefreshTokenMissing)?;
				let minted = self.facade().refresh(refresh_token.expose(), current.scope()).await?;
				let replacement = CredentialSet::builder(minted.scope().clone())
					.access_token(minted.access_token().expose())
					.maybe_refresh_token(minted.refresh_token().cloned().or(Some(refresh_token)))
					.issued_at(minted.issued_at())
					.expires_at(minted.expires_at())
					.build()
					.map_err(UpstreamError::from)?;

				let outcome =
					self.store.replace_if_current(current.access_token().expose(), replacement.clone());

				match outcome {
					SwapOutcome::Updated => {
						tracing::info!(expires_at = %replacement.expires_at(), "Refreshed credentials.");

						Ok(replacement)
					},
					SwapOutcome::Superseded => {
						tracing::info!("Credentials changed during refresh; keeping the newer set.");

						self.store.get().ok_or_else(|| AdmissionError::AuthRequired.into())
					},
					SwapOutcome::Missing => Err(AdmissionError::AuthRequired.into()),
				}
			})
			.await;

		if let Err(err) = &result {
			tracing::warn!(error = %err, "Credential refresh failed.");
		}

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}
}
