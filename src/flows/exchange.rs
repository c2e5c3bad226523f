//! Authorization-code exchange: the only transition into the authenticated state.

// self
use crate::{
	_prelude::*,
	auth::CredentialSet,
	error::ValidationError,
	flows::Broker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Broker {
	/// Exchanges the callback `code` for credentials and stores them.
	///
	/// Any failure leaves the slot exactly as it was, including "absent". Callbacks are not
	/// correlated with an earlier redirect; any valid code is accepted.
	pub async fn exchange_code(&self, code: &str) -> Result<CredentialSet> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<CredentialSet> = span
			.instrument(async move {
				let code = code.trim();

				if code.is_empty() {
					return Err(ValidationError::MissingQueryParameter { name: "code" }.into());
				}

				let credentials = self.facade().exchange_code(code, &self.scope).await?;

				if credentials.refresh_token().is_none() {
					tracing::warn!(
						"Provider granted no refresh token; reconnect with forced consent to enable refresh."
					);
				}

				self.store.set(credentials.clone());
				tracing::info!(expires_at = %credentials.expires_at(), "Connected the mailbox.");

				Ok(credentials)
			})
			.await;

		if let Err(err) = &result {
			tracing::warn!(error = %err, "Authorization code exchange failed.");
		}

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}
}
