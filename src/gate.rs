//! Admission check placed in front of every credentialed operation.

// self
use crate::{_prelude::*, auth::CredentialSet, error::AdmissionError, store::TokenStore};

/// Decides whether an operation may proceed and, if so, hands it the held credentials.
///
/// The gate only reads the slot. Expiry does not block admission; an expired access token
/// surfaces as an ordinary mail API failure.
#[derive(Clone)]
pub struct AuthGate {
	store: Arc<dyn TokenStore>,
}
impl AuthGate {
	/// Creates a gate over the shared slot.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store }
	}

	/// Returns a clone of the held credentials or [`AdmissionError::AuthRequired`].
	pub fn admit(&self) -> Result<CredentialSet, AdmissionError> {
		let Some(credentials) = self.store.get() else {
			tracing::debug!("Rejected an operation because no credentials are held.");

			return Err(AdmissionError::AuthRequired);
		};

		if credentials.is_expired_at(OffsetDateTime::now_utc()) {
			tracing::debug!(
				expires_at = %credentials.expires_at(),
				"Admitted credentials past their expiry."
			);
		}

		Ok(credentials)
	}
}
impl Debug for AuthGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthGate")
			.field("authenticated", &self.store.state().is_authenticated())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::credential_fixture, store::MemoryTokenStore};

	#[test]
	fn empty_slot_is_rejected_with_auth_required() {
		let gate = AuthGate::new(Arc::new(MemoryTokenStore::default()));

		assert_eq!(gate.admit(), Err(AdmissionError::AuthRequired));
	}

	#[test]
	fn held_credentials_are_furnished_even_when_expired() {
		let store = Arc::new(MemoryTokenStore::default());
		let gate = AuthGate::new(store.clone());
		let credentials = credential_fixture("tok1", None);

		store.set(credentials.clone());

		assert!(credentials.is_expired_at(OffsetDateTime::now_utc()));
		assert_eq!(gate.admit(), Ok(credentials));
	}
}
