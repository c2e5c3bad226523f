//! Process-local [`TokenStore`] holding the credential slot behind a read-write lock.

// self
use crate::{
	_prelude::*,
	auth::CredentialSet,
	store::{AuthState, SwapOutcome, TokenStore},
};

/// In-memory credential slot; contents vanish when the process exits.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(Arc<RwLock<AuthState>>);
impl MemoryTokenStore {
	/// Creates a store already holding `credentials`.
	pub fn with_credentials(credentials: CredentialSet) -> Self {
		Self(Arc::new(RwLock::new(AuthState::Authenticated(credentials))))
	}
}
impl TokenStore for MemoryTokenStore {
	fn state(&self) -> AuthState {
		self.0.read().clone()
	}

	fn set(&self, credentials: CredentialSet) {
		*self.0.write() = AuthState::Authenticated(credentials);
	}

	fn clear(&self) {
		*self.0.write() = AuthState::Unauthenticated;
	}

	fn replace_if_current(
		&self,
		expected_access: &str,
		replacement: CredentialSet,
	) -> SwapOutcome {
		let mut guard = self.0.write();
		let outcome = match &*guard {
			AuthState::Authenticated(current)
				if current.access_token().expose() == expected_access =>
				SwapOutcome::Updated,
			AuthState::Authenticated(_) => SwapOutcome::Superseded,
			AuthState::Unauthenticated => SwapOutcome::Missing,
		};

		if matches!(outcome, SwapOutcome::Updated) {
			*guard = AuthState::Authenticated(replacement);
		}

		outcome
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::credential_fixture;

	#[test]
	fn compare_and_swap_only_replaces_the_expected_token() {
		let store = MemoryTokenStore::with_credentials(credential_fixture("tok1", Some("r1")));

		assert_eq!(
			store.replace_if_current("stale", credential_fixture("tok2", Some("r1"))),
			SwapOutcome::Superseded
		);
		assert_eq!(
			store.replace_if_current("tok1", credential_fixture("tok2", Some("r1"))),
			SwapOutcome::Updated
		);
		assert_eq!(store.get().map(|c| c.access_token().expose().to_owned()), Some("tok2".into()));

		store.clear();

		assert_eq!(
			store.replace_if_current("tok2", credential_fixture("tok3", None)),
			SwapOutcome::Missing
		);
		assert!(!store.state().is_authenticated());
	}

	#[test]
	fn clones_share_one_slot() {
		let store = MemoryTokenStore::default();
		let handle = store.clone();

		handle.set(credential_fixture("tok1", None));

		assert!(store.state().is_authenticated());
	}
}
