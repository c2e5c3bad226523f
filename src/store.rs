//! Credential slot contract and the explicit authentication state it holds.

pub mod memory;

pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, auth::CredentialSet};

/// Authentication state of the single connected mailbox.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
	/// No credentials are held; gated operations are rejected.
	#[default]
	Unauthenticated,
	/// A complete credential set is held.
	Authenticated(CredentialSet),
}
impl AuthState {
	/// Returns true when credentials are held.
	pub fn is_authenticated(&self) -> bool {
		matches!(self, Self::Authenticated(_))
	}

	/// Borrows the held credentials, if any.
	pub fn credentials(&self) -> Option<&CredentialSet> {
		match self {
			Self::Authenticated(credentials) => Some(credentials),
			Self::Unauthenticated => None,
		}
	}

	/// Consumes the state and returns the held credentials, if any.
	pub fn into_credentials(self) -> Option<CredentialSet> {
		match self {
			Self::Authenticated(credentials) => Some(credentials),
			Self::Unauthenticated => None,
		}
	}
}
impl From<Option<CredentialSet>> for AuthState {
	fn from(value: Option<CredentialSet>) -> Self {
		value.map_or(Self::Unauthenticated, Self::Authenticated)
	}
}

/// Result of a compare-and-swap on the held access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapOutcome {
	/// The held access token matched and the slot was replaced.
	Updated,
	/// The slot holds different credentials; the replacement was discarded.
	Superseded,
	/// The slot is empty; the replacement was discarded.
	Missing,
}

/// Single-slot credential holder shared by the gate, the flows, and the HTTP surface.
///
/// Implementations never perform I/O while holding the slot and never fail: `set` replaces
/// unconditionally (last writer wins) and `clear` is idempotent.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Snapshot of the current state.
	fn state(&self) -> AuthState;

	/// Replaces whatever is held with `credentials`.
	fn set(&self, credentials: CredentialSet);

	/// Empties the slot.
	fn clear(&self);

	/// Replaces the slot only if it still holds the access token `expected_access`.
	fn replace_if_current(&self, expected_access: &str, replacement: CredentialSet)
	-> SwapOutcome;

	/// Clone of the held credentials, if any.
	fn get(&self) -> Option<CredentialSet> {
		self.state().into_credentials()
	}
}
