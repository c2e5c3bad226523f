#![cfg(feature = "test")]

// std
use std::thread;
// self
use gmail_relay::{
	_preludet::*,
	error::AdmissionError,
	gate::AuthGate,
	store::{AuthState, MemoryTokenStore, SwapOutcome, TokenStore},
};

#[test]
fn slot_lifecycle_follows_set_and_clear() {
	let store = MemoryTokenStore::default();

	assert_eq!(store.state(), AuthState::Unauthenticated);

	store.set(credential_fixture("access-1", Some("refresh-1")));
	store.set(credential_fixture("access-2", None));

	let held = store.get().expect("Last writer should win.");

	assert_eq!(held.access_token().expose(), "access-2");
	assert!(held.refresh_token().is_none());

	store.clear();
	store.clear();

	assert_eq!(store.state(), AuthState::Unauthenticated);
}

#[test]
fn gate_tracks_the_shared_slot() {
	let backend = Arc::new(MemoryTokenStore::default());
	let store: Arc<dyn TokenStore> = backend.clone();
	let gate = AuthGate::new(store);

	assert_eq!(gate.admit(), Err(AdmissionError::AuthRequired));

	backend.set(credential_fixture("access-gate", Some("refresh-gate")));

	let admitted = gate.admit().expect("A filled slot admits.");

	assert_eq!(admitted.access_token().expose(), "access-gate");

	backend.clear();

	assert_eq!(gate.admit(), Err(AdmissionError::AuthRequired));
}

#[test]
fn readers_never_observe_a_torn_credential_set() {
	let store = MemoryTokenStore::default();
	let writers = (0..4)
		.map(|writer| {
			let store = store.clone();

			thread::spawn(move || {
				for round in 0..200 {
					let tag = format!("{writer}-{round}");
					let refresh = format!("refresh-{tag}");

					store.set(credential_fixture(&format!("access-{tag}"), Some(&refresh)));
				}
			})
		})
		.collect::<Vec<_>>();

	for _ in 0..500 {
		if let Some(held) = store.get() {
			let access = held.access_token().expose().trim_start_matches("access-").to_owned();
			let refresh = held
				.refresh_token()
				.map(|secret| secret.expose().trim_start_matches("refresh-").to_owned());

			assert_eq!(Some(access), refresh);
		}
	}

	for writer in writers {
		writer.join().expect("Writer thread should not panic.");
	}
}

#[test]
fn only_one_compare_and_swap_wins() {
	let store = MemoryTokenStore::with_credentials(credential_fixture("access-base", None));
	let outcomes = (0..8)
		.map(|contender| {
			let store = store.clone();

			thread::spawn(move || {
				store.replace_if_current(
					"access-base",
					credential_fixture(&format!("access-{contender}"), None),
				)
			})
		})
		.collect::<Vec<_>>()
		.into_iter()
		.map(|handle| handle.join().expect("Contender thread should not panic."))
		.collect::<Vec<_>>();

	assert_eq!(outcomes.iter().filter(|outcome| **outcome == SwapOutcome::Updated).count(), 1);
	assert_eq!(outcomes.iter().filter(|outcome| **outcome == SwapOutcome::Superseded).count(), 7);
}
