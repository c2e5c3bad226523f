//! Auth-domain models: scope sets and the credential bundle held by the token store.

pub mod credential;
pub mod scope;

pub use credential::*;
pub use scope::*;
