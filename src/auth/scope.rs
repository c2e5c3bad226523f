//! Scope modeling for authorization requests and granted credentials.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Gmail capability needed to send mail.
pub const GMAIL_SEND: &str = "https://www.googleapis.com/auth/gmail.send";
/// Gmail capability needed to list and read mail.
pub const GMAIL_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Deduplicated, sorted set of capability strings.
///
/// Sorting keeps equality independent of the order a provider echoes scopes back in.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Creates a normalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}

			set.insert(owned);
		}

		Ok(Self(Arc::from(set.into_iter().collect::<Vec<_>>())))
	}

	/// The send + read-only Gmail scopes requested when nothing else is configured.
	pub fn gmail_default() -> Self {
		let mut scopes = vec![GMAIL_READONLY.to_owned(), GMAIL_SEND.to_owned()];

		scopes.sort();

		Self(Arc::from(scopes))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited representation used on the wire.
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.0.iter() }
	}
}
/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(String::as_str)
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	/// Accepts space- or comma-separated lists, as written in environment variables.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let entries = s
			.split(|c: char| c == ',' || c.is_whitespace())
			.filter(|entry| !entry.is_empty())
			.collect::<Vec<_>>();

		if entries.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(entries)
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for scope in self.0.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeSet::new(values).map_err(DeError::custom)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_normalize_regardless_of_order() {
		let lhs = ScopeSet::new([GMAIL_SEND, GMAIL_READONLY, GMAIL_SEND])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::new([GMAIL_READONLY, GMAIL_SEND])
			.expect("Right-hand scope set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs, ScopeSet::gmail_default());
		assert_eq!(lhs.len(), 2);
	}

	#[test]
	fn env_lists_accept_commas_and_spaces() {
		let scopes = ScopeSet::from_str("openid, email profile")
			.expect("Mixed separators should parse successfully.");

		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["email", "openid", "profile"]);
		assert_eq!(scopes.normalized(), "email openid profile");
		assert!(scopes.contains("openid"));
		assert!(!scopes.contains("gmail"));
		assert!(ScopeSet::from_str(" , ").is_err(), "Separator-only input must be rejected.");
	}

	#[test]
	fn invalid_scopes_error() {
		assert_eq!(ScopeSet::new([""]), Err(ScopeValidationError::Empty));
		assert!(matches!(
			ScopeSet::new(["contains space"]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn serde_rejects_invalid_entries() {
		let parsed: ScopeSet =
			serde_json::from_str("[\"b\",\"a\"]").expect("Scope list should deserialize.");

		assert_eq!(
			serde_json::to_string(&parsed).expect("Scope set should serialize."),
			"[\"a\",\"b\"]"
		);
		assert!(serde_json::from_str::<ScopeSet>("[\"\"]").is_err());
	}
}
