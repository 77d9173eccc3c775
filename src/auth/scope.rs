//! Scope normalization for the `scope` form parameter.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Ordered list of OAuth scopes.
///
/// Entries are trimmed and blank entries are dropped; the configured order is kept so the
/// request matches what the operator wrote. An empty set means the `scope` parameter is omitted
/// from the token request entirely.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
}
impl ScopeSet {
	/// Creates a normalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let scopes = scopes
			.into_iter()
			.map(|scope| scope.as_ref().trim().to_owned())
			.filter(|scope| !scope.is_empty())
			.collect::<Vec<_>>();

		Self { scopes: Arc::from(scopes) }
	}

	/// Number of scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Iterator over scopes in configured order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Space-joined form sent as the `scope` parameter, or `None` when empty.
	pub fn to_param(&self) -> Option<String> {
		if self.is_empty() { None } else { Some(self.scopes.join(" ")) }
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.scopes.join(" "))
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.scopes.iter() }
	}
}
impl From<Vec<String>> for ScopeSet {
	fn from(value: Vec<String>) -> Self {
		Self::new(value)
	}
}
impl FromStr for ScopeSet {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::new(s.split_whitespace()))
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
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
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Joined(String),
			List(Vec<String>),
		}

		match Raw::deserialize(deserializer).map_err(|_| {
			DeError::custom("scope must be a space-delimited string or a list of strings")
		})? {
			Raw::Joined(value) => Ok(value.parse().unwrap_or_default()),
			Raw::List(values) => Ok(Self::new(values)),
		}
	}
}
