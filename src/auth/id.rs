//! Strongly typed identifiers sent to the token endpoint and the API.
//!
//! [`ClientId`] and [`CustomerId`] share one validated representation, [`Identifier`], tagged by
//! a zero-sized kind so the two can never be swapped at a call site.

// std
use std::{borrow::Borrow, hash::Hash, marker::PhantomData, ops::Deref};
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Marker describing one family of identifiers.
pub trait IdentifierKind {
	/// Human-readable label used in errors and `Debug` output.
	const LABEL: &'static str;
}

/// Marker for OAuth client identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Client {}
impl IdentifierKind for Client {
	const LABEL: &'static str = "Client";
}

/// Marker for DigiKey customer numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Customer {}
impl IdentifierKind for Customer {
	const LABEL: &'static str = "Customer";
}

/// OAuth client identifier issued by the DigiKey developer portal.
pub type ClientId = Identifier<Client>;
/// DigiKey customer number sent as `X-DIGIKEY-Customer-Id`.
pub type CustomerId = Identifier<Customer>;

/// Non-empty identifier without whitespace, at most 128 bytes long.
pub struct Identifier<K> {
	value: String,
	_kind: PhantomData<K>,
}
impl<K> Identifier<K>
where
	K: IdentifierKind,
{
	/// Validates and wraps `value`.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();

		if value.is_empty() {
			return Err(IdentifierError::Empty { kind: K::LABEL });
		}
		if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
			return Err(IdentifierError::ContainsWhitespace { kind: K::LABEL });
		}
		if value.len() > IDENTIFIER_MAX_LEN {
			return Err(IdentifierError::TooLong { kind: K::LABEL, max: IDENTIFIER_MAX_LEN });
		}

		Ok(Self { value, _kind: PhantomData })
	}

	/// Borrowed identifier text.
	pub fn as_str(&self) -> &str {
		&self.value
	}
}
impl<K> Clone for Identifier<K> {
	fn clone(&self) -> Self {
		Self { value: self.value.clone(), _kind: PhantomData }
	}
}
impl<K> PartialEq for Identifier<K> {
	fn eq(&self, other: &Self) -> bool {
		self.value == other.value
	}
}
impl<K> Eq for Identifier<K> {}
impl<K> Hash for Identifier<K> {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.value.hash(state);
	}
}
impl<K> Deref for Identifier<K> {
	type Target = str;

	fn deref(&self) -> &str {
		&self.value
	}
}
impl<K> AsRef<str> for Identifier<K> {
	fn as_ref(&self) -> &str {
		&self.value
	}
}
impl<K> Borrow<str> for Identifier<K> {
	fn borrow(&self) -> &str {
		&self.value
	}
}
impl<K> From<Identifier<K>> for String {
	fn from(id: Identifier<K>) -> Self {
		id.value
	}
}
impl<K> Debug for Identifier<K>
where
	K: IdentifierKind,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}({})", K::LABEL, self.value)
	}
}
impl<K> Display for Identifier<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.value)
	}
}
impl<K> FromStr for Identifier<K>
where
	K: IdentifierKind,
{
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl<K> Serialize for Identifier<K> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.value)
	}
}
impl<'de, K> Deserialize<'de> for Identifier<K>
where
	K: IdentifierKind,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Self::new(String::deserialize(deserializer)?).map_err(DeError::custom)
	}
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Identifier family label.
		kind: &'static str,
	},
	/// The identifier contains whitespace or control characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Identifier family label.
		kind: &'static str,
	},
	/// The identifier is longer than the allowed byte count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Identifier family label.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}
