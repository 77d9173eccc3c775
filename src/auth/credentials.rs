//! Client credentials used for the client-credentials grant.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, CustomerId, IdentifierError},
};

/// Errors produced while assembling [`Credentials`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialsError {
	/// Client identifier failed validation.
	#[error("Client identifier is invalid.")]
	ClientId(#[source] IdentifierError),
	/// Customer identifier failed validation.
	#[error("Customer identifier is invalid.")]
	CustomerId(#[source] IdentifierError),
	/// Client secret was empty or whitespace.
	#[error("Client secret cannot be empty.")]
	EmptySecret,
}

/// Client secret wrapper that keeps the value out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);
impl ClientSecret {
	/// Wraps a secret, rejecting blank values.
	pub fn new(value: impl Into<String>) -> Result<Self, CredentialsError> {
		let value = value.into();

		if value.trim().is_empty() {
			return Err(CredentialsError::EmptySecret);
		}

		Ok(Self(value))
	}

	/// Returns the raw secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for ClientSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ClientSecret").field(&"<redacted>").finish()
	}
}
impl Display for ClientSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Immutable credential set: client id + secret, optionally bound to a customer number.
///
/// The client id alone determines the token cache entry, so two sets with different client ids
/// never observe each other's tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret.
	pub client_secret: ClientSecret,
	/// Customer number forwarded as `X-DIGIKEY-Customer-Id`.
	pub customer_id: Option<CustomerId>,
}
impl Credentials {
	/// Validates and bundles a client id + secret pair.
	pub fn new(
		client_id: impl AsRef<str>,
		client_secret: impl Into<String>,
	) -> Result<Self, CredentialsError> {
		Ok(Self {
			client_id: ClientId::new(client_id.as_ref()).map_err(CredentialsError::ClientId)?,
			client_secret: ClientSecret::new(client_secret)?,
			customer_id: None,
		})
	}

	/// Binds the credentials to a customer number.
	pub fn with_customer_id(mut self, customer_id: impl AsRef<str>) -> Result<Self, CredentialsError> {
		self.customer_id =
			Some(CustomerId::new(customer_id.as_ref()).map_err(CredentialsError::CustomerId)?);

		Ok(self)
	}
}
