//! Transport primitives shared by the token manager and the request mediator.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. Both the token exchange
//! and every mediated API call go through short-lived [`AsyncHttpClient`] handles obtained from
//! it, so swapping reqwest for another client (or a test double) touches nothing else.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::{config::HttpConfig, error::ConfigError};

/// Abstraction over HTTP transports capable of executing token exchanges and API calls.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared behind `Arc` by the
/// manager and the mediator, and the handles they return must own whatever state they need so
/// request futures stay `Send` for the lifetime of the in-flight call.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single call.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for one request.
	fn handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Neither the token endpoint nor the API is expected to redirect; configure any custom
/// [`ReqwestClient`] to disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured total and connect timeouts.
	pub fn from_config(config: &HttpConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(config.timeout())
			.connect_timeout(config.connect_timeout())
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// [`AsyncHttpClient`] adapter returned by [`ReqwestHttpClient::handle`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Decodes an error body into JSON, falling back to an empty object when it is not JSON.
pub(crate) fn error_details(body: &[u8]) -> JsonValue {
	match serde_json::from_slice::<JsonValue>(body) {
		Ok(value @ JsonValue::Object(_)) => value,
		_ => JsonValue::Object(Default::default()),
	}
}

/// First non-empty string among `keys` in a decoded error body.
pub(crate) fn provider_message(details: &JsonValue, keys: &[&str]) -> Option<String> {
	keys.iter()
		.filter_map(|key| details.get(key).and_then(JsonValue::as_str))
		.map(str::trim)
		.find(|message| !message.is_empty())
		.map(ToOwned::to_owned)
}
