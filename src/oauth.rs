//! Client-credentials wire contract and transport error mapping.
//!
//! The token request is a form-encoded POST of `grant_type=client_credentials`, `client_id`,
//! `client_secret`, and an optional space-joined `scope`. The response parser is deliberately
//! lenient: only `access_token` is required, and `expires_in` may be a number or a numeric
//! string.

pub use oauth2;

// crates.io
use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE, HeaderValue},
	},
};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, ScopeSet},
	error::{ApiError, AuthenticationError, ConfigError},
	http,
};

/// Where a transport failure happened; decides which error category it lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportStage {
	/// Calling the OAuth token endpoint.
	TokenEndpoint,
	/// Calling the product API.
	Api,
}

/// Maps HTTP transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a client error.
	fn map_transport_error(&self, stage: TransportStage, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, stage: TransportStage, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(stage, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => transport_failure(stage, inner.to_string(), false, inner),
			HttpClientError::Other(message) =>
				transport_failure(stage, message.clone(), false, std::io::Error::other(message)),
			_ => transport_failure(
				stage,
				"unknown transport failure".into(),
				false,
				std::io::Error::other("unknown transport failure"),
			),
		}
	}
}

/// Successful token endpoint payload reduced to what the manager needs.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct TokenGrant {
	pub(crate) access_token: String,
	/// `None` when the field was absent or non-positive.
	pub(crate) expires_in: Option<Duration>,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

#[derive(Deserialize)]
struct RawTokenResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	expires_in: Option<JsonValue>,
}

/// Builds the form-encoded client-credentials request.
pub(crate) fn build_token_request(
	token_url: &Url,
	credentials: &Credentials,
	scope: &ScopeSet,
) -> Result<HttpRequest, ConfigError> {
	let mut form = FormSerializer::new(String::new());

	form.append_pair("grant_type", "client_credentials")
		.append_pair("client_id", &credentials.client_id)
		.append_pair("client_secret", credentials.client_secret.expose());

	if let Some(scope) = scope.to_param() {
		form.append_pair("scope", &scope);
	}

	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(token_url.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
		.header(ACCEPT, HeaderValue::from_static("application/json"))
		.body(form.finish().into_bytes())?;

	Ok(request)
}

/// Interprets a token endpoint response.
pub(crate) fn parse_token_response(
	response: &HttpResponse,
) -> Result<TokenGrant, AuthenticationError> {
	let status = response.status();
	let body = response.body();

	if !status.is_success() {
		let details = http::error_details(body);
		let message = http::provider_message(&details, &["error_description", "message", "error"])
			.unwrap_or_else(|| format!("token endpoint returned HTTP {}", status.as_u16()));

		return Err(AuthenticationError::TokenEndpoint {
			message,
			status: status.as_u16(),
			details,
		});
	}

	let mut de = serde_json::Deserializer::from_slice(body);
	let raw: RawTokenResponse = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| AuthenticationError::TokenResponseParse { source, status: status.as_u16() })?;
	let access_token = raw
		.access_token
		.filter(|token| !token.trim().is_empty())
		.ok_or(AuthenticationError::MissingAccessToken)?;
	let expires_in = raw.expires_in.as_ref().and_then(expires_in_seconds).map(Duration::seconds);

	Ok(TokenGrant { access_token, expires_in })
}

fn expires_in_seconds(value: &JsonValue) -> Option<i64> {
	let seconds = match value {
		JsonValue::Number(number) =>
			number.as_i64().or_else(|| number.as_f64().map(|secs| secs.trunc() as i64)),
		JsonValue::String(text) => text.trim().parse::<i64>().ok(),
		_ => None,
	}?;

	(seconds > 0).then_some(seconds)
}

fn transport_failure(
	stage: TransportStage,
	message: String,
	timed_out: bool,
	src: impl 'static + Send + Sync + StdError,
) -> Error {
	match stage {
		TransportStage::TokenEndpoint =>
			AuthenticationError::TokenTransport { source: Box::new(src) }.into(),
		TransportStage::Api => ApiError::transport(message, timed_out, src).into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(stage: TransportStage, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	let timed_out = err.is_timeout();
	let message = if timed_out {
		"request timed out".to_owned()
	} else if err.is_connect() {
		"connection failed".to_owned()
	} else {
		err.to_string()
	};

	transport_failure(stage, message, timed_out, err)
}
