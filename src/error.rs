//! Client-level error taxonomy shared by the token manager, the mediator, and cache backends.
//!
//! Callers branch on three top-level categories:
//!
//! - [`Error::Authentication`]: a token could not be obtained or the API rejected it with 401.
//! - [`Error::RateLimited`]: the API answered 429; back off before calling again.
//! - [`Error::Api`]: any other HTTP failure or malformed response. Transport failures land here
//!   with status code `0`.

// self
use crate::{_prelude::*, cache::CacheError, rate_limit::RateLimit};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token acquisition failed or the API rejected the bearer token.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// API answered with HTTP 429.
	#[error(transparent)]
	RateLimited(#[from] RateLimitedError),
	/// Any other HTTP, decoding, or transport failure.
	#[error(transparent)]
	Api(#[from] ApiError),
}
impl Error {
	/// HTTP status associated with the failure; `0` when no response was received and `None`
	/// for local failures (configuration, cache).
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::Authentication(e) => e.status_code(),
			Self::RateLimited(_) => Some(429),
			Self::Api(e) => Some(e.status_code()),
			Self::Cache(_) | Self::Config(_) => None,
		}
	}

	/// Returns `true` for authentication failures, including 401 rejections.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Authentication(_))
	}

	/// Returns `true` when the API throttled the request.
	pub fn is_rate_limited(&self) -> bool {
		matches!(self, Self::RateLimited(_))
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A required setting is missing.
	#[error("Configuration value `{key}` is required.")]
	Missing {
		/// Setting name.
		key: &'static str,
	},
	/// A setting could not be parsed.
	#[error("Configuration value `{key}` is invalid: {reason}.")]
	Invalid {
		/// Setting name.
		key: &'static str,
		/// Parser-supplied reason string.
		reason: String,
	},
	/// A configured URL cannot be parsed.
	#[error("Configuration value `{key}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The API base URL cannot carry path segments.
	#[error("Base URL `{url}` cannot be used as a path prefix.")]
	CannotBeBase {
		/// Offending URL.
		url: String,
	},
	/// A header name or value contains characters HTTP does not allow.
	#[error("Header `{name}` has an invalid name or value.")]
	InvalidHeader {
		/// Header name as supplied by the caller.
		name: String,
	},
	/// Client identifier or secret is malformed.
	#[error(transparent)]
	InvalidCredentials(#[from] crate::auth::CredentialsError),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize {
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures that leave the caller without a usable bearer token.
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// Transport failure while calling the token endpoint.
	#[error("Failed to obtain access token: the token endpoint could not be reached.")]
	TokenTransport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Token endpoint answered with a non-success status.
	#[error("Failed to obtain access token: {message}.")]
	TokenEndpoint {
		/// Provider- or client-supplied message.
		message: String,
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Decoded error body (empty object when the body was not JSON).
		details: JsonValue,
	},
	/// Token endpoint responded with a body that is not valid JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint response did not include an `access_token`.
	#[error("Invalid token response: access_token not found.")]
	MissingAccessToken,
	/// The token expiry cannot be represented as a calendar instant.
	#[error("Invalid token response: the token expiry is out of range.")]
	ExpiryOutOfRange,
	/// Token could not be read from or written to the cache.
	#[error("Failed to obtain access token: {source}")]
	TokenUnavailable {
		/// Underlying client error.
		#[source]
		source: Box<Error>,
	},
	/// The API rejected the bearer token (HTTP 401); the cached token has been invalidated.
	#[error("{message}")]
	Rejected {
		/// Provider-supplied message, or a generic fallback.
		message: String,
		/// HTTP status (always 401).
		status: u16,
		/// Decoded error body.
		details: JsonValue,
		/// Set when deleting the cached token failed; the 401 still propagates.
		invalidation_error: Option<CacheError>,
	},
}
impl AuthenticationError {
	/// HTTP status associated with the failure, when a response was received.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::TokenEndpoint { status, .. }
			| Self::TokenResponseParse { status, .. }
			| Self::Rejected { status, .. } => Some(*status),
			Self::TokenTransport { .. }
			| Self::MissingAccessToken
			| Self::ExpiryOutOfRange
			| Self::TokenUnavailable { .. } => None,
		}
	}

	/// Human-readable message, preferring the provider's own wording.
	pub fn message(&self) -> String {
		match self {
			Self::TokenEndpoint { message, .. } | Self::Rejected { message, .. } => message.clone(),
			other => other.to_string(),
		}
	}

	/// Provider error body, when one was decoded.
	pub fn details(&self) -> Option<&JsonValue> {
		match self {
			Self::TokenEndpoint { details, .. } | Self::Rejected { details, .. } => Some(details),
			_ => None,
		}
	}
}

/// API failures other than authentication and throttling.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// API answered with a 4xx (other than 401/429), 5xx, or otherwise unexpected status.
	#[error("{message}")]
	Status {
		/// Provider-supplied message, or a generic fallback.
		message: String,
		/// HTTP status code.
		status: u16,
		/// Decoded error body (empty object when the body was not JSON).
		details: JsonValue,
	},
	/// Success response body was not valid JSON.
	#[error("Invalid response: the API returned malformed JSON.")]
	InvalidResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// No HTTP response was received (DNS, TCP, TLS, timeout).
	#[error("HTTP request failed: {message}.")]
	Transport {
		/// Short description of the transport failure.
		message: String,
		/// Indicates the failure was a timeout.
		timed_out: bool,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
}
impl ApiError {
	/// Wraps a transport failure; the status code is reported as `0`.
	pub fn transport(
		message: impl Into<String>,
		timed_out: bool,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Transport { message: message.into(), timed_out, source: Box::new(src) }
	}

	/// HTTP status code; `0` for transport failures.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Status { status, .. } | Self::InvalidResponse { status, .. } => *status,
			Self::Transport { .. } => 0,
		}
	}

	/// Human-readable message, preferring the provider's own wording.
	pub fn message(&self) -> String {
		match self {
			Self::Status { message, .. } => message.clone(),
			other => other.to_string(),
		}
	}

	/// Provider error body, when one was decoded.
	pub fn details(&self) -> Option<&JsonValue> {
		match self {
			Self::Status { details, .. } => Some(details),
			_ => None,
		}
	}
}

/// HTTP 429 surfaced separately so callers can back off without string matching.
#[derive(Debug, ThisError)]
#[error("Rate limit exceeded: {message}.")]
pub struct RateLimitedError {
	/// Provider-supplied message, or a generic fallback.
	pub message: String,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Rate-limit headers attached to the 429 response.
	pub rate_limit: Option<RateLimit>,
	/// Decoded error body.
	pub details: JsonValue,
}
