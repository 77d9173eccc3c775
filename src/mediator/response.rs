//! Decoded API responses and failure message selection.

// crates.io
use oauth2::HttpResponse;
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::ApiError, rate_limit::RateLimit};

/// Successful API response: status, decoded JSON body, and rate-limit metadata.
///
/// Rate-limit headers are kept beside the body instead of being merged into it.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedResponse {
	/// HTTP status (2xx).
	pub status: u16,
	/// Decoded body; `null` when the response had no content.
	pub body: JsonValue,
	/// `X-RateLimit-*` values, when the response carried any.
	pub rate_limit: Option<RateLimit>,
}
impl DecodedResponse {
	/// Consumes the response, keeping only the body.
	pub fn into_json(self) -> JsonValue {
		self.body
	}

	/// Deserializes the body into a caller-defined type.
	pub fn json<T>(&self) -> Result<T, ApiError>
	where
		T: DeserializeOwned,
	{
		serde_path_to_error::deserialize(&self.body)
			.map_err(|source| ApiError::InvalidResponse { source, status: self.status })
	}
}

pub(crate) fn decode_success(response: &HttpResponse) -> Result<DecodedResponse, ApiError> {
	let status = response.status().as_u16();
	let raw = response.body();
	let body = if raw.iter().all(u8::is_ascii_whitespace) {
		JsonValue::Null
	} else {
		let mut de = serde_json::Deserializer::from_slice(raw);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ApiError::InvalidResponse { source, status })?
	};

	Ok(DecodedResponse { status, body, rate_limit: RateLimit::from_headers(response.headers()) })
}

/// Provider message from an error body, else a fallback for the status class.
pub(crate) fn failure_message(status: u16, details: &JsonValue) -> String {
	crate::http::provider_message(details, &["message", "error_description"]).unwrap_or_else(|| {
		match status {
			429 => "Too many requests".into(),
			400..=499 => "Client error occurred".into(),
			500..=599 => "Server error occurred".into(),
			_ => format!("Unexpected HTTP status {status}"),
		}
	})
}
