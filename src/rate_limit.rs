//! Rate-limit metadata carried by API responses.

// crates.io
use oauth2::http::{HeaderMap, header::RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

const LIMIT: &str = "x-ratelimit-limit";
const REMAINING: &str = "x-ratelimit-remaining";
const RESET: &str = "x-ratelimit-reset";
const WINDOW: &str = "x-ratelimit-window";

/// Values of the `X-RateLimit-*` headers.
///
/// Numeric headers that fail to parse are dropped rather than failing the call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
	/// `X-RateLimit-Limit`: requests allowed in the current window.
	pub limit: Option<i64>,
	/// `X-RateLimit-Remaining`: requests left in the current window.
	pub remaining: Option<i64>,
	/// `X-RateLimit-Reset`: provider-defined reset marker.
	pub reset: Option<i64>,
	/// `X-RateLimit-Window`: window description, verbatim.
	pub window: Option<String>,
}
impl RateLimit {
	/// Extracts rate-limit metadata; returns `None` when no such header is present.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let rate_limit = Self {
			limit: header_str(headers, LIMIT).and_then(|v| v.parse().ok()),
			remaining: header_str(headers, REMAINING).and_then(|v| v.parse().ok()),
			reset: header_str(headers, RESET).and_then(|v| v.parse().ok()),
			window: header_str(headers, WINDOW).map(ToOwned::to_owned),
		};

		if rate_limit == Self::default() { None } else { Some(rate_limit) }
	}
}

/// Parses `Retry-After` as delta-seconds or an HTTP date, relative to now.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = header_str(headers, RETRY_AFTER.as_str())?;

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name)?.to_str().ok().map(str::trim).filter(|value| !value.is_empty())
}
