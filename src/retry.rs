//! Caller-side retry decorator around [`RequestMediator::execute`].
//!
//! The mediator itself never retries. Wrapping a call in [`execute_with_retry`] opts into
//! exponential backoff with full jitter for failures the [`RetryPolicy`] marks as transient.
//! Authentication failures and 4xx responses other than 429 are never retried; 429 is retried
//! only when [`RetryPolicy::retry_rate_limited`] is set, honoring `Retry-After` when present.
//!
//! The sleep function is supplied by the caller so the decorator stays runtime-agnostic.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	config::HttpConfig,
	error::{ApiError, AuthenticationError, RateLimitedError},
	http::HttpTransport,
	mediator::{DecodedResponse, RequestContext, RequestMediator},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Which failures to retry and how long to wait between attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts including the first; `1` disables retries.
	pub max_attempts: u32,
	/// Backoff cap for the first retry; doubles per attempt.
	pub base_backoff: Duration,
	/// Upper bound for any single wait, including `Retry-After` hints.
	pub max_backoff: Duration,
	/// Retry HTTP 429 responses.
	pub retry_rate_limited: bool,
	/// Retry HTTP 5xx responses.
	pub retry_server_errors: bool,
	/// Retry failures where no HTTP response was received.
	pub retry_transport_errors: bool,
}
impl RetryPolicy {
	/// Policy with `retry_attempts` from the transport configuration.
	pub fn from_config(config: &HttpConfig) -> Self {
		Self { max_attempts: config.retry_attempts.max(1), ..Default::default() }
	}

	/// Policy that performs exactly one attempt.
	pub fn disabled() -> Self {
		Self { max_attempts: 1, ..Default::default() }
	}

	/// Enables or disables retrying HTTP 429.
	pub fn with_retry_rate_limited(mut self, enabled: bool) -> Self {
		self.retry_rate_limited = enabled;

		self
	}

	/// Overrides the backoff window.
	pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
		self.base_backoff = base;
		self.max_backoff = max;

		self
	}

	/// Returns `true` when `err` is worth another attempt under this policy.
	pub fn should_retry(&self, err: &Error) -> bool {
		match err {
			Error::RateLimited(_) => self.retry_rate_limited,
			Error::Api(ApiError::Status { status, .. }) => *status >= 500 && self.retry_server_errors,
			Error::Api(ApiError::Transport { .. }) => self.retry_transport_errors,
			Error::Authentication(AuthenticationError::TokenTransport { .. }) =>
				self.retry_transport_errors,
			Error::Authentication(AuthenticationError::TokenEndpoint { status, .. }) =>
				*status >= 500 && self.retry_server_errors,
			_ => false,
		}
	}

	/// Wait before retry number `retry` (1-based) after `err`.
	pub fn delay_for(&self, retry: u32, err: &Error) -> Duration {
		if let Error::RateLimited(RateLimitedError { retry_after: Some(retry_after), .. }) = err {
			return (*retry_after).clamp(Duration::ZERO, self.max_backoff);
		}

		let exponent = retry.saturating_sub(1).min(16);
		let cap = self
			.base_backoff
			.checked_mul(2_i32.pow(exponent))
			.unwrap_or(self.max_backoff)
			.min(self.max_backoff);
		let cap_ms = u64::try_from(cap.whole_milliseconds()).unwrap_or(0);

		if cap_ms == 0 {
			return Duration::ZERO;
		}

		Duration::milliseconds(rand::rng().random_range(0..=cap_ms) as i64)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_backoff: Duration::milliseconds(500),
			max_backoff: Duration::seconds(30),
			retry_rate_limited: false,
			retry_server_errors: true,
			retry_transport_errors: true,
		}
	}
}

/// Executes `request` through `mediator`, retrying transient failures per `policy`.
///
/// `sleep` is awaited between attempts, e.g. `tokio::time::sleep`.
pub async fn execute_with_retry<C, M, S, Fut>(
	mediator: &RequestMediator<C, M>,
	request: RequestContext,
	policy: &RetryPolicy,
	sleep: S,
) -> Result<DecodedResponse>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
	S: Fn(std::time::Duration) -> Fut,
	Fut: Future<Output = ()>,
{
	const KIND: FlowKind = FlowKind::Retry;

	let span = FlowSpan::new(KIND, "execute_with_retry");
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt = 1;

	loop {
		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		match span.instrument(mediator.execute(request.clone())).await {
			Ok(response) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				return Ok(response);
			},
			Err(e) if attempt < max_attempts && policy.should_retry(&e) => {
				sleep(policy.delay_for(attempt, &e).unsigned_abs()).await;

				attempt += 1;
			},
			Err(e) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				return Err(e);
			},
		}
	}
}
