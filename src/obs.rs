//! Optional observability helpers for token and API flows.
//!
//! # Feature Flags
//!
//! - `tracing` (on by default) wraps token and API calls in `digikey_client.flow` spans with
//!   `flow`, `stage` and `http.status` fields.
//! - `metrics` increments `digikey_client_flow_total{flow, outcome}` for each attempt, success
//!   and failure. It also increments `digikey_client_http_responses_total{flow, class}` for each
//!   received status, where a missing response counts as `transport`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Client-credentials exchange against the token endpoint.
	TokenAcquire,
	/// Explicit removal of the cached token.
	TokenInvalidate,
	/// Mediated API call.
	ApiRequest,
	/// Caller-side retry loop around a mediated call.
	Retry,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenAcquire => "token_acquire",
			FlowKind::TokenInvalidate => "token_invalidate",
			FlowKind::ApiRequest => "api_request",
			FlowKind::Retry => "retry",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
