// self
use crate::obs::{FlowKind, FlowOutcome};

/// Bumps `digikey_client_flow_total{flow, outcome}` when the `metrics` feature is enabled.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"digikey_client_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Bumps `digikey_client_http_responses_total{flow, class}` for a received status code.
pub fn record_http_status(kind: FlowKind, status: u16) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"digikey_client_http_responses_total",
		"flow" => kind.as_str(),
		"class" => status_class(status)
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, status);
}

/// Coarse label for a status code; `0` stands for "no response".
pub fn status_class(status: u16) -> &'static str {
	match status {
		0 => "transport",
		100..=199 => "1xx",
		200..=299 => "2xx",
		300..=399 => "3xx",
		401 => "unauthorized",
		429 => "rate_limited",
		400..=499 => "4xx",
		500..=599 => "5xx",
		_ => "other",
	}
}
