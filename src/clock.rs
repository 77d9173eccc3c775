//! Time source used for token expiry decisions.

// self
use crate::_prelude::*;

/// Supplies the current instant to the token manager.
pub trait Clock
where
	Self: Debug + Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time via [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually advanced clock for deterministic expiry tests.
#[cfg(any(test, feature = "test"))]
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
#[cfg(any(test, feature = "test"))]
impl ManualClock {
	/// Starts the clock at `instant`.
	pub fn starting_at(instant: OffsetDateTime) -> Self {
		Self(Mutex::new(instant))
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Jumps the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
#[cfg(any(test, feature = "test"))]
impl Default for ManualClock {
	fn default() -> Self {
		Self::starting_at(OffsetDateTime::now_utc())
	}
}
#[cfg(any(test, feature = "test"))]
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
