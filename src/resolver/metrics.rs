// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for region lookups.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
	lookups: AtomicU64,
	remote_attempts: AtomicU64,
	retries: AtomicU64,
}
impl ResolverMetrics {
	/// Returns the number of lookups that missed both cached tables.
	pub fn lookups(&self) -> u64 {
		self.lookups.load(Ordering::Relaxed)
	}

	/// Returns the number of remote calls issued, retries included.
	pub fn remote_attempts(&self) -> u64 {
		self.remote_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of retries after cancellation-class failures.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	pub(crate) fn record_lookup(&self) {
		self.lookups.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_remote_attempt(&self) {
		self.remote_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}
}
