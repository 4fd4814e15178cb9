// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for repository cascades.
#[derive(Debug, Default)]
pub struct RepositoryMetrics {
	requests: AtomicU64,
	cache_hits: AtomicU64,
	store_hits: AtomicU64,
	remote_fetches: AtomicU64,
	failures: AtomicU64,
}
impl RepositoryMetrics {
	/// Returns the number of repository calls, joined waiters included.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of cascades served from the in-memory cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of cascades served from the record store.
	pub fn store_hits(&self) -> u64 {
		self.store_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of remote fetches issued.
	pub fn remote_fetches(&self) -> u64 {
		self.remote_fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of repository calls that ended in an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_store_hit(&self) {
		self.store_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_remote_fetch(&self) {
		self.remote_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
