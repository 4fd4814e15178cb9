//! Single-entry in-memory rate cache keyed implicitly by the active tariff.

// self
use crate::{
	_prelude::*,
	freshness::FreshnessPolicy,
	rate::{PriceRecord, TariffCode, TimeWindow},
};

/// Snapshot of the records fetched for one tariff.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
	/// Tariff the records belong to.
	pub tariff_code: TariffCode,
	/// Records ordered by `valid_from`.
	pub records: Vec<PriceRecord>,
	/// Instant the records were obtained.
	pub fetched_at: DateTime<Utc>,
	/// Whether `fetched_at` fell at or after that day's cutoff.
	pub fetched_after_cutoff: bool,
	/// Next expected publication instant at storage time.
	pub next_refresh_at: DateTime<Utc>,
}

/// Holds at most one [`CacheEntry`]; replacements are atomic and wholesale.
#[derive(Debug, Default)]
pub struct RateCache {
	policy: FreshnessPolicy,
	entry: RwLock<Option<CacheEntry>>,
}
impl RateCache {
	/// Creates an empty cache judged by `policy`.
	pub fn new(policy: FreshnessPolicy) -> Self {
		Self { policy, entry: RwLock::new(None) }
	}

	/// Returns windowed records when the entry matches `tariff` and is fresh and sufficient.
	pub fn lookup(
		&self,
		tariff: &TariffCode,
		window: TimeWindow,
		now: DateTime<Utc>,
	) -> Option<Vec<PriceRecord>> {
		let guard = self.entry.read();
		let entry = guard.as_ref().filter(|entry| &entry.tariff_code == tariff)?;

		let fresh = self.policy.is_entry_fresh(entry, now);

		if !fresh || !self.policy.is_sufficient(&entry.records, now) {
			return None;
		}

		Some(window.filter(&entry.records))
	}

	/// Replaces the entry and returns a copy of what was stored.
	pub fn store(
		&self,
		tariff: TariffCode,
		mut records: Vec<PriceRecord>,
		now: DateTime<Utc>,
	) -> CacheEntry {
		records.sort_by_key(|record| record.valid_from);

		let entry = CacheEntry {
			tariff_code: tariff,
			records,
			fetched_at: now,
			fetched_after_cutoff: self.policy.is_after_cutoff(now),
			next_refresh_at: self.policy.next_refresh_at(now),
		};

		*self.entry.write() = Some(entry.clone());

		entry
	}

	/// Drops the entry.
	pub fn invalidate(&self) {
		self.entry.write().take();
	}

	/// Drops the entry if it belongs to a tariff other than `tariff`; returns whether it did.
	pub fn invalidate_if_other(&self, tariff: &TariffCode) -> bool {
		let mut guard = self.entry.write();

		if guard.as_ref().is_some_and(|entry| &entry.tariff_code != tariff) {
			*guard = None;

			return true;
		}

		false
	}

	/// Clone of the current entry.
	pub fn entry(&self) -> Option<CacheEntry> {
		self.entry.read().clone()
	}
}
