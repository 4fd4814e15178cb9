//! Renderable view of a repository result for UI and widget consumers.

// self
use crate::{
	_prelude::*,
	config::RatesConfig,
	freshness::FreshnessPolicy,
	rate::{PriceRecord, current_record},
	repository::{RateSet, RateSource},
};

/// Whether a snapshot carries data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotStatus {
	/// Records were served from the given tier.
	Fresh(RateSource),
	/// The repository failed; the message is suitable for display.
	Unavailable(String),
}

/// Current and upcoming rates plus the instant a consumer should ask again.
#[derive(Clone, Debug, PartialEq)]
pub struct RateSnapshot {
	/// Record whose interval contains `now`.
	pub current: Option<PriceRecord>,
	/// Records starting after `now`, ordered by `valid_from`.
	pub upcoming: Vec<PriceRecord>,
	/// When the consumer should refresh.
	pub next_refresh_at: DateTime<Utc>,
	/// Data availability.
	pub status: SnapshotStatus,
}
impl RateSnapshot {
	/// Builds a snapshot from a repository result.
	///
	/// Successful results refresh at the earlier of the current slot's end and the next
	/// publication; failures retry after [`RatesConfig::failure_retry`].
	pub fn from_result(result: &Result<RateSet>, now: DateTime<Utc>, config: &RatesConfig) -> Self {
		match result {
			Ok(set) => {
				let current = current_record(&set.records, now).cloned();
				let mut upcoming: Vec<PriceRecord> =
					set.records.iter().filter(|record| record.valid_from > now).cloned().collect();

				upcoming.sort_by_key(|record| record.valid_from);

				let publication = FreshnessPolicy::new(config.schedule).next_refresh_at(now);
				let next_refresh_at = current
					.as_ref()
					.map_or(publication, |record| record.valid_to.min(publication));

				let status = SnapshotStatus::Fresh(set.source);

				Self { current, upcoming, next_refresh_at, status }
			},
			Err(e) => Self {
				current: None,
				upcoming: Vec::new(),
				next_refresh_at: now + config.failure_retry,
				status: SnapshotStatus::Unavailable(e.to_string()),
			},
		}
	}

	/// Whether a current rate is available.
	pub fn has_current(&self) -> bool {
		self.current.is_some()
	}
}
