//! Publication-schedule freshness rules.
//!
//! The provider publishes the next day's prices at a fixed local cutoff hour (16:00
//! `Europe/London` by default), and each publication extends coverage to 23:00 local on the
//! following day. Everything here is a pure function of an injected `now`, so boundary behavior
//! can be exercised deterministically.
//!
//! When zone arithmetic cannot produce an instant (a local time that falls in a DST gap), the
//! policy fails towards refetching: record sets are reported insufficient and refreshes are
//! scheduled one hour out.

// self
use crate::{_prelude::*, cache::CacheEntry, error::ConfigError, rate::PriceRecord};

/// How a record set is judged to reach the expected publication boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SufficiencyRule {
	/// Some record's `valid_to` reaches the expected coverage end.
	#[default]
	EndCoverage,
	/// Some record's `valid_from` lies within the tolerance of the expected coverage end.
	StartTolerance,
}

/// Fixed daily publication schedule in a reference time zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutoffSchedule {
	/// Reference zone the provider publishes in.
	pub zone: Tz,
	/// Local hour at which the next period's prices are published.
	pub cutoff_hour: u32,
	/// Local hour at which each publication's coverage ends.
	pub coverage_end_hour: u32,
	/// Tolerance used by [`SufficiencyRule::StartTolerance`].
	pub tolerance: Duration,
	/// Active sufficiency rule.
	pub rule: SufficiencyRule,
}
impl CutoffSchedule {
	/// Validates hour ranges and the tolerance.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.cutoff_hour > 23 {
			return Err(ConfigError::HourOutOfRange {
				field: "cutoff hour",
				hour: self.cutoff_hour,
			});
		}
		if self.coverage_end_hour > 23 {
			return Err(ConfigError::HourOutOfRange {
				field: "coverage end hour",
				hour: self.coverage_end_hour,
			});
		}
		if self.tolerance < Duration::zero() {
			return Err(ConfigError::NonPositiveDuration { field: "sufficiency tolerance" });
		}

		Ok(())
	}
}
impl Default for CutoffSchedule {
	fn default() -> Self {
		Self {
			zone: chrono_tz::Europe::London,
			cutoff_hour: 16,
			coverage_end_hour: 23,
			tolerance: Duration::minutes(30),
			rule: SufficiencyRule::EndCoverage,
		}
	}
}

/// Stateless freshness decisions over a [`CutoffSchedule`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FreshnessPolicy {
	schedule: CutoffSchedule,
}
impl FreshnessPolicy {
	/// Creates a policy for the provided schedule.
	pub fn new(schedule: CutoffSchedule) -> Self {
		Self { schedule }
	}

	/// Schedule backing the policy.
	pub fn schedule(&self) -> &CutoffSchedule {
		&self.schedule
	}

	/// Instant through which published prices are expected to exist at `now`.
	///
	/// Before the cutoff this is the coverage end hour today; from the cutoff onwards it is the
	/// coverage end hour tomorrow. Returns `None` if that local time does not exist.
	pub fn expected_coverage_end(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
		let local = now.with_timezone(&self.schedule.zone);
		let today = local.date_naive();
		let target =
			if local.hour() < self.schedule.cutoff_hour { today } else { today.succ_opt()? };

		self.local_instant(target, self.schedule.coverage_end_hour)
	}

	/// Whether `records` reach the expected publication boundary at `now`.
	pub fn is_sufficient(&self, records: &[PriceRecord], now: DateTime<Utc>) -> bool {
		let Some(end) = self.expected_coverage_end(now) else {
			return false;
		};

		match self.schedule.rule {
			SufficiencyRule::EndCoverage => records.iter().any(|record| record.valid_to >= end),
			SufficiencyRule::StartTolerance => records
				.iter()
				.any(|record| (record.valid_from - end).abs() <= self.schedule.tolerance),
		}
	}

	/// Whether a cache entry may still be served at `now`.
	///
	/// Once post-cutoff data has been fetched it stays valid until the next day's cutoff; data
	/// fetched before a cutoff expires at that cutoff.
	pub fn is_entry_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
		let local = now.with_timezone(&self.schedule.zone);
		let today = local.date_naive();
		let fetched_on = self.local_date(entry.fetched_at);

		if local.hour() >= self.schedule.cutoff_hour {
			entry.fetched_after_cutoff && fetched_on == today
		} else {
			fetched_on == today
				|| (entry.fetched_after_cutoff && today.pred_opt() == Some(fetched_on))
		}
	}

	/// Next instant at which new prices are expected to be published.
	pub fn next_refresh_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
		let local = now.with_timezone(&self.schedule.zone);
		let today = local.date_naive();
		let target =
			if local.hour() < self.schedule.cutoff_hour { Some(today) } else { today.succ_opt() };

		target
			.and_then(|date| self.local_instant(date, self.schedule.cutoff_hour))
			.unwrap_or_else(|| now + Duration::hours(1))
	}

	/// Whether `instant` falls at or after the cutoff hour on its local day.
	pub fn is_after_cutoff(&self, instant: DateTime<Utc>) -> bool {
		instant.with_timezone(&self.schedule.zone).hour() >= self.schedule.cutoff_hour
	}

	fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
		instant.with_timezone(&self.schedule.zone).date_naive()
	}

	fn local_instant(&self, date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
		let naive = date.and_hms_opt(hour, 0, 0)?;

		self.schedule
			.zone
			.from_local_datetime(&naive)
			.earliest()
			.map(|instant| instant.with_timezone(&Utc))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use chrono_tz::{America::Sao_Paulo, Europe::London};
	// self
	use super::*;
	use crate::rate::TariffCode;

	fn london(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
		London
			.with_ymd_and_hms(y, m, d, h, min, 0)
			.single()
			.expect("London fixture instant should be unambiguous.")
			.with_timezone(&Utc)
	}

	fn tariff() -> TariffCode {
		TariffCode::new("E-1R-AGILE-24-10-01-C").expect("Tariff fixture should be valid.")
	}

	fn slot_ending(end: DateTime<Utc>) -> PriceRecord {
		PriceRecord::new(tariff(), end - Duration::minutes(30), end, 12.0, 12.6)
			.expect("Slot fixture should be valid.")
	}

	fn entry(fetched_at: DateTime<Utc>, policy: &FreshnessPolicy) -> CacheEntry {
		CacheEntry {
			tariff_code: tariff(),
			records: Vec::new(),
			fetched_at,
			fetched_after_cutoff: policy.is_after_cutoff(fetched_at),
			next_refresh_at: policy.next_refresh_at(fetched_at),
		}
	}

	#[test]
	fn coverage_end_switches_at_the_cutoff() {
		let policy = FreshnessPolicy::default();

		// BST (UTC+1).
		assert_eq!(
			policy.expected_coverage_end(london(2024, 10, 15, 15, 59)),
			Some(london(2024, 10, 15, 23, 0))
		);
		assert_eq!(
			policy.expected_coverage_end(london(2024, 10, 15, 16, 0)),
			Some(london(2024, 10, 16, 23, 0))
		);
		// GMT (UTC+0).
		assert_eq!(
			policy.expected_coverage_end(london(2024, 12, 10, 0, 0)),
			Some(Utc.with_ymd_and_hms(2024, 12, 10, 23, 0, 0).unwrap())
		);
		assert_eq!(
			policy.expected_coverage_end(london(2024, 12, 10, 23, 59)),
			Some(Utc.with_ymd_and_hms(2024, 12, 11, 23, 0, 0).unwrap())
		);
	}

	#[test]
	fn coverage_end_holds_for_every_quarter_hour() {
		let policy = FreshnessPolicy::default();

		for minutes in (0..24 * 60).step_by(15) {
			let now = london(2024, 10, 15, 0, 0) + Duration::minutes(minutes);
			let expected = if minutes < 16 * 60 {
				london(2024, 10, 15, 23, 0)
			} else {
				london(2024, 10, 16, 23, 0)
			};

			assert_eq!(policy.expected_coverage_end(now), Some(expected), "now = {now}");
		}
	}

	#[test]
	fn coverage_end_crosses_the_spring_transition() {
		let policy = FreshnessPolicy::default();
		// Clocks go forward on 2024-03-31, so 23:00 that day is 22:00 UTC.
		let end = policy
			.expected_coverage_end(london(2024, 3, 30, 17, 0))
			.expect("Coverage end should exist across the transition.");

		assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 31, 22, 0, 0).unwrap());
	}

	#[test]
	fn end_coverage_rule_compares_valid_to() {
		let policy = FreshnessPolicy::default();
		let before_cutoff = london(2024, 10, 15, 15, 59);
		let after_cutoff = london(2024, 10, 15, 16, 1);
		let today = vec![slot_ending(london(2024, 10, 15, 23, 0))];

		assert!(policy.is_sufficient(&today, before_cutoff));
		assert!(!policy.is_sufficient(&today, after_cutoff));
		assert!(!policy.is_sufficient(&[], before_cutoff));

		let short = vec![slot_ending(london(2024, 10, 15, 22, 30))];

		assert!(!policy.is_sufficient(&short, before_cutoff));
	}

	#[test]
	fn start_tolerance_rule_accepts_nearby_slots() {
		let policy = FreshnessPolicy::new(CutoffSchedule {
			rule: SufficiencyRule::StartTolerance,
			..CutoffSchedule::default()
		});
		let now = london(2024, 10, 15, 12, 0);
		// Last slot starts at 22:30, inside the 30 minute tolerance.
		let today = vec![slot_ending(london(2024, 10, 15, 23, 0))];
		let early = vec![slot_ending(london(2024, 10, 15, 22, 0))];

		assert!(policy.is_sufficient(&today, now));
		assert!(!policy.is_sufficient(&early, now));
	}

	#[test]
	fn entries_fetched_after_cutoff_last_until_the_next_cutoff() {
		let policy = FreshnessPolicy::default();
		let fetched = entry(london(2024, 10, 15, 16, 30), &policy);

		assert!(fetched.fetched_after_cutoff);
		assert!(policy.is_entry_fresh(&fetched, london(2024, 10, 15, 23, 59)));
		assert!(policy.is_entry_fresh(&fetched, london(2024, 10, 16, 0, 1)));
		assert!(policy.is_entry_fresh(&fetched, london(2024, 10, 16, 15, 59)));
		assert!(!policy.is_entry_fresh(&fetched, london(2024, 10, 16, 16, 0)));
	}

	#[test]
	fn entries_fetched_before_cutoff_expire_at_the_cutoff() {
		let policy = FreshnessPolicy::default();
		let fetched = entry(london(2024, 10, 15, 9, 0), &policy);

		assert!(!fetched.fetched_after_cutoff);
		assert!(policy.is_entry_fresh(&fetched, london(2024, 10, 15, 15, 59)));
		assert!(!policy.is_entry_fresh(&fetched, london(2024, 10, 15, 16, 0)));
		assert!(!policy.is_entry_fresh(&fetched, london(2024, 10, 16, 9, 0)));
	}

	#[test]
	fn entries_older_than_a_day_are_never_fresh() {
		let policy = FreshnessPolicy::default();

		for fetched_hour in [0, 9, 15, 16, 20, 23] {
			let fetched = entry(london(2024, 10, 13, fetched_hour, 0), &policy);

			for now_hour in [0, 9, 15, 16, 20, 23] {
				assert!(!policy.is_entry_fresh(&fetched, london(2024, 10, 15, now_hour, 0)));
			}

			let mut forced = fetched.clone();

			forced.fetched_after_cutoff = !forced.fetched_after_cutoff;

			assert!(!policy.is_entry_fresh(&forced, london(2024, 10, 15, 10, 0)));
		}
	}

	#[test]
	fn next_refresh_targets_the_upcoming_cutoff() {
		let policy = FreshnessPolicy::default();

		assert_eq!(policy.next_refresh_at(london(2024, 10, 15, 9, 0)), london(2024, 10, 15, 16, 0));
		assert_eq!(
			policy.next_refresh_at(london(2024, 10, 15, 16, 0)),
			london(2024, 10, 16, 16, 0)
		);
		assert_eq!(
			policy.next_refresh_at(london(2024, 12, 31, 18, 0)),
			london(2025, 1, 1, 16, 0)
		);
	}

	#[test]
	fn missing_local_times_fail_towards_refetching() {
		// Brazil entered DST at 00:00 on 2018-11-04, so that local midnight never existed.
		let policy = FreshnessPolicy::new(CutoffSchedule {
			zone: Sao_Paulo,
			cutoff_hour: 0,
			coverage_end_hour: 0,
			..CutoffSchedule::default()
		});
		let now = Sao_Paulo
			.with_ymd_and_hms(2018, 11, 3, 12, 0, 0)
			.single()
			.expect("Sao Paulo fixture instant should be unambiguous.")
			.with_timezone(&Utc);
		let far_future = slot_ending(now + Duration::days(7));

		assert_eq!(policy.expected_coverage_end(now), None);
		assert!(!policy.is_sufficient(&[far_future], now));
		assert_eq!(policy.next_refresh_at(now), now + Duration::hours(1));
	}

	#[test]
	fn schedule_validation_rejects_out_of_range_hours() {
		let schedule = CutoffSchedule { coverage_end_hour: 24, ..CutoffSchedule::default() };

		assert!(matches!(
			schedule.validate(),
			Err(ConfigError::HourOutOfRange { field: "coverage end hour", hour: 24 })
		));
	}
}
