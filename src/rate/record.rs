//! Immutable price record structs and time-window helpers.

// self
use crate::{_prelude::*, rate::TariffCode};

/// Errors produced while constructing a [`PriceRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum PriceRecordError {
	/// The validity interval is empty or inverted.
	#[error("Price record must end after it starts ({valid_from} >= {valid_to}).")]
	InvalidInterval {
		/// Validity start.
		valid_from: DateTime<Utc>,
		/// Validity end.
		valid_to: DateTime<Utc>,
	},
}

/// One published unit rate for a half-open validity interval `[valid_from, valid_to)`.
///
/// Records are uniquely identified by `(tariff_code, valid_from)` and never overlap for a single
/// tariff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedRecord")]
pub struct PriceRecord {
	/// Tariff the rate belongs to.
	pub tariff_code: TariffCode,
	/// Inclusive start of the validity interval.
	pub valid_from: DateTime<Utc>,
	/// Exclusive end of the validity interval.
	pub valid_to: DateTime<Utc>,
	/// Unit rate excluding tax.
	pub value_excl_tax: f64,
	/// Unit rate including tax.
	pub value_incl_tax: f64,
}
impl PriceRecord {
	/// Creates a record after checking that the interval is non-empty.
	pub fn new(
		tariff_code: TariffCode,
		valid_from: DateTime<Utc>,
		valid_to: DateTime<Utc>,
		value_excl_tax: f64,
		value_incl_tax: f64,
	) -> Result<Self, PriceRecordError> {
		if valid_to <= valid_from {
			return Err(PriceRecordError::InvalidInterval { valid_from, valid_to });
		}

		Ok(Self { tariff_code, valid_from, valid_to, value_excl_tax, value_incl_tax })
	}

	/// Returns `true` if the instant falls inside `[valid_from, valid_to)`.
	pub fn contains(&self, instant: DateTime<Utc>) -> bool {
		self.valid_from <= instant && instant < self.valid_to
	}

	/// Returns `true` if the record overlaps the window.
	pub fn overlaps(&self, window: &TimeWindow) -> bool {
		self.valid_to > window.start && window.end.is_none_or(|end| self.valid_from < end)
	}
}
impl TryFrom<UncheckedRecord> for PriceRecord {
	type Error = PriceRecordError;

	fn try_from(raw: UncheckedRecord) -> Result<Self, Self::Error> {
		Self::new(
			raw.tariff_code,
			raw.valid_from,
			raw.valid_to,
			raw.value_excl_tax,
			raw.value_incl_tax,
		)
	}
}

#[derive(Deserialize)]
struct UncheckedRecord {
	tariff_code: TariffCode,
	valid_from: DateTime<Utc>,
	valid_to: DateTime<Utc>,
	value_excl_tax: f64,
	value_incl_tax: f64,
}

/// Query window over record validity intervals; `end == None` leaves it open-ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
	/// Inclusive lower bound compared against `valid_to`.
	pub start: DateTime<Utc>,
	/// Optional exclusive upper bound compared against `valid_from`.
	pub end: Option<DateTime<Utc>>,
}
impl TimeWindow {
	/// Open-ended window starting at `start`.
	pub fn since(start: DateTime<Utc>) -> Self {
		Self { start, end: None }
	}

	/// Window looking back `lookback` from `now`, open towards the future.
	pub fn lookback(now: DateTime<Utc>, lookback: Duration) -> Self {
		Self::since(now - lookback)
	}

	/// Bounded window.
	pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
		Self { start, end: Some(end) }
	}

	/// Returns records overlapping the window, ordered by `valid_from`.
	pub fn filter<'a, I>(&self, records: I) -> Vec<PriceRecord>
	where
		I: IntoIterator<Item = &'a PriceRecord>,
	{
		let mut kept: Vec<PriceRecord> =
			records.into_iter().filter(|record| record.overlaps(self)).cloned().collect();

		kept.sort_by_key(|record| record.valid_from);

		kept
	}
}

/// Returns the record whose interval contains `now`, if any.
pub fn current_record(records: &[PriceRecord], now: DateTime<Utc>) -> Option<&PriceRecord> {
	records.iter().find(|record| record.contains(now))
}
