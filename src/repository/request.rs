// self
use crate::{_prelude::*, rate::TariffCode};

/// Which tiers a cascade may consult.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
	/// Cache, then store, then remote.
	#[default]
	Cascade,
	/// Cache and store only; never touches the network.
	LocalOnly,
	/// Skips cache and store and always fetches.
	ForceRemote,
}

/// Parameters for [`RateRepository::rates`](crate::repository::RateRepository::rates).
#[derive(Clone, Debug, PartialEq)]
pub struct RatesRequest {
	/// Tariff whose records are requested.
	pub tariff_code: TariffCode,
	/// Lookback window; `None` uses the configured default.
	pub lookback: Option<Duration>,
	/// Instant every freshness decision is made against.
	pub now: DateTime<Utc>,
	/// Tier selection.
	pub mode: FetchMode,
}
impl RatesRequest {
	/// Creates a cascade request with the default lookback.
	pub fn new(tariff_code: TariffCode, now: DateTime<Utc>) -> Self {
		Self { tariff_code, lookback: None, now, mode: FetchMode::default() }
	}

	/// Overrides the lookback window.
	pub fn with_lookback(mut self, lookback: Duration) -> Self {
		self.lookback = Some(lookback);

		self
	}

	/// Overrides the fetch mode.
	pub fn with_mode(mut self, mode: FetchMode) -> Self {
		self.mode = mode;

		self
	}
}
