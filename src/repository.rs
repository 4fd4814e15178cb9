//! Rate repository: the cache → store → remote cascade behind a per-tariff single flight.
//!
//! [`RateRepository::rates`] joins (or starts) the flight for the requested tariff. Inside the
//! flight the cascade runs strictly in order:
//!
//! 1. a cache entry for another tariff is dropped;
//! 2. a fresh and sufficient cache entry is served without I/O;
//! 3. stored records covering the lookback window are served when sufficient, and a store read
//!    failure counts as insufficient;
//! 4. the remote API is called, its records upserted, and the window re-queried. If the store
//!    write or re-read fails the fetched records themselves are evaluated.
//!
//! Every caller receives the flight's result re-filtered to its own lookback window.
//! `LocalOnly` requests fly separately from network-capable ones, so a default caller never
//! inherits a local-only failure.

mod metrics;
mod request;

pub use metrics::RepositoryMetrics;
pub use request::*;

// self
use crate::{
	_prelude::*,
	cache::RateCache,
	config::RatesConfig,
	freshness::FreshnessPolicy,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	rate::{PriceRecord, TariffCode, TimeWindow},
	remote::RatesApi,
	singleflight::SingleFlight,
	store::RecordStore,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestRatesClient};

type FlightKey = (TariffCode, bool);

#[cfg(feature = "reqwest")]
/// Repository specialized for the crate's reqwest-backed API client.
pub type ReqwestRateRepository = RateRepository<ReqwestRatesClient>;

/// Tier that served a cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
	/// In-memory cache entry.
	Cache,
	/// Persistent record store.
	Store,
	/// Remote rates API.
	Remote,
}
impl RateSource {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RateSource::Cache => "cache",
			RateSource::Store => "store",
			RateSource::Remote => "remote",
		}
	}
}
impl Display for RateSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records returned by the repository, ordered by `valid_from`.
#[derive(Clone, Debug, PartialEq)]
pub struct RateSet {
	/// Tariff the records belong to.
	pub tariff_code: TariffCode,
	/// Records overlapping the requested window.
	pub records: Vec<PriceRecord>,
	/// Tier that served them.
	pub source: RateSource,
}
impl RateSet {
	/// Narrows the set to records overlapping `window`.
	pub fn within(self, window: TimeWindow) -> Self {
		let records = self.records.into_iter().filter(|record| record.overlaps(&window)).collect();

		Self { records, ..self }
	}
}

/// Orchestrating façade over the cache, the record store, and the remote API.
///
/// Clones share the cache, the flight table, and the metrics.
pub struct RateRepository<A>
where
	A: ?Sized + RatesApi,
{
	/// Remote API client.
	pub api: Arc<A>,
	/// Persistent record store.
	pub store: Arc<dyn RecordStore>,
	/// Shared cascade counters.
	pub metrics: Arc<RepositoryMetrics>,
	cache: Arc<RateCache>,
	flights: Arc<SingleFlight<FlightKey, RateSet, Error>>,
	policy: FreshnessPolicy,
	default_lookback: Duration,
}
impl<A> RateRepository<A>
where
	A: 'static + ?Sized + RatesApi,
{
	/// Creates a repository over the provided store and API client.
	pub fn new(store: Arc<dyn RecordStore>, api: impl Into<Arc<A>>, config: &RatesConfig) -> Self {
		let policy = FreshnessPolicy::new(config.schedule);

		Self {
			api: api.into(),
			store,
			metrics: Default::default(),
			cache: Arc::new(RateCache::new(policy)),
			flights: Default::default(),
			policy,
			default_lookback: config.default_lookback,
		}
	}

	/// Shared in-memory cache.
	pub fn cache(&self) -> &RateCache {
		&self.cache
	}

	/// Whether a cascade is currently running for `tariff`, in any mode.
	pub fn is_in_flight(&self, tariff: &TariffCode) -> bool {
		[false, true]
			.into_iter()
			.any(|local_only| self.flights.is_in_flight(&(tariff.clone(), local_only)))
	}

	/// Returns records for the request, running or joining the tariff's cascade.
	pub async fn rates(&self, request: RatesRequest) -> Result<RateSet> {
		const KIND: OperationKind = OperationKind::Rates;

		let span = OperationSpan::new(KIND, "rates");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);
		self.metrics.record_request();

		let window = self.window_for(&request);
		let key = (request.tariff_code.clone(), request.mode == FetchMode::LocalOnly);
		let this = self.clone();
		let flight = self.flights.execute(key, move || async move { this.cascade(request).await });
		let result = span.instrument(flight).await;

		match result {
			Ok(set) => {
				obs::record_operation_outcome(KIND, OperationOutcome::Success);

				Ok(set.within(window))
			},
			Err(e) => {
				obs::record_operation_outcome(KIND, OperationOutcome::Failure);
				self.metrics.record_failure();

				Err(e)
			},
		}
	}

	/// Validates raw tariff text and runs the default cascade.
	pub async fn rates_for(
		&self,
		tariff: &str,
		lookback_hours: u32,
		now: DateTime<Utc>,
	) -> Result<RateSet> {
		let tariff_code = TariffCode::new(tariff).map_err(Error::invalid_tariff)?;
		let request = RatesRequest::new(tariff_code, now)
			.with_lookback(Duration::hours(i64::from(lookback_hours)));

		self.rates(request).await
	}

	fn window_for(&self, request: &RatesRequest) -> TimeWindow {
		TimeWindow::lookback(request.now, request.lookback.unwrap_or(self.default_lookback))
	}

	async fn cascade(&self, request: RatesRequest) -> Result<RateSet> {
		let window = self.window_for(&request);
		let RatesRequest { tariff_code: tariff, now, mode, .. } = request;

		self.cache.invalidate_if_other(&tariff);

		if mode != FetchMode::ForceRemote {
			if let Some(records) = self.cache.lookup(&tariff, window, now) {
				self.metrics.record_cache_hit();

				return Ok(self.served(tariff, records, RateSource::Cache));
			}

			let stored = match self.store.query(&tariff, window).await {
				Ok(records) => records,
				Err(e) => {
					obs::warn_degraded("store_read", &tariff, &e);

					Vec::new()
				},
			};

			if !stored.is_empty() && self.policy.is_sufficient(&stored, now) {
				self.metrics.record_store_hit();
				self.cache.store(tariff.clone(), stored.clone(), now);

				return Ok(self.served(tariff, stored, RateSource::Store));
			}
			if mode == FetchMode::LocalOnly {
				let tariff = tariff.to_string();

				return Err(if stored.is_empty() {
					Error::NoDataAvailable { tariff }
				} else {
					Error::LocalDataIncomplete { tariff }
				});
			}
		}

		self.metrics.record_remote_fetch();

		let fetched = self.api.fetch_rates(&tariff).await?;
		let records = self.persist_and_requery(&tariff, fetched, window).await;

		if !self.policy.is_sufficient(&records, now) {
			return Err(Error::NoDataAvailable { tariff: tariff.to_string() });
		}

		self.cache.store(tariff.clone(), records.clone(), now);

		Ok(self.served(tariff, records, RateSource::Remote))
	}

	async fn persist_and_requery(
		&self,
		tariff: &TariffCode,
		fetched: Vec<PriceRecord>,
		window: TimeWindow,
	) -> Vec<PriceRecord> {
		if let Err(e) = self.store.upsert(fetched.clone()).await {
			obs::warn_degraded("store_write", tariff, &e);

			return window.filter(&fetched);
		}

		match self.store.query(tariff, window).await {
			Ok(records) => records,
			Err(e) => {
				obs::warn_degraded("store_read", tariff, &e);

				window.filter(&fetched)
			},
		}
	}

	fn served(&self, tariff: TariffCode, records: Vec<PriceRecord>, source: RateSource) -> RateSet {
		obs::debug_source(&tariff, source.as_str());
		obs::record_rate_source(source);

		RateSet { tariff_code: tariff, records, source }
	}
}
#[cfg(feature = "reqwest")]
impl RateRepository<ReqwestRatesClient> {
	/// Creates a repository that provisions its own reqwest-backed API client.
	pub fn from_config(
		store: Arc<dyn RecordStore>,
		config: &RatesConfig,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(store, ReqwestRatesClient::new(config)?, config))
	}
}
impl<A> Clone for RateRepository<A>
where
	A: ?Sized + RatesApi,
{
	fn clone(&self) -> Self {
		Self {
			api: Arc::clone(&self.api),
			store: Arc::clone(&self.store),
			metrics: Arc::clone(&self.metrics),
			cache: Arc::clone(&self.cache),
			flights: Arc::clone(&self.flights),
			policy: self.policy,
			default_lookback: self.default_lookback,
		}
	}
}
impl<A> Debug for RateRepository<A>
where
	A: ?Sized + RatesApi,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateRepository")
			.field("policy", &self.policy)
			.field("default_lookback", &self.default_lookback)
			.field("cached", &self.cache.entry().map(|entry| entry.tariff_code))
			.finish()
	}
}
