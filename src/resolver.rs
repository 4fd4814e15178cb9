//! Postcode to region resolution with bounded retry and persisted lookup tables.
//!
//! Both outcomes of a remote lookup are cached permanently: valid mappings under
//! [`POSTCODE_REGIONS_KEY`] and unknown postcodes under [`INVALID_POSTCODES_KEY`]. Only
//! cancellation-class failures are retried; everything else propagates on the first attempt.

mod metrics;

pub use metrics::ResolverMetrics;

// self
use crate::{
	_prelude::*,
	config::{RatesConfig, RetryPolicy},
	error::RemoteError,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	rate::{Postcode, RegionCode},
	remote::{RatesApi, SupplyPointLookup},
	singleflight::SingleFlight,
	store::{SettingsStore, StoreError},
};

/// Settings key holding the JSON object of postcode → region mappings.
pub const POSTCODE_REGIONS_KEY: &str = "postcode_regions";
/// Settings key holding the JSON array of postcodes without a supply point.
pub const INVALID_POSTCODES_KEY: &str = "invalid_postcodes";

#[derive(Debug, Default)]
struct RegionTables {
	regions: BTreeMap<Postcode, RegionCode>,
	invalid: BTreeSet<Postcode>,
}

/// Resolves postcodes to provider regions.
///
/// Clones share the cached tables, the flight table, and the metrics.
pub struct RegionResolver<A>
where
	A: ?Sized + RatesApi,
{
	/// Remote API client.
	pub api: Arc<A>,
	/// Persistence for the cached tables.
	pub settings: Arc<dyn SettingsStore>,
	/// Shared lookup counters.
	pub metrics: Arc<ResolverMetrics>,
	tables: Arc<RwLock<RegionTables>>,
	flights: Arc<SingleFlight<Postcode, RegionCode, Error>>,
	retry: RetryPolicy,
}
impl<A> RegionResolver<A>
where
	A: 'static + ?Sized + RatesApi,
{
	/// Loads the cached tables from `settings` and builds a resolver.
	pub async fn load(
		settings: Arc<dyn SettingsStore>,
		api: impl Into<Arc<A>>,
		config: &RatesConfig,
	) -> Result<Self> {
		let regions = match settings.get(POSTCODE_REGIONS_KEY).await? {
			Some(raw) => decode_setting(POSTCODE_REGIONS_KEY, &raw)?,
			None => BTreeMap::new(),
		};
		let invalid = match settings.get(INVALID_POSTCODES_KEY).await? {
			Some(raw) => decode_setting(INVALID_POSTCODES_KEY, &raw)?,
			None => BTreeSet::new(),
		};

		Ok(Self {
			api: api.into(),
			settings,
			metrics: Default::default(),
			tables: Arc::new(RwLock::new(RegionTables { regions, invalid })),
			flights: Default::default(),
			retry: config.region_retry,
		})
	}

	/// Cached region for `postcode`, if any.
	pub fn cached_region(&self, postcode: &Postcode) -> Option<RegionCode> {
		self.tables.read().regions.get(postcode).cloned()
	}

	/// Whether `postcode` is cached as having no supply point.
	pub fn is_known_invalid(&self, postcode: &Postcode) -> bool {
		self.tables.read().invalid.contains(postcode)
	}

	/// Resolves raw postcode text to a region code.
	pub async fn resolve(&self, raw: &str) -> Result<RegionCode> {
		const KIND: OperationKind = OperationKind::RegionLookup;

		let Some(postcode) = Postcode::parse(raw) else {
			return Err(Error::InvalidPostcode { postcode: raw.trim().to_owned() });
		};

		if self.is_known_invalid(&postcode) {
			return Err(Error::InvalidPostcode { postcode: postcode.to_string() });
		}
		if let Some(region) = self.cached_region(&postcode) {
			return Ok(region);
		}

		let span = OperationSpan::new(KIND, "resolve");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);
		self.metrics.record_lookup();

		let this = self.clone();
		let key = postcode.clone();
		let flight = self.flights.execute(key, move || async move { this.lookup(postcode).await });
		let result = span.instrument(flight).await;

		obs::record_operation_outcome(
			KIND,
			if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure },
		);

		result
	}

	async fn lookup(&self, postcode: Postcode) -> Result<RegionCode> {
		let lookup = self.lookup_with_retry(&postcode).await?;
		let Some(point) = lookup.results.first() else {
			let snapshot = {
				let mut tables = self.tables.write();

				tables.invalid.insert(postcode.clone());

				encode_setting(&tables.invalid)
			};

			self.persist(INVALID_POSTCODES_KEY, snapshot).await;

			return Err(Error::InvalidPostcode { postcode: postcode.to_string() });
		};
		let region = RegionCode::from_group_id(&point.group_id).map_err(|e| {
			RemoteError::Decode { path: "results[0].group_id".into(), message: e.to_string() }
		})?;
		let snapshot = {
			let mut tables = self.tables.write();

			tables.regions.insert(postcode, region.clone());

			encode_setting(&tables.regions)
		};

		self.persist(POSTCODE_REGIONS_KEY, snapshot).await;

		Ok(region)
	}

	async fn lookup_with_retry(&self, postcode: &Postcode) -> Result<SupplyPointLookup> {
		let mut attempt = 1;

		loop {
			self.metrics.record_remote_attempt();

			match self.api.lookup_supply_points(postcode).await {
				Ok(lookup) => return Ok(lookup),
				Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
					self.metrics.record_retry();
					tokio::time::sleep(self.retry.backoff_after(attempt)).await;

					attempt += 1;
				},
				Err(e) => return Err(e.into()),
			}
		}
	}

	async fn persist(&self, key: &'static str, snapshot: Result<String, StoreError>) {
		let result = match snapshot {
			Ok(value) => self.settings.put(key, value).await,
			Err(e) => Err(e),
		};

		if let Err(e) = result {
			obs::warn_degraded("settings_persist", &key, &e);
		}
	}
}
impl<A> Clone for RegionResolver<A>
where
	A: ?Sized + RatesApi,
{
	fn clone(&self) -> Self {
		Self {
			api: Arc::clone(&self.api),
			settings: Arc::clone(&self.settings),
			metrics: Arc::clone(&self.metrics),
			tables: Arc::clone(&self.tables),
			flights: Arc::clone(&self.flights),
			retry: self.retry,
		}
	}
}
impl<A> Debug for RegionResolver<A>
where
	A: ?Sized + RatesApi,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let tables = self.tables.read();

		f.debug_struct("RegionResolver")
			.field("cached_regions", &tables.regions.len())
			.field("invalid_postcodes", &tables.invalid.len())
			.field("retry", &self.retry)
			.finish()
	}
}

/// Resolves `input`, or returns the default region when the input is blank.
pub async fn resolve_or_default<A>(resolver: &RegionResolver<A>, input: &str) -> Result<RegionCode>
where
	A: 'static + ?Sized + RatesApi,
{
	if input.trim().is_empty() {
		return Ok(RegionCode::fallback());
	}

	resolver.resolve(input).await
}

fn decode_setting<T>(key: &str, raw: &str) -> Result<T, StoreError>
where
	T: for<'de> Deserialize<'de>,
{
	serde_json::from_str(raw).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse setting `{key}`: {e}"),
	})
}

fn encode_setting<T>(value: &T) -> Result<String, StoreError>
where
	T: Serialize,
{
	serde_json::to_string(value).map_err(|e| StoreError::Serialization {
		message: format!("Failed to serialize setting: {e}"),
	})
}
