//! Storage contracts and built-in store implementations for price records and settings.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// std
use std::ops::Bound;
// self
use crate::{
	_prelude::*,
	rate::{PriceRecord, TariffCode, TimeWindow},
};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable price record storage keyed by `(tariff_code, valid_from)`.
pub trait RecordStore
where
	Self: Send + Sync,
{
	/// Inserts or replaces records by key; repeating an upsert is a no-op.
	fn upsert(&self, records: Vec<PriceRecord>) -> StoreFuture<'_, ()>;

	/// Returns the tariff's records overlapping `window`, ordered by `valid_from`.
	fn query<'a>(
		&'a self,
		tariff: &'a TariffCode,
		window: TimeWindow,
	) -> StoreFuture<'a, Vec<PriceRecord>>;
}

/// Plain string key/value persistence.
pub trait SettingsStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes `value` under `key`, replacing any previous value.
	fn put<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;
}

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// In-process record and settings tables shared by the built-in stores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Snapshot", into = "Snapshot")]
pub(crate) struct StoreState {
	records: BTreeMap<TariffCode, BTreeMap<DateTime<Utc>, PriceRecord>>,
	settings: BTreeMap<String, String>,
}
impl StoreState {
	pub(crate) fn upsert(&mut self, records: Vec<PriceRecord>) {
		for record in records {
			self.records
				.entry(record.tariff_code.clone())
				.or_default()
				.insert(record.valid_from, record);
		}
	}

	pub(crate) fn query(&self, tariff: &TariffCode, window: TimeWindow) -> Vec<PriceRecord> {
		let Some(table) = self.records.get(tariff) else {
			return Vec::new();
		};
		let upper = window.end.map_or(Bound::Unbounded, Bound::Excluded);

		table
			.range((Bound::Unbounded, upper))
			.map(|(_, record)| record)
			.filter(|record| record.overlaps(&window))
			.cloned()
			.collect()
	}

	pub(crate) fn get(&self, key: &str) -> Option<String> {
		self.settings.get(key).cloned()
	}

	pub(crate) fn put(&mut self, key: &str, value: String) {
		self.settings.insert(key.to_owned(), value);
	}
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
	#[serde(default)]
	records: Vec<PriceRecord>,
	#[serde(default)]
	settings: BTreeMap<String, String>,
}
impl From<Snapshot> for StoreState {
	fn from(snapshot: Snapshot) -> Self {
		let mut state = Self { records: BTreeMap::new(), settings: snapshot.settings };

		state.upsert(snapshot.records);

		state
	}
}
impl From<StoreState> for Snapshot {
	fn from(state: StoreState) -> Self {
		let records = state.records.into_values().flat_map(BTreeMap::into_values).collect();

		Self { records, settings: state.settings }
	}
}
