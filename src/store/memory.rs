//! Thread-safe in-memory [`RecordStore`] and [`SettingsStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	rate::{PriceRecord, TariffCode, TimeWindow},
	store::{RecordStore, SettingsStore, StoreFuture, StoreState},
};

type StoreMap = Arc<RwLock<StoreState>>;

/// Storage backend that keeps records and settings in-process.
///
/// Clones share the same tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Creates a store pre-populated with `records`.
	pub fn with_records(records: Vec<PriceRecord>) -> Self {
		let store = Self::default();

		store.0.write().upsert(records);

		store
	}
}
impl RecordStore for MemoryStore {
	fn upsert(&self, records: Vec<PriceRecord>) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().upsert(records);

			Ok(())
		})
	}

	fn query<'a>(
		&'a self,
		tariff: &'a TariffCode,
		window: TimeWindow,
	) -> StoreFuture<'a, Vec<PriceRecord>> {
		let map = self.0.clone();
		let tariff = tariff.to_owned();

		Box::pin(async move { Ok(map.read().query(&tariff, window)) })
	}
}
impl SettingsStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key)) })
	}

	fn put<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().put(key, value);

			Ok(())
		})
	}
}
