//! Remote rates API contract.
//!
//! The repository and resolver only ever talk to [`RatesApi`]; the reqwest-backed
//! implementation lives in [`crate::http`] behind the `reqwest` feature, and tests substitute
//! scripted fakes.

// self
use crate::{
	_prelude::*,
	error::RemoteError,
	rate::{Postcode, PriceRecord, TariffCode},
};

/// Boxed future returned by [`RatesApi`] operations.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + 'a + Send>>;

/// Stateless client for the provider's rates and postcode endpoints.
pub trait RatesApi
where
	Self: Send + Sync,
{
	/// Fetches every currently published record for the tariff's region.
	fn fetch_rates<'a>(&'a self, tariff: &'a TariffCode) -> RemoteFuture<'a, Vec<PriceRecord>>;

	/// Looks up the grid supply points matching a normalized postcode.
	fn lookup_supply_points<'a>(
		&'a self,
		postcode: &'a Postcode,
	) -> RemoteFuture<'a, SupplyPointLookup>;
}

/// Response body of the grid supply point lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyPointLookup {
	/// Number of matches reported by the API.
	#[serde(default)]
	pub count: u32,
	/// Matching supply points.
	#[serde(default)]
	pub results: Vec<SupplyPoint>,
}

/// One grid supply point; `group_id` carries the region letter, e.g. `_C`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyPoint {
	/// Provider group identifier.
	pub group_id: String,
}
