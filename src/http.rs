//! Reqwest-backed [`RatesApi`] implementation.
//!
//! Requests carry a per-request timeout taken from [`RatesConfig::request_timeout`]. Non-success
//! statuses surface as [`RemoteError::Status`] with a bounded body preview, and JSON bodies are
//! decoded through `serde_path_to_error` so failures report the offending path.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::RatesConfig,
	error::{ConfigError, RemoteError},
	rate::{Postcode, PriceRecord, TariffCode},
	remote::{RatesApi, RemoteFuture, SupplyPointLookup},
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// HTTP client for the provider's rates API.
#[derive(Clone, Debug)]
pub struct ReqwestRatesClient {
	client: ReqwestClient,
	rates_url: Url,
	supply_points_url: Url,
	timeout: StdDuration,
}
impl ReqwestRatesClient {
	/// Builds a client with its own connection pool.
	pub fn new(config: &RatesConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(config.request_timeout).build()?;

		Self::with_client(client, config)
	}

	/// Wraps an existing reqwest client, e.g. one shared with the rest of the application.
	pub fn with_client(client: ReqwestClient, config: &RatesConfig) -> Result<Self, ConfigError> {
		Ok(Self {
			client,
			rates_url: config.endpoints.rates()?,
			supply_points_url: config.endpoints.grid_supply_points()?,
			timeout: config.request_timeout,
		})
	}

	async fn get_json<T>(&self, mut url: Url, param: (&str, &str)) -> Result<T, RemoteError>
	where
		T: DeserializeOwned,
	{
		url.query_pairs_mut().append_pair(param.0, param.1);

		let response = self.client.get(url).timeout(self.timeout).send().await?;
		let status = response.status();
		let bytes = response.bytes().await?;

		if !status.is_success() {
			return Err(RemoteError::Status {
				status: status.as_u16(),
				body: body_preview(&String::from_utf8_lossy(&bytes)),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer).map_err(RemoteError::decode)
	}
}
impl RatesApi for ReqwestRatesClient {
	fn fetch_rates<'a>(&'a self, tariff: &'a TariffCode) -> RemoteFuture<'a, Vec<PriceRecord>> {
		Box::pin(async move {
			let region = tariff.region();
			let rows: Vec<RateRow> =
				self.get_json(self.rates_url.clone(), ("region", region.as_ref())).await?;

			into_records(tariff, rows)
		})
	}

	fn lookup_supply_points<'a>(
		&'a self,
		postcode: &'a Postcode,
	) -> RemoteFuture<'a, SupplyPointLookup> {
		Box::pin(async move {
			self.get_json(self.supply_points_url.clone(), ("postcode", postcode.as_ref())).await
		})
	}
}

/// Wire shape of one rate row.
#[derive(Debug, Deserialize)]
struct RateRow {
	valid_from: DateTime<Utc>,
	valid_to: DateTime<Utc>,
	value_exc_vat: f64,
	value_inc_vat: f64,
}

fn into_records(tariff: &TariffCode, rows: Vec<RateRow>) -> Result<Vec<PriceRecord>, RemoteError> {
	rows.into_iter()
		.enumerate()
		.map(|(idx, row)| {
			PriceRecord::new(
				tariff.clone(),
				row.valid_from,
				row.valid_to,
				row.value_exc_vat,
				row.value_inc_vat,
			)
			.map_err(|e| RemoteError::Decode { path: format!("[{idx}]"), message: e.to_string() })
		})
		.collect()
}

fn body_preview(body: &str) -> String {
	let body = body.trim();

	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf: String = body.chars().take(BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}
