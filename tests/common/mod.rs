//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
pub use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};

// crates.io
pub use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Europe::London;
use serde_json::{Value, json};
// self
pub use rates_broker::{
	config::{RatesConfig, RetryPolicy},
	error::{Error, RemoteError},
	rate::{PriceRecord, TariffCode},
	url::Url,
};

pub const TARIFF: &str = "E-1R-AGILE-24-10-01-C";

/// Instant at the given London wall-clock time.
pub fn london(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
	London
		.with_ymd_and_hms(y, m, d, h, min, 0)
		.single()
		.expect("London fixture instant should be unambiguous.")
		.with_timezone(&Utc)
}

pub fn tariff() -> TariffCode {
	TariffCode::new(TARIFF).expect("Tariff fixture should be valid.")
}

pub fn tariff_for(region: char) -> TariffCode {
	TariffCode::new(format!("E-1R-AGILE-24-10-01-{region}"))
		.expect("Regional tariff fixture should be valid.")
}

/// Half-hour slots covering `[from, until)`.
pub fn half_hour_slots(
	tariff: &TariffCode,
	from: DateTime<Utc>,
	until: DateTime<Utc>,
) -> Vec<PriceRecord> {
	let mut records = Vec::new();
	let mut start = from;
	let mut value = 10.0;

	while start < until {
		let end = start + Duration::minutes(30);

		records.push(
			PriceRecord::new(tariff.clone(), start, end, value, value * 1.05)
				.expect("Half-hour slot fixture should be valid."),
		);
		start = end;
		value += 0.5;
	}

	records
}

/// Wire body returned by the rates endpoint for `records`.
pub fn rates_body(records: &[PriceRecord]) -> String {
	let rows: Vec<Value> = records
		.iter()
		.map(|record| {
			json!({
				"valid_from": record.valid_from.to_rfc3339(),
				"valid_to": record.valid_to.to_rfc3339(),
				"value_exc_vat": record.value_excl_tax,
				"value_inc_vat": record.value_incl_tax,
			})
		})
		.collect();

	Value::Array(rows).to_string()
}

/// Configuration pointing at `base` with fast region retries.
pub fn config_for(base: &str) -> RatesConfig {
	let base = Url::parse(base).expect("Mock base URL should parse.");

	RatesConfig::builder(base)
		.request_timeout(StdDuration::from_secs(5))
		.region_retry(
			RetryPolicy::new(3, StdDuration::from_millis(5))
				.expect("Fast retry policy should validate."),
		)
		.build()
		.expect("Test configuration should validate.")
}
