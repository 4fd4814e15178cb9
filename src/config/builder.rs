// self
use crate::{
	_prelude::*,
	config::{ApiEndpoints, RatesConfig, RetryPolicy},
	error::ConfigError,
	freshness::{CutoffSchedule, SufficiencyRule},
};

/// Builder for [`RatesConfig`] values.
#[derive(Debug)]
pub struct RatesConfigBuilder {
	/// Base URL of the rates API.
	pub base: Url,
	/// Per-request timeout.
	pub request_timeout: StdDuration,
	/// Publication schedule.
	pub schedule: CutoffSchedule,
	/// Region lookup retry policy.
	pub region_retry: RetryPolicy,
	/// Default lookback window.
	pub default_lookback: Duration,
	/// Retry delay reported to consumers after failures.
	pub failure_retry: Duration,
}
impl RatesConfigBuilder {
	/// Creates a new builder seeded with defaults and the provided base URL.
	pub fn new(base: Url) -> Self {
		Self {
			base,
			request_timeout: RatesConfig::DEFAULT_REQUEST_TIMEOUT,
			schedule: CutoffSchedule::default(),
			region_retry: RetryPolicy::default(),
			default_lookback: Duration::hours(24),
			failure_retry: Duration::minutes(5),
		}
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the whole publication schedule.
	pub fn schedule(mut self, schedule: CutoffSchedule) -> Self {
		self.schedule = schedule;

		self
	}

	/// Overrides the reference time zone.
	pub fn reference_zone(mut self, zone: Tz) -> Self {
		self.schedule.zone = zone;

		self
	}

	/// Overrides the local publication hour.
	pub fn cutoff_hour(mut self, hour: u32) -> Self {
		self.schedule.cutoff_hour = hour;

		self
	}

	/// Selects the sufficiency rule.
	pub fn sufficiency_rule(mut self, rule: SufficiencyRule) -> Self {
		self.schedule.rule = rule;

		self
	}

	/// Overrides the region lookup retry policy.
	pub fn region_retry(mut self, retry: RetryPolicy) -> Self {
		self.region_retry = retry;

		self
	}

	/// Overrides the default lookback window.
	pub fn default_lookback(mut self, lookback: Duration) -> Self {
		self.default_lookback = lookback;

		self
	}

	/// Overrides the failure retry delay.
	pub fn failure_retry(mut self, delay: Duration) -> Self {
		self.failure_retry = delay;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<RatesConfig, ConfigError> {
		let endpoints = ApiEndpoints { base: normalize_base(self.base)? };
		let config = RatesConfig {
			endpoints,
			request_timeout: self.request_timeout,
			schedule: self.schedule,
			region_retry: self.region_retry,
			default_lookback: self.default_lookback,
			failure_retry: self.failure_retry,
		};

		config.validate()?;

		Ok(config)
	}
}

impl RatesConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.request_timeout.is_zero() {
			return Err(ConfigError::NonPositiveDuration { field: "request timeout" });
		}
		if self.region_retry.max_attempts == 0 {
			return Err(ConfigError::ZeroRetryAttempts);
		}
		if self.default_lookback <= Duration::zero() {
			return Err(ConfigError::NonPositiveDuration { field: "default lookback" });
		}
		if self.failure_retry <= Duration::zero() {
			return Err(ConfigError::NonPositiveDuration { field: "failure retry delay" });
		}

		self.schedule.validate()
	}
}

fn normalize_base(mut base: Url) -> Result<Url, ConfigError> {
	if !matches!(base.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { url: base.to_string() });
	}
	if base.cannot_be_a_base() {
		return Err(ConfigError::CannotBeABase { url: base.to_string() });
	}
	if !base.path().ends_with('/') {
		let path = format!("{}/", base.path());

		base.set_path(&path);
	}

	base.set_query(None);
	base.set_fragment(None);

	Ok(base)
}
