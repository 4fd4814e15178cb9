//! Validated runtime configuration shared by the repository, resolver, and HTTP client.
//!
//! Values are assembled through [`RatesConfigBuilder`] so every invariant (base URL shape, hour
//! ranges, positive durations) is checked once at construction time and the resulting
//! [`RatesConfig`] can be cloned freely.

/// Builder API for assembling configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError, freshness::CutoffSchedule};

/// Endpoint set exposed by the rates API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiEndpoints {
	/// Base URL; always ends with `/` so relative joins keep its path.
	pub base: Url,
}
impl ApiEndpoints {
	/// Relative path of the rates listing.
	pub const RATES: &'static str = "rates";
	/// Relative path of the postcode lookup.
	pub const GRID_SUPPLY_POINTS: &'static str = "grid-supply-points";

	/// Absolute URL of the rates listing.
	pub fn rates(&self) -> Result<Url, ConfigError> {
		self.join(Self::RATES)
	}

	/// Absolute URL of the postcode lookup.
	pub fn grid_supply_points(&self) -> Result<Url, ConfigError> {
		self.join(Self::GRID_SUPPLY_POINTS)
	}

	fn join(&self, endpoint: &'static str) -> Result<Url, ConfigError> {
		self.base.join(endpoint).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
	}
}

/// Bounded linear backoff used for region lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	/// Delay multiplied by the attempt number between attempts.
	pub base_backoff: StdDuration,
}
impl RetryPolicy {
	/// Creates a validated retry policy.
	pub fn new(max_attempts: u32, base_backoff: StdDuration) -> Result<Self, ConfigError> {
		if max_attempts == 0 {
			return Err(ConfigError::ZeroRetryAttempts);
		}

		Ok(Self { max_attempts, base_backoff })
	}

	/// Delay to wait after the given (1-based) failed attempt.
	pub fn backoff_after(&self, attempt: u32) -> StdDuration {
		self.base_backoff.saturating_mul(attempt)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_attempts: 3, base_backoff: StdDuration::from_secs(1) }
	}
}

/// Immutable configuration consumed by the broker components.
#[derive(Clone, Debug, PartialEq)]
pub struct RatesConfig {
	/// Remote API endpoints.
	pub endpoints: ApiEndpoints,
	/// Per-request timeout applied by the HTTP client.
	pub request_timeout: StdDuration,
	/// Publication schedule driving freshness decisions.
	pub schedule: CutoffSchedule,
	/// Retry policy for region lookups.
	pub region_retry: RetryPolicy,
	/// Lookback window used when a request does not specify one.
	pub default_lookback: Duration,
	/// How soon consumers should retry after a failed fetch.
	pub failure_retry: Duration,
}
impl RatesConfig {
	/// Default per-request timeout.
	pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates a new builder for the provided base URL.
	pub fn builder(base: Url) -> RatesConfigBuilder {
		RatesConfigBuilder::new(base)
	}
}
