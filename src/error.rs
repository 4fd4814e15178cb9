//! Broker-level error types shared across the cascade, the resolver, and the stores.

// crates.io
use tokio::task::JoinError;
// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Every variant is cheap to clone so a single failed fetch can be handed to all callers that
/// joined it.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport or decoding failure from the remote rates API.
	#[error("Remote fetch failed: {0}")]
	FetchFailed(
		#[from]
		#[source]
		RemoteError,
	),

	/// Caller supplied an empty or malformed tariff code.
	#[error("Tariff code is invalid: {reason}")]
	InvalidTariffCode {
		/// Validation failure summary.
		reason: String,
	},
	/// Cache, store, and remote were all consulted without reaching sufficiency.
	#[error("No sufficient price data is available for tariff {tariff}.")]
	NoDataAvailable {
		/// Tariff code the request was made for.
		tariff: String,
	},
	/// The local store held records for the tariff but they do not cover the expected window.
	#[error("Locally stored price data for tariff {tariff} is incomplete.")]
	LocalDataIncomplete {
		/// Tariff code the request was made for.
		tariff: String,
	},
	/// The postcode has no matching grid supply point.
	#[error("Postcode `{postcode}` has no matching grid supply point.")]
	InvalidPostcode {
		/// Normalized postcode text.
		postcode: String,
	},
}
impl Error {
	/// Converts a tariff identifier validation failure into [`Error::InvalidTariffCode`].
	pub fn invalid_tariff(e: crate::rate::IdentifierError) -> Self {
		Self::InvalidTariffCode { reason: e.to_string() }
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Base URL uses a scheme other than `http`/`https`.
	#[error("The rates API base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a path (e.g. `mailto:`).
	#[error("The rates API base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// URL that failed validation.
		url: String,
	},
	/// An endpoint path could not be joined onto the base URL.
	#[error("Endpoint `{endpoint}` could not be joined onto the base URL.")]
	InvalidEndpoint {
		/// Relative endpoint path.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Hour values must fall within a single day.
	#[error("The {field} must be between 0 and 23, got {hour}.")]
	HourOutOfRange {
		/// Which setting failed validation.
		field: &'static str,
		/// Rejected hour.
		hour: u32,
	},
	/// Durations that must be positive were zero or negative.
	#[error("The {field} must be positive.")]
	NonPositiveDuration {
		/// Which setting failed validation.
		field: &'static str,
	},
	/// Retry policies need at least one attempt.
	#[error("Retry policy must allow at least one attempt.")]
	ZeroRetryAttempts,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures surfaced by [`RatesApi`](crate::remote::RatesApi) implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RemoteError {
	/// The request was cancelled before a response arrived.
	#[error("Request to the rates API was cancelled.")]
	Cancelled,
	/// The request exceeded its per-request timeout.
	#[error("Request to the rates API timed out.")]
	Timeout,
	/// Connection-level failure (DNS, TCP, TLS).
	#[error("Network error while calling the rates API: {message}.")]
	Network {
		/// Transport-specific failure summary.
		message: String,
	},
	/// Request could not be built or sent for a non-network reason.
	#[error("Request to the rates API could not be sent: {message}.")]
	Request {
		/// Failure summary.
		message: String,
	},
	/// The API answered with a non-success status.
	#[error("Rates API returned HTTP {status}: {body}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body preview.
		body: String,
	},
	/// The response body could not be decoded into the expected shape.
	#[error("Rates API response could not be decoded at `{path}`: {message}.")]
	Decode {
		/// JSON path at which decoding failed.
		path: String,
		/// Decoder message.
		message: String,
	},
}
impl RemoteError {
	/// Whether the failure belongs to the cancellation class that region lookups retry.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Cancelled | Self::Timeout)
	}

	/// Builds a [`RemoteError::Decode`] from a path-aware serde failure.
	pub fn decode(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Decode { path: e.path().to_string(), message: e.inner().to_string() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for RemoteError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout
		} else if e.is_builder() || e.is_redirect() {
			Self::Request { message: e.to_string() }
		} else if e.is_decode() || e.is_body() {
			Self::Decode { path: ".".into(), message: e.to_string() }
		} else {
			Self::Network { message: e.to_string() }
		}
	}
}
impl From<JoinError> for Error {
	fn from(_: JoinError) -> Self {
		Self::FetchFailed(RemoteError::Cancelled)
	}
}
