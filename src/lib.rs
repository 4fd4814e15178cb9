//! Freshness-aware electricity rate cache: cutoff-driven staleness rules, singleflight fetch
//! coordination, and a cache → store → remote cascade in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod config;
pub mod error;
pub mod freshness;
#[cfg(feature = "reqwest")] pub mod http;
pub mod obs;
pub mod rate;
pub mod remote;
pub mod repository;
pub mod resolver;
pub mod singleflight;
pub mod snapshot;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
	pub use chrono_tz::Tz;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use chrono_tz;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;

#[cfg(test)] use httpmock as _;
