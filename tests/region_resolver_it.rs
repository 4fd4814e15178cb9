mod common;

// std
use std::collections::VecDeque;
// crates.io
use futures::future;
use parking_lot::Mutex;
// self
use common::*;
use rates_broker::{
	rate::Postcode,
	remote::{RatesApi, RemoteFuture, SupplyPoint, SupplyPointLookup},
	resolver::{INVALID_POSTCODES_KEY, POSTCODE_REGIONS_KEY, RegionResolver, resolve_or_default},
	store::{MemoryStore, SettingsStore},
};

/// Replays scripted lookup outcomes, then keeps answering with the last one.
struct ScriptedApi {
	script: Mutex<VecDeque<Result<SupplyPointLookup, RemoteError>>>,
	fallback: Result<SupplyPointLookup, RemoteError>,
	calls: AtomicUsize,
}
impl ScriptedApi {
	fn new(script: Vec<Result<SupplyPointLookup, RemoteError>>) -> Self {
		let fallback = script.last().cloned().unwrap_or_else(|| Ok(lookup(&[])));

		Self { script: Mutex::new(script.into()), fallback, calls: AtomicUsize::new(0) }
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl RatesApi for ScriptedApi {
	fn fetch_rates<'a>(&'a self, _tariff: &'a TariffCode) -> RemoteFuture<'a, Vec<PriceRecord>> {
		Box::pin(async { Ok(Vec::new()) })
	}

	fn lookup_supply_points<'a>(
		&'a self,
		_postcode: &'a Postcode,
	) -> RemoteFuture<'a, SupplyPointLookup> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let next = self
			.script
			.lock()
			.pop_front()
			.unwrap_or_else(|| self.fallback.clone());

		Box::pin(async move {
			tokio::time::sleep(StdDuration::from_millis(10)).await;

			next
		})
	}
}

fn lookup(group_ids: &[&str]) -> SupplyPointLookup {
	SupplyPointLookup {
		count: group_ids.len() as u32,
		results: group_ids.iter().map(|id| SupplyPoint { group_id: (*id).into() }).collect(),
	}
}

async fn build_resolver(
	settings: MemoryStore,
	api: ScriptedApi,
) -> RegionResolver<ScriptedApi> {
	let config = config_for("https://rates.example.com/");

	RegionResolver::<ScriptedApi>::load(Arc::new(settings), api, &config)
		.await
		.expect("Resolver should load from settings.")
}

#[tokio::test]
async fn cancellations_are_retried_within_budget() {
	let api = ScriptedApi::new(vec![
		Err(RemoteError::Cancelled),
		Err(RemoteError::Cancelled),
		Ok(lookup(&["_C"])),
	]);
	let settings = MemoryStore::default();
	let resolver = build_resolver(settings.clone(), api).await;
	let region = resolver.resolve("sw1a 1aa").await.expect("Third attempt should succeed.");

	assert_eq!(&*region, "C");
	assert_eq!(resolver.api.calls(), 3);
	assert_eq!(resolver.metrics.retries(), 2);

	let persisted = settings
		.get(POSTCODE_REGIONS_KEY)
		.await
		.expect("Settings read should succeed.")
		.expect("Resolved mapping should be persisted.");

	assert_eq!(persisted, r#"{"SW1A 1AA":"C"}"#);
}

#[tokio::test]
async fn exhausted_budget_surfaces_the_last_cancellation() {
	let api = ScriptedApi::new(vec![Err(RemoteError::Cancelled)]);
	let resolver = build_resolver(MemoryStore::default(), api).await;
	let err = resolver.resolve("SW1A 1AA").await.expect_err("Three cancellations must fail.");

	assert!(matches!(err, Error::FetchFailed(RemoteError::Cancelled)));
	assert_eq!(resolver.api.calls(), 3);
}

#[tokio::test]
async fn other_failures_are_not_retried() {
	let api = ScriptedApi::new(vec![Err(RemoteError::Status { status: 500, body: "boom".into() })]);
	let resolver = build_resolver(MemoryStore::default(), api).await;
	let err = resolver.resolve("SW1A 1AA").await.expect_err("Server errors must propagate.");

	assert!(matches!(err, Error::FetchFailed(RemoteError::Status { status: 500, .. })));
	assert_eq!(resolver.api.calls(), 1);
}

#[tokio::test]
async fn cached_regions_skip_the_network() {
	let settings = MemoryStore::default();

	settings
		.put(POSTCODE_REGIONS_KEY, r#"{"SW1A 1AA":"C"}"#.into())
		.await
		.expect("Seeding regions should succeed.");

	let resolver = build_resolver(settings, ScriptedApi::new(Vec::new())).await;
	let region = resolver.resolve("  sw1a 1aa ").await.expect("Cached postcode should resolve.");

	assert_eq!(&*region, "C");
	assert_eq!(resolver.api.calls(), 0);
}

#[tokio::test]
async fn unknown_postcodes_are_cached_as_invalid() {
	let settings = MemoryStore::default();
	let resolver = build_resolver(settings.clone(), ScriptedApi::new(vec![Ok(lookup(&[]))])).await;
	let err = resolver.resolve("ZZ1 1ZZ").await.expect_err("Unknown postcodes must fail.");

	assert!(matches!(err, Error::InvalidPostcode { ref postcode } if postcode == "ZZ1 1ZZ"));

	let again = resolver.resolve("zz1 1zz").await.expect_err("Cached invalid postcodes must fail.");

	assert!(matches!(again, Error::InvalidPostcode { .. }));
	assert_eq!(resolver.api.calls(), 1);

	let persisted =
		settings.get(INVALID_POSTCODES_KEY).await.expect("Settings read should succeed.");

	assert_eq!(persisted.as_deref(), Some(r#"["ZZ1 1ZZ"]"#));

	// A freshly loaded resolver sees the persisted set.
	let reloaded = build_resolver(settings, ScriptedApi::new(Vec::new())).await;

	assert!(reloaded.resolve("ZZ1 1ZZ").await.is_err());
	assert_eq!(reloaded.api.calls(), 0);
}

#[tokio::test]
async fn concurrent_resolutions_share_one_lookup() {
	let resolver =
		build_resolver(MemoryStore::default(), ScriptedApi::new(vec![Ok(lookup(&["_C"]))])).await;
	let results =
		future::join_all((0..6).map(|_| resolver.resolve("SW1A 1AA"))).await;

	assert!(results.iter().all(|result| result.as_ref().ok().map(|region| &**region) == Some("C")));
	assert_eq!(resolver.api.calls(), 1);
	assert_eq!(resolver.metrics.lookups(), 6);
}

#[tokio::test]
async fn blank_input_defaults_without_lookup() {
	let resolver = build_resolver(MemoryStore::default(), ScriptedApi::new(Vec::new())).await;
	let region = resolve_or_default(&resolver, "").await.expect("Blank input should default.");

	assert_eq!(&*region, "H");
	assert_eq!(resolver.api.calls(), 0);
}

#[cfg(feature = "reqwest")]
#[tokio::test]
async fn reqwest_client_decodes_group_ids() {
	// crates.io
	use httpmock::prelude::*;
	// self
	use rates_broker::http::ReqwestRatesClient;

	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/grid-supply-points").query_param("postcode", "SW1A 1AA");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"count":1,"results":[{"group_id":"_C"}]}"#);
		})
		.await;
	let config = config_for(&server.url("/"));
	let client = ReqwestRatesClient::new(&config).expect("Client should build.");
	let resolver = RegionResolver::<ReqwestRatesClient>::load(
		Arc::new(MemoryStore::default()),
		client,
		&config,
	)
	.await
	.expect("Resolver should load from empty settings.");
	let region = resolver.resolve("sw1a 1aa").await.expect("Mock lookup should resolve.");

	mock.assert_async().await;

	assert_eq!(&*region, "C");
}
