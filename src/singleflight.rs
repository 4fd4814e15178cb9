//! Keyed single-flight coordination.
//!
//! At most one unit of work runs per key at a time. Callers that arrive while a flight is active
//! join it and observe the identical `Result`, errors included. The work runs on its own tokio
//! task, so it completes even when every caller stops waiting, and it removes its own table entry
//! when it settles. The next caller for the key always starts fresh work.

// std
use std::{
	panic,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinError;
// self
use crate::_prelude::*;

/// Shared handle to an in-flight unit of work.
pub type FlightFuture<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

type FlightTable<K, T, E> = Arc<Mutex<HashMap<K, Flight<T, E>>>>;

struct Flight<T, E> {
	id: u64,
	future: FlightFuture<T, E>,
}

// Clears the table entry when the task ends, including on panic or runtime shutdown.
struct Settle<K, T, E>
where
	K: Eq + Hash,
{
	table: FlightTable<K, T, E>,
	key: K,
	id: u64,
}
impl<K, T, E> Drop for Settle<K, T, E>
where
	K: Eq + Hash,
{
	fn drop(&mut self) {
		let mut flights = self.table.lock();

		if flights.get(&self.key).is_some_and(|flight| flight.id == self.id) {
			flights.remove(&self.key);
		}
	}
}

/// Per-key deduplication of concurrent asynchronous work.
pub struct SingleFlight<K, T, E> {
	flights: FlightTable<K, T, E>,
	next_id: AtomicU64,
}
impl<K, T, E> SingleFlight<K, T, E>
where
	K: 'static + Send + Clone + Eq + Hash,
	T: 'static + Send + Sync + Clone,
	E: 'static + Send + Sync + Clone + From<JoinError>,
{
	/// Creates an empty flight table.
	pub fn new() -> Self {
		Self { flights: Arc::new(Mutex::new(HashMap::new())), next_id: AtomicU64::new(0) }
	}

	/// Joins the flight for `key`, starting one with `producer` if none is active.
	///
	/// Must be called inside a tokio runtime. The producer is spawned immediately; the returned
	/// handle only observes its result, so dropping any caller, the initiator included, never
	/// stops or stalls the work. A task cancelled by runtime shutdown surfaces as `E::from`.
	pub fn execute<F, Fut>(&self, key: K, producer: F) -> FlightFuture<T, E>
	where
		F: 'static + Send + FnOnce() -> Fut,
		Fut: 'static + Send + Future<Output = Result<T, E>>,
	{
		let mut flights = self.flights.lock();

		if let Some(flight) = flights.get(&key) {
			return flight.future.clone();
		}

		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let settle = Settle { table: Arc::clone(&self.flights), key: key.clone(), id };
		// The task blocks on the table lock until the entry below is inserted.
		let handle = tokio::spawn(async move {
			let _settle = settle;

			producer().await
		});
		let future = async move {
			match handle.await {
				Ok(result) => result,
				Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
				Err(e) => Err(E::from(e)),
			}
		}
		.boxed()
		.shared();

		flights.insert(key, Flight { id, future: future.clone() });

		future
	}

	/// Whether a flight is currently registered for `key`.
	pub fn is_in_flight(&self, key: &K) -> bool {
		self.flights.lock().contains_key(key)
	}

	/// Number of registered flights.
	pub fn in_flight_len(&self) -> usize {
		self.flights.lock().len()
	}
}
impl<K, T, E> Default for SingleFlight<K, T, E>
where
	K: 'static + Send + Clone + Eq + Hash,
	T: 'static + Send + Sync + Clone,
	E: 'static + Send + Sync + Clone + From<JoinError>,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, T, E> Debug for SingleFlight<K, T, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("SingleFlight").field("in_flight", &self.flights.lock().len()).finish()
	}
}
