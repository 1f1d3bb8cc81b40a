use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Sequence number handed out when a poll starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Latest polled value, guarded so a slow, older poll cannot overwrite the
/// result of a newer one.
#[derive(Debug)]
pub struct Snapshot<T> {
    issued: AtomicU64,
    state: RwLock<(u64, T)>,
}

impl<T: Clone> Snapshot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            issued: AtomicU64::new(0),
            state: RwLock::new((0, initial)),
        }
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Stores `value` if `ticket` is newer than the last applied one.
    pub fn apply(&self, ticket: Ticket, value: T) -> bool {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if ticket.0 <= state.0 {
            return false;
        }
        *state = (ticket.0, value);
        true
    }

    pub fn get(&self) -> T {
        match self.state.read() {
            Ok(state) => state.1.clone(),
            Err(poisoned) => poisoned.into_inner().1.clone(),
        }
    }

    pub fn applied(&self) -> u64 {
        match self.state.read() {
            Ok(state) => state.0,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

impl<T: Clone + Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The single outstanding fetch of a poller. Dropping it aborts the fetch.
#[derive(Debug, Default)]
struct InFlight(Option<JoinHandle<()>>);

impl InFlight {
    /// Aborts the previous fetch if it is still running, then tracks `next`.
    fn replace(&mut self, next: JoinHandle<()>) -> bool {
        let superseded = match self.0.take() {
            Some(previous) if !previous.is_finished() => {
                previous.abort();
                true
            }
            _ => false,
        };
        self.0 = Some(next);
        superseded
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

/// Re-runs `fetch` every `period`, storing results into `snapshot`. Each run is
/// spawned so a hung upstream call does not hold back the next tick; at most one
/// run is outstanding, and a run still pending when the next tick fires is
/// cancelled. Aborting the returned handle also cancels the outstanding run.
pub fn spawn_poller<T, F, Fut>(
    name: &'static str,
    period: Duration,
    snapshot: Arc<Snapshot<T>>,
    fetch: F,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut in_flight = InFlight::default();
        loop {
            interval.tick().await;
            let ticket = snapshot.begin();
            let target = Arc::clone(&snapshot);
            let poll = fetch();
            let handle = tokio::spawn(async move {
                let value = poll.await;
                if !target.apply(ticket, value) {
                    debug!(poller = name, ?ticket, "Dropped stale poll result");
                }
            });
            if in_flight.replace(handle) {
                debug!(poller = name, ?ticket, "Cancelled poll still pending at next tick");
            }
        }
    })
}
