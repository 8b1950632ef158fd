//! Single-flight evaluation per series.
//!
//! At most one evaluation per [`SeriesKey`] runs at a time. A snapshot
//! submitted while its key is busy is parked; a later submission replaces
//! the parked one, so only the newest snapshot is evaluated next. Every
//! submission bumps the key's generation, which lets callers tell whether a
//! finished result is still current.
//!
//! The lock only guards bookkeeping and is never held while evaluating. A
//! [`Ticket`] dropped without [`Coordinator::complete`] (including by a
//! panicking evaluation) frees its key and discards the parked snapshot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::pipeline::SeriesKey;
use crate::series::MeasurementSeries;

/// Permission to evaluate one snapshot.
///
/// Hand it back through [`Coordinator::complete`]. Dropping it instead
/// releases the key without running the parked snapshot.
#[derive(Debug)]
#[must_use = "a ticket keeps its series busy until it is completed or dropped"]
pub struct Ticket<'c> {
    owner: &'c Coordinator,
    key: SeriesKey,
    generation: u64,
    series: MeasurementSeries,
    completed: bool,
}

impl Ticket<'_> {
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn series(&self) -> &MeasurementSeries {
        &self.series
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.owner.release(&self.key, self.generation);
        }
    }
}

/// Outcome of [`Coordinator::submit`].
#[derive(Debug)]
#[must_use]
pub enum Admission<'c> {
    /// Nothing was running for the key; evaluate now.
    Run(Ticket<'c>),
    /// An evaluation is in flight; the snapshot will run after it.
    Coalesced,
}

#[derive(Debug, Default)]
struct Slot {
    latest: u64,
    running: bool,
    pending: Option<MeasurementSeries>,
}

/// Tracks in-flight evaluations by series key.
#[derive(Debug, Default)]
pub struct Coordinator {
    slots: Mutex<HashMap<SeriesKey, Slot>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<SeriesKey, Slot>> {
        // Slots stay consistent even if a holder panicked.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ticket(&self, key: SeriesKey, generation: u64, series: MeasurementSeries) -> Ticket<'_> {
        Ticket {
            owner: self,
            key,
            generation,
            series,
            completed: false,
        }
    }

    /// Offers a new snapshot for `key`.
    pub fn submit(&self, key: SeriesKey, series: MeasurementSeries) -> Admission<'_> {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_default();
        slot.latest += 1;
        if slot.running {
            if slot.pending.replace(series).is_some() {
                debug!(%key, generation = slot.latest, "replaced pending snapshot");
            } else {
                debug!(%key, generation = slot.latest, "evaluation in flight, snapshot parked");
            }
            return Admission::Coalesced;
        }
        slot.running = true;
        let generation = slot.latest;
        drop(slots);
        Admission::Run(self.ticket(key, generation, series))
    }

    /// Finishes `ticket`'s evaluation and returns the parked snapshot to
    /// evaluate next, if any. The key stays busy while a ticket is out.
    pub fn complete<'c>(&'c self, mut ticket: Ticket<'c>) -> Option<Ticket<'c>> {
        ticket.completed = true;
        let mut slots = self.slots();
        let slot = slots.get_mut(&ticket.key)?;
        match slot.pending.take() {
            Some(series) => {
                let generation = slot.latest;
                drop(slots);
                Some(self.ticket(ticket.key.clone(), generation, series))
            }
            None => {
                slot.running = false;
                None
            }
        }
    }

    /// Frees a key whose ticket was dropped without being completed.
    fn release(&self, key: &SeriesKey, generation: u64) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(key) {
            slot.running = false;
            let discarded = slot.pending.take().is_some();
            warn!(%key, generation, discarded, "evaluation abandoned, key released");
        }
    }

    /// `false` once a newer snapshot has been submitted for the ticket's key.
    pub fn is_current(&self, ticket: &Ticket<'_>) -> bool {
        self.slots()
            .get(&ticket.key)
            .is_some_and(|slot| slot.latest == ticket.generation)
    }

    /// `true` while an evaluation for `key` is out.
    pub fn is_running(&self, key: &SeriesKey) -> bool {
        self.slots().get(key).is_some_and(|slot| slot.running)
    }

    /// Submits `series` and, if admitted, evaluates it and every snapshot
    /// coalesced behind it. Returns the result for the newest snapshot, or
    /// `None` when another caller is already evaluating `key` and will pick
    /// this snapshot up.
    ///
    /// If `evaluate` panics the key is released before the panic propagates.
    pub fn run<R>(
        &self,
        key: SeriesKey,
        series: MeasurementSeries,
        mut evaluate: impl FnMut(&MeasurementSeries) -> R,
    ) -> Option<R> {
        let Admission::Run(mut ticket) = self.submit(key, series) else {
            return None;
        };
        loop {
            let result = evaluate(ticket.series());
            match self.complete(ticket) {
                Some(next) => {
                    debug!(key = %next.key, generation = next.generation, "discarding stale result");
                    ticket = next;
                }
                None => return Some(result),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    fn key(m: &str) -> SeriesKey {
        SeriesKey::new(m, "diameter")
    }

    fn series(values: &[f64]) -> MeasurementSeries {
        MeasurementSeries::from_values(values).unwrap()
    }

    #[test]
    fn test_second_submit_is_coalesced() {
        let c = Coordinator::new();
        let Admission::Run(ticket) = c.submit(key("a"), series(&[1.0])) else {
            panic!("first submission must run");
        };
        assert!(matches!(c.submit(key("a"), series(&[1.0, 2.0])), Admission::Coalesced));
        assert!(!c.is_current(&ticket));
        assert!(c.is_running(&key("a")));
    }

    #[test]
    fn test_newest_pending_snapshot_wins() {
        let c = Coordinator::new();
        let Admission::Run(ticket) = c.submit(key("a"), series(&[1.0])) else {
            panic!("first submission must run");
        };
        assert!(matches!(c.submit(key("a"), series(&[1.0, 2.0])), Admission::Coalesced));
        assert!(matches!(c.submit(key("a"), series(&[1.0, 2.0, 3.0])), Admission::Coalesced));
        let next = c.complete(ticket).unwrap();
        assert_eq!(next.series().len(), 3);
        assert!(c.is_current(&next));
        assert!(c.complete(next).is_none());
        assert!(!c.is_running(&key("a")));
    }

    #[test]
    fn test_keys_are_independent() {
        let c = Coordinator::new();
        assert!(matches!(c.submit(key("a"), series(&[1.0])), Admission::Run(_)));
        assert!(matches!(c.submit(key("b"), series(&[1.0])), Admission::Run(_)));
    }

    #[test]
    fn test_dropped_ticket_releases_key() {
        let c = Coordinator::new();
        let Admission::Run(ticket) = c.submit(key("a"), series(&[1.0])) else {
            panic!("first submission must run");
        };
        assert!(matches!(c.submit(key("a"), series(&[1.0, 2.0])), Admission::Coalesced));
        drop(ticket);
        assert!(!c.is_running(&key("a")));
        assert!(matches!(c.submit(key("a"), series(&[1.0])), Admission::Run(_)));
    }

    #[test]
    fn test_panicking_evaluation_does_not_wedge_key() {
        let c = Coordinator::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            c.run(key("a"), series(&[1.0]), |_| -> usize { panic!("evaluation failed") })
        }));
        assert!(outcome.is_err());
        assert!(!c.is_running(&key("a")));
        assert_eq!(c.run(key("a"), series(&[1.0, 2.0]), |s| s.len()), Some(2));
    }

    #[test]
    fn test_run_returns_newest_result() {
        let c = Coordinator::new();
        let result = c.run(key("a"), series(&[1.0, 2.0]), |s| s.len());
        assert_eq!(result, Some(2));
        assert!(!c.is_running(&key("a")));
    }

    #[test]
    fn test_concurrent_submissions_never_overlap() {
        let c = Arc::new(Coordinator::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let c = Arc::clone(&c);
                let in_flight = Arc::clone(&in_flight);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let values: Vec<f64> = (0..=i).map(f64::from).collect();
                    c.run(key("shared"), series(&values), |_| {
                        let before = in_flight.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(before, 0, "two evaluations of one key overlapped");
                        thread::sleep(Duration::from_millis(2));
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        let finished = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Option::is_some)
            .count();
        assert!(finished >= 1);
        assert!(!c.is_running(&key("shared")));
    }
}
