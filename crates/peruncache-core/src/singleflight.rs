//! Per-key coalescing of concurrent cache fills.
//!
//! When several callers miss on the same key at once, only one of them
//! (the pilot) executes the expensive fill; everyone else blocks on the
//! flight's completion signal and receives the pilot's result. This keeps
//! a thundering herd on one key from stampeding the origin.
//!
//! The coordinator's mutex is held only across index operations, never
//! across the work itself.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

/// One in-flight fill: a one-shot completion signal plus the eventual
/// result. At most one packet exists per key at any instant.
struct Packet<T> {
    result: Mutex<Option<Result<T>>>,
    done: Condvar,
}

impl<T> Packet<T> {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Result<T>
    where
        T: Clone,
    {
        let mut slot = self.result.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut slot);
        }
    }
}

/// Per-key duplicate-call suppressor.
pub struct Flight<T> {
    flights: Mutex<HashMap<String, Arc<Packet<T>>>>,
}

impl<T> Default for Flight<T> {
    fn default() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> Flight<T> {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` for `key`, coalescing with any in-flight call.
    ///
    /// The first caller for a key becomes the pilot and executes `work`;
    /// callers arriving while the flight is outstanding block and receive
    /// the pilot's result (errors included, verbatim). The flight record
    /// is removed once the pilot completes, so a caller arriving after
    /// that starts a fresh flight.
    ///
    /// If `work` panics, waiters are still released (with
    /// [`Error::Internal`]) and the record is still removed; the panic
    /// propagates to the pilot's caller.
    pub fn fly<F>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let (packet, is_pilot) = {
            let mut flights = self.flights.lock();
            match flights.get(key) {
                Some(packet) => (Arc::clone(packet), false),
                None => {
                    let packet = Arc::new(Packet::new());
                    flights.insert(key.to_string(), Arc::clone(&packet));
                    (packet, true)
                }
            }
        };

        if !is_pilot {
            return packet.wait();
        }

        let guard = CompletionGuard {
            flight: self,
            key: key.to_string(),
            packet,
        };
        let result = work();
        guard.publish(result)
    }

    /// Number of outstanding flights. Test-only visibility.
    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }
}

/// Publishes the pilot's result on every exit path.
///
/// Dropping without an explicit publish (the pilot panicked) stores an
/// [`Error::Internal`] so waiters are never left blocked. The drop also
/// removes the flight record, which ends the coalescing window.
struct CompletionGuard<'a, T> {
    flight: &'a Flight<T>,
    key: String,
    packet: Arc<Packet<T>>,
}

impl<T: Clone> CompletionGuard<'_, T> {
    fn publish(self, result: Result<T>) -> Result<T> {
        {
            let mut slot = self.packet.result.lock();
            *slot = Some(result.clone());
        }
        result
        // Drop runs here: waiters are notified, the record is removed.
    }
}

impl<T> Drop for CompletionGuard<'_, T> {
    fn drop(&mut self) {
        {
            let mut slot = self.packet.result.lock();
            if slot.is_none() {
                *slot = Some(Err(Error::internal(format!(
                    "flight for '{}' aborted before completing",
                    self.key
                ))));
            }
        }
        self.packet.done.notify_all();
        self.flight.flights.lock().remove(&self.key);
    }
}
