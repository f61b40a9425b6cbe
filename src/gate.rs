//! Capacity gate — a counting permit pool bounding buffer occupancy.
//!
//! One permit is acquired per write (blocking, deadline-aware) and released
//! per item read out.  At every quiescent point the available permits equal
//! `capacity − occupied`.
//!
//! The pool is never rebuilt: a live-resize applies the capacity change as a
//! **signed delta** to this one gate, so a release can never target a stale
//! pool.  `avail` is signed because a shrink with permits still outstanding
//! can push it below zero; `acquire` simply waits while `avail <= 0`.
//!
//! While the gate is paused (resize draining in-flight writers), `acquire`
//! waits even if permits are free.  Releases always use `notify_all`: waiters
//! woken spuriously re-check and re-sleep, and no waiter is ever stranded
//! behind a `notify_one` that went to a thread whose deadline had passed.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::BufferError;

struct GateState {
    /// Permit ceiling.  Tracks the buffer's capacity.
    capacity: i64,
    /// Permits currently grantable.  May be negative after a shrink while
    /// permits are outstanding.
    avail: i64,
    /// While set, no new permits are granted.
    paused: bool,
}

/// Counting permit pool with timeout-aware blocking acquisition.
pub(crate) struct CapacityGate {
    state: Mutex<GateState>,
    cv: Condvar,
}

impl CapacityGate {
    /// Creates a gate with `capacity` permits available.
    pub(crate) fn new(capacity: usize) -> Self {
        CapacityGate {
            state: Mutex::new(GateState {
                capacity: capacity as i64,
                avail: capacity as i64,
                paused: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// Acquires one permit, blocking until one is free or `timeout` elapses.
    ///
    /// Never partially acquires: on [`BufferError::AcquireTimeout`] the gate
    /// is exactly as it was.
    pub(crate) fn acquire_timeout(&self, timeout: Duration) -> Result<(), BufferError> {
        let deadline = Instant::now() + timeout;
        let mut st = self.state.lock();
        while st.avail <= 0 || st.paused {
            if self.cv.wait_until(&mut st, deadline).timed_out() {
                // A release may have landed between the last check and the
                // deadline firing; take the permit if so.
                if st.avail > 0 && !st.paused {
                    break;
                }
                return Err(BufferError::AcquireTimeout);
            }
        }
        st.avail -= 1;
        Ok(())
    }

    /// Returns `n` permits and wakes every waiter.
    pub(crate) fn release(&self, n: usize) {
        let mut st = self.state.lock();
        st.avail += n as i64;
        debug_assert!(
            st.avail <= st.capacity,
            "gate over-release: avail {} > capacity {}",
            st.avail,
            st.capacity
        );
        drop(st);
        self.cv.notify_all();
    }

    /// Applies a capacity change in place.
    ///
    /// Both the ceiling and the available count shift by `delta`, so permits
    /// already granted stay accounted for across the change.
    pub(crate) fn resize_by(&self, delta: i64) {
        let mut st = self.state.lock();
        st.capacity += delta;
        st.avail += delta;
        debug_assert!(st.capacity > 0, "gate capacity must stay positive");
        drop(st);
        self.cv.notify_all();
    }

    /// Stops granting permits until [`unpause`](Self::unpause).
    pub(crate) fn pause(&self) {
        self.state.lock().paused = true;
    }

    /// Resumes granting permits.
    pub(crate) fn unpause(&self) {
        self.state.lock().paused = false;
        self.cv.notify_all();
    }

    /// Snapshot of grantable permits (clamped at zero).  May be stale by the
    /// time the caller looks at it.
    pub(crate) fn available(&self) -> usize {
        self.state.lock().avail.max(0) as usize
    }

    /// Raw signed available count, negative while a shrink has permits
    /// outstanding.  Used by resize for in-flight accounting.
    pub(crate) fn balance(&self) -> i64 {
        self.state.lock().avail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn acquire_and_release_round_trip() {
        let gate = CapacityGate::new(3);
        assert_eq!(gate.available(), 3);
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(gate.available(), 1);
        gate.release(2);
        assert_eq!(gate.available(), 3);
    }

    #[test]
    fn exhausted_gate_times_out() {
        let gate = CapacityGate::new(1);
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();

        let start = Instant::now();
        let err = gate.acquire_timeout(Duration::from_millis(50)).unwrap_err();
        assert_eq!(err, BufferError::AcquireTimeout);
        assert!(
            start.elapsed() >= Duration::from_millis(40),
            "timed out too early: {:?}",
            start.elapsed()
        );
        assert_eq!(gate.available(), 0, "failed acquire must not consume a permit");
    }

    #[test]
    fn release_unblocks_waiter() {
        let gate = Arc::new(CapacityGate::new(1));
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();

        let woke = Arc::new(AtomicBool::new(false));
        let (g, w) = (Arc::clone(&gate), Arc::clone(&woke));
        let th = thread::spawn(move || {
            g.acquire_timeout(Duration::from_secs(5)).unwrap();
            w.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!woke.load(Ordering::SeqCst), "should still be blocked");
        gate.release(1);
        th.join().unwrap();
        assert!(woke.load(Ordering::SeqCst));
    }

    #[test]
    fn paused_gate_grants_nothing() {
        let gate = CapacityGate::new(2);
        gate.pause();
        let err = gate.acquire_timeout(Duration::from_millis(30)).unwrap_err();
        assert_eq!(err, BufferError::AcquireTimeout);
        assert_eq!(gate.available(), 2);

        gate.unpause();
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(gate.available(), 1);
    }

    #[test]
    fn shrink_below_outstanding_goes_negative_then_recovers() {
        let gate = CapacityGate::new(4);
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();

        // 4 -> 2 with 3 permits out: avail = 1 - 2 = -1.
        gate.resize_by(-2);
        assert_eq!(gate.available(), 0);
        let err = gate.acquire_timeout(Duration::from_millis(20)).unwrap_err();
        assert_eq!(err, BufferError::AcquireTimeout);

        // One release brings avail to 0, a second to 1.
        gate.release(1);
        assert_eq!(gate.available(), 0);
        gate.release(1);
        assert_eq!(gate.available(), 1);
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn grow_frees_waiters() {
        let gate = Arc::new(CapacityGate::new(1));
        gate.acquire_timeout(Duration::from_millis(10)).unwrap();

        let g = Arc::clone(&gate);
        let th = thread::spawn(move || g.acquire_timeout(Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(30));
        gate.resize_by(2);
        th.join().unwrap().unwrap();
        assert_eq!(gate.available(), 1);
    }
}
