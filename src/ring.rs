//! Fixed-capacity, thread-safe circular buffer with live resize.
//!
//! One `parking_lot::Mutex` serializes every structural mutation (slots,
//! cursors, flags, capacity); the [`CapacityGate`] is a second, independent
//! synchronization layer that bounds occupancy and gives `write` its
//! blocking, timeout-aware entry.  Because `read_cursor == write_cursor` is
//! ambiguous between empty and full, an explicit `is_full` flag resolves it.
//!
//! ## Resize discipline
//!
//! `resize` must not race with permits granted against the old capacity.  The
//! permit pool is therefore never replaced; instead resize (1) pauses the
//! gate, (2) waits on the state condvar until every granted permit has become
//! a stored item, then (3) migrates the slots and shifts the gate's ceiling
//! by a signed delta.  Writers holding permits only need the state mutex to
//! finish, which the wait releases, so the drain always terminates.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::{Condvar, Mutex};

use crate::error::BufferError;
use crate::gate::CapacityGate;
use crate::stats::{Stats, StatsCounter};

// ---------------------------------------------------------------------------
// ReadBatch
// ---------------------------------------------------------------------------

/// Items returned by [`RingBuffer::read_many`], in FIFO order.
///
/// A batch shorter than requested is **not** a failure: the items are valid
/// and already consumed from the buffer.  [`is_partial`](Self::is_partial)
/// reports the shortfall.
#[derive(Debug)]
pub struct ReadBatch<T> {
    items: Vec<T>,
    requested: usize,
}

impl<T> ReadBatch<T> {
    /// Borrows the drained items in the order they were written.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consumes the batch, yielding the drained items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Number of items actually drained.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `true` when fewer items than requested were available.
    pub fn is_partial(&self) -> bool {
        self.items.len() < self.requested
    }
}

impl<T> IntoIterator for ReadBatch<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Interior state
// ---------------------------------------------------------------------------

struct RingState<T> {
    /// Slot array.  An occupied slot is always `Some` until read out.
    slots: Box<[Option<T>]>,
    read_cursor: usize,
    write_cursor: usize,
    /// Disambiguates `read_cursor == write_cursor` (empty vs full).
    is_full: bool,
    /// One-way flag; never reverts to `false`.
    closed: bool,
    capacity: usize,
}

impl<T> RingState<T> {
    fn occupied(&self) -> usize {
        if self.is_full {
            self.capacity
        } else {
            (self.write_cursor + self.capacity - self.read_cursor) % self.capacity
        }
    }

    fn is_empty(&self) -> bool {
        self.read_cursor == self.write_cursor && !self.is_full
    }
}

/// Shared interior of a [`RingBuffer`].
struct Shared<T> {
    state: Mutex<RingState<T>>,
    /// Signaled each time a granted permit settles (item stored, or the
    /// permit handed back).  `resize` waits on this to drain in-flight
    /// writers.
    settled: Condvar,
    gate: CapacityGate,
    stats: StatsCounter,
}

// ---------------------------------------------------------------------------
// RingBuffer handle
// ---------------------------------------------------------------------------

/// A bounded, thread-safe FIFO ring buffer over an opaque item type.
///
/// Writes block (with a caller-supplied timeout) while the buffer is full;
/// reads never block — an empty open buffer reports [`BufferError::Empty`]
/// immediately and leaves retry policy to the caller.  After [`close`], the
/// remaining items stay readable and [`BufferError::Closed`] surfaces only
/// once occupancy reaches zero.
///
/// Handles are cheap to clone and share one interior.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use rondo::RingBuffer;
///
/// let buf: RingBuffer<u32> = RingBuffer::with_capacity(4);
/// buf.write(7, Duration::from_millis(100)).unwrap();
/// assert_eq!(buf.read().unwrap(), 7);
/// ```
pub struct RingBuffer<T> {
    inner: Arc<Shared<T>>,
}

impl<T> Clone for RingBuffer<T> {
    fn clone(&self) -> Self {
        RingBuffer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> RingBuffer<T> {
    /// Creates an empty, open buffer with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();
        RingBuffer {
            inner: Arc::new(Shared {
                state: Mutex::new(RingState {
                    slots,
                    read_cursor: 0,
                    write_cursor: 0,
                    is_full: false,
                    closed: false,
                    capacity,
                }),
                settled: Condvar::new(),
                gate: CapacityGate::new(capacity),
                stats: StatsCounter::new(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Stores `item`, blocking up to `timeout` while the buffer is full.
    ///
    /// On success occupancy grows by exactly one; an unread slot is never
    /// overwritten because the gate guarantees a free slot before the store.
    ///
    /// # Errors
    ///
    /// [`BufferError::Closed`] if the buffer is closed (immediately, or if a
    /// close raced in while waiting — no item is stored either way), and
    /// [`BufferError::AcquireTimeout`] if no slot freed up in time.  Both
    /// failures leave the buffer unchanged.
    pub fn write(&self, item: T, timeout: Duration) -> Result<(), BufferError> {
        if self.inner.state.lock().closed {
            return Err(BufferError::Closed);
        }

        if let Err(e) = self.inner.gate.acquire_timeout(timeout) {
            self.inner.stats.record_write_timeout();
            return Err(e);
        }

        let mut st = self.inner.state.lock();
        if st.closed {
            // close() won the race while we held the permit; hand it back
            // untouched.  Release under the state lock so a concurrent
            // resize sees consistent in-flight accounting.
            self.inner.gate.release(1);
            drop(st);
            self.inner.settled.notify_all();
            return Err(BufferError::Closed);
        }

        let at = st.write_cursor;
        st.slots[at] = Some(item);
        st.write_cursor = (at + 1) % st.capacity;
        st.is_full = st.write_cursor == st.read_cursor;
        self.inner.stats.record_write();
        drop(st);
        self.inner.settled.notify_all();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Removes and returns the oldest item.  Never blocks.
    ///
    /// # Errors
    ///
    /// [`BufferError::Empty`] while the buffer is open but holds nothing
    /// (transient — retry later), [`BufferError::Closed`] once it is both
    /// drained and closed (terminal).
    pub fn read(&self) -> Result<T, BufferError> {
        match self.read_many(1)?.into_items().pop() {
            Some(item) => Ok(item),
            // read_many(1) never succeeds with zero items.
            None => Err(BufferError::Empty),
        }
    }

    /// Removes and returns up to `count` items in FIFO order.  Never blocks.
    ///
    /// Wraparound costs at most two contiguous segment copies.  The drained
    /// count of permits is released back to the gate.  `count == 0` returns
    /// an empty batch without touching the buffer.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read) when zero items are available; fewer
    /// items than requested is a *successful* partial batch, see
    /// [`ReadBatch::is_partial`].
    pub fn read_many(&self, count: usize) -> Result<ReadBatch<T>, BufferError> {
        if count == 0 {
            return Ok(ReadBatch { items: Vec::new(), requested: 0 });
        }

        let mut st = self.inner.state.lock();
        if st.is_empty() {
            return Err(if st.closed {
                BufferError::Closed
            } else {
                BufferError::Empty
            });
        }

        let take = count.min(st.occupied());
        let mut items = Vec::with_capacity(take);

        // Segment 1: read_cursor up to the end of the array.
        let first = take.min(st.capacity - st.read_cursor);
        for i in 0..first {
            let at = st.read_cursor + i;
            items.push(st.slots[at].take().expect("occupied slot holds an item"));
        }
        // Segment 2: wrapped prefix.
        for i in 0..(take - first) {
            items.push(st.slots[i].take().expect("occupied slot holds an item"));
        }

        st.read_cursor = (st.read_cursor + take) % st.capacity;
        st.is_full = false;

        self.inner.stats.record_reads(take as u64);
        if take < count {
            self.inner.stats.record_partial_read();
        }
        // Release under the state lock: resize computes in-flight writers
        // from occupancy and gate balance together, which must move in step.
        self.inner.gate.release(take);

        Ok(ReadBatch { items, requested: count })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Marks the buffer closed.  Idempotent.
    ///
    /// Buffered items are not evicted: readers keep draining them and only
    /// observe [`BufferError::Closed`] once occupancy reaches zero.  Writers
    /// are rejected immediately.
    pub fn close(&self) {
        self.inner.state.lock().closed = true;
    }

    // -----------------------------------------------------------------------
    // Resize
    // -----------------------------------------------------------------------

    /// Changes the capacity to `new_capacity`, preserving every buffered
    /// item and its FIFO order.
    ///
    /// Blocks briefly while in-flight writers (permit granted, item not yet
    /// stored) settle; concurrent reads proceed throughout.  Afterwards the
    /// gate holds exactly `new_capacity − occupied` available permits.
    ///
    /// # Errors
    ///
    /// [`BufferError::InvalidResize`] if `new_capacity` is 0 or smaller than
    /// the current occupancy; the buffer is left untouched.
    pub fn resize(&self, new_capacity: usize) -> Result<(), BufferError> {
        let mut st = self.inner.state.lock();
        let occupied = st.occupied();
        if new_capacity == 0 || new_capacity < occupied {
            return Err(BufferError::InvalidResize { requested: new_capacity, occupied });
        }
        if new_capacity == st.capacity {
            return Ok(());
        }

        // Stop granting permits, then wait for already-granted ones to turn
        // into stored items.  Waiting releases the state mutex, which is all
        // a permit-holding writer needs to finish.
        self.inner.gate.pause();
        loop {
            let in_flight =
                st.capacity as i64 - st.occupied() as i64 - self.inner.gate.balance();
            if in_flight <= 0 {
                break;
            }
            debug!("resize: waiting for {in_flight} in-flight writer(s)");
            self.inner.settled.wait(&mut st);
        }

        // Writers may have stored during the drain; re-validate.
        let occupied = st.occupied();
        if new_capacity < occupied {
            self.inner.gate.unpause();
            return Err(BufferError::InvalidResize { requested: new_capacity, occupied });
        }

        // Migrate occupied items into the prefix of a fresh slot array,
        // oldest first (same two-segment copy as read_many).
        let mut slots = (0..new_capacity).map(|_| None).collect::<Vec<_>>();
        let first = occupied.min(st.capacity - st.read_cursor);
        for i in 0..first {
            let at = st.read_cursor + i;
            slots[i] = st.slots[at].take();
        }
        for i in 0..(occupied - first) {
            slots[first + i] = st.slots[i].take();
        }

        let delta = new_capacity as i64 - st.capacity as i64;
        st.slots = slots.into_boxed_slice();
        st.read_cursor = 0;
        st.write_cursor = occupied % new_capacity;
        st.is_full = occupied == new_capacity;
        st.capacity = new_capacity;

        self.inner.gate.resize_by(delta);
        self.inner.gate.unpause();
        self.inner.stats.record_resize();
        debug!("resize: capacity now {new_capacity}, occupied {occupied}");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// `true` when no items are buffered (open or closed).
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().is_empty()
    }

    /// `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Number of items currently buffered.
    pub fn occupied(&self) -> usize {
        self.inner.state.lock().occupied()
    }

    /// Current slot count.
    pub fn capacity(&self) -> usize {
        self.inner.state.lock().capacity
    }

    /// Gate permits currently grantable.  At quiescence this equals
    /// `capacity() − occupied()`.
    pub fn available_permits(&self) -> usize {
        self.inner.gate.available()
    }

    /// Snapshot of operation counters.
    pub fn stats(&self) -> Stats {
        self.inner.stats.snapshot()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
