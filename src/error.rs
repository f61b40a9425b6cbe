//! Error taxonomy for buffer operations and the pipeline loops.
//!
//! Every failure is returned to the immediate caller; the buffer performs no
//! internal retries.  `Empty` is a transient condition on an open buffer
//! (retry later), `Closed` is terminal for writes immediately and for reads
//! once the buffer has drained.  A short read is **not** an error — see
//! [`ReadBatch::is_partial`](crate::ReadBatch::is_partial).

use thiserror::Error;

/// Failures surfaced by [`RingBuffer`](crate::RingBuffer) operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// No slot freed up before the caller's deadline.  Recoverable; the
    /// caller decides whether to retry, back off, or abort.  The buffer
    /// state is unchanged.
    #[error("no capacity became available within the timeout")]
    AcquireTimeout,

    /// The buffer is open but currently holds no items.  Transient: retry
    /// after a backoff.
    #[error("buffer is empty")]
    Empty,

    /// The buffer has been closed.  Immediate for writes; reads see this
    /// only once every buffered item has been drained.
    #[error("buffer is closed")]
    Closed,

    /// The requested capacity cannot hold the items currently buffered
    /// (or was zero).  The buffer state is unchanged.
    #[error("cannot resize to {requested} slots while holding {occupied} items")]
    InvalidResize {
        /// Capacity that was requested.
        requested: usize,
        /// Items buffered at the time of the call.
        occupied: usize,
    },
}

/// Failures decoding a [`Record`](crate::Record) from its wire form.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The timestamp field does not match the fixed fractional-seconds shape.
    #[error("malformed timestamp {0:?}")]
    BadTimestamp(String),

    /// The textual value field is not a valid integer.
    #[error("malformed value field {text:?}")]
    BadValue {
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Failures that abort the producer loop.
///
/// Any of these is fatal to the loop, never to the buffer: the loop closes
/// the buffer before returning so consumers still terminate cleanly.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// The underlying line source failed.
    #[error("reading input failed")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded into an item.
    #[error("decoding line {line} failed")]
    Decode {
        /// 1-based line number of the offending input line.
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The buffer rejected a push (timeout or closed).
    #[error("pushing line {line} into the buffer failed")]
    Push {
        /// 1-based line number of the record that could not be pushed.
        line: usize,
        #[source]
        source: BufferError,
    },
}
