//! Bounded, thread-safe ring buffer decoupling producers from consumers.
//!
//! The core is [`RingBuffer`]: a fixed-capacity circular queue with blocking,
//! timeout-aware writes, non-blocking reads, live capacity change that never
//! loses or reorders buffered items, and explicit end-of-stream signaling via
//! [`RingBuffer::close`].  Occupancy is bounded by an internal counting
//! permit gate, so a full buffer exerts backpressure on writers instead of
//! overwriting unread slots.
//!
//! Around the core, [`producer::drain_lines`] pumps a line-oriented JSON
//! source into a buffer and [`Consumer`] drains one through a bounded worker
//! pool, with a one-shot done signal once everything is processed.

mod error;
mod gate;
mod ring;
mod stats;

pub mod consumer;
pub mod producer;
pub mod record;

pub use consumer::{Consumer, ConsumerBuilder, ConsumerHandle, FnProcessor, Processor};
pub use error::{BufferError, ProducerError, RecordError};
pub use producer::drain_lines;
pub use record::{Record, Timestamp};
pub use ring::{ReadBatch, RingBuffer};
pub use stats::Stats;
