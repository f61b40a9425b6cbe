//! Polling consumer loop with a bounded worker pool.
//!
//! The pull thread reads one item at a time: on [`BufferError::Empty`] it
//! sleeps a short fixed interval and retries; each item is handed to a fixed
//! pool of worker threads through a **bounded** channel, so the number of
//! in-flight processing tasks can never grow without bound — when the pool
//! falls behind, the pull thread blocks on the channel and backpressure
//! propagates to producers through the buffer, symmetric to the write side.
//!
//! Once the buffer reports [`BufferError::Closed`] (drained and closed), the
//! pull thread drops the dispatch channel, joins every worker, and signals
//! completion exactly once.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};
use log::{debug, warn};

use crate::error::BufferError;
use crate::ring::RingBuffer;

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Per-item processing invoked on a worker thread.
///
/// Implementations must be `Send + Sync + 'static` so the pool can share one
/// instance across workers via `Arc`.  Do not call blocking buffer writes
/// from inside `process` against the same buffer this consumer drains — a
/// full buffer would then deadlock against its own backpressure.
pub trait Processor<T>: Send + Sync + 'static {
    fn process(&self, item: T);
}

/// A [`Processor`] backed by a closure.
pub struct FnProcessor<F>(pub F);

impl<T, F> Processor<T> for FnProcessor<F>
where
    F: Fn(T) + Send + Sync + 'static,
{
    fn process(&self, item: T) {
        (self.0)(item)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a [`Consumer`].
///
/// # Example
/// ```
/// use std::time::Duration;
/// use rondo::{Consumer, RingBuffer};
///
/// let buf: RingBuffer<u64> = RingBuffer::with_capacity(16);
/// let handle = Consumer::builder(buf.clone())
///     .workers(2)
///     .poll_interval(Duration::from_millis(5))
///     .start(|item: u64| {
///         let _ = item; // per-item work
///     });
/// buf.write(1, Duration::from_millis(50)).unwrap();
/// buf.close();
/// handle.wait();
/// ```
pub struct ConsumerBuilder<T> {
    buffer: RingBuffer<T>,
    workers: usize,
    queue_depth: usize,
    poll_interval: Duration,
}

impl<T: Send + 'static> ConsumerBuilder<T> {
    pub fn new(buffer: RingBuffer<T>) -> Self {
        ConsumerBuilder {
            buffer,
            workers: 4,
            queue_depth: 64,
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Number of worker threads (default: 4).
    pub fn workers(mut self, n: usize) -> Self {
        assert!(n > 0, "workers must be greater than 0");
        self.workers = n;
        self
    }

    /// Bound of the dispatch channel feeding the pool (default: 64).  When
    /// full, the pull thread blocks until a worker catches up.
    pub fn queue_depth(mut self, n: usize) -> Self {
        assert!(n > 0, "queue_depth must be greater than 0");
        self.queue_depth = n;
        self
    }

    /// Sleep between polls of an empty, open buffer (default: 10 ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Spawns the worker pool and the pull thread with a closure processor.
    pub fn start<F>(self, f: F) -> ConsumerHandle
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.start_with(FnProcessor(f))
    }

    /// Spawns the worker pool and the pull thread with any [`Processor`].
    pub fn start_with<P: Processor<T>>(self, processor: P) -> ConsumerHandle {
        Consumer {
            buffer: self.buffer,
            processor: Arc::new(processor),
            workers: self.workers,
            queue_depth: self.queue_depth,
            poll_interval: self.poll_interval,
        }
        .start()
    }
}

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

/// Pulls items from a [`RingBuffer`] and fans them out to a bounded pool.
pub struct Consumer<T> {
    buffer: RingBuffer<T>,
    processor: Arc<dyn Processor<T>>,
    workers: usize,
    queue_depth: usize,
    poll_interval: Duration,
}

impl<T: Send + 'static> Consumer<T> {
    /// Returns a [`ConsumerBuilder`] for `buffer`.
    pub fn builder(buffer: RingBuffer<T>) -> ConsumerBuilder<T> {
        ConsumerBuilder::new(buffer)
    }

    fn start(self) -> ConsumerHandle {
        let (work_tx, work_rx) = bounded::<T>(self.queue_depth);

        let worker_handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|_| {
                let rx = work_rx.clone();
                let processor = Arc::clone(&self.processor);
                thread::spawn(move || {
                    // recv fails once the pull thread drops the sender and
                    // the queue is drained.
                    while let Ok(item) = rx.recv() {
                        processor.process(item);
                    }
                })
            })
            .collect();
        drop(work_rx);

        // Zero-capacity channel used only for its disconnect edge: dropping
        // `done_tx` is the one-shot completion signal every receiver clone
        // observes, like closing a done channel.
        let (done_tx, done_rx) = bounded::<()>(0);

        let buffer = self.buffer;
        let poll_interval = self.poll_interval;
        let pull = thread::spawn(move || {
            loop {
                match buffer.read() {
                    Ok(item) => {
                        if work_tx.send(item).is_err() {
                            warn!("consumer: worker pool gone, stopping pull loop");
                            break;
                        }
                    }
                    Err(BufferError::Closed) => {
                        debug!("consumer: buffer drained and closed");
                        break;
                    }
                    // Empty: transient on an open buffer, back off and retry.
                    Err(_) => thread::sleep(poll_interval),
                }
            }
            drop(work_tx);
            for handle in worker_handles {
                if handle.join().is_err() {
                    warn!("consumer: worker panicked");
                }
            }
            drop(done_tx);
        });

        ConsumerHandle { done: done_rx, pull: Some(pull) }
    }
}

// ---------------------------------------------------------------------------
// ConsumerHandle
// ---------------------------------------------------------------------------

/// Observes a running consumer.
pub struct ConsumerHandle {
    done: Receiver<()>,
    pull: Option<JoinHandle<()>>,
}

impl ConsumerHandle {
    /// A receiver that disconnects exactly once, after the buffer is closed,
    /// drained, and every dispatched item has finished processing.  Clones
    /// freely; `recv()` returning `Err` *is* the completion signal.
    pub fn done(&self) -> Receiver<()> {
        self.done.clone()
    }

    /// Blocks until processing is complete.
    pub fn wait(mut self) {
        let _ = self.done.recv();
        if let Some(handle) = self.pull.take() {
            if handle.join().is_err() {
                warn!("consumer: pull thread panicked");
            }
        }
    }
}
