//! Throughput benchmarks: rondo vs crossbeam-channel vs std mpsc.
//!
//! Each group runs the same workload across all three queues so criterion
//! can generate side-by-side reports.
//!
//! Run with:
//!     cargo bench --bench throughput

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rondo::RingBuffer;

/// Queue capacity for every contender.
const CAP: usize = 1_024;

/// Operations executed per criterion iteration (hot-loop size).
const OPS: usize = 512;

const T: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Group 1: write_read
// ---------------------------------------------------------------------------
// Alternating single-item push/pop on one thread — measures per-operation
// overhead with no contention and no wraparound pressure.

fn bench_write_read(c: &mut Criterion) {
    let ring: RingBuffer<u64> = RingBuffer::with_capacity(CAP);
    let (cb_tx, cb_rx) = crossbeam_channel::bounded::<u64>(CAP);
    let (mpsc_tx, mpsc_rx) = std::sync::mpsc::sync_channel::<u64>(CAP);

    let mut group = c.benchmark_group("write_read");
    group.throughput(Throughput::Elements(OPS as u64));

    group.bench_function("rondo", |b| {
        b.iter(|| {
            for i in 0..OPS as u64 {
                ring.write(black_box(i), T).unwrap();
                black_box(ring.read().unwrap());
            }
        })
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            for i in 0..OPS as u64 {
                cb_tx.send(black_box(i)).unwrap();
                black_box(cb_rx.recv().unwrap());
            }
        })
    });

    group.bench_function("std_mpsc", |b| {
        b.iter(|| {
            for i in 0..OPS as u64 {
                mpsc_tx.send(black_box(i)).unwrap();
                black_box(mpsc_rx.recv().unwrap());
            }
        })
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Group 2: fill_drain
// ---------------------------------------------------------------------------
// Fill to capacity, then drain.  rondo drains in one read_many batch (two
// segment copies); the channels drain item by item — this is the batched
// read path the channels do not offer.

fn bench_fill_drain(c: &mut Criterion) {
    let ring: RingBuffer<u64> = RingBuffer::with_capacity(CAP);
    let (cb_tx, cb_rx) = crossbeam_channel::bounded::<u64>(CAP);
    let (mpsc_tx, mpsc_rx) = std::sync::mpsc::sync_channel::<u64>(CAP);

    let mut group = c.benchmark_group("fill_drain");
    group.throughput(Throughput::Elements(CAP as u64));

    group.bench_function("rondo", |b| {
        b.iter(|| {
            for i in 0..CAP as u64 {
                ring.write(i, T).unwrap();
            }
            black_box(ring.read_many(CAP).unwrap());
        })
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            for i in 0..CAP as u64 {
                cb_tx.send(i).unwrap();
            }
            for _ in 0..CAP {
                black_box(cb_rx.recv().unwrap());
            }
        })
    });

    group.bench_function("std_mpsc", |b| {
        b.iter(|| {
            for i in 0..CAP as u64 {
                mpsc_tx.send(i).unwrap();
            }
            for _ in 0..CAP {
                black_box(mpsc_rx.recv().unwrap());
            }
        })
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Group 3: spsc_cross_thread
// ---------------------------------------------------------------------------
// One producer thread, one consumer thread, OPS items per iteration.

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_cross_thread");
    group.throughput(Throughput::Elements(OPS as u64));

    group.bench_function("rondo", |b| {
        b.iter(|| {
            let ring: RingBuffer<u64> = RingBuffer::with_capacity(CAP);
            let producer = {
                let ring = ring.clone();
                std::thread::spawn(move || {
                    for i in 0..OPS as u64 {
                        ring.write(i, T).unwrap();
                    }
                    ring.close();
                })
            };
            let mut got = 0usize;
            loop {
                match ring.read_many(64) {
                    Ok(batch) => got += batch.len(),
                    Err(rondo::BufferError::Closed) => break,
                    Err(_) => std::hint::spin_loop(),
                }
            }
            producer.join().unwrap();
            assert_eq!(got, OPS);
        })
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            let (tx, rx) = crossbeam_channel::bounded::<u64>(CAP);
            let producer = std::thread::spawn(move || {
                for i in 0..OPS as u64 {
                    tx.send(i).unwrap();
                }
            });
            let mut got = 0usize;
            while rx.recv().is_ok() {
                got += 1;
            }
            producer.join().unwrap();
            assert_eq!(got, OPS);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_write_read, bench_fill_drain, bench_spsc);
criterion_main!(benches);
