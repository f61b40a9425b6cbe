//! End-to-end pipeline demo: JSON lines → producer → ring buffer → worker pool.
//!
//! Generates a small batch of readings, pumps them through a buffer far
//! smaller than the input (so the producer feels backpressure), re-encodes
//! each record on a worker thread, and waits for the done signal.
//!
//! Run with:
//!     RUST_LOG=debug cargo run --example pipeline

use std::io::Cursor;
use std::thread;
use std::time::Duration;

use rondo::{drain_lines, Consumer, Record, RingBuffer};

fn main() {
    env_logger::init();

    let mut input = String::new();
    for i in 0..100i64 {
        let partition = ["eu-1", "us-2", "ap-3"][(i % 3) as usize];
        input.push_str(&format!(
            r#"{{"datetime":"2024-05-01 10:{:02}:{:02}.123456.654321","value":"{}","partition":"{}"}}"#,
            i / 60,
            i % 60,
            i * 7,
            partition
        ));
        input.push('\n');
    }

    let buffer: RingBuffer<Record> = RingBuffer::with_capacity(10);

    let handle = Consumer::builder(buffer.clone())
        .workers(4)
        .queue_depth(16)
        .poll_interval(Duration::from_millis(5))
        .start(|record: Record| match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("re-encode failed: {e}"),
        });

    let producer = {
        let buffer = buffer.clone();
        thread::spawn(move || drain_lines(Cursor::new(input), &buffer, Duration::from_secs(1)))
    };

    match producer.join().expect("producer thread panicked") {
        Ok(pushed) => eprintln!("producer pushed {pushed} records"),
        Err(e) => eprintln!("producer aborted: {e}"),
    }

    handle.wait();
    let stats = buffer.stats();
    eprintln!(
        "done: {} written, {} read, {} write timeout(s), {} partial read(s)",
        stats.writes, stats.reads, stats.write_timeouts, stats.partial_reads
    );
}
