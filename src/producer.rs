//! Line-oriented producer loop.
//!
//! Reads a text source one line at a time, decodes each line with serde_json
//! and pushes the item into the buffer with a bounded timeout.  The loop
//! stops at end of input, at the first blank line, or on the first decode or
//! push failure — and **closes the buffer on every exit path**, so a consumer
//! draining the other end always terminates instead of polling forever.

use std::io::BufRead;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::error::ProducerError;
use crate::ring::RingBuffer;

/// Pumps `reader` into `buffer` line by line, then closes the buffer.
///
/// Each non-blank line is decoded as one JSON item and written with
/// `timeout`.  Returns the number of items pushed.
///
/// # Errors
///
/// I/O, decode and push failures abort the loop and are returned to the
/// caller; the buffer is closed first in all cases.  A failure here is fatal
/// to this loop only, never to the buffer.
pub fn drain_lines<T, R>(
    reader: R,
    buffer: &RingBuffer<T>,
    timeout: Duration,
) -> Result<usize, ProducerError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let result = pump(reader, buffer, timeout);
    buffer.close();
    if let Ok(pushed) = &result {
        debug!("producer finished after {pushed} record(s)");
    }
    result
}

fn pump<T, R>(
    reader: R,
    buffer: &RingBuffer<T>,
    timeout: Duration,
) -> Result<usize, ProducerError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut pushed = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            // Blank line terminates the stream.
            debug!("producer: blank line {line_no}, stopping");
            break;
        }
        let item: T = serde_json::from_str(&line).map_err(|source| {
            warn!("producer: undecodable line {line_no}: {source}");
            ProducerError::Decode { line: line_no, source }
        })?;
        buffer.write(item, timeout).map_err(|source| {
            warn!("producer: push failed at line {line_no}: {source}");
            ProducerError::Push { line: line_no, source }
        })?;
        pushed += 1;
    }
    Ok(pushed)
}
