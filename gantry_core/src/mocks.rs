//! Test and helper mocks for gantry_core.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use gantry_traits::{Clock, FeedSource, Pot};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A feed with no data; useful when driving the core from a script or when
/// no vision subsystem is attached.
pub struct NoopFeed;

impl FeedSource for NoopFeed {
    fn read_available(&mut self, _buf: &mut [u8]) -> Result<usize, BoxError> {
        Ok(0)
    }
}

/// In-memory feed whose handle lets a test push bytes between ticks.
pub struct QueueFeed {
    queue: Arc<Mutex<VecDeque<u8>>>,
}

#[derive(Clone)]
pub struct QueueFeedHandle(Arc<Mutex<VecDeque<u8>>>);

impl QueueFeedHandle {
    pub fn push(&self, bytes: &[u8]) {
        if let Ok(mut q) = self.0.lock() {
            q.extend(bytes.iter().copied());
        }
    }

    pub fn push_line(&self, line: &str) {
        self.push(line.as_bytes());
        self.push(b"\n");
    }
}

impl QueueFeed {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn handle(&self) -> QueueFeedHandle {
        QueueFeedHandle(self.queue.clone())
    }
}

impl Default for QueueFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSource for QueueFeed {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, BoxError> {
        let mut q = match self.queue.lock() {
            Ok(q) => q,
            Err(_) => return Ok(0),
        };
        let mut n = 0;
        while n < buf.len() {
            match q.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/// Pot that returns a fixed sequence, then repeats the last value.
pub struct SeqPot {
    seq: Vec<u16>,
    idx: usize,
}

impl SeqPot {
    pub fn new(seq: impl Into<Vec<u16>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl Pot for SeqPot {
    fn read(&mut self) -> Result<u16, BoxError> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(0)
        };
        Ok(v)
    }
}

/// Deterministic clock advanced manually in milliseconds; `sleep` advances
/// it so runner loops stay virtual in tests.
#[derive(Clone)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::Relaxed))
    }

    fn sleep(&self, d: Duration) {
        self.advance_ms(d.as_millis() as u64);
    }
}
