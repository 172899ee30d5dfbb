//! Background command-feed reading.
//!
//! Spawns a thread that owns the blocking `io::Read` (USB serial, stdin,
//! TCP), pushes byte chunks over a channel, and exposes them through the
//! non-blocking `FeedSource` trait so the control loop can drain input once
//! per tick without ever stalling.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel as xch;
use gantry_traits::FeedSource;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const CHUNK_SIZE: usize = 256;

pub struct ThreadedFeed {
    rx: xch::Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    shutdown: Arc<AtomicBool>,
}

impl ThreadedFeed {
    pub fn spawn<R: Read + Send + 'static>(mut reader: R) -> Self {
        let (tx, rx) = xch::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        std::thread::spawn(move || {
            let mut chunk = [0u8; CHUNK_SIZE];
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                match reader.read(&mut chunk) {
                    Ok(0) => {
                        tracing::debug!("feed source reached EOF");
                        break;
                    }
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "feed read failed");
                        break;
                    }
                }
            }
            tracing::trace!("feed thread exiting");
        });

        Self {
            rx,
            pending: VecDeque::new(),
            shutdown,
        }
    }
}

impl FeedSource for ThreadedFeed {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, BoxError> {
        while let Ok(chunk) = self.rx.try_recv() {
            self.pending.extend(chunk);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.pending.pop_front() {
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

impl Drop for ThreadedFeed {
    fn drop(&mut self) {
        // The reader may be parked in a blocking read with no timeout
        // (stdin, an idle socket), so the thread is detached rather than
        // joined; it exits on EOF, on error, or at the next read.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn delivers_bytes_from_reader() {
        let data: &[u8] = b"1,2,3\nRELEASE\n";
        let mut feed = ThreadedFeed::spawn(std::io::Cursor::new(data.to_vec()));
        let mut collected = Vec::new();
        let mut buf = [0u8; 8];
        let deadline = Instant::now() + Duration::from_secs(2);
        while collected.len() < data.len() && Instant::now() < deadline {
            let n = feed.read_available(&mut buf).unwrap();
            collected.extend_from_slice(&buf[..n]);
            if n == 0 {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        assert_eq!(collected, data);
    }

    #[test]
    fn read_available_never_blocks_after_eof() {
        let mut feed = ThreadedFeed::spawn(std::io::Cursor::new(Vec::<u8>::new()));
        std::thread::sleep(Duration::from_millis(20));
        let mut buf = [0u8; 8];
        assert_eq!(feed.read_available(&mut buf).unwrap(), 0);
    }
}
