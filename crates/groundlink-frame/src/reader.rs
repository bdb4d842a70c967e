use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::codec::{HEADER_SIZE, MAX_FRAME};
use crate::error::{FrameError, Result};

/// Reads whole frames from a byte stream whose reads time out.
///
/// Serial ports report "nothing arrived" as either `Ok(0)` or a `TimedOut`
/// error once the port's read timeout elapses. The reader tells idleness from
/// a dead link by how long that empty read took:
///
/// - Waiting for a length byte, any empty read is idle: `Ok(None)`.
/// - Mid-frame, an empty read that returned quickly is retried. One that took
///   at least half of `read_timeout`, or a frame still incomplete after
///   `read_timeout` in total, is [`FrameError::Stalled`].
///
/// This is a heuristic. A link that dies between frames is only noticed when
/// the device reports an I/O error.
pub struct StreamReader<T> {
    inner: T,
    read_timeout: Duration,
    buf: BytesMut,
}

impl<T: Read> StreamReader<T> {
    pub fn new(inner: T, read_timeout: Duration) -> Self {
        Self {
            inner,
            read_timeout,
            buf: BytesMut::with_capacity(MAX_FRAME),
        }
    }

    /// Read the next frame, length byte included.
    ///
    /// Returns `Ok(None)` when the stream is idle.
    pub fn read_message(&mut self) -> Result<Option<Bytes>> {
        let mut header = [0u8; HEADER_SIZE];
        loop {
            match self.inner.read(&mut header) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_empty_read(&err) => return Ok(None),
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        let expected = header[0] as usize;
        self.buf.clear();
        self.buf.put_u8(header[0]);

        let mut chunk = [0u8; MAX_FRAME];
        let mut received = 0usize;
        let started = Instant::now();
        while received < expected {
            let attempt = Instant::now();
            let read = match self.inner.read(&mut chunk[..expected - received]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_empty_read(&err) => 0,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if attempt.elapsed() >= self.read_timeout / 2
                    || started.elapsed() >= self.read_timeout
                {
                    debug!(expected, received, "stream stalled mid-frame");
                    return Err(FrameError::Stalled { expected, received });
                }
                continue;
            }

            self.buf.extend_from_slice(&chunk[..read]);
            received += read;
        }

        Ok(Some(self.buf.split().freeze()))
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn is_empty_read(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
