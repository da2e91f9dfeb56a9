//! In-memory output buffer with a single-use lifecycle.

use std::io;

use crate::error::ReportError;

/// Byte buffer opened when a report is constructed and closed once its
/// contents have been extracted.
///
/// Writes after [`ReportBuffer::close`] fail with an I/O error and a second
/// `close` returns [`ReportError::AlreadyBuilt`], so a report can never hand
/// out stale or empty bytes from a previous build.
#[derive(Debug)]
pub struct ReportBuffer {
    bytes: Option<Vec<u8>>,
}

impl ReportBuffer {
    /// Opens an empty buffer.
    pub fn new() -> Self {
        Self {
            bytes: Some(Vec::new()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.bytes.is_none()
    }

    /// Fails when the buffer has already been closed.
    pub fn ensure_open(&self) -> Result<(), ReportError> {
        if self.is_closed() {
            Err(ReportError::AlreadyBuilt)
        } else {
            Ok(())
        }
    }

    /// Moves the open buffer out for a build, leaving a closed one behind.
    ///
    /// A build attempt consumes the buffer whether or not it succeeds.
    pub fn take(&mut self) -> Result<ReportBuffer, ReportError> {
        let bytes = self.bytes.take().ok_or(ReportError::AlreadyBuilt)?;
        Ok(Self { bytes: Some(bytes) })
    }

    /// Returns the written bytes and closes the buffer.
    pub fn close(&mut self) -> Result<Vec<u8>, ReportError> {
        self.bytes.take().ok_or(ReportError::AlreadyBuilt)
    }
}

impl Default for ReportBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for ReportBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.bytes.as_mut() {
            Some(bytes) => {
                bytes.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "report buffer is closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
