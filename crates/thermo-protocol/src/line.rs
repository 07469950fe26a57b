//! Reassembly of newline-terminated lines from partial reads.

use thiserror::Error;

/// Maximum line length in bytes, excluding the terminator.
pub const LINE_CAPACITY: usize = 100;

const TERMINATOR: u8 = b'\n';

/// Fixed-capacity accumulator turning a byte stream into complete lines.
///
/// The write cursor never exceeds the capacity: a line that would grow
/// past it is reported as [`LineError::Overflow`] instead of truncated.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Box<[u8]>,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_capacity(LINE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Feeds one byte.
    ///
    /// Returns the completed line (without terminator) when `byte` is a
    /// newline, `None` otherwise.
    pub fn push(&mut self, byte: u8) -> Result<Option<Vec<u8>>, LineError> {
        if byte == TERMINATOR {
            let line = self.pending().to_vec();
            self.cursor = 0;
            return Ok(Some(line));
        }

        match self.buf.get_mut(self.cursor) {
            Some(slot) => {
                *slot = byte;
                self.cursor += 1;
                Ok(None)
            }
            None => Err(LineError::Overflow {
                capacity: self.buf.len(),
            }),
        }
    }

    /// Bytes accumulated since the last terminator.
    pub fn pending(&self) -> &[u8] {
        self.buf.get(..self.cursor).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Discards any partial line.
    pub fn clear(&mut self) {
        self.cursor = 0;
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from line reassembly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("Control line exceeds {capacity} bytes without a terminator")]
    Overflow { capacity: usize },
}
