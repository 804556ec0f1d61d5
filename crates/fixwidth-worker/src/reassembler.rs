//! Rebuilds logical lines from arbitrarily sized byte chunks
//!
//! Chunks carry no alignment guarantee: a line may span any number of them
//! and a multi-byte UTF-8 character may be cut anywhere. Bytes are buffered
//! until a line feed arrives and only complete lines are decoded, so the
//! output does not depend on where chunk boundaries fall.
//!
//! ```
//! use fixwidth_worker::reassembler::LineReassembler;
//!
//! let mut lines = LineReassembler::new(1024);
//! lines.push(b"first\r\nsec");
//! assert_eq!(lines.next_line(), Some(Ok("first".to_string())));
//! assert_eq!(lines.next_line(), None);
//!
//! lines.push(b"ond");
//! lines.finish();
//! assert_eq!(lines.next_line(), Some(Ok("second".to_string())));
//! assert_eq!(lines.next_line(), None);
//! ```

use crate::error::RowError;

/// Default upper bound for a single logical line (8 MiB)
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

pub struct LineReassembler {
    buffer: Vec<u8>,
    /// Start of the line currently being assembled
    start: usize,
    /// Everything in `start..scan_from` is known to contain no line feed
    scan_from: usize,
    max_line_bytes: usize,
    /// Dropping the rest of an over-long line until its line feed
    discarding: bool,
    finished: bool,
}

impl LineReassembler {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            start: 0,
            scan_from: 0,
            max_line_bytes,
            discarding: false,
            finished: false,
        }
    }

    /// Append the next chunk of the stream
    pub fn push(&mut self, chunk: &[u8]) {
        if self.start > 0 {
            self.buffer.drain(..self.start);
            self.scan_from -= self.start;
            self.start = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Mark the end of the stream so an unterminated last line is released
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Bytes held for a line that has not been terminated yet
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len() - self.start
    }

    /// Next complete line, if the buffered bytes contain one
    ///
    /// Empty lines are skipped. A line longer than the configured maximum is
    /// reported once as [`RowError::LineTooLong`] and its bytes are dropped.
    pub fn next_line(&mut self) -> Option<Result<String, RowError>> {
        loop {
            match memchr::memchr(b'\n', &self.buffer[self.scan_from..]) {
                Some(offset) => {
                    let end = self.scan_from + offset;
                    let line_start = self.start;
                    self.start = end + 1;
                    self.scan_from = self.start;

                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }
                    if end - line_start > self.max_line_bytes {
                        return Some(Err(self.too_long()));
                    }
                    if let Some(line) = decode(&self.buffer[line_start..end]) {
                        return Some(Ok(line));
                    }
                },
                None => {
                    self.scan_from = self.buffer.len();

                    if self.discarding {
                        self.start = self.buffer.len();
                        return None;
                    }
                    if self.pending_bytes() > self.max_line_bytes {
                        self.start = self.buffer.len();
                        self.discarding = !self.finished;
                        return Some(Err(self.too_long()));
                    }
                    if self.finished && self.pending_bytes() > 0 {
                        let line = decode(&self.buffer[self.start..]);
                        self.start = self.buffer.len();
                        return line.map(Ok);
                    }
                    return None;
                },
            }
        }
    }

    fn too_long(&self) -> RowError {
        RowError::LineTooLong {
            limit: self.max_line_bytes,
        }
    }
}

impl Default for LineReassembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

/// Decode one line's bytes, dropping invalid UTF-8 and trailing carriage
/// returns. `None` when nothing is left.
fn decode(bytes: &[u8]) -> Option<String> {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }

    let trimmed = text.trim_end_matches('\r').len();
    text.truncate(trimmed);

    (!text.is_empty()).then_some(text)
}
