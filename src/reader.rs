//! A bounded-read adapter that bridges an in-memory text buffer to pull-based
//! consumers while counting the source lines it delivers.
//!
//! Line terminators (`\n`, `\r\n`, bare `\r`) are consumed but never copied
//! out, and each read stops right after crossing one. That is what lets
//! [`LineBridgingReader::lines_read`] be read off afterwards as the number of
//! source lines a consumer actually pulled.

use std::io;

use tracing::trace;

use crate::error::ParseError;

#[derive(Debug, Clone)]
pub struct LineBridgingReader<'a> {
    source: &'a str,
    index: usize,
    lines_read: usize,
    /// Characters were produced since the last terminator.
    line_open: bool,
}

impl<'a> LineBridgingReader<'a> {
    /// Start reading `source` at byte offset `start`.
    pub fn new(source: &'a str, start: usize) -> Result<Self, ParseError> {
        if start > source.len() {
            return Err(ParseError::invalid_argument(format!(
                "start offset {start} is past the end of a {}-byte buffer",
                source.len()
            )));
        }
        if !source.is_char_boundary(start) {
            return Err(ParseError::invalid_argument(format!(
                "start offset {start} is not on a character boundary"
            )));
        }
        Ok(Self { source, index: start, lines_read: 0, line_open: false })
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Current byte offset into the source.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.source.len()
    }

    /// Copy at most `max_count` bytes into `buf[offset..]`.
    ///
    /// Stops after crossing one line terminator, after `max_count` bytes, or
    /// at the end of the source. Returns `0` for an empty line as well as at
    /// the end of the source; use [`is_exhausted`](Self::is_exhausted) to tell
    /// them apart.
    pub fn read_into(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        max_count: usize,
    ) -> Result<usize, ParseError> {
        if offset >= buf.len() {
            return Err(ParseError::invalid_argument(format!(
                "offset {offset} is outside a buffer of length {}",
                buf.len()
            )));
        }
        if max_count > buf.len() - offset {
            return Err(ParseError::invalid_argument(format!(
                "max_count {max_count} exceeds the {} bytes available after offset {offset}",
                buf.len() - offset
            )));
        }

        let bytes = self.source.as_bytes();
        let mut written = 0;
        while written < max_count {
            let Some(&b) = bytes.get(self.index) else {
                break;
            };
            match b {
                b'\n' => {
                    self.index += 1;
                    self.cross_terminator();
                    return Ok(written);
                }
                b'\r' => {
                    self.index += 1;
                    if bytes.get(self.index) == Some(&b'\n') {
                        self.index += 1;
                    }
                    self.cross_terminator();
                    return Ok(written);
                }
                _ => {
                    buf[offset + written] = b;
                    written += 1;
                    self.index += 1;
                    self.line_open = true;
                }
            }
        }

        if self.is_exhausted() && self.line_open {
            // The final line has no terminator of its own.
            self.cross_terminator();
        }
        Ok(written)
    }

    /// Consume the rest of a partially delivered line, including its
    /// terminator, without copying anything.
    pub fn complete_line(&mut self) {
        if !self.line_open {
            return;
        }
        let rest = &self.source.as_bytes()[self.index..];
        match rest.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(pos) => {
                self.index += pos + 1;
                if rest[pos] == b'\r' && rest.get(pos + 1) == Some(&b'\n') {
                    self.index += 1;
                }
            }
            None => self.index = self.source.len(),
        }
        self.cross_terminator();
    }

    fn cross_terminator(&mut self) {
        self.lines_read += 1;
        self.line_open = false;
        trace!(target: "jsonblock::reader", lines = self.lines_read, position = self.index, "line delivered");
    }
}

impl io::Read for LineBridgingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        // `Ok(0)` means end of stream to `io::Read` callers, so blank lines
        // are stepped over rather than reported.
        loop {
            let n = self.read_into(buf, 0, buf.len()).map_err(io::Error::other)?;
            if n > 0 || self.is_exhausted() {
                return Ok(n);
            }
        }
    }
}
