//! Incremental boundary detection for brace-delimited embedded objects.
//!
//! The host feeds one line fragment at a time; [`BoundaryScanner`] carries
//! brace depth, string-literal state and a pending backslash across calls and
//! reports the moment the top-level object closes. Malformed input is not
//! diagnosed here: unbalanced braces simply keep the scanner in `Continue`
//! until the host calls [`BoundaryScanner::finish`].

use tracing::{debug, trace};

use crate::error::ParseError;

/// Running state of one embedded object being recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    pub open_objects: usize,
    pub within_string: bool,
    /// The last character consumed was an unescaped backslash.
    pub escape_pending: bool,
}

/// Verdict for one fed fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    Continue,
    /// Byte offset, inside the fragment, of the closing `}` (inclusive).
    Closed { end: usize },
}

#[derive(Debug, Default)]
pub struct BoundaryScanner {
    state: ScanState,
    started: bool,
    closed: bool,
    lines_fed: usize,
}

impl BoundaryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn lines_fed(&self) -> usize {
        self.lines_fed
    }

    /// Feed the unconsumed remainder of the next source line.
    ///
    /// The first fragment must start with the opening `{`. Characters after
    /// the closing brace are not inspected; they belong to the document.
    pub fn feed_line(&mut self, fragment: &str) -> Result<Scan, ParseError> {
        if self.closed {
            return Err(ParseError::invalid_argument(
                "scanner fed after its object already closed",
            ));
        }
        if !self.started {
            if !fragment.starts_with('{') {
                return Err(ParseError::invalid_argument(
                    "first fragment must begin with '{'",
                ));
            }
            self.started = true;
        }
        self.lines_fed += 1;

        for (i, &b) in fragment.as_bytes().iter().enumerate() {
            let escaped = self.state.escape_pending;
            self.state.escape_pending = b == b'\\' && !escaped;

            if self.state.within_string {
                if b == b'"' && !escaped {
                    self.state.within_string = false;
                }
                continue;
            }

            match b {
                b'"' if !escaped => self.state.within_string = true,
                b'{' => self.state.open_objects += 1,
                b'}' => {
                    self.state.open_objects = self.state.open_objects.saturating_sub(1);
                    if self.state.open_objects == 0 {
                        self.closed = true;
                        debug!(
                            target: "jsonblock::scanner",
                            end = i,
                            lines = self.lines_fed,
                            "embedded object closed"
                        );
                        return Ok(Scan::Closed { end: i });
                    }
                }
                _ => {}
            }
        }

        trace!(target: "jsonblock::scanner", depth = self.state.open_objects, in_string = self.state.within_string, "line fed, object still open");
        Ok(Scan::Continue)
    }

    /// Signal that no more lines will arrive.
    ///
    /// `opened_at` is the line number the object started on and is only used
    /// to describe the failure.
    pub fn finish(&self, opened_at: usize) -> Result<(), ParseError> {
        if self.started && !self.closed {
            return Err(ParseError::unterminated(opened_at));
        }
        Ok(())
    }
}

/// Byte column of the first non-whitespace character of `line` when that
/// character opens an object.
///
/// This is the cheap lookahead a host uses before committing to a block; it
/// never inspects past the first significant character.
pub fn leading_object_column(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    trimmed.starts_with('{').then(|| line.len() - trimmed.len())
}
