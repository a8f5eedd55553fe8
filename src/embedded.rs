//! One-shot extraction of an embedded value from a buffer already in memory.
//!
//! Boundary detection is delegated to `serde_json`: its stream deserializer
//! stops pulling as soon as one self-delimited value is complete, and the
//! [`LineBridgingReader`] underneath records how many source lines that took.
//! No brace counting happens here; see [`crate::scanner`] for the
//! line-at-a-time strategy.

use std::io::BufReader;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{ErrorKind, ParseError};
use crate::reader::LineBridgingReader;

pub const DEFAULT_READER_CAPACITY: usize = 8 * 1024;

/// A deserialized value together with the number of source lines it spanned.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedSpan<T> {
    pub lines_consumed: usize,
    pub value: T,
}

#[derive(Debug, Clone)]
pub struct EmbeddedObjectParser {
    capacity: usize,
}

impl Default for EmbeddedObjectParser {
    fn default() -> Self {
        Self { capacity: DEFAULT_READER_CAPACITY }
    }
}

impl EmbeddedObjectParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the buffer between the line reader and the deserializer.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Deserialize exactly one `T` starting at byte offset `start`.
    ///
    /// The caller is expected to have checked that `start` points at the
    /// opening brace. `lines_consumed` always includes the whole line holding
    /// the end of the value, so the host resumes on the following line.
    ///
    /// Terminators never reach the deserializer, so tokens split by a line
    /// break are read as one: `{"n": 1` followed by `2}` yields `{"n": 12}`.
    #[instrument(target = "jsonblock::embedded", skip(self, source), fields(len = source.len()))]
    pub fn parse<T: DeserializeOwned>(
        &self,
        source: &str,
        start: usize,
    ) -> Result<ConsumedSpan<T>, ParseError> {
        let mut reader = LineBridgingReader::new(source, start)?;

        let value = {
            let buffered = BufReader::with_capacity(self.capacity, &mut reader);
            let mut values = serde_json::Deserializer::from_reader(buffered).into_iter::<T>();
            match values.next() {
                Some(Ok(value)) => value,
                Some(Err(err)) => return Err(ParseError::new(ErrorKind::MalformedEmbeddedValue(err))),
                None => {
                    return Err(ParseError::new(ErrorKind::MalformedEmbeddedValue(
                        serde::de::Error::custom("no embedded value before end of input"),
                    )))
                }
            }
        };

        reader.complete_line();
        let lines_consumed = reader.lines_read();
        debug!(target: "jsonblock::embedded", lines_consumed, resume_at = reader.position(), "embedded value parsed");
        Ok(ConsumedSpan { lines_consumed, value })
    }
}

/// [`EmbeddedObjectParser::parse`] with the default reader capacity.
pub fn parse_embedded<T: DeserializeOwned>(
    source: &str,
    start: usize,
) -> Result<ConsumedSpan<T>, ParseError> {
    EmbeddedObjectParser::default().parse(source, start)
}
