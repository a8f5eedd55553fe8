use serde_json::Value;
use tracing::warn;

use crate::block::{Block, BlockStart, CloseAction, DocumentView, Line};
use crate::config::UnterminatedPolicy;
use crate::document::split_lines;
use crate::embedded::EmbeddedObjectParser;
use crate::error::ParseError;
use crate::scanner::{leading_object_column, BoundaryScanner, Scan};
use crate::wrapping::BlockParser;

pub const FRONT_MATTER_KIND: &str = "front-matter";

/// An object at the very top of the document, parsed in one pass over the
/// remaining source instead of line by line.
///
/// Text following the closing brace on its last line is dropped along with
/// the line.
#[derive(Debug, Default)]
pub struct FrontMatterParser {
    policy: UnterminatedPolicy,
    embedded: EmbeddedObjectParser,
    parsed: Option<Value>,
}

impl FrontMatterParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: UnterminatedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_embedded(mut self, embedded: EmbeddedObjectParser) -> Self {
        self.embedded = embedded;
        self
    }
}

/// Scan `rest` line by line until the leading object closes, returning the
/// scanner and the number of lines it was fed.
fn scan_to_close(rest: &str) -> Result<(BoundaryScanner, usize), ParseError> {
    let mut scanner = BoundaryScanner::new();
    for (_, text) in split_lines(rest) {
        if let Scan::Closed { .. } = scanner.feed_line(text)? {
            break;
        }
    }
    let lines = scanner.lines_fed();
    Ok((scanner, lines))
}

impl BlockParser for FrontMatterParser {
    fn kind(&self) -> &str {
        FRONT_MATTER_KIND
    }

    fn try_open_block(
        &mut self,
        line: &Line<'_>,
        view: &DocumentView<'_>,
    ) -> Result<Option<BlockStart>, ParseError> {
        if !view.is_first_content_line(line.number) {
            return Ok(None);
        }
        let Some(offset) = leading_object_column(line.rest()) else {
            return Ok(None);
        };
        let column = line.column + offset;
        let Some(line_start) = view.line_offset(line.number) else {
            return Err(ParseError::invalid_argument(format!(
                "line {} is not part of the document",
                line.number
            )));
        };
        let start = line_start + column;
        let Some(rest) = view.source().get(start..) else {
            return Err(ParseError::invalid_argument(format!(
                "column {column} is outside line {}",
                line.number
            )));
        };

        // The deserializer cannot tell a missing brace from text that follows
        // the object, so the end of the object is located first.
        let (scanner, scanned) = scan_to_close(rest)?;
        if let Err(err) = scanner.finish(line.number) {
            return match self.policy {
                UnterminatedPolicy::Error => Err(err),
                UnterminatedPolicy::ConsumeToEnd => {
                    warn!(target: "jsonblock::plugins", start_line = line.number, lines = scanned, "front matter never closed, keeping the rest of the document as its content");
                    self.parsed = None;
                    Ok(Some(BlockStart::at(column).spanning(scanned)))
                }
            };
        }

        let span = self.embedded.parse::<Value>(view.source(), start)?;
        self.parsed = Some(span.value);
        Ok(Some(BlockStart::at(column).spanning(span.lines_consumed).completed(None)))
    }

    fn close_block(&mut self, block: &mut Block) -> Result<CloseAction, ParseError> {
        if let Some(value) = self.parsed.take() {
            block.set_value(value);
        }
        Ok(CloseAction::Keep)
    }
}
