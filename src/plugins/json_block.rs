use tracing::{debug, warn};

use super::trailing_from;
use crate::block::{Block, BlockId, BlockStart, CloseAction, Continuation, DocumentView, Line};
use crate::config::UnterminatedPolicy;
use crate::error::ParseError;
use crate::scanner::{leading_object_column, BoundaryScanner, Scan};
use crate::wrapping::BlockParser;

pub const JSON_BLOCK_KIND: &str = "json";

/// Recognizes an embedded object line by line, then materializes it on close.
#[derive(Debug, Default)]
pub struct JsonBlockParser {
    policy: UnterminatedPolicy,
    /// Scanner of the block currently being continued.
    active: Option<(BlockId, BoundaryScanner)>,
}

impl JsonBlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: UnterminatedPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl BlockParser for JsonBlockParser {
    fn kind(&self) -> &str {
        JSON_BLOCK_KIND
    }

    fn try_open_block(
        &mut self,
        line: &Line<'_>,
        view: &DocumentView<'_>,
    ) -> Result<Option<BlockStart>, ParseError> {
        let Some(offset) = leading_object_column(line.rest()) else {
            return Ok(None);
        };
        let column = line.column + offset;

        let mut scanner = BoundaryScanner::new();
        match scanner.feed_line(&line.text[column..])? {
            Scan::Closed { end } => {
                let trailing = trailing_from(line.text, column + end + 1);
                Ok(Some(BlockStart::at(column).completed(trailing)))
            }
            Scan::Continue => {
                self.active = Some((view.next_id(), scanner));
                Ok(Some(BlockStart::at(column)))
            }
        }
    }

    fn try_continue_block(
        &mut self,
        block: &mut Block,
        line: &Line<'_>,
    ) -> Result<Continuation, ParseError> {
        if block.is_complete() {
            return Ok(Continuation::Unmatched);
        }
        let scanner = match self.active.as_mut() {
            Some((id, scanner)) if *id == block.id() => scanner,
            _ => {
                return Err(ParseError::invalid_argument(format!(
                    "json block #{} is not the block being scanned",
                    block.id().0
                )))
            }
        };

        match scanner.feed_line(line.rest())? {
            Scan::Continue => Ok(Continuation::Consumed),
            Scan::Closed { end } => {
                self.active = None;
                let trailing = trailing_from(line.text, line.column + end + 1);
                Ok(Continuation::Finished { trailing_from: trailing })
            }
        }
    }

    fn close_block(&mut self, block: &mut Block) -> Result<CloseAction, ParseError> {
        let scanner = match self.active.take() {
            Some((id, scanner)) if id == block.id() => Some(scanner),
            other => {
                self.active = other;
                None
            }
        };

        if !block.is_complete() {
            let ended = match &scanner {
                Some(scanner) => scanner.finish(block.start_line()),
                None => Err(ParseError::unterminated(block.start_line())),
            };
            if let Err(err) = ended {
                return match self.policy {
                    UnterminatedPolicy::Error => Err(err),
                    UnterminatedPolicy::ConsumeToEnd => {
                        warn!(target: "jsonblock::plugins", block = block.id().0, start_line = block.start_line(), "embedded object never closed, keeping the rest of the document as its content");
                        Ok(CloseAction::Keep)
                    }
                };
            }
        }

        // Parsed from the joined lines so that line breaks still separate tokens.
        let value: serde_json::Value = serde_json::from_str(&block.content())?;
        debug!(target: "jsonblock::plugins", block = block.id().0, lines = block.lines().len(), "json block materialized");
        block.set_value(value);
        Ok(CloseAction::Keep)
    }
}
