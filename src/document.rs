//! A minimal line-driven host for block plugins.
//!
//! For each line: the active block is offered the line first; if it declines,
//! the block becomes *pending*, every plugin gets a chance to open a new block
//! on the line (first match wins), and only then is the pending block
//! finalized. Lines no block claims become text nodes.

use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::block::{Block, BlockId, BlockRef, BlockStart, CloseAction, Continuation, DocumentView, Line};
use crate::config::ParseConfig;
use crate::embedded::EmbeddedObjectParser;
use crate::error::ParseError;
use crate::plugins::{FrontMatterParser, JsonBlockParser};
use crate::wrapping::{BlockClosedHook, BlockParser, ErrorContextExtension, ErrorContextParser};

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Text { line: usize, text: String },
    Block(Block),
}

#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Block(block) => Some(block),
            Node::Text { .. } => None,
        })
    }

    /// Text nodes joined with `\n`.
    pub fn text(&self) -> String {
        let texts: Vec<&str> = self
            .nodes
            .iter()
            .filter_map(|node| match node {
                Node::Text { text, .. } => Some(text.as_str()),
                Node::Block(_) => None,
            })
            .collect();
        texts.join("\n")
    }
}

/// Split on `\n`, `\r\n` and bare `\r`, returning each line with its byte
/// offset. A final terminator does not produce an extra empty line.
pub fn split_lines(source: &str) -> Vec<(usize, &str)> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push((start, &source[start..i]));
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push((start, &source[start..i]));
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push((start, &source[start..]));
    }
    lines
}

fn split_trailing(text: &str, from: usize) -> Result<(&str, &str), ParseError> {
    if !text.is_char_boundary(from) {
        return Err(ParseError::invalid_argument(format!(
            "trailing offset {from} is outside a {}-byte line",
            text.len()
        )));
    }
    Ok(text.split_at(from))
}

#[derive(Debug, Default)]
pub struct DocumentParser {
    parsers: Vec<ErrorContextParser>,
    extensions: Vec<ErrorContextExtension>,
}

impl DocumentParser {
    /// A host with no plugins; every line becomes text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Front matter (when enabled) and JSON blocks, configured from `config`.
    pub fn with_config(config: &ParseConfig) -> Self {
        let embedded = EmbeddedObjectParser::new().with_capacity(config.reader_capacity);
        let mut parser = Self::new();
        if config.front_matter {
            parser.register(
                FrontMatterParser::new()
                    .with_policy(config.unterminated)
                    .with_embedded(embedded),
            );
        }
        parser.register(JsonBlockParser::new().with_policy(config.unterminated));
        parser
    }

    /// Plugins are tried in registration order.
    pub fn register(&mut self, parser: impl BlockParser + 'static) -> &mut Self {
        self.parsers.push(ErrorContextParser::new(parser));
        self
    }

    pub fn register_extension(
        &mut self,
        name: impl Into<String>,
        hook: impl BlockClosedHook + 'static,
    ) -> &mut Self {
        self.extensions.push(ErrorContextExtension::new(name, hook));
        self
    }

    #[instrument(target = "jsonblock::document", skip_all, fields(len = source.len()))]
    pub fn parse(&mut self, source: &str) -> Result<Document, ParseError> {
        let lines = split_lines(source);
        let offsets: Vec<usize> = lines.iter().map(|(offset, _)| *offset).collect();
        let mut nodes = Vec::new();
        let mut next_id = 0;
        let mut active: Option<(usize, Block)> = None;
        let mut index = 0;

        while index < lines.len() {
            let text = lines[index].1;
            let line = Line::new(text, index + 1);
            let mut pending: Option<(usize, Block)> = None;

            if let Some((owner, mut block)) = active.take() {
                match self.parsers[owner].try_continue(&mut block, &line)? {
                    Continuation::Consumed => {
                        block.push_line(text);
                        active = Some((owner, block));
                        index += 1;
                        continue;
                    }
                    Continuation::Finished { trailing_from } => {
                        let (content, trailing) =
                            split_trailing(text, trailing_from.unwrap_or(text.len()))?;
                        block.push_line(content);
                        block.mark_complete();
                        self.finalize(owner, block, &mut nodes)?;
                        if !trailing.is_empty() {
                            nodes.push(Node::Text { line: line.number, text: trailing.to_string() });
                        }
                        index += 1;
                        continue;
                    }
                    Continuation::Unmatched => pending = Some((owner, block)),
                }
            }

            let view = DocumentView::new(
                source,
                &offsets,
                pending.as_ref().map(|(_, block)| block.reference()),
                BlockId(next_id),
            );
            let mut opened = None;
            for (owner, parser) in self.parsers.iter_mut().enumerate() {
                if let Some(start) = parser.try_open(&line, &view)? {
                    opened = Some((owner, start));
                    break;
                }
            }

            if let Some((owner, block)) = pending.take() {
                self.finalize(owner, block, &mut nodes)?;
            }

            match opened {
                None => {
                    nodes.push(Node::Text { line: line.number, text: text.to_string() });
                    index += 1;
                }
                Some((owner, start)) => {
                    let reference = BlockRef {
                        id: BlockId(next_id),
                        kind: self.parsers[owner].kind().to_string(),
                        start_line: line.number,
                    };
                    next_id += 1;
                    let (block, trailing, last) = self.claim(reference, &start, &lines, index)?;
                    debug!(target: "jsonblock::document", block = block.id().0, kind = block.kind(), lines = last - index, complete = start.complete, "block opened");
                    index = last;

                    if start.complete {
                        self.finalize(owner, block, &mut nodes)?;
                        if let Some((number, trailing)) = trailing {
                            nodes.push(Node::Text { line: number, text: trailing });
                        }
                    } else {
                        active = Some((owner, block));
                    }
                }
            }
        }

        if let Some((owner, block)) = active.take() {
            self.finalize(owner, block, &mut nodes)?;
        }
        Ok(Document { nodes })
    }

    /// Build the block for a successful open, returning any trailing text of
    /// its last line and the index of the first unclaimed line.
    fn claim(
        &self,
        reference: BlockRef,
        start: &BlockStart,
        lines: &[(usize, &str)],
        index: usize,
    ) -> Result<(Block, Option<(usize, String)>, usize), ParseError> {
        let last = (index + start.lines_consumed.max(1)).min(lines.len());
        let mut block = Block::new(reference, start.column);
        let mut trailing = None;

        for (i, (_, text)) in lines.iter().enumerate().take(last).skip(index) {
            match start.trailing_from {
                Some(from) if start.complete && i + 1 == last => {
                    let (content, rest) = split_trailing(text, from)?;
                    block.push_line(content);
                    if !rest.is_empty() {
                        trailing = Some((i + 1, rest.to_string()));
                    }
                }
                _ => block.push_line(*text),
            }
        }
        if start.complete {
            block.mark_complete();
        }
        Ok((block, trailing, last))
    }

    fn finalize(&mut self, owner: usize, mut block: Block, nodes: &mut Vec<Node>) -> Result<(), ParseError> {
        match self.parsers[owner].close(&mut block)? {
            CloseAction::Discard => {
                debug!(target: "jsonblock::document", block = block.id().0, "block discarded");
            }
            CloseAction::Keep => {
                for extension in &mut self.extensions {
                    extension.block_closed(&mut block)?;
                }
                nodes.push(Node::Block(block));
            }
        }
        Ok(())
    }
}
