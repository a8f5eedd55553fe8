//! The slice of the host document model that block plugins see.

use schemars::JsonSchema;
use serde::Serialize;

/// One source line as presented to a plugin.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub text: &'a str,
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the host's cursor within `text`.
    pub column: usize,
}

impl<'a> Line<'a> {
    pub fn new(text: &'a str, number: usize) -> Self {
        Self { text, number, column: 0 }
    }

    /// The unconsumed remainder of the line.
    pub fn rest(&self) -> &'a str {
        self.text.get(self.column..).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, JsonSchema)]
pub struct BlockId(pub usize);

/// Stable reference to a block, cheap enough to embed in errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct BlockRef {
    pub id: BlockId,
    pub kind: String,
    pub start_line: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Block {
    reference: BlockRef,
    /// Byte column of the first line where the block content begins.
    start_column: usize,
    /// Raw block lines; the first starts at `start_column`, the last ends at
    /// the closing character when the block closed mid-line.
    lines: Vec<String>,
    value: Option<serde_json::Value>,
    complete: bool,
    #[serde(skip)]
    finalized: bool,
}

impl Block {
    pub fn new(reference: BlockRef, start_column: usize) -> Self {
        Self {
            reference,
            start_column,
            lines: Vec::new(),
            value: None,
            complete: false,
            finalized: false,
        }
    }

    pub fn reference(&self) -> &BlockRef {
        &self.reference
    }

    pub fn id(&self) -> BlockId {
        self.reference.id
    }

    pub fn kind(&self) -> &str {
        &self.reference.kind
    }

    pub fn start_line(&self) -> usize {
        self.reference.start_line
    }

    pub fn start_column(&self) -> usize {
        self.start_column
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Block content joined with `\n`, starting at `start_column`.
    pub fn content(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i == 0 {
                out.push_str(line.get(self.start_column..).unwrap_or(""));
            } else {
                out.push('\n');
                out.push_str(line);
            }
        }
        out
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: serde_json::Value) {
        self.value = Some(value);
    }

    /// The plugin has seen the end of this block's content.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    /// `close` has run for this block.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub(crate) fn mark_finalized(&mut self) {
        self.finalized = true;
    }
}

/// Returned by a successful `try_open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStart {
    /// Byte column where the block content begins on the opening line.
    pub column: usize,
    /// Lines claimed by the open, counting the opening line.
    pub lines_consumed: usize,
    /// The block's content already ended within the claimed lines.
    pub complete: bool,
    /// Byte offset on the last claimed line where document text resumes.
    pub trailing_from: Option<usize>,
}

impl BlockStart {
    /// A block starting at `column` that continues on following lines.
    pub fn at(column: usize) -> Self {
        Self { column, lines_consumed: 1, complete: false, trailing_from: None }
    }

    pub fn spanning(mut self, lines_consumed: usize) -> Self {
        self.lines_consumed = lines_consumed.max(1);
        self
    }

    pub fn completed(mut self, trailing_from: Option<usize>) -> Self {
        self.complete = true;
        self.trailing_from = trailing_from;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// The line is not part of the block; the block ends before it.
    Unmatched,
    /// The line belongs to the block, which stays open.
    Consumed,
    /// The line belongs to the block and completes it. Text from
    /// `trailing_from` onwards goes back to the document.
    Finished { trailing_from: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    Keep,
    Discard,
}

/// Read-only lookahead over the document, offered to `try_open`.
#[derive(Debug, Clone, Copy)]
pub struct DocumentView<'a> {
    source: &'a str,
    line_offsets: &'a [usize],
    pending: Option<&'a BlockRef>,
    next_id: BlockId,
}

impl<'a> DocumentView<'a> {
    pub fn new(
        source: &'a str,
        line_offsets: &'a [usize],
        pending: Option<&'a BlockRef>,
        next_id: BlockId,
    ) -> Self {
        Self { source, line_offsets, pending, next_id }
    }

    /// The full document text.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Byte offset of 1-based line `number` within [`source`](Self::source).
    pub fn line_offset(&self, number: usize) -> Option<usize> {
        number.checked_sub(1).and_then(|i| self.line_offsets.get(i)).copied()
    }

    /// The most recently pushed block whose `close` has not run yet.
    pub fn pending_block(&self) -> Option<&'a BlockRef> {
        self.pending
    }

    /// Id the next opened block will receive.
    pub fn next_id(&self) -> BlockId {
        self.next_id
    }

    /// `true` when no line before `number` carries non-whitespace text.
    pub fn is_first_content_line(&self, number: usize) -> bool {
        let end = self.line_offset(number).unwrap_or(self.source.len());
        self.source[..end].trim().is_empty()
    }
}
