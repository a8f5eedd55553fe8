use std::fmt;

use thiserror::Error;

use crate::block::BlockRef;

/// Where in the document an error was raised.
///
/// Ranked `None < Line < Block`. Enrichment only ever moves up that ranking,
/// and a `Block` context is final.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorContext {
    #[default]
    None,
    /// 1-based line and column of the host's cursor.
    Line { line: usize, column: usize },
    /// The in-progress block the failure belongs to.
    Block(BlockRef),
}

impl ErrorContext {
    fn rank(&self) -> u8 {
        match self {
            ErrorContext::None => 0,
            ErrorContext::Line { .. } => 1,
            ErrorContext::Block(_) => 2,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, ErrorContext::Block(_))
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::None => Ok(()),
            ErrorContext::Line { line, column } => write!(f, " at line {line}, column {column}"),
            ErrorContext::Block(block) => write!(
                f,
                " in {} block #{} opened at line {}",
                block.kind, block.id.0, block.start_line
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    /// Programmer misuse. Never carries a document location.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("malformed embedded value: {0}")]
    MalformedEmbeddedValue(#[source] serde_json::Error),
    #[error("embedded value opened at line {opened_at} is never closed")]
    UnterminatedEmbeddedValue { opened_at: usize },
    #[error("{0:#}")]
    Plugin(anyhow::Error),
}

/// The only error type surfaced to the host: a kind plus its location.
#[derive(Error, Debug)]
#[error("{kind}{context}")]
pub struct ParseError {
    kind: ErrorKind,
    context: ErrorContext,
}

impl ParseError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, context: ErrorContext::None }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    pub fn unterminated(opened_at: usize) -> Self {
        Self::new(ErrorKind::UnterminatedEmbeddedValue { opened_at })
    }

    /// Wraps arbitrary plugin failure text.
    pub fn plugin(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Plugin(anyhow::anyhow!("{message}")))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument(_))
    }

    /// Attach `context` unless a location at least as specific is already
    /// present. `InvalidArgument` errors pass through untouched.
    pub fn attach_once(mut self, context: ErrorContext) -> Self {
        if self.is_invalid_argument() || self.context.is_block() {
            return self;
        }
        if context.rank() > self.context.rank() {
            self.context = context;
        }
        self
    }
}

impl From<ErrorKind> for ParseError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::MalformedEmbeddedValue(err))
    }
}

impl From<anyhow::Error> for ParseError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(ErrorKind::Plugin(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockId;

    fn block_ref(id: usize) -> BlockRef {
        BlockRef { id: BlockId(id), kind: "json".to_string(), start_line: 4 }
    }

    #[test]
    fn line_context_is_upgraded_to_block() {
        let err = ParseError::plugin("boom").attach_once(ErrorContext::Line { line: 2, column: 1 });
        let err = err.attach_once(ErrorContext::Block(block_ref(1)));
        assert_eq!(err.context(), &ErrorContext::Block(block_ref(1)));
    }

    #[test]
    fn block_context_is_final() {
        let err = ParseError::plugin("boom").attach_once(ErrorContext::Block(block_ref(1)));
        let err = err.attach_once(ErrorContext::Block(block_ref(2)));
        assert_eq!(err.context(), &ErrorContext::Block(block_ref(1)));
    }

    #[test]
    fn first_line_context_wins() {
        let err = ParseError::plugin("boom")
            .attach_once(ErrorContext::Line { line: 2, column: 3 })
            .attach_once(ErrorContext::Line { line: 9, column: 1 });
        assert_eq!(err.context(), &ErrorContext::Line { line: 2, column: 3 });
    }

    #[test]
    fn invalid_argument_is_never_located() {
        let err = ParseError::invalid_argument("negative offset")
            .attach_once(ErrorContext::Block(block_ref(1)));
        assert_eq!(err.context(), &ErrorContext::None);
    }

    #[test]
    fn display_includes_location() {
        let err = ParseError::unterminated(4).attach_once(ErrorContext::Block(block_ref(7)));
        assert_eq!(
            err.to_string(),
            "embedded value opened at line 4 is never closed in json block #7 opened at line 4"
        );
    }
}
