//! Error-context funnels around block plugins.
//!
//! Plugin authors implement [`BlockParser`] (or [`BlockClosedHook`] when they
//! only observe blocks another plugin owns). The host never calls those
//! directly: it goes through [`ErrorContextParser`] / [`ErrorContextExtension`],
//! which route every failure through one enrichment point so it leaves with
//! exactly one location, the most specific one available:
//!
//! - `try_open`: the pending (pushed, not yet finalized) block if there is
//!   one, otherwise the host cursor's line and column.
//! - `try_continue`, `close`, block-closed hooks: the block itself.
//!
//! Errors already tagged with a block pass through unchanged, and
//! `InvalidArgument` is never located.

use std::fmt;

use tracing::{debug, instrument, trace};

use crate::block::{Block, BlockStart, CloseAction, Continuation, DocumentView, Line};
use crate::error::{ErrorContext, ParseError};

/// The three extension points of a block plugin.
pub trait BlockParser {
    /// Kind recorded on every block this plugin opens.
    fn kind(&self) -> &str;

    /// Decide whether a block starts on `line`.
    fn try_open_block(
        &mut self,
        line: &Line<'_>,
        view: &DocumentView<'_>,
    ) -> Result<Option<BlockStart>, ParseError>;

    /// Called for each line after the opening one while the block is active.
    /// By default the block never extends past its opening lines.
    fn try_continue_block(
        &mut self,
        _block: &mut Block,
        _line: &Line<'_>,
    ) -> Result<Continuation, ParseError> {
        Ok(Continuation::Unmatched)
    }

    fn close_block(&mut self, _block: &mut Block) -> Result<CloseAction, ParseError> {
        Ok(CloseAction::Keep)
    }
}

impl<P: BlockParser + ?Sized> BlockParser for Box<P> {
    fn kind(&self) -> &str {
        self.as_ref().kind()
    }

    fn try_open_block(
        &mut self,
        line: &Line<'_>,
        view: &DocumentView<'_>,
    ) -> Result<Option<BlockStart>, ParseError> {
        self.as_mut().try_open_block(line, view)
    }

    fn try_continue_block(
        &mut self,
        block: &mut Block,
        line: &Line<'_>,
    ) -> Result<Continuation, ParseError> {
        self.as_mut().try_continue_block(block, line)
    }

    fn close_block(&mut self, block: &mut Block) -> Result<CloseAction, ParseError> {
        self.as_mut().close_block(block)
    }
}

/// Observer of blocks closed by some other plugin.
pub trait BlockClosedHook {
    fn on_block_closed(&mut self, block: &mut Block) -> Result<(), ParseError>;
}

impl<F> BlockClosedHook for F
where
    F: FnMut(&mut Block) -> Result<(), ParseError>,
{
    fn on_block_closed(&mut self, block: &mut Block) -> Result<(), ParseError> {
        self(block)
    }
}

/// Lifecycle step an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Continue,
    Close,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Open => "open",
            Phase::Continue => "continue",
            Phase::Close => "close",
            Phase::Closed => "block-closed",
        };
        f.write_str(name)
    }
}

/// The single enrichment point.
fn locate<T>(
    phase: Phase,
    kind: &str,
    result: Result<T, ParseError>,
    context: impl FnOnce() -> ErrorContext,
) -> Result<T, ParseError> {
    result.map_err(|err| {
        if err.context().is_block() || err.is_invalid_argument() {
            trace!(target: "jsonblock::wrapping", %phase, kind, "error passed through unchanged");
            return err;
        }
        let context = context();
        debug!(target: "jsonblock::wrapping", %phase, kind, location = %context, "locating plugin error");
        err.attach_once(context)
    })
}

fn check_line(line: &Line<'_>) -> Result<(), ParseError> {
    if line.number == 0 {
        return Err(ParseError::invalid_argument("line numbers are 1-based"));
    }
    if !line.text.is_char_boundary(line.column) {
        return Err(ParseError::invalid_argument(format!(
            "cursor column {} is outside line {} ({} bytes)",
            line.column,
            line.number,
            line.text.len()
        )));
    }
    Ok(())
}

/// Wraps a [`BlockParser`]; the only entry point the host uses.
pub struct ErrorContextParser {
    inner: Box<dyn BlockParser>,
}

impl fmt::Debug for ErrorContextParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorContextParser").field("kind", &self.inner.kind()).finish()
    }
}

impl ErrorContextParser {
    pub fn new(inner: impl BlockParser + 'static) -> Self {
        Self { inner: Box::new(inner) }
    }

    pub fn kind(&self) -> &str {
        self.inner.kind()
    }

    fn check_owned(&self, block: &Block) -> Result<(), ParseError> {
        if block.kind() != self.inner.kind() {
            return Err(ParseError::invalid_argument(format!(
                "{} block #{} handed to the {} parser",
                block.kind(),
                block.id().0,
                self.inner.kind()
            )));
        }
        if block.is_finalized() {
            return Err(ParseError::invalid_argument(format!(
                "block #{} is already closed",
                block.id().0
            )));
        }
        Ok(())
    }

    #[instrument(target = "jsonblock::wrapping", level = "trace", skip_all, fields(kind = self.inner.kind(), line = line.number))]
    pub fn try_open(
        &mut self,
        line: &Line<'_>,
        view: &DocumentView<'_>,
    ) -> Result<Option<BlockStart>, ParseError> {
        check_line(line)?;
        let result = self.inner.try_open_block(line, view);
        let start = locate(Phase::Open, self.inner.kind(), result, || match view.pending_block() {
            Some(pending) => ErrorContext::Block(pending.clone()),
            None => ErrorContext::Line { line: line.number, column: line.column + 1 },
        })?;

        if let Some(start) = &start {
            if !line.text.is_char_boundary(start.column) {
                return Err(ParseError::invalid_argument(format!(
                    "{} parser opened a block at column {} outside line {}",
                    self.inner.kind(),
                    start.column,
                    line.number
                )));
            }
        }
        Ok(start)
    }

    #[instrument(target = "jsonblock::wrapping", level = "trace", skip_all, fields(kind = self.inner.kind(), block = block.id().0, line = line.number))]
    pub fn try_continue(
        &mut self,
        block: &mut Block,
        line: &Line<'_>,
    ) -> Result<Continuation, ParseError> {
        check_line(line)?;
        self.check_owned(block)?;
        let result = self.inner.try_continue_block(block, line);
        locate(Phase::Continue, self.inner.kind(), result, || {
            ErrorContext::Block(block.reference().clone())
        })
    }

    #[instrument(target = "jsonblock::wrapping", level = "trace", skip_all, fields(kind = self.inner.kind(), block = block.id().0))]
    pub fn close(&mut self, block: &mut Block) -> Result<CloseAction, ParseError> {
        self.check_owned(block)?;
        let result = self.inner.close_block(block);
        block.mark_finalized();
        let action = locate(Phase::Close, self.inner.kind(), result, || {
            ErrorContext::Block(block.reference().clone())
        })?;
        debug!(target: "jsonblock::wrapping", kind = self.inner.kind(), block = block.id().0, ?action, "block closed");
        Ok(action)
    }
}

/// Wraps a [`BlockClosedHook`] with the same attach-once discipline.
pub struct ErrorContextExtension {
    name: String,
    inner: Box<dyn BlockClosedHook>,
}

impl fmt::Debug for ErrorContextExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorContextExtension").field("name", &self.name).finish()
    }
}

impl ErrorContextExtension {
    pub fn new(name: impl Into<String>, hook: impl BlockClosedHook + 'static) -> Self {
        Self { name: name.into(), inner: Box::new(hook) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_closed(&mut self, block: &mut Block) -> Result<(), ParseError> {
        if !block.is_finalized() {
            return Err(ParseError::invalid_argument(format!(
                "{} saw block #{} before it was closed",
                self.name,
                block.id().0
            )));
        }
        let result = self.inner.on_block_closed(block);
        locate(Phase::Closed, &self.name, result, || {
            ErrorContext::Block(block.reference().clone())
        })
    }
}
