pub mod block;
pub mod config;
pub mod document;
pub mod embedded;
pub mod error;
pub mod plugins;
pub mod reader;
pub mod scanner;
pub mod wrapping;

// Convenient re-exports
pub use block::{Block, BlockId, BlockRef, BlockStart, CloseAction, Continuation, DocumentView, Line};
pub use config::{ParseConfig, UnterminatedPolicy};
pub use document::{Document, DocumentParser, Node};
pub use embedded::{parse_embedded, ConsumedSpan, EmbeddedObjectParser};
pub use error::{ErrorContext, ErrorKind, ParseError};
pub use reader::LineBridgingReader;
pub use scanner::{BoundaryScanner, Scan, ScanState};
pub use wrapping::{BlockClosedHook, BlockParser, ErrorContextExtension, ErrorContextParser};
