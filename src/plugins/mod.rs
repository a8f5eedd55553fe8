//! Block plugins shipped with the crate.
//!
//! - [`FrontMatterParser`]: a leading object read in one shot through the
//!   line-bridging reader.
//! - [`JsonBlockParser`]: objects anywhere in the document, recognized line
//!   by line with the boundary scanner.
//! - [`RequiredKeys`]: a block-closed hook validating what the JSON parser
//!   produced.

mod front_matter;
mod json_block;
mod required_keys;

pub use front_matter::FrontMatterParser;
pub use json_block::JsonBlockParser;
pub use required_keys::RequiredKeys;

/// Offset where document text resumes after `end` on `text`, if anything but
/// whitespace follows.
fn trailing_from(text: &str, end: usize) -> Option<usize> {
    text.get(end..)
        .filter(|rest| !rest.trim().is_empty())
        .map(|_| end)
}
