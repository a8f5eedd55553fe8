use anyhow::anyhow;

use crate::block::Block;
use crate::error::ParseError;
use crate::wrapping::BlockClosedHook;

/// Rejects closed blocks of one kind whose object lacks any of `keys`.
///
/// Blocks without a value (kept under `ConsumeToEnd`) are not checked.
#[derive(Debug, Clone)]
pub struct RequiredKeys {
    kind: String,
    keys: Vec<String>,
}

impl RequiredKeys {
    pub fn new<I, S>(kind: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { kind: kind.into(), keys: keys.into_iter().map(Into::into).collect() }
    }
}

impl BlockClosedHook for RequiredKeys {
    fn on_block_closed(&mut self, block: &mut Block) -> Result<(), ParseError> {
        if block.kind() != self.kind {
            return Ok(());
        }
        let Some(value) = block.value() else {
            return Ok(());
        };
        let object = value
            .as_object()
            .ok_or_else(|| anyhow!("expected an object, found {value}"))?;

        let missing: Vec<&str> = self
            .keys
            .iter()
            .filter(|key| !object.contains_key(key.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(anyhow!("missing required keys: {}", missing.join(", ")).into());
        }
        Ok(())
    }
}
