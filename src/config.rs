use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::embedded::DEFAULT_READER_CAPACITY;

/// Settings that can be picked up from the process environment.
pub trait FromEnvVar: Sized {
    /// The environment variable holding this setting
    const VAR_NAME: &'static str;

    fn parse_var(raw: &str) -> Option<Self>;

    /// Read the variable from the process environment.
    fn from_env() -> Option<Self> {
        let raw = env::var(Self::VAR_NAME).ok()?;
        let parsed = Self::parse_var(raw.trim());
        if parsed.is_none() {
            warn!(target: "jsonblock::config", var = Self::VAR_NAME, value = %raw, "ignoring unrecognized value");
        }
        parsed
    }
}

/// What to do when the document ends inside an embedded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnterminatedPolicy {
    /// Fail with `UnterminatedEmbeddedValue`.
    #[default]
    Error,
    /// Keep the block, without a value, having swallowed the rest of the document.
    ConsumeToEnd,
}

impl FromStr for UnterminatedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "consume" | "consume-to-end" => Ok(Self::ConsumeToEnd),
            _ => Err(format!("Unknown unterminated policy: '{}'. Supported: error, consume", s)),
        }
    }
}

impl fmt::Display for UnterminatedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnterminatedPolicy::Error => write!(f, "error"),
            UnterminatedPolicy::ConsumeToEnd => write!(f, "consume"),
        }
    }
}

impl FromEnvVar for UnterminatedPolicy {
    const VAR_NAME: &'static str = "JSONBLOCK_UNTERMINATED";

    fn parse_var(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Buffer size between the line reader and the deserializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderCapacity(pub usize);

impl FromEnvVar for ReaderCapacity {
    const VAR_NAME: &'static str = "JSONBLOCK_READER_CAPACITY";

    fn parse_var(raw: &str) -> Option<Self> {
        raw.parse::<usize>().ok().filter(|n| *n > 0).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter(pub bool);

impl FromEnvVar for FrontMatter {
    const VAR_NAME: &'static str = "JSONBLOCK_FRONT_MATTER";

    fn parse_var(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(Self(true)),
            "0" | "false" | "no" | "off" => Some(Self(false)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub unterminated: UnterminatedPolicy,
    pub reader_capacity: usize,
    /// Recognize a leading embedded object as document front matter.
    pub front_matter: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            unterminated: UnterminatedPolicy::default(),
            reader_capacity: DEFAULT_READER_CAPACITY,
            front_matter: true,
        }
    }
}

impl ParseConfig {
    /// Defaults overridden by `JSONBLOCK_*` variables, loading `.env` first
    /// if present.
    pub fn from_env() -> Self {
        // A missing .env file is not an error.
        if let Ok(path) = dotenvy::dotenv() {
            debug!(target: "jsonblock::config", path = %path.display(), "loaded .env");
        }
        let defaults = Self::default();
        Self {
            unterminated: UnterminatedPolicy::from_env().unwrap_or(defaults.unterminated),
            reader_capacity: ReaderCapacity::from_env()
                .map(|c| c.0)
                .unwrap_or(defaults.reader_capacity),
            front_matter: FrontMatter::from_env().map(|f| f.0).unwrap_or(defaults.front_matter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("error".parse(), Ok(UnterminatedPolicy::Error));
        assert_eq!("CONSUME".parse(), Ok(UnterminatedPolicy::ConsumeToEnd));
        assert!("later".parse::<UnterminatedPolicy>().is_err());
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        env::set_var(UnterminatedPolicy::VAR_NAME, "consume");
        assert_eq!(UnterminatedPolicy::from_env(), Some(UnterminatedPolicy::ConsumeToEnd));
        env::set_var(UnterminatedPolicy::VAR_NAME, "sometimes");
        assert_eq!(UnterminatedPolicy::from_env(), None);
        env::remove_var(UnterminatedPolicy::VAR_NAME);
        assert_eq!(UnterminatedPolicy::from_env(), None);
    }

    #[test]
    fn test_var_parsing() {
        assert_eq!(ReaderCapacity::parse_var("64"), Some(ReaderCapacity(64)));
        assert_eq!(ReaderCapacity::parse_var("0"), None);
        assert_eq!(FrontMatter::parse_var("off"), Some(FrontMatter(false)));
        assert_eq!(FrontMatter::parse_var("maybe"), None);
    }
}
