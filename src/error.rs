use std::str::Utf8Error;

use hmac::digest::InvalidLength;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The profile cannot produce a password. Fix the input, never retry.
    #[error("invalid profile: {0}")]
    Config(#[from] ConfigError),

    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),

    /// HMAC accepts keys of any length, so no HMAC-based primitive here
    /// produces this.
    #[error("MAC rejected the key: {0}")]
    InvalidKey(#[from] InvalidLength),

    #[error("derivation cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("iteration count must be at least 1")]
    ZeroIterations,

    #[error("counter must be at least 1")]
    ZeroCounter,

    #[error("at least one character class is required")]
    NoCharacterClasses,

    #[error("length {length} cannot hold one character from each of {classes} classes")]
    LengthBelowClassCount { length: usize, classes: usize },

    #[error("length {length} is outside the supported range {min}..={max}")]
    LengthOutOfRange {
        length: usize,
        min: usize,
        max: usize,
    },

    #[error("unknown character class bits {0:#04x}")]
    UnknownCharacterClasses(u8),

    #[error("unknown digest size {0} (expected 256, 384 or 512)")]
    UnknownAlgorithm(u16),
}

impl Error {
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
