use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlyphAtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not an atlas state buffer (magic {found:#010x})")]
    BadMagic { found: u32 },
    #[error("Unsupported atlas state version {found}")]
    UnsupportedVersion { found: u32 },
    #[error("Truncated atlas state: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("Corrupt atlas state: {0}")]
    Corrupt(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid skyline: {0}")]
    InvalidSkyline(String),
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, GlyphAtlasError>;
