//! Top-level gateway error, folding the per-crate error types raised at
//! each boundary into one enum the binary can match on. Mirrors
//! `crates/domain/src/error.rs`'s derive shape one level up, per the
//! error-handling design's "aggregated into a top-level `Error` in the
//! gateway crate" rule.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("orchestration: {0}")]
    Orchestration(#[from] orc_domain::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
