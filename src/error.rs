use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ScoutError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{url} returned status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("missing embedded data: {0}")]
    MissingData(String),

    #[error("store snapshot is corrupt: {0}")]
    #[diagnostic(help("the snapshot is not repaired automatically; regenerate it with `generate`"))]
    CorruptStore(String),

    #[error("store snapshot not found at {0}")]
    #[diagnostic(help("run `fabric-scout generate <url>` first"))]
    StoreNotFound(PathBuf),

    #[error("cannot group by {material}: {url} has no such material")]
    MissingGroupAttribute { material: String, url: String },

    #[error("invalid percentage: {0}")]
    InvalidPercentage(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
