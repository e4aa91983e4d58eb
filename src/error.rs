use std::path::PathBuf;
use thiserror::Error;

use crate::page_range::ItemKind;

#[derive(Error, Debug)]
pub enum SplitterError {
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Invalid {kind} number in range expression: '{token}'")]
    ParseError { kind: ItemKind, token: String },

    #[error("Invalid {kind} range {start}-{end}: start {kind} cannot be greater than end {kind}")]
    InvalidRange { kind: ItemKind, start: u32, end: u32 },

    #[error("{kind} {token} is out of bounds: {bound} is not within 1-{total}, the document has {total} {kind}s")]
    OutOfBounds {
        kind: ItemKind,
        token: String,
        bound: u32,
        total: usize,
    },

    #[error("Failed to open {}: {reason}", .path.display())]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported document type: {} (expected .pdf or .pptx)", .0.display())]
    UnsupportedKind(PathBuf),
}

pub type Result<T, E = SplitterError> = std::result::Result<T, E>;
