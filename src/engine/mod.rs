pub mod command;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use command::{CommandDocument, CommandEngine};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("invalid PDF format: {0}")]
    InvalidFormat(PathBuf),
    #[error("conversion of {path} failed: {reason}")]
    Conversion { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A PDF-to-HTML backend.
///
/// `load` acquires a document handle; the handle's resources are released
/// when it is dropped, so only successfully loaded documents are ever released.
pub trait Engine {
    type Document: Document;

    fn load(&self, pdf: &Path) -> Result<Self::Document, ConvertError>;
}

pub trait Document {
    fn save_html(&mut self, out: &Path) -> Result<(), ConvertError>;
}
