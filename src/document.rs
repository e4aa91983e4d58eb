use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SplitterError};
use crate::page_range::ItemKind;

/// A document whose pages or slides can be narrowed down to a subset.
pub trait SubsetDocument: Sized {
    /// What the document is made of, used for range parsing and messages.
    const KIND: ItemKind;

    fn open(path: &Path) -> Result<Self>;

    fn item_count(&self) -> usize;

    /// Keep only the items at the given zero-based indices.
    fn subset(self, indices: &[usize]) -> Result<Self>;

    fn write_to(&mut self, writer: &mut dyn Write) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Pptx,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("pptx") => Ok(DocumentKind::Pptx),
            _ => Err(SplitterError::UnsupportedKind(PathBuf::from(path))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Pptx => "pptx",
        }
    }
}
