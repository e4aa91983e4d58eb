use crate::document::DocumentKind;
use crate::pdf::PdfDocument;
use crate::pptx::PptxPackage;
use anyhow::Result;
use std::path::Path;

use super::require_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub kind: DocumentKind,
    pub item_count: usize,
}

pub fn execute(path: &Path) -> Result<DocumentInfo> {
    require_path(path, "input file")?;
    let kind = DocumentKind::from_path(path)?;
    let item_count = match kind {
        DocumentKind::Pdf => PdfDocument::open(path)?.page_count(),
        DocumentKind::Pptx => PptxPackage::open(path)?.slide_count(),
    };
    Ok(DocumentInfo { kind, item_count })
}

pub fn run(path: &Path) -> Result<()> {
    let info = execute(path)?;

    println!("File: {}", path.display());
    println!("Type: {}", info.kind.name());
    match info.kind {
        DocumentKind::Pdf => println!("Pages: {}", info.item_count),
        DocumentKind::Pptx => println!("Slides: {}", info.item_count),
    }

    Ok(())
}
