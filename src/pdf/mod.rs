pub mod detach;
pub mod document;
pub mod page_tree;

pub use document::{merge_documents, PdfDocument};
