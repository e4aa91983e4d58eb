pub mod package;
pub mod xml;

pub use package::PptxPackage;
