use crate::output::{default_merge_output, write_atomically};
use crate::pdf::{merge_documents, PdfDocument};
use anyhow::Result;
use std::path::Path;

use super::{output_path, require_path, Outcome};

pub fn execute(first: &Path, second: &Path, output: Option<&Path>) -> Result<Outcome> {
    require_path(first, "first input file")?;
    require_path(second, "second input file")?;
    let output = output_path(output, || default_merge_output(first))?;

    let first_doc = PdfDocument::open(first)?;
    let second_doc = PdfDocument::open(second)?;
    tracing::info!(
        first = %first.display(),
        second = %second.display(),
        pages = first_doc.page_count() + second_doc.page_count(),
        "merging"
    );

    let mut merged = merge_documents(first_doc.doc, second_doc.doc)?;
    let item_count = merged.get_pages().len();
    write_atomically(&output, |writer| PdfDocument::save_to(&mut merged, writer))?;

    Ok(Outcome {
        output_path: output,
        item_count,
    })
}

pub fn run(first: &Path, second: &Path, output: Option<&Path>) -> Result<()> {
    let outcome = execute(first, second, output)?;

    println!(
        "Merged 2 files ({} pages) into {}",
        outcome.item_count,
        outcome.output_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitterError;
    use crate::pdf::page_tree::test_support::{create_test_pdf, page_labels};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_two_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.pdf");
        let second = dir.path().join("b.pdf");
        create_test_pdf(2, "A").save(&first).unwrap();
        create_test_pdf(1, "B").save(&second).unwrap();

        let outcome = execute(&first, &second, None).unwrap();

        assert_eq!(outcome.output_path, dir.path().join("a_merged.pdf"));
        assert_eq!(outcome.item_count, 3);
        let merged = PdfDocument::open(&outcome.output_path).unwrap();
        assert_eq!(
            page_labels(&merged.doc),
            vec!["A-Page-1", "A-Page-2", "B-Page-1"]
        );
    }

    #[test]
    fn test_merge_requires_both_inputs() {
        let err = execute(Path::new("a.pdf"), Path::new(""), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitterError>(),
            Some(SplitterError::MissingInput("second input file"))
        ));
    }

    #[test]
    fn test_merge_with_missing_second_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.pdf");
        create_test_pdf(2, "A").save(&first).unwrap();

        let err = execute(&first, &dir.path().join("missing.pdf"), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitterError>(),
            Some(SplitterError::DocumentOpen { .. })
        ));
        assert!(!dir.path().join("a_merged.pdf").exists());
    }
}
