use crate::output::default_slides_output;
use crate::page_range::Accumulation;
use crate::pptx::PptxPackage;
use anyhow::Result;
use std::path::Path;

use super::extract::subset_to;
use super::{output_path, require_path, require_text, Outcome};

pub fn execute(input: &Path, slides: &str, output: Option<&Path>) -> Result<Outcome> {
    require_path(input, "input file")?;
    require_text(slides, "slide range")?;
    let output = output_path(output, || default_slides_output(input, slides))?;

    // Slides are removed in place, so the kept ones always stay in deck order
    subset_to::<PptxPackage>(input, slides, &output, Accumulation::Sorted)
}

pub fn run(input: &Path, slides: &str, output: Option<&Path>) -> Result<()> {
    let outcome = execute(input, slides, output)?;

    println!(
        "Extracted {} slide(s) to {}",
        outcome.item_count,
        outcome.output_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitterError;
    use crate::pptx::package::test_support::create_test_pptx;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_extract_slides_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("deck.pptx");
        fs::write(&input, create_test_pptx(8)).unwrap();

        let outcome = execute(&input, "1-2, 8", None).unwrap();

        assert_eq!(outcome.output_path, dir.path().join("deck_slides_1_2_8.pptx"));
        assert_eq!(outcome.item_count, 3);

        let out = PptxPackage::open(&outcome.output_path).unwrap();
        let parts: Vec<&str> = out.slides().iter().map(|s| s.part.as_str()).collect();
        assert_eq!(
            parts,
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide8.xml"
            ]
        );
    }

    #[test]
    fn test_slide_out_of_bounds_message() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("deck.pptx");
        fs::write(&input, create_test_pptx(8)).unwrap();

        let err = execute(&input, "7-9", None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains('9'), "{message}");
        assert!(message.contains("8 slides"), "{message}");
        assert!(!dir.path().join("deck_slides_7_9.pptx").exists());
    }

    #[test]
    fn test_pdf_given_as_presentation() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("deck.pptx");
        fs::write(&input, b"%PDF-1.5").unwrap();

        let err = execute(&input, "1", None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitterError>(),
            Some(SplitterError::DocumentOpen { .. })
        ));
    }
}
