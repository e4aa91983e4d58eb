use crate::document::SubsetDocument;
use crate::output::{default_extract_output, write_atomically};
use crate::page_range::{expand_page_ranges, parse_page_ranges, Accumulation};
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

use super::{output_path, require_path, require_text, Outcome};

/// Open `input`, keep the items selected by `ranges`, and write the result to `output`.
pub fn subset_to<D: SubsetDocument>(
    input: &Path,
    ranges: &str,
    output: &Path,
    accumulation: Accumulation,
) -> Result<Outcome> {
    // malformed ranges are reported without touching the document
    parse_page_ranges(ranges, D::KIND)?;
    let source = D::open(input)?;
    let total = source.item_count();

    let indices = expand_page_ranges(ranges, total, D::KIND, accumulation)?;
    tracing::info!(
        input = %input.display(),
        ranges,
        total,
        selected = indices.len(),
        "extracting {}s",
        D::KIND
    );

    let mut subset = source.subset(&indices)?;
    write_atomically(output, |writer| subset.write_to(writer))?;

    Ok(Outcome {
        output_path: output.to_path_buf(),
        item_count: subset.item_count(),
    })
}

pub fn execute(input: &Path, pages: &str, output: Option<&Path>, ordered: bool) -> Result<Outcome> {
    require_path(input, "input file")?;
    require_text(pages, "page range")?;
    let output = output_path(output, || default_extract_output(input, pages))?;

    let accumulation = if ordered {
        Accumulation::Ordered
    } else {
        Accumulation::Sorted
    };
    subset_to::<PdfDocument>(input, pages, &output, accumulation)
}

pub fn run(input: &Path, pages: &str, output: Option<&Path>, ordered: bool) -> Result<()> {
    let outcome = execute(input, pages, output, ordered)?;

    println!(
        "Extracted {} page(s) to {}",
        outcome.item_count,
        outcome.output_path.display()
    );

    Ok(())
}
