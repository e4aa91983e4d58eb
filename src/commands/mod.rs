pub mod extract;
pub mod info;
pub mod merge;
pub mod slides;

use std::path::{Path, PathBuf};

use crate::error::SplitterError;

/// What a finished operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output_path: PathBuf,
    pub item_count: usize,
}

fn require_path(path: &Path, what: &'static str) -> Result<(), SplitterError> {
    if path.as_os_str().is_empty() {
        return Err(SplitterError::MissingInput(what));
    }
    Ok(())
}

fn require_text(text: &str, what: &'static str) -> Result<(), SplitterError> {
    if text.trim().is_empty() {
        return Err(SplitterError::MissingInput(what));
    }
    Ok(())
}

/// The explicit output path, or the derived default when none was given.
fn output_path<F>(output: Option<&Path>, default: F) -> Result<PathBuf, SplitterError>
where
    F: FnOnce() -> PathBuf,
{
    match output {
        Some(path) => {
            require_path(path, "output file")?;
            Ok(path.to_path_buf())
        }
        None => Ok(default()),
    }
}
