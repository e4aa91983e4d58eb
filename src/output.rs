use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::error::{Result, SplitterError};
use crate::page_range::range_slug;

/// Write a file through a temporary sibling and rename it into place.
///
/// Nothing appears at `path` unless `write` succeeds; an existing file there
/// is replaced only at the final rename and keeps its permissions. New files
/// get the permissions a plain create would give them.
pub fn write_atomically<P, F>(path: P, write: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let path = path.as_ref();
    let io_error = |source| SplitterError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path).ok().map(|metadata| metadata.permissions());

    let mut builder = Builder::new();
    builder.prefix(".splitter");
    // same mode File::create asks for, before the umask
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(io_error)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(io_error)?;
        writer.flush().map_err(io_error)?;
    }
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions).map_err(io_error)?;
    }
    tmp.as_file().sync_all().map_err(io_error)?;

    tmp.persist(path).map_err(|e| io_error(e.error))?;
    tracing::debug!(path = %path.display(), "output written");
    Ok(())
}

fn sibling(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}_{}.{}", stem, suffix, extension))
}

/// `report.pdf` + "1-3,5" gives `report_pages_1_3_5.pdf` next to the input.
pub fn default_extract_output(input: &Path, pages: &str) -> PathBuf {
    sibling(input, &format!("pages_{}", range_slug(pages)), "pdf")
}

pub fn default_merge_output(first: &Path) -> PathBuf {
    sibling(first, "merged", "pdf")
}

pub fn default_slides_output(input: &Path, slides: &str) -> PathBuf {
    sibling(input, &format!("slides_{}", range_slug(slides)), "pptx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let input = Path::new("/docs/report.pdf");
        assert_eq!(
            default_extract_output(input, "1-3, 5"),
            PathBuf::from("/docs/report_pages_1_3_5.pdf")
        );
        assert_eq!(
            default_merge_output(input),
            PathBuf::from("/docs/report_merged.pdf")
        );
        assert_eq!(
            default_slides_output(Path::new("deck.pptx"), "1-2,8"),
            PathBuf::from("deck_slides_1_2_8.pptx")
        );
    }

    #[test]
    fn test_write_atomically_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        write_atomically(&path, |w| w.write_all(b"hello")).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"old").unwrap();

        let result = write_atomically(&path, |w| {
            let _ = w.write_all(b"partial");
            Err(io::Error::other("boom"))
        });

        assert!(matches!(result, Err(SplitterError::Io { .. })));
        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");

        let err = write_atomically(&path, |_| Ok(())).unwrap_err();
        assert!(matches!(err, SplitterError::Io { .. }));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_replaced_file_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        for mode in [0o644, 0o640] {
            fs::write(&path, b"old").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();

            write_atomically(&path, |w| w.write_all(b"new")).unwrap();

            let actual = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(actual, mode);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_mode_follows_umask() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.bin");
        fs::write(&plain, b"x").unwrap();
        let path = dir.path().join("out.bin");

        write_atomically(&path, |w| w.write_all(b"x")).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&plain));
    }
}
