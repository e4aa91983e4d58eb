use std::collections::{BTreeSet, VecDeque};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::{self, attribute, Relationship};
use crate::document::SubsetDocument;
use crate::error::{Result, SplitterError};
use crate::page_range::ItemKind;

const CONTENT_TYPES: &str = "[Content_Types].xml";
const PRESENTATION: &str = "ppt/presentation.xml";

struct ZipEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// A slide as listed in `presentation.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRef {
    /// Numeric slide id (`p:sldId/@id`)
    pub id: String,
    /// Relationship id from the presentation part to the slide part
    pub rel_id: String,
    /// Package path of the slide part, e.g. `ppt/slides/slide3.xml`
    pub part: String,
}

/// An opened `.pptx` package, held fully in memory.
pub struct PptxPackage {
    entries: Vec<ZipEntry>,
    slides: Vec<SlideRef>,
}

impl PptxPackage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SplitterError::DocumentOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let package = Self::from_reader(BufReader::new(file), path)?;
        tracing::debug!(path = %path.display(), slides = package.slides.len(), "opened presentation");
        Ok(package)
    }

    #[cfg(test)]
    pub fn from_bytes<P: AsRef<Path>>(data: Vec<u8>, path: P) -> Result<Self> {
        Self::from_reader(Cursor::new(data), path.as_ref())
    }

    fn from_reader<R: Read + Seek>(reader: R, path: &Path) -> Result<Self> {
        let open_error = |reason: String| SplitterError::DocumentOpen {
            path: path.to_path_buf(),
            reason,
        };

        let mut archive = ZipArchive::new(reader).map_err(|e| open_error(e.to_string()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(|e| open_error(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| open_error(e.to_string()))?;
            entries.push(ZipEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
            });
        }

        let mut package = PptxPackage {
            entries,
            slides: Vec::new(),
        };
        package.slides = package.read_slide_list().map_err(|e| match e {
            SplitterError::Malformed(reason) => open_error(reason),
            other => other,
        })?;

        Ok(package)
    }

    fn read_slide_list(&self) -> Result<Vec<SlideRef>> {
        let presentation = self
            .part(PRESENTATION)
            .ok_or_else(|| SplitterError::Malformed(format!("missing {}", PRESENTATION)))?;
        let ids = xml::parse_slide_ids(presentation).map_err(xml_error(PRESENTATION))?;
        let rels = self.relationships(PRESENTATION)?;

        ids.into_iter()
            .map(|(id, rel_id)| {
                let rel = rels.iter().find(|rel| rel.id == rel_id).ok_or_else(|| {
                    SplitterError::Malformed(format!(
                        "slide {} refers to unknown relationship {}",
                        id, rel_id
                    ))
                })?;
                Ok(SlideRef {
                    id,
                    part: resolve_target(PRESENTATION, &rel.target),
                    rel_id,
                })
            })
            .collect()
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slides(&self) -> &[SlideRef] {
        &self.slides
    }

    /// Raw bytes of a package part. Part names compare case-insensitively.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.data.as_slice())
    }

    fn part_mut(&mut self, name: &str) -> Option<&mut Vec<u8>> {
        self.entries
            .iter_mut()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| &mut entry.data)
    }

    fn rewrite_part<F>(&mut self, name: &str, remove: F) -> Result<()>
    where
        F: Fn(&quick_xml::events::BytesStart) -> bool,
    {
        let Some(data) = self.part_mut(name) else {
            return Ok(());
        };
        *data = xml::remove_elements(data, remove).map_err(xml_error(name))?;
        Ok(())
    }

    /// Relationships declared by `part`; empty if it has no `.rels` part.
    fn relationships(&self, part: &str) -> Result<Vec<Relationship>> {
        let rels_name = rels_path(part);
        match self.part(&rels_name) {
            Some(data) => xml::parse_relationships(data).map_err(xml_error(&rels_name)),
            None => Ok(Vec::new()),
        }
    }

    /// Every part reachable from the package root through internal relationships,
    /// lowercased.
    fn reachable_parts(&self) -> Result<BTreeSet<String>> {
        let mut reachable = BTreeSet::new();
        let mut queue = VecDeque::from([String::new()]);

        while let Some(part) = queue.pop_front() {
            for rel in self.relationships(&part)? {
                if rel.external {
                    continue;
                }
                let target = resolve_target(&part, &rel.target);
                if reachable.insert(target.to_ascii_lowercase()) {
                    queue.push_back(target);
                }
            }
        }

        Ok(reachable)
    }

    /// Detach the slide at `index` from the presentation.
    ///
    /// Removes its entry from the slide list (plus section and custom show
    /// references) and the presentation relationship pointing at it. The slide
    /// part itself is only dropped by [`PptxPackage::retain_slides`], once it is
    /// known what else became unreachable.
    pub fn remove_slide(&mut self, index: usize) -> Result<SlideRef> {
        if index >= self.slides.len() {
            return Err(SplitterError::OutOfBounds {
                kind: ItemKind::Slide,
                token: (index + 1).to_string(),
                bound: (index + 1) as u32,
                total: self.slides.len(),
            });
        }
        let slide = self.slides.remove(index);

        self.rewrite_part(PRESENTATION, |e| {
            attribute(e, b"id", true).as_deref() == Some(slide.rel_id.as_str())
                || (e.local_name().as_ref() == b"sldId"
                    && attribute(e, b"id", false).as_deref() == Some(slide.id.as_str()))
        })?;
        self.rewrite_part(&rels_path(PRESENTATION), |e| {
            e.local_name().as_ref() == b"Relationship"
                && attribute(e, b"Id", false).as_deref() == Some(slide.rel_id.as_str())
        })?;

        tracing::debug!(slide = %slide.part, "removed slide");
        Ok(slide)
    }

    /// Keep only the slides at the given zero-based indices, in source order.
    ///
    /// Every complement slide is removed; then each part that was reachable
    /// before and is not anymore (slide parts, their notes, media nobody else
    /// uses) is dropped along with its relationships and content type override.
    pub fn retain_slides(&mut self, indices: &[usize]) -> Result<()> {
        let total = self.slides.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= total) {
            return Err(SplitterError::OutOfBounds {
                kind: ItemKind::Slide,
                token: (index + 1).to_string(),
                bound: (index + 1) as u32,
                total,
            });
        }

        let before = self.reachable_parts()?;
        let keep: BTreeSet<usize> = indices.iter().copied().collect();

        // Highest first so lower indices stay valid
        for index in (0..total).rev().filter(|index| !keep.contains(index)) {
            self.remove_slide(index)?;
        }

        let after = self.reachable_parts()?;
        let dropped: BTreeSet<String> = before.difference(&after).cloned().collect();
        self.drop_parts(&dropped)?;

        Ok(())
    }

    fn drop_parts(&mut self, dropped: &BTreeSet<String>) -> Result<()> {
        if dropped.is_empty() {
            return Ok(());
        }
        let dropped_rels: BTreeSet<String> = dropped.iter().map(|part| rels_path(part)).collect();

        self.entries.retain(|entry| {
            let name = entry.name.to_ascii_lowercase();
            !dropped.contains(&name) && !dropped_rels.contains(&name)
        });

        self.rewrite_part(CONTENT_TYPES, |e| {
            e.local_name().as_ref() == b"Override"
                && attribute(e, b"PartName", false).is_some_and(|name| {
                    dropped.contains(&name.trim_start_matches('/').to_ascii_lowercase())
                })
        })?;

        tracing::debug!(parts = dropped.len(), "dropped unreachable parts");
        Ok(())
    }

    /// Serialize the package as a zip archive.
    pub fn save_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let compression = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(compression);
            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| io::Error::other(e.to_string()))?;
            zip.write_all(&entry.data)?;
        }
        let archive = zip.finish().map_err(|e| io::Error::other(e.to_string()))?;
        writer.write_all(&archive.into_inner())
    }
}

impl SubsetDocument for PptxPackage {
    const KIND: ItemKind = ItemKind::Slide;

    fn open(path: &Path) -> Result<Self> {
        PptxPackage::open(path)
    }

    fn item_count(&self) -> usize {
        self.slide_count()
    }

    fn subset(mut self, indices: &[usize]) -> Result<Self> {
        self.retain_slides(indices)?;
        Ok(self)
    }

    fn write_to(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        self.save_to(writer)
    }
}

fn xml_error(part: &str) -> impl Fn(quick_xml::Error) -> SplitterError + '_ {
    move |e| SplitterError::Malformed(format!("{}: {}", part, e))
}

fn split_part(part: &str) -> (&str, &str) {
    match part.rfind('/') {
        Some(pos) => (&part[..pos], &part[pos + 1..]),
        None => ("", part),
    }
}

/// Name of the relationships part for `part`; the empty name is the package root.
fn rels_path(part: &str) -> String {
    let (dir, file) = split_part(part);
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

/// Resolve a relationship target relative to the part that declares it.
fn resolve_target(source: &str, target: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let relative = match target.strip_prefix('/') {
        Some(absolute) => absolute,
        None => {
            let (dir, _) = split_part(source);
            segments.extend(dir.split('/').filter(|s| !s.is_empty()));
            target
        }
    };

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}


#[cfg(test)]
mod tests {
    use super::test_support::create_test_pptx;
    use super::*;
    use pretty_assertions::assert_eq;

    fn package(num_slides: usize) -> PptxPackage {
        PptxPackage::from_bytes(create_test_pptx(num_slides), "deck.pptx").unwrap()
    }

    fn slide_texts(package: &PptxPackage) -> Vec<String> {
        package
            .slides()
            .iter()
            .map(|slide| {
                let xml = String::from_utf8_lossy(package.part(&slide.part).unwrap()).to_string();
                let start = xml.find("<a:t>").unwrap() + "<a:t>".len();
                let end = xml.find("</a:t>").unwrap();
                xml[start..end].to_string()
            })
            .collect()
    }

    fn round_trip(package: &PptxPackage) -> PptxPackage {
        let mut buffer = Vec::new();
        package.save_to(&mut buffer).unwrap();
        PptxPackage::from_bytes(buffer, "out.pptx").unwrap()
    }

    fn text(package: &PptxPackage, part: &str) -> String {
        String::from_utf8_lossy(package.part(part).unwrap()).to_string()
    }

    #[test]
    fn test_open_lists_slides_in_order() {
        let package = package(8);
        assert_eq!(package.slide_count(), 8);
        assert_eq!(
            package.slides()[2],
            SlideRef {
                id: "258".into(),
                rel_id: "rId4".into(),
                part: "ppt/slides/slide3.xml".into(),
            }
        );
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let result = PptxPackage::from_bytes(b"%PDF-1.5".to_vec(), "fake.pptx");
        assert!(matches!(result, Err(SplitterError::DocumentOpen { .. })));
    }

    #[test]
    fn test_retain_keeps_selected_slides_in_source_order() {
        let mut package = package(8);
        package.retain_slides(&[7, 0, 1]).unwrap();

        let out = round_trip(&package);
        assert_eq!(out.slide_count(), 3);
        assert_eq!(slide_texts(&out), vec!["Slide 1", "Slide 2", "Slide 8"]);
    }

    #[test]
    fn test_retain_drops_parts_of_removed_slides() {
        let mut package = package(8);
        package.retain_slides(&[0, 1, 7]).unwrap();
        let out = round_trip(&package);

        for gone in [
            "ppt/slides/slide3.xml",
            "ppt/slides/_rels/slide3.xml.rels",
            "ppt/slides/slide7.xml",
            "ppt/notesSlides/notesSlide1.xml",
            "ppt/notesSlides/_rels/notesSlide1.xml.rels",
            "ppt/media/only3.png",
        ] {
            assert!(out.part(gone).is_none(), "{gone} should be dropped");
        }
        for kept in [
            "ppt/slides/slide1.xml",
            "ppt/slides/slide8.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            "ppt/media/shared.png",
            "customXml/orphan.xml",
        ] {
            assert!(out.part(kept).is_some(), "{kept} should be kept");
        }
    }

    #[test]
    fn test_retain_cleans_presentation_and_content_types() {
        let mut package = package(4);
        package.retain_slides(&[1]).unwrap();

        let presentation = text(&package, PRESENTATION);
        assert!(presentation.contains(r#"id="257""#));
        for removed in ["256", "258", "259"] {
            assert!(!presentation.contains(&format!(r#"id="{}""#, removed)));
        }
        assert!(presentation.contains("sldMasterId"));

        let rels = text(&package, "ppt/_rels/presentation.xml.rels");
        assert!(rels.contains("slides/slide2.xml"));
        assert!(!rels.contains("slides/slide1.xml"));
        assert!(rels.contains("slideMasters/slideMaster1.xml"));

        let content_types = text(&package, CONTENT_TYPES);
        assert!(content_types.contains("/ppt/slides/slide2.xml"));
        assert!(!content_types.contains("/ppt/slides/slide3.xml"));
        assert!(!content_types.contains("notesSlide1.xml"));
        assert!(content_types.contains("/ppt/slideLayouts/slideLayout1.xml"));
    }

    #[test]
    fn test_retain_everything_changes_nothing() {
        let mut package = package(3);
        let before = text(&package, PRESENTATION);
        package.retain_slides(&[0, 1, 2]).unwrap();

        assert_eq!(text(&package, PRESENTATION), before);
        assert!(package.part("ppt/notesSlides/notesSlide1.xml").is_some());
    }

    #[test]
    fn test_remove_slide_out_of_range() {
        let mut package = package(2);
        let err = package.remove_slide(2).unwrap_err();
        assert!(matches!(err, SplitterError::OutOfBounds { total: 2, .. }));
        assert_eq!(package.slide_count(), 2);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(resolve_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/media/a.png"),
            "ppt/media/a.png"
        );
    }

    #[test]
    fn test_rels_path() {
        assert_eq!(rels_path(""), "_rels/.rels");
        assert_eq!(rels_path("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
    }
}
