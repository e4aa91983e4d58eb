use lopdf::{Document, Object, ObjectId};
use std::io::{self, Write};
use std::path::Path;

use super::detach::detach_dropped_pages;
use super::page_tree::{page_ids, rebuild_page_tree};
use crate::document::SubsetDocument;
use crate::error::{Result, SplitterError};
use crate::page_range::ItemKind;

pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|e| SplitterError::DocumentOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), pages = doc.get_pages().len(), "opened PDF");
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page object IDs in page order
    pub fn page_ids(&self) -> Vec<ObjectId> {
        page_ids(&self.doc)
    }

    /// Build a new document holding the pages at the given zero-based indices, in that order.
    pub fn extract_pages(&self, indices: &[usize]) -> Result<Document> {
        let all_pages = self.page_ids();
        let total = all_pages.len();

        let selected = indices
            .iter()
            .map(|&index| {
                all_pages.get(index).copied().ok_or(SplitterError::OutOfBounds {
                    kind: ItemKind::Page,
                    token: (index + 1).to_string(),
                    bound: (index + 1) as u32,
                    total,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut new_doc = self.doc.clone();
        rebuild_page_tree(&mut new_doc, &selected)?;
        detach_dropped_pages(&mut new_doc)?;

        new_doc.prune_objects();
        new_doc.renumber_objects();
        Ok(new_doc)
    }

    pub fn save_to(doc: &mut Document, mut writer: &mut dyn Write) -> io::Result<()> {
        doc.save_to(&mut writer)
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

impl SubsetDocument for PdfDocument {
    const KIND: ItemKind = ItemKind::Page;

    fn open(path: &Path) -> Result<Self> {
        PdfDocument::open(path)
    }

    fn item_count(&self) -> usize {
        self.page_count()
    }

    fn subset(self, indices: &[usize]) -> Result<Self> {
        Ok(PdfDocument {
            doc: self.extract_pages(indices)?,
        })
    }

    fn write_to(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        PdfDocument::save_to(&mut self.doc, writer)
    }
}

/// Concatenate every page of `first` followed by every page of `second`.
///
/// The second document's objects are shifted past the first's highest object
/// ID; the first document's catalog and trailer are kept.
pub fn merge_documents(first: Document, second: Document) -> Result<Document> {
    let mut merged = first;
    let mut pages = page_ids(&merged);

    let offset = merged.max_id;
    let second_max_id = second.max_id;
    pages.extend(
        page_ids(&second)
            .into_iter()
            .map(|(id, generation)| (id + offset, generation)),
    );

    for (id, object) in second.objects {
        merged
            .objects
            .insert((id.0 + offset, id.1), remap_object_refs(object, offset));
    }
    merged.max_id = offset + second_max_id;

    rebuild_page_tree(&mut merged, &pages)?;
    merged.prune_objects();
    merged.renumber_objects();

    Ok(merged)
}

fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
