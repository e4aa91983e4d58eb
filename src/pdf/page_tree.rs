use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeSet;

use crate::error::{Result, SplitterError};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deep page trees are rare; anything deeper is treated as a cycle.
const MAX_TREE_DEPTH: usize = 64;

pub fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| SplitterError::Malformed("no /Root reference in trailer".into()))
}

pub fn pages_root_id(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| SplitterError::Malformed("catalog has no /Pages reference".into()))
}

/// Page object ids in page order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    // get_pages is keyed by 1-based page number
    doc.get_pages().into_values().collect()
}

fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return found;
    };

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if page.has(key) || found.iter().any(|(k, _)| k.as_slice() == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }

        depth += 1;
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    found
}

/// Replace the document's page tree with a single flat node holding `pages` in order.
///
/// Each page gets its inherited attributes copied onto itself so it renders the
/// same once detached from intermediate nodes. A page listed more than once is
/// cloned into a new object for every repeat.
pub fn rebuild_page_tree(doc: &mut Document, pages: &[ObjectId]) -> Result<()> {
    let root_id = pages_root_id(doc)?;
    let mut placed = BTreeSet::new();
    let mut kids = Vec::with_capacity(pages.len());

    for &page_id in pages {
        let inherited = inherited_attributes(doc, page_id);
        let mut page = doc
            .get_dictionary(page_id)
            .map_err(|e| SplitterError::Malformed(format!("page object {:?}: {}", page_id, e)))?
            .clone();
        for (key, value) in inherited {
            page.set(key, value);
        }
        page.set("Parent", Object::Reference(root_id));

        let id = if placed.insert(page_id) {
            doc.objects.insert(page_id, Object::Dictionary(page));
            page_id
        } else {
            doc.add_object(Object::Dictionary(page))
        };
        kids.push(Object::Reference(id));
    }

    let count = kids.len() as i64;
    let root = doc
        .get_dictionary_mut(root_id)
        .map_err(|_| SplitterError::Malformed("invalid pages dictionary".into()))?;
    root.set("Kids", Object::Array(kids));
    root.set("Count", Object::Integer(count));
    // The root is now the only page tree node
    root.remove(b"Parent");

    Ok(())
}
