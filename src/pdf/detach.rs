use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeSet;

use super::page_tree::{catalog_id, page_ids};
use crate::error::Result;

/// Catalog entries that address pages directly or through trees of their own.
const PAGE_ADDRESSING_ENTRIES: [&[u8]; 6] = [
    b"Outlines",
    b"StructTreeRoot",
    b"Dests",
    b"OpenAction",
    b"PageLabels",
    b"Threads",
];

/// Form field trees deeper than this are treated as cycles.
const MAX_FIELD_DEPTH: usize = 32;

/// Cut every path from the catalog to pages that are no longer in the page tree.
///
/// Run after the page tree has been rebuilt and before pruning: anything still
/// pointing at a dropped page would otherwise keep its content in the output.
pub fn detach_dropped_pages(doc: &mut Document) -> Result<()> {
    let kept: BTreeSet<ObjectId> = page_ids(doc).into_iter().collect();
    let root = catalog_id(doc)?;

    if let Ok(catalog) = doc.get_dictionary_mut(root) {
        for key in PAGE_ADDRESSING_ENTRIES {
            catalog.remove(key);
        }
    }
    remove_named_destinations(doc, root);

    let kept_annotations = filter_annotations(doc, &kept);
    prune_form_fields(doc, root, &kept_annotations);

    tracing::debug!(
        pages = kept.len(),
        annotations = kept_annotations.len(),
        "detached dropped pages"
    );
    Ok(())
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// The page an explicit destination like `[page /Fit]` points at.
fn destination_page(doc: &Document, dest: &Object) -> Option<ObjectId> {
    resolve(doc, dest)?
        .as_array()
        .ok()?
        .first()?
        .as_reference()
        .ok()
}

fn remove_named_destinations(doc: &mut Document, root: ObjectId) {
    let names_id = doc
        .get_dictionary(root)
        .ok()
        .and_then(|catalog| catalog.get(b"Names").ok())
        .and_then(|names| names.as_reference().ok());

    let names = match names_id {
        Some(id) => doc.get_dictionary_mut(id).ok(),
        None => doc
            .get_dictionary_mut(root)
            .ok()
            .and_then(|catalog| catalog.get_mut(b"Names").ok())
            .and_then(|names| names.as_dict_mut().ok()),
    };
    if let Some(names) = names {
        names.remove(b"Dests");
    }
}

/// Whether an annotation reaches a page outside `kept` through its `/P` owner,
/// its `/Dest`, or a GoTo action.
fn targets_dropped_page(doc: &Document, annotation: &Object, kept: &BTreeSet<ObjectId>) -> bool {
    let Some(dict) = resolve(doc, annotation).and_then(|a| a.as_dict().ok()) else {
        return false;
    };

    let owner = dict.get(b"P").and_then(Object::as_reference).ok();
    let dest = dict
        .get(b"Dest")
        .ok()
        .and_then(|dest| destination_page(doc, dest));
    let action = dict
        .get(b"A")
        .ok()
        .and_then(|action| resolve(doc, action))
        .and_then(|action| action.as_dict().ok())
        .and_then(|action| action.get(b"D").ok())
        .and_then(|dest| destination_page(doc, dest));

    [owner, dest, action]
        .into_iter()
        .flatten()
        .any(|page| !kept.contains(&page))
}

/// Drop annotations on kept pages that lead to dropped ones, and article beads.
/// Returns the ids of the annotations that survive.
fn filter_annotations(doc: &mut Document, kept: &BTreeSet<ObjectId>) -> BTreeSet<ObjectId> {
    let mut survivors = BTreeSet::new();

    for &page_id in kept {
        let annotations = doc
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Annots").ok())
            .and_then(|annots| resolve(&*doc, annots))
            .and_then(|annots| annots.as_array().ok())
            .cloned();

        let retained = annotations.map(|annotations| {
            annotations
                .into_iter()
                .filter(|annotation| !targets_dropped_page(&*doc, annotation, kept))
                .collect::<Vec<_>>()
        });

        let Ok(page) = doc.get_dictionary_mut(page_id) else {
            continue;
        };
        // beads chain into threads that span other pages
        page.remove(b"B");
        if let Some(retained) = retained {
            survivors.extend(retained.iter().filter_map(|a| a.as_reference().ok()));
            page.set("Annots", Object::Array(retained));
        }
    }

    survivors
}

fn field_kids(doc: &Document, field_id: ObjectId) -> Option<Vec<Object>> {
    doc.get_dictionary(field_id)
        .ok()?
        .get(b"Kids")
        .ok()
        .and_then(|kids| resolve(doc, kids))
        .and_then(|kids| kids.as_array().ok())
        .cloned()
}

/// Drop the widgets of `field_id` that are not on a kept page, recursively.
/// Returns whether the field still has a widget.
fn prune_field(
    doc: &mut Document,
    field_id: ObjectId,
    widgets: &BTreeSet<ObjectId>,
    depth: usize,
) -> bool {
    if widgets.contains(&field_id) {
        return true;
    }
    if depth >= MAX_FIELD_DEPTH {
        return false;
    }
    let Some(kids) = field_kids(doc, field_id) else {
        return false;
    };

    let retained: Vec<Object> = kids
        .into_iter()
        .filter(|kid| match kid.as_reference() {
            Ok(id) => prune_field(doc, id, widgets, depth + 1),
            Err(_) => false,
        })
        .collect();

    let alive = !retained.is_empty();
    if let Ok(field) = doc.get_dictionary_mut(field_id) {
        field.set("Kids", Object::Array(retained));
    }
    alive
}

fn field_is_alive(doc: &Document, field_id: ObjectId, widgets: &BTreeSet<ObjectId>) -> bool {
    widgets.contains(&field_id) || field_kids(doc, field_id).is_some_and(|kids| !kids.is_empty())
}

/// Keep only the form fields that still have a widget on a kept page.
fn prune_form_fields(doc: &mut Document, root: ObjectId, widgets: &BTreeSet<ObjectId>) {
    // Fields reachable from surviving widgets, whether or not the form lists them
    let mut field_roots = BTreeSet::new();
    for &widget in widgets {
        let mut current = widget;
        for _ in 0..MAX_FIELD_DEPTH {
            match doc
                .get_dictionary(current)
                .ok()
                .and_then(|dict| dict.get(b"Parent").ok())
                .and_then(|parent| parent.as_reference().ok())
            {
                Some(parent) => current = parent,
                None => break,
            }
        }
        if current != widget {
            field_roots.insert(current);
        }
    }

    let form_id = doc
        .get_dictionary(root)
        .ok()
        .and_then(|catalog| catalog.get(b"AcroForm").ok())
        .and_then(|form| form.as_reference().ok());
    let form = match form_id {
        Some(id) => doc.get_dictionary(id).ok(),
        None => doc
            .get_dictionary(root)
            .ok()
            .and_then(|catalog| catalog.get(b"AcroForm").ok())
            .and_then(|form| form.as_dict().ok()),
    };
    let entries = |key: &[u8]| {
        form.and_then(|form| form.get(key).ok())
            .and_then(|list| resolve(&*doc, list))
            .and_then(|list| list.as_array().ok())
            .cloned()
    };
    let fields = entries(b"Fields");
    let calculation_order = entries(b"CO");

    let mut retained_fields = Vec::new();
    for field in fields.iter().flatten() {
        let Ok(id) = field.as_reference() else {
            continue;
        };
        field_roots.remove(&id);
        if prune_field(doc, id, widgets, 0) {
            retained_fields.push(field.clone());
        }
    }
    for id in field_roots {
        prune_field(doc, id, widgets, 0);
    }

    let calculation_order = calculation_order.map(|order| {
        order
            .into_iter()
            .filter(|field| {
                field
                    .as_reference()
                    .is_ok_and(|id| field_is_alive(&*doc, id, widgets))
            })
            .collect::<Vec<_>>()
    });

    let form = match form_id {
        Some(id) => doc.get_dictionary_mut(id).ok(),
        None => doc
            .get_dictionary_mut(root)
            .ok()
            .and_then(|catalog| catalog.get_mut(b"AcroForm").ok())
            .and_then(|form| form.as_dict_mut().ok()),
    };
    let Some(form) = form else {
        return;
    };
    if fields.is_some() {
        form.set("Fields", Object::Array(retained_fields));
    }
    if let Some(order) = calculation_order {
        form.set("CO", Object::Array(order));
    }
}
