//! Streaming helpers over OOXML parts.
//!
//! Parts are rewritten event by event so everything we do not touch
//! (namespaces, extension lists, formatting) passes through byte for byte.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

/// One `<Relationship>` of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub target: String,
    pub external: bool,
}

fn attr_value(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// Value of an attribute matched by local name; `prefixed` selects `r:id` over `id`.
pub fn attribute(e: &BytesStart, local_name: &[u8], prefixed: bool) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| {
            attr.key.local_name().as_ref() == local_name && attr.key.prefix().is_some() == prefixed
        })
        .map(|attr| attr_value(&attr.value))
}

pub fn parse_relationships(xml: &[u8]) -> quick_xml::Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut rels = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute(&e, b"Id", false).unwrap_or_default();
                let target = attribute(&e, b"Target", false).unwrap_or_default();
                let external = attribute(&e, b"TargetMode", false)
                    .is_some_and(|mode| mode.eq_ignore_ascii_case("External"));
                if !id.is_empty() && !target.is_empty() {
                    rels.push(Relationship {
                        id,
                        target,
                        external,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// `(id, r:id)` of every `<p:sldId>` in the slide list of `presentation.xml`, in order.
pub fn parse_slide_ids(xml: &[u8]) -> quick_xml::Result<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut slides = Vec::new();
    let mut in_list = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sldIdLst" => in_list = true,
            Event::End(e) if e.local_name().as_ref() == b"sldIdLst" => in_list = false,
            Event::Empty(e) | Event::Start(e) if in_list && e.local_name().as_ref() == b"sldId" => {
                if let (Some(id), Some(rel_id)) =
                    (attribute(&e, b"id", false), attribute(&e, b"id", true))
                {
                    slides.push((id, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(slides)
}

/// Copy `xml`, leaving out every element (with its subtree) for which `remove` is true.
pub fn remove_elements<F>(xml: &[u8], remove: F) -> quick_xml::Result<Vec<u8>>
where
    F: Fn(&BytesStart) -> bool,
{
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    let mut buf = Vec::new();
    let mut skipped = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) if remove(&e) => {
                let end = e.name().as_ref().to_vec();
                reader.read_to_end_into(QName(&end), &mut skipped)?;
                skipped.clear();
            }
            Event::Empty(e) if remove(&e) => {}
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}
