//! Typed views over the page object shapes the engine understands
//!
//! `/Contents` may be a single stream or an array of streams, `/XObject`
//! entries may be images, other XObjects or something unexpected. Each of these
//! is resolved into an enum so callers match every shape explicitly.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::EditError;

/// Where a page's drawing operators live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLayout {
    /// No `/Contents` entry
    Empty,
    Single(ObjectId),
    Layered(Vec<ContentPart>),
}

/// One element of a `/Contents` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Stream(ObjectId),
    Unsupported(String),
}

/// The two stream shapes: raw bytes, or bytes behind one or more filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPayload {
    Decoded,
    Encoded(Vec<String>),
}

/// A classified `/XObject` resource entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XObjectEntry {
    Image {
        name: String,
        id: ObjectId,
        payload: StreamPayload,
    },
    /// Form XObjects and anything else that is a stream but not an image
    Other { name: String, id: ObjectId },
    Unsupported { name: String, reason: String },
}

impl StreamPayload {
    pub fn of(stream: &Stream) -> Result<Self, EditError> {
        match stream.dict.get(b"Filter") {
            Err(_) => Ok(StreamPayload::Decoded),
            Ok(Object::Name(name)) => Ok(StreamPayload::Encoded(vec![
                String::from_utf8_lossy(name).into_owned(),
            ])),
            Ok(Object::Array(items)) if items.is_empty() => Ok(StreamPayload::Decoded),
            Ok(Object::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Object::Name(name) => Ok(String::from_utf8_lossy(name).into_owned()),
                    other => Err(EditError::UnsupportedStructure(format!(
                        "filter array contains {}",
                        kind(other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(StreamPayload::Encoded),
            Ok(other) => Err(EditError::UnsupportedStructure(format!(
                "/Filter is {}",
                kind(other)
            ))),
        }
    }

    /// The stream's bytes with every filter removed
    pub fn read(&self, stream: &Stream) -> Result<Vec<u8>, EditError> {
        match self {
            StreamPayload::Decoded => Ok(stream.content.clone()),
            StreamPayload::Encoded(filters) => stream.decompressed_content().map_err(|e| {
                EditError::UnsupportedStructure(format!(
                    "cannot decode stream with filters {:?}: {}",
                    filters, e
                ))
            }),
        }
    }
}

impl ContentLayout {
    /// Resolve a page's `/Contents` entry
    pub fn of_page(doc: &Document, page_id: ObjectId) -> Result<Self, EditError> {
        let page = dictionary(doc, page_id)?;

        let contents = match page.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(ContentLayout::Empty),
        };

        match contents {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(Object::Stream(_)) => Ok(ContentLayout::Single(*id)),
                Ok(Object::Array(items)) => Ok(ContentLayout::Layered(parts(doc, items))),
                Ok(other) => Err(EditError::UnsupportedStructure(format!(
                    "/Contents {:?} of page {:?} is {}",
                    id,
                    page_id,
                    kind(other)
                ))),
                Err(e) => Err(EditError::UnsupportedStructure(format!(
                    "/Contents {:?} of page {:?} is missing: {}",
                    id, page_id, e
                ))),
            },
            Object::Array(items) => Ok(ContentLayout::Layered(parts(doc, items))),
            other => Err(EditError::UnsupportedStructure(format!(
                "/Contents of page {:?} is {}",
                page_id,
                kind(other)
            ))),
        }
    }
}

fn parts(doc: &Document, items: &[Object]) -> Vec<ContentPart> {
    items
        .iter()
        .map(|item| match item {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(Object::Stream(_)) => ContentPart::Stream(*id),
                Ok(other) => ContentPart::Unsupported(format!(
                    "content element {:?} is {}",
                    id,
                    kind(other)
                )),
                Err(e) => {
                    ContentPart::Unsupported(format!("content element {:?} is missing: {}", id, e))
                }
            },
            other => ContentPart::Unsupported(format!("inline {} in /Contents", kind(other))),
        })
        .collect()
}

/// Classify every `/XObject` entry of a page's (possibly inherited) resources,
/// in dictionary order.
pub fn xobject_entries(doc: &Document, page_id: ObjectId) -> Result<Vec<XObjectEntry>, EditError> {
    let Some(resources) = page_resources(doc, page_id)? else {
        return Ok(Vec::new());
    };
    let xobjects = match resources.get(b"XObject") {
        Ok(xobjects) => resolve_dict(doc, xobjects, "/XObject")?,
        Err(_) => return Ok(Vec::new()),
    };

    Ok(xobjects
        .iter()
        .map(|(name, value)| classify_xobject(doc, name, value))
        .collect())
}

fn classify_xobject(doc: &Document, name: &[u8], value: &Object) -> XObjectEntry {
    let name = String::from_utf8_lossy(name).into_owned();

    let id = match value {
        Object::Reference(id) => *id,
        other => {
            return XObjectEntry::Unsupported {
                name,
                reason: format!("inline {} entry", kind(other)),
            }
        }
    };

    match doc.get_object(id) {
        Ok(Object::Stream(stream)) if is_image(stream) => match StreamPayload::of(stream) {
            Ok(payload) => XObjectEntry::Image { name, id, payload },
            Err(e) => XObjectEntry::Unsupported {
                name,
                reason: e.to_string(),
            },
        },
        Ok(Object::Stream(_)) => XObjectEntry::Other { name, id },
        Ok(other) => XObjectEntry::Unsupported {
            name,
            reason: format!("{:?} is {}", id, kind(other)),
        },
        Err(e) => XObjectEntry::Unsupported {
            name,
            reason: format!("{:?} is missing: {}", id, e),
        },
    }
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .map(|subtype| subtype == b"Image")
        .unwrap_or(false)
}

/// Walk up `/Parent` until a node carries `/Resources`
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>, EditError> {
    let mut seen = HashSet::new();
    let mut current = Some(page_id);

    while let Some(node_id) = current {
        if !seen.insert(node_id) {
            return Err(EditError::UnsupportedStructure(format!(
                "page tree cycle at {:?}",
                node_id
            )));
        }
        let node = dictionary(doc, node_id)?;
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources, "/Resources").map(Some);
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(None)
}

fn dictionary(doc: &Document, id: ObjectId) -> Result<&Dictionary, EditError> {
    match doc.get_object(id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        Ok(other) => Err(EditError::UnsupportedStructure(format!(
            "object {:?} is {}, expected a dictionary",
            id,
            kind(other)
        ))),
        Err(e) => Err(EditError::UnsupportedStructure(format!(
            "object {:?} is missing: {}",
            id, e
        ))),
    }
}

fn resolve_dict<'a>(
    doc: &'a Document,
    object: &'a Object,
    what: &str,
) -> Result<&'a Dictionary, EditError> {
    match object {
        Object::Dictionary(dict) => Ok(dict),
        Object::Reference(id) => dictionary(doc, *id),
        other => Err(EditError::UnsupportedStructure(format!(
            "{} is {}",
            what,
            kind(other)
        ))),
    }
}

/// Encrypted documents are rejected up front
pub fn ensure_unencrypted(doc: &Document) -> Result<(), EditError> {
    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(EditError::Parse(
            "Encrypted PDFs are not supported".into(),
        ));
    }
    Ok(())
}

fn kind(object: &Object) -> &'static str {
    match object {
        Object::Null => "null",
        Object::Boolean(_) => "a boolean",
        Object::Integer(_) => "an integer",
        Object::Real(_) => "a real",
        Object::Name(_) => "a name",
        Object::String(..) => "a string",
        Object::Array(_) => "an array",
        Object::Dictionary(_) => "a dictionary",
        Object::Stream(_) => "a stream",
        Object::Reference(_) => "a reference",
    }
}
