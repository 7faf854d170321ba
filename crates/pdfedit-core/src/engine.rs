//! Apply text substitutions and image replacement to PDF documents

use std::collections::HashSet;

use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, warn};

use crate::error::EditError;
use crate::replacement::ReplacementImage;
use crate::request::SubstitutionRequest;
use crate::structure::{
    ensure_unencrypted, xobject_entries, ContentLayout, ContentPart, StreamPayload, XObjectEntry,
};
use crate::text::ContentText;

#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    /// Flate-compress unfiltered streams before saving
    pub compress: bool,
}

/// What an edit did, including every unit skipped under the fail-soft policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    pub page_count: u32,
    pub streams_rewritten: usize,
    pub replacements: usize,
    pub images_replaced: usize,
    pub skipped: Vec<String>,
}

impl EditReport {
    fn skip(&mut self, reason: String) {
        warn!("Skipping: {}", reason);
        self.skipped.push(reason);
    }
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub bytes: Vec<u8>,
    pub report: EditReport,
}

#[derive(Debug, Clone, Default)]
pub struct PdfSubstitutionEngine {
    options: EditOptions,
}

impl PdfSubstitutionEngine {
    pub fn new(options: EditOptions) -> Self {
        Self { options }
    }

    pub fn edit(
        &self,
        pdf_bytes: &[u8],
        request: &SubstitutionRequest,
        image: Option<&ReplacementImage>,
    ) -> Result<Vec<u8>, EditError> {
        self.edit_with_report(pdf_bytes, request, image)
            .map(|outcome| outcome.bytes)
    }

    /// Edit every page in document order.
    ///
    /// Parse and serialization failures abort with no output. Page contents
    /// or resources of an unexpected shape are skipped and listed in the
    /// report. An empty request without an image still loads and saves the
    /// document, leaving every page's text as it was.
    pub fn edit_with_report(
        &self,
        pdf_bytes: &[u8],
        request: &SubstitutionRequest,
        image: Option<&ReplacementImage>,
    ) -> Result<EditOutcome, EditError> {
        request.validate()?;

        let mut doc =
            Document::load_mem(pdf_bytes).map_err(|e| EditError::Parse(e.to_string()))?;
        ensure_unencrypted(&doc)?;

        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        info!(
            "Editing {} pages: {} substitutions, replacement image: {}",
            pages.len(),
            request.len(),
            image.is_some()
        );

        let mut report = EditReport {
            page_count: pages.len() as u32,
            ..EditReport::default()
        };
        let mut rewritten = HashSet::new();
        let mut overwritten = HashSet::new();

        for (page_num, page_id) in &pages {
            if !request.is_empty() {
                substitute_page(
                    &mut doc,
                    *page_num,
                    *page_id,
                    request,
                    &mut rewritten,
                    &mut report,
                );
            }
            if let Some(image) = image {
                replace_first_image(
                    &mut doc,
                    *page_num,
                    *page_id,
                    image,
                    &mut overwritten,
                    &mut report,
                );
            }
        }

        if self.options.compress {
            doc.compress();
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| EditError::Serialization(e.to_string()))?;

        info!(
            "Edit complete: {} replacements in {} streams, {} images replaced, {} skipped",
            report.replacements,
            report.streams_rewritten,
            report.images_replaced,
            report.skipped.len()
        );

        Ok(EditOutcome {
            bytes: output,
            report,
        })
    }
}

fn substitute_page(
    doc: &mut Document,
    page_num: u32,
    page_id: ObjectId,
    request: &SubstitutionRequest,
    rewritten: &mut HashSet<ObjectId>,
    report: &mut EditReport,
) {
    let layout = match ContentLayout::of_page(doc, page_id) {
        Ok(layout) => layout,
        Err(e) => {
            report.skip(format!("page {} contents: {}", page_num, e));
            return;
        }
    };

    let stream_ids: Vec<ObjectId> = match layout {
        ContentLayout::Empty => Vec::new(),
        ContentLayout::Single(id) => vec![id],
        ContentLayout::Layered(parts) => parts
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Stream(id) => Some(id),
                ContentPart::Unsupported(reason) => {
                    report.skip(format!("page {} contents: {}", page_num, reason));
                    None
                }
            })
            .collect(),
    };

    for id in stream_ids {
        // Streams shared between pages are edited once
        if !rewritten.insert(id) {
            debug!("Page {}: content stream {:?} already processed", page_num, id);
            continue;
        }
        match substitute_stream(doc, id, request) {
            Ok(0) => {}
            Ok(count) => {
                debug!(
                    "Page {}: {} replacements in stream {:?}",
                    page_num, count, id
                );
                report.streams_rewritten += 1;
                report.replacements += count;
            }
            Err(e) => report.skip(format!("page {} stream {:?}: {}", page_num, id, e)),
        }
    }
}

/// Rewrite one content stream. A stream without matches is left untouched.
fn substitute_stream(
    doc: &mut Document,
    id: ObjectId,
    request: &SubstitutionRequest,
) -> Result<usize, EditError> {
    let stream = doc
        .get_object_mut(id)
        .and_then(Object::as_stream_mut)
        .map_err(|e| EditError::UnsupportedStructure(e.to_string()))?;

    let payload = StreamPayload::of(stream)?;
    let original = ContentText::decode(&payload.read(stream)?);
    let (edited, count) = original.substitute(request);
    if count == 0 {
        return Ok(0);
    }

    let content = edited.encode()?;
    stream.dict.remove(b"Filter");
    stream.dict.remove(b"DecodeParms");
    stream
        .dict
        .set("Length", Object::Integer(content.len() as i64));
    stream.content = content;
    Ok(count)
}

/// Overwrite the first image XObject of the page, if any
fn replace_first_image(
    doc: &mut Document,
    page_num: u32,
    page_id: ObjectId,
    image: &ReplacementImage,
    overwritten: &mut HashSet<ObjectId>,
    report: &mut EditReport,
) {
    let entries = match xobject_entries(doc, page_id) {
        Ok(entries) => entries,
        Err(e) => {
            report.skip(format!("page {} resources: {}", page_num, e));
            return;
        }
    };

    let mut target = None;
    for entry in entries {
        match entry {
            XObjectEntry::Image { name, id, payload } => {
                debug!("Page {}: image /{} ({:?})", page_num, name, payload);
                target = Some((name, id));
                break;
            }
            XObjectEntry::Other { name, .. } => {
                debug!("Page {}: /{} is not an image", page_num, name);
            }
            XObjectEntry::Unsupported { name, reason } => {
                report.skip(format!("page {} XObject /{}: {}", page_num, name, reason));
            }
        }
    }

    let Some((name, id)) = target else {
        debug!("Page {}: no image resource", page_num);
        return;
    };
    // Images shared through common resources are overwritten once
    if !overwritten.insert(id) {
        debug!("Page {}: image /{} already replaced", page_num, name);
        return;
    }

    match doc.get_object_mut(id).and_then(Object::as_stream_mut) {
        Ok(stream) => {
            image.overwrite(stream);
            report.images_replaced += 1;
            debug!(
                "Page {}: replaced /{} with {}x{} image",
                page_num,
                name,
                image.width(),
                image.height()
            );
        }
        Err(e) => report.skip(format!("page {} XObject /{}: {}", page_num, name, e)),
    }
}
