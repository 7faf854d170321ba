//! PDF text and image substitution
//!
//! This crate edits PDFs in place using lopdf:
//! - literal text substitution inside page content streams, line by line
//! - replacement of the first image XObject on every page
//!
//! Pages whose contents or resources have an unexpected shape are skipped with
//! a warning; the rest of the document is still edited.

pub mod engine;
pub mod error;
pub mod replacement;
pub mod request;
pub mod structure;
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{EditOptions, EditOutcome, EditReport, PdfSubstitutionEngine};
pub use error::EditError;
pub use replacement::ReplacementImage;
pub use request::{EditRequest, EditResult, ProcessMetrics, Substitution, SubstitutionRequest};

/// File name offered for the edited document
pub const OUTPUT_FILE_NAME: &str = "edited_document.pdf";

/// MIME type of the edited document
pub const OUTPUT_MIME_TYPE: &str = "application/pdf";

/// Edit with default options.
///
/// The replacement image is decoded before the document is parsed, so an
/// unreadable image fails the call without touching any page.
pub fn edit(
    pdf_bytes: &[u8],
    request: &SubstitutionRequest,
    image_bytes: Option<&[u8]>,
) -> Result<Vec<u8>, EditError> {
    let image = image_bytes.map(ReplacementImage::decode).transpose()?;
    PdfSubstitutionEngine::default().edit(pdf_bytes, request, image.as_ref())
}

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, EditError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| EditError::Parse(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_lines, pdf_with_pages, png, PageFixture};

    #[test]
    fn test_page_count() {
        let pdf = pdf_with_pages(vec![PageFixture::text("(a) Tj"), PageFixture::text("(b) Tj")]);
        assert_eq!(get_page_count(&pdf).unwrap(), 2);
    }

    #[test]
    fn test_page_count_rejects_garbage() {
        assert!(matches!(
            get_page_count(b"garbage"),
            Err(EditError::Parse(_))
        ));
    }

    #[test]
    fn test_edit_text_only() {
        let pdf = pdf_with_pages(vec![PageFixture::text("(Hello World) Tj")]);
        let request = SubstitutionRequest::new().with("World", "PDF").unwrap();
        let output = edit(&pdf, &request, None).unwrap();
        assert!(page_lines(&output, 1).contains(&"(Hello PDF) Tj".to_string()));
    }

    #[test]
    fn test_bad_image_aborts_before_parsing() {
        // The PDF is garbage too; the image error must win
        let request = SubstitutionRequest::new().with("a", "b").unwrap();
        let result = edit(b"garbage", &request, Some(b"not an image"));
        assert!(matches!(result, Err(EditError::ImageDecode(_))));
    }

    #[test]
    fn test_image_only_edit() {
        let pdf = pdf_with_pages(vec![PageFixture::text("(x) Tj").with_image()]);
        let output = edit(&pdf, &SubstitutionRequest::new(), Some(&png(5, 4))).unwrap();
        assert_eq!(get_page_count(&output).unwrap(), 1);
    }
}
