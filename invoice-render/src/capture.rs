//! Print-to-PDF capture.
//!
//! Capture is a single print request with fixed layout parameters: A4 page,
//! background graphics included, uniform 10 mm margins. No pagination
//! customization beyond these parameters is supported.

use crate::engine::RenderEngine;
use crate::error::{AddContext, Error};

pub const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4,
}

/// Fixed print parameters handed to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintOptions {
    pub page: PageSize,
    pub background: bool,
    pub margin_mm: f64,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            page: PageSize::A4,
            background: true,
            margin_mm: 10.0,
        }
    }
}

/// A captured PDF byte buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    bytes: Vec<u8>,
}

impl PdfDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Byte length of the document
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the buffer starts with the standard `%PDF` file signature
    pub fn has_pdf_signature(&self) -> bool {
        self.bytes.starts_with(PDF_MAGIC)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Issue the print-to-PDF request against the current page state
pub async fn print(engine: &mut dyn RenderEngine) -> Result<PdfDocument, Error> {
    let options = PrintOptions::default();
    let bytes = engine
        .print_to_pdf(&options)
        .await
        .add_context("capturing pdf")?;
    Ok(PdfDocument::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_signature_is_detected() {
        let doc = PdfDocument::new(b"%PDF-1.4\n".to_vec());
        assert!(doc.has_pdf_signature());
        assert_eq!(doc.len(), 9);
        assert!(!doc.is_empty());
    }

    #[test]
    fn non_pdf_bytes_are_rejected() {
        assert!(!PdfDocument::new(b"<html>".to_vec()).has_pdf_signature());
        assert!(!PdfDocument::new(Vec::new()).has_pdf_signature());
    }

    #[test]
    fn default_print_options_match_the_page_contract() {
        let options = PrintOptions::default();
        assert_eq!(options.page, PageSize::A4);
        assert!(options.background);
        assert_eq!(options.margin_mm, 10.0);
    }
}
