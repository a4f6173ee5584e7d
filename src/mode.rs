//! Conversion-mode selection and its fixed derived data.
//!
//! [`ConversionMode`] is a leaf: it records which direction the user picked
//! and exposes static mappings derived from it — the accepted MIME set, the
//! identifier the remote service expects, and the user-facing strings. It
//! cannot fail; there are exactly two options and everything else is a
//! fixed lookup.

use serde::{Deserialize, Serialize};

/// MIME type of a PDF document.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of a modern Word document (.docx).
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type of a legacy Word document (.doc).
pub const DOC_MIME: &str = "application/msword";

/// The selected direction of document conversion.
///
/// Mutated only by explicit user selection, never inferred from file
/// content. Switching modes resets any in-flight selection — a file
/// validated under the previous mode is not reusable, since the accepted
/// type differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversionMode {
    /// PDF → Word (.docx). The startup default.
    #[default]
    PdfToDocx,
    /// Word (.docx or legacy .doc) → PDF.
    DocxToPdf,
}

impl ConversionMode {
    /// MIME types a candidate file may declare under this mode.
    pub fn accepted_mime_types(self) -> &'static [&'static str] {
        match self {
            ConversionMode::PdfToDocx => &[PDF_MIME],
            ConversionMode::DocxToPdf => &[DOCX_MIME, DOC_MIME],
        }
    }

    /// Whether a declared MIME type is acceptable under this mode.
    pub fn accepts(self, mime: &str) -> bool {
        self.accepted_mime_types().contains(&mime)
    }

    /// The stable identifier the conversion endpoint expects for this mode.
    pub fn conversion_type(self) -> &'static str {
        match self {
            ConversionMode::PdfToDocx => "pdf_to_docx",
            ConversionMode::DocxToPdf => "docx_to_pdf",
        }
    }

    /// Prompt shown while waiting for a file.
    pub fn prompt(self) -> &'static str {
        match self {
            ConversionMode::PdfToDocx => "Drag a PDF here or click to select",
            ConversionMode::DocxToPdf => "Drag a Word file here or click to select",
        }
    }

    /// Status text shown while a submission is in flight.
    pub fn busy_text(self) -> &'static str {
        match self {
            ConversionMode::PdfToDocx => "Converting PDF to Word…",
            ConversionMode::DocxToPdf => "Converting Word to PDF…",
        }
    }

    /// Message shown when a candidate's type does not match this mode.
    pub fn rejection_message(self) -> &'static str {
        match self {
            ConversionMode::PdfToDocx => "file must be a PDF",
            ConversionMode::DocxToPdf => "file must be a Word document (.docx or .doc)",
        }
    }
}
