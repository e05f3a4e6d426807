use crate::unified_blocks::{BlockKind, UnifiedBlock};

#[cfg(feature = "pdfium")]
use crate::reader_pdf_pdfium::read_pdf_to_blocks_pdfium;
#[cfg(feature = "pure-pdf")]
use crate::reader_pdf_pure::read_pdf_to_blocks_pure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfBackend {
    Pdfium,
    PureRust,
    Stub,
}

pub fn default_backend() -> PdfBackend {
    #[cfg(feature = "pdfium")]
    {
        return PdfBackend::Pdfium;
    }
    #[cfg(all(not(feature = "pdfium"), feature = "pure-pdf"))]
    {
        return PdfBackend::PureRust;
    }
    #[cfg(not(any(feature = "pdfium", feature = "pure-pdf")))]
    {
        PdfBackend::Stub
    }
}

/// Reads a PDF into [`UnifiedBlock`]s using whichever backend is compiled in.
/// With no PDF feature enabled, returns a single placeholder block — callers
/// should route pages with no extractable text through OCR (spec §4.C "PDF:
/// one unit per page; may fall back to OCR for image-only pages").
pub fn read_pdf_to_blocks(path: &str) -> Vec<UnifiedBlock> {
    match default_backend() {
        #[cfg(feature = "pdfium")]
        PdfBackend::Pdfium => read_pdf_to_blocks_pdfium(path),
        #[cfg(feature = "pure-pdf")]
        PdfBackend::PureRust => read_pdf_to_blocks_pure(path),
        _ => vec![UnifiedBlock::new(
            BlockKind::Paragraph,
            String::new(),
            0,
            path,
            "pdf",
        )],
    }
}
