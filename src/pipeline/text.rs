//! PDF text extraction: one string per page, in page order.
//!
//! The converter only depends on [`TextExtractor`]; the production
//! implementation is [`PdfiumExtractor`], which drives the pdfium C++ library
//! through `pdfium-render`. Pdfium is loaded once per process and the
//! shared library is fetched and cached by `pdfium-auto` on first use.

use crate::error::{DocumentError, RefExtractError};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Capability: turn a PDF file into its ordered page texts.
pub trait TextExtractor {
    /// Extract the text of every page. Pages without text yield `""`.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, DocumentError>;
}

/// [`TextExtractor`] backed by pdfium.
pub struct PdfiumExtractor {
    pdfium: Pdfium,
}

impl PdfiumExtractor {
    /// Bind to pdfium, downloading the library first if it is not cached.
    ///
    /// `on_progress` receives `(bytes_downloaded, total_bytes)` during the
    /// one-time download.
    pub fn bind(on_progress: Option<&dyn Fn(u64, Option<u64>)>) -> Result<Self, RefExtractError> {
        let pdfium = pdfium_auto::bind_pdfium(on_progress)
            .map_err(|e| RefExtractError::PdfiumUnavailable(e.to_string()))?;
        info!("pdfium bound");
        Ok(Self { pdfium })
    }

    /// Wrap an already bound pdfium instance.
    pub fn with_pdfium(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, DocumentError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(classify_load_error)?;

        let pages = document.pages();
        let total = pages.len() as usize;
        let mut texts = Vec::with_capacity(total);

        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| DocumentError::Corrupt {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;
            let body = text.all();
            debug!("{}: page {} → {} chars", path.display(), idx + 1, body.len());
            texts.push(body);
        }

        Ok(texts)
    }
}

fn classify_load_error(e: PdfiumError) -> DocumentError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        DocumentError::Encrypted
    } else {
        DocumentError::Corrupt { detail }
    }
}
