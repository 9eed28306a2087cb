use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use pdf_oxide::PdfDocument;

use crate::application::ports::{DocumentReader, DocumentReaderError};

use super::text_sanitizer::sanitize_extracted_text;

const PDF_MAGIC: &[u8] = b"%PDF-";
const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads PDFs page by page with pdf_oxide; plain UTF-8 uploads are accepted
/// as-is.
#[derive(Default)]
pub struct DocumentTextReader;

impl DocumentTextReader {
    pub fn new() -> Self {
        Self
    }

    /// Spills the bytes to a temporary file for pdf_oxide and reads every
    /// page. Runs on the blocking pool.
    fn extract_pdf_pages(data: Vec<u8>) -> Result<Vec<String>, DocumentReaderError> {
        let mut temp_file = tempfile::NamedTempFile::new().map_err(|e| {
            DocumentReaderError::ExtractionFailed(format!("failed to create temp file: {e}"))
        })?;
        temp_file.write_all(&data).map_err(|e| {
            DocumentReaderError::ExtractionFailed(format!("failed to write temp file: {e}"))
        })?;

        let mut doc = PdfDocument::open(temp_file.path()).map_err(|e| {
            DocumentReaderError::ExtractionFailed(format!("failed to parse PDF: {e}"))
        })?;

        let page_count = doc.page_count().map_err(|e| {
            DocumentReaderError::ExtractionFailed(format!("failed to read page count: {e}"))
        })?;

        let mut pages = Vec::with_capacity(page_count);
        for page_index in 0..page_count {
            let text = doc.extract_text(page_index).unwrap_or_default();
            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        Ok(pages)
    }

    async fn read_pdf(&self, data: &[u8]) -> Result<String, DocumentReaderError> {
        let data = data.to_vec();
        let pages = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || Self::extract_pdf_pages(data)),
        )
        .await
        .map_err(|_| DocumentReaderError::ExtractionFailed("PDF extraction timed out".to_string()))?
        .map_err(|e| DocumentReaderError::ExtractionFailed(format!("task join error: {e}")))??;

        tracing::info!(page_count = pages.len(), "PDF text extraction complete");

        let text = pages
            .iter()
            .map(|page| sanitize_extracted_text(page))
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(text)
    }
}

#[async_trait]
impl DocumentReader for DocumentTextReader {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn extract_text(&self, data: &[u8]) -> Result<String, DocumentReaderError> {
        let text = if data.starts_with(PDF_MAGIC) {
            self.read_pdf(data).await?
        } else {
            let raw = std::str::from_utf8(data).map_err(|_| {
                DocumentReaderError::UnsupportedDocument(
                    "neither a PDF nor UTF-8 text".to_string(),
                )
            })?;
            sanitize_extracted_text(raw)
        };

        if text.is_empty() {
            return Err(DocumentReaderError::NoTextFound);
        }
        Ok(text)
    }
}
