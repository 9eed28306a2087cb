mod document_text_reader;
mod text_sanitizer;

pub use document_text_reader::DocumentTextReader;
pub use text_sanitizer::sanitize_extracted_text;
