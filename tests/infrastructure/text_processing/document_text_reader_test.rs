use findoc_analyzer::application::ports::{DocumentReader, DocumentReaderError};
use findoc_analyzer::infrastructure::text_processing::DocumentTextReader;

#[tokio::test]
async fn given_plain_text_when_extracting_then_sanitized_text_is_returned() {
    let reader = DocumentTextReader::new();

    let text = reader
        .extract_text(b"Quarterly   report\n\n\nRevenue: 10M")
        .await
        .unwrap();

    assert_eq!(text, "Quarterly report\n\nRevenue: 10M");
}

#[tokio::test]
async fn given_binary_garbage_when_extracting_then_unsupported_document() {
    let reader = DocumentTextReader::new();

    let result = reader.extract_text(&[0xff, 0xfe, 0x00, 0x81]).await;

    assert!(matches!(result, Err(DocumentReaderError::UnsupportedDocument(_))));
}

#[tokio::test]
async fn given_blank_text_when_extracting_then_no_text_found() {
    let reader = DocumentTextReader::new();

    let result = reader.extract_text(b"   \n  ").await;

    assert!(matches!(result, Err(DocumentReaderError::NoTextFound)));
}

#[tokio::test]
async fn given_truncated_pdf_when_extracting_then_error_is_returned() {
    let reader = DocumentTextReader::new();

    let result = reader.extract_text(b"%PDF-1.4\n% truncated upload").await;

    assert!(result.is_err());
}

#[tokio::test(flavor = "current_thread")]
async fn given_single_threaded_runtime_when_extracting_broken_pdf_then_error_is_returned() {
    let reader = DocumentTextReader::new();

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        reader.extract_text(b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog"),
    )
    .await
    .unwrap();

    assert!(result.is_err());
}
