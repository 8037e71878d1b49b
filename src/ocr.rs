//! OCR capability interface and extraction adapter
//!
//! OCR is an injected capability returning raw JSON; the adapter owns the
//! mapping into structured records and the non-blocking guarantee: any
//! provider failure or malformed payload maps to an empty record, never an
//! error. Confirmation must never wait on extraction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{CardFields, DocumentKind, EncodedImage, ExtractedFields, IdFields};

/// OCR provider failure; callers of the adapter never see this
#[derive(Debug, Clone)]
pub enum OcrError {
    /// Provider-side failure (service down, quota, bad credentials)
    Provider(String),
    /// Provider replied with something that is not the agreed JSON shape
    Malformed(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider(msg) => write!(f, "OCR provider error: {}", msg),
            Self::Malformed(msg) => write!(f, "OCR response malformed: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}

/// Injected OCR capability
///
/// Implementations send the image to whatever vision backend the host uses
/// and return its raw JSON. They may fail; the adapter absorbs it.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn extract(
        &self,
        image: &[u8],
        kind: DocumentKind,
    ) -> Result<serde_json::Value, OcrError>;
}

/// Provider for hosts without an OCR backend; always yields nothing
pub struct NullOcrProvider;

#[async_trait]
impl OcrProvider for NullOcrProvider {
    async fn extract(
        &self,
        _image: &[u8],
        _kind: DocumentKind,
    ) -> Result<serde_json::Value, OcrError> {
        Ok(serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// Maps provider output to structured records, tolerant of total failure
#[derive(Clone)]
pub struct OcrExtractionAdapter {
    provider: Arc<dyn OcrProvider>,
}

impl OcrExtractionAdapter {
    pub fn new(provider: Arc<dyn OcrProvider>) -> Self {
        Self { provider }
    }

    /// Extract structured fields from a normalized image
    ///
    /// Never fails: a provider error or unparseable reply is logged and
    /// mapped to the empty record for the document kind.
    pub async fn extract(&self, image: &EncodedImage, kind: DocumentKind) -> ExtractedFields {
        match self.provider.extract(&image.bytes, kind).await {
            Ok(value) => map_fields(kind, value),
            Err(e) => {
                log::warn!("OCR extraction failed for {}: {}; continuing without fields", kind, e);
                ExtractedFields::empty(kind)
            }
        }
    }
}

/// Map raw provider JSON to the record shape for the document kind
fn map_fields(kind: DocumentKind, value: serde_json::Value) -> ExtractedFields {
    match kind {
        DocumentKind::CardFront | DocumentKind::CardBack => {
            match serde_json::from_value::<CardFields>(value) {
                Ok(fields) => ExtractedFields::Card(fields),
                Err(e) => {
                    log::warn!("Discarding malformed card OCR payload: {}", e);
                    ExtractedFields::empty(kind)
                }
            }
        }
        DocumentKind::PhotoId => match serde_json::from_value::<IdFields>(value) {
            Ok(fields) => ExtractedFields::Id(fields),
            Err(e) => {
                log::warn!("Discarding malformed ID OCR payload: {}", e);
                ExtractedFields::empty(kind)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOcrProvider;
    use crate::types::ImageEncoding;
    use serde_json::json;

    fn image() -> EncodedImage {
        EncodedImage::new(vec![1, 2, 3], ImageEncoding::Jpeg, 4, 4)
    }

    #[tokio::test]
    async fn test_card_fields_are_mapped() {
        let provider = MockOcrProvider::replying(json!({
            "number": "4242424242424242",
            "expiry": "12/27",
            "holder": "JANE DOE",
            "brand": "visa",
            "valid": true,
        }));
        let adapter = OcrExtractionAdapter::new(Arc::new(provider));

        let fields = adapter.extract(&image(), DocumentKind::CardFront).await;
        match fields {
            ExtractedFields::Card(card) => {
                assert_eq!(card.number.as_deref(), Some("4242424242424242"));
                assert_eq!(card.holder.as_deref(), Some("JANE DOE"));
                assert_eq!(card.valid, Some(true));
            }
            other => panic!("expected card fields, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_id_fields_accept_partial_payload() {
        let provider = MockOcrProvider::replying(json!({
            "documentType": "passport",
            "fullName": "JANE DOE",
        }));
        let adapter = OcrExtractionAdapter::new(Arc::new(provider));

        let fields = adapter.extract(&image(), DocumentKind::PhotoId).await;
        match fields {
            ExtractedFields::Id(id) => {
                assert_eq!(id.document_type.as_deref(), Some("passport"));
                assert_eq!(id.full_name.as_deref(), Some("JANE DOE"));
                assert!(id.document_number.is_none());
            }
            other => panic!("expected id fields, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty_record() {
        let provider = MockOcrProvider::failing("service unavailable");
        let adapter = OcrExtractionAdapter::new(Arc::new(provider));

        let fields = adapter.extract(&image(), DocumentKind::CardBack).await;
        assert!(fields.is_empty());
        assert!(matches!(fields, ExtractedFields::Card(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_empty_record() {
        let provider = MockOcrProvider::replying(json!("not an object"));
        let adapter = OcrExtractionAdapter::new(Arc::new(provider));

        let fields = adapter.extract(&image(), DocumentKind::PhotoId).await;
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_null_provider_is_empty() {
        let adapter = OcrExtractionAdapter::new(Arc::new(NullOcrProvider));
        let fields = adapter.extract(&image(), DocumentKind::CardFront).await;
        assert!(fields.is_empty());
    }
}
