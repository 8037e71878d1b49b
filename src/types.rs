//! Core data model for the verification capture pipeline.
//!
//! Frames, encoded images, per-document records, and the three-document
//! verification bundle that gets submitted to the fraud-verification backend.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The three document kinds collected for a verification bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    CardFront,
    CardBack,
    PhotoId,
}

impl DocumentKind {
    /// All kinds in bundle order
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::CardFront,
        DocumentKind::CardBack,
        DocumentKind::PhotoId,
    ];

    /// Multipart field name expected by the upload endpoint
    pub fn field_name(&self) -> &'static str {
        match self {
            DocumentKind::CardFront => "cardFront",
            DocumentKind::CardBack => "cardBack",
            DocumentKind::PhotoId => "photoId",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::CardFront => "card_front",
            DocumentKind::CardBack => "card_back",
            DocumentKind::PhotoId => "photo_id",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discrete frame quality classification used to guide capture timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    /// No reading yet
    None,
    /// Too dark or too bright to capture
    Poor,
    /// Usable, manual capture recommended
    Good,
    /// Well lit; auto-capture may fire
    Perfect,
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityLevel::None => write!(f, "none"),
            QualityLevel::Poor => write!(f, "poor"),
            QualityLevel::Good => write!(f, "good"),
            QualityLevel::Perfect => write!(f, "perfect"),
        }
    }
}

/// Raw RGB24 frame as delivered by a camera stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrame {
    /// Interleaved RGB pixel data, 3 bytes per pixel
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub device_id: String,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        Self {
            data,
            width,
            height,
            device_id,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Compressed raster output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageEncoding {
    Jpeg,
    Png,
}

impl ImageEncoding {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
            ImageEncoding::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
            ImageEncoding::Png => "png",
        }
    }
}

/// An encoded bitmap plus the dimensions it encodes
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Bytes,
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, encoding: ImageEncoding, width: u32, height: u32) -> Self {
        Self {
            bytes: Bytes::from(bytes),
            encoding,
            width,
            height,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Structured fields recovered from a card image by OCR
///
/// Any subset may be absent; OCR is best-effort and never blocks the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardFields {
    pub number: Option<String>,
    pub expiry: Option<String>,
    pub holder: Option<String>,
    pub brand: Option<String>,
    pub valid: Option<bool>,
}

impl CardFields {
    pub fn is_empty(&self) -> bool {
        self.number.is_none()
            && self.expiry.is_none()
            && self.holder.is_none()
            && self.brand.is_none()
            && self.valid.is_none()
    }
}

/// Structured fields recovered from a photo-ID image by OCR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdFields {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub expiry: Option<String>,
}

impl IdFields {
    pub fn is_empty(&self) -> bool {
        self.document_type.is_none()
            && self.document_number.is_none()
            && self.full_name.is_none()
            && self.date_of_birth.is_none()
            && self.expiry.is_none()
    }
}

/// Extraction result for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractedFields {
    Card(CardFields),
    Id(IdFields),
}

impl ExtractedFields {
    /// Empty record for the given document kind
    pub fn empty(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::CardFront | DocumentKind::CardBack => {
                ExtractedFields::Card(CardFields::default())
            }
            DocumentKind::PhotoId => ExtractedFields::Id(IdFields::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ExtractedFields::Card(c) => c.is_empty(),
            ExtractedFields::Id(i) => i.is_empty(),
        }
    }
}

/// One captured document inside a bundle
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub kind: DocumentKind,
    /// As captured or selected, before normalization
    pub raw: Option<EncodedImage>,
    /// Normalized output of the post-processor; required for submission
    pub normalized: Option<EncodedImage>,
    pub extracted: Option<ExtractedFields>,
    pub uploaded: bool,
}

impl DocumentRecord {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            raw: None,
            normalized: None,
            extracted: None,
            uploaded: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.normalized.is_some()
    }
}

/// The complete set of three document captures plus submission metadata
///
/// Submission is permitted only when all three records carry a normalized
/// image; `can_submit` and `progress_percent` agree at 100%.
#[derive(Debug, Clone)]
pub struct VerificationBundle {
    pub booking_reference: String,
    pub upload_token: String,
    records: [DocumentRecord; 3],
}

impl VerificationBundle {
    pub fn new(booking_reference: impl Into<String>, upload_token: impl Into<String>) -> Self {
        Self {
            booking_reference: booking_reference.into(),
            upload_token: upload_token.into(),
            records: [
                DocumentRecord::new(DocumentKind::CardFront),
                DocumentRecord::new(DocumentKind::CardBack),
                DocumentRecord::new(DocumentKind::PhotoId),
            ],
        }
    }

    pub fn record(&self, kind: DocumentKind) -> &DocumentRecord {
        &self.records[Self::index(kind)]
    }

    pub fn record_mut(&mut self, kind: DocumentKind) -> &mut DocumentRecord {
        &mut self.records[Self::index(kind)]
    }

    pub fn records(&self) -> &[DocumentRecord; 3] {
        &self.records
    }

    /// Attach a confirmed capture to its slot
    pub fn attach(
        &mut self,
        kind: DocumentKind,
        raw: EncodedImage,
        normalized: EncodedImage,
        extracted: Option<ExtractedFields>,
    ) {
        let record = self.record_mut(kind);
        record.raw = Some(raw);
        record.normalized = Some(normalized);
        record.extracted = extracted;
        record.uploaded = false;
    }

    /// Clear a slot (user discarded a capture)
    pub fn discard(&mut self, kind: DocumentKind) {
        *self.record_mut(kind) = DocumentRecord::new(kind);
    }

    pub fn completed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_complete()).count()
    }

    pub fn progress_percent(&self) -> u8 {
        (self.completed_count() * 100 / self.records.len()) as u8
    }

    pub fn can_submit(&self) -> bool {
        self.records.iter().all(|r| r.is_complete())
    }

    pub fn mark_uploaded(&mut self) {
        for record in &mut self.records {
            record.uploaded = true;
        }
    }

    fn index(kind: DocumentKind) -> usize {
        match kind {
            DocumentKind::CardFront => 0,
            DocumentKind::CardBack => 1,
            DocumentKind::PhotoId => 2,
        }
    }
}

/// Outcome of a single upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    TerminalFailure,
}

/// One submission attempt, surfaced to the caller for UI feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadAttempt {
    /// 1-based attempt number
    pub number: u32,
    pub outcome: AttemptOutcome,
    pub reason: String,
    pub at: chrono::DateTime<chrono::Utc>,
}
