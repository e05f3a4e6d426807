//! Image processing (spec §4.C "Image"): OCR via an external service, plus
//! an optional image-description model call. Both results are stored
//! independently of the user-authored `summary`.

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider failed: {0}")]
    ProviderFailure(String),
}

pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<OcrResult, OcrError>;
}

#[derive(Debug, Clone, Default)]
pub struct OcrResult {
    pub text: String,
    pub langs: Vec<String>,
}

/// Always fails; used when no OCR backend is configured so ingestion
/// degrades the same way a real provider timeout would.
pub struct UnavailableOcrEngine;

impl OcrEngine for UnavailableOcrEngine {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<OcrResult, OcrError> {
        Err(OcrError::ProviderFailure("no OCR backend configured".into()))
    }
}

pub trait ImageDescriber: Send + Sync {
    fn describe(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

pub struct UnavailableImageDescriber;

impl ImageDescriber for UnavailableImageDescriber {
    fn describe(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::ProviderFailure("no image-description backend configured".into()))
    }
}

/// Runs OCR and (optionally) image description, degrading to `None` on
/// failure and logging rather than aborting ingestion.
pub fn process_image(
    ocr: &dyn OcrEngine,
    describer: Option<&dyn ImageDescriber>,
    tenant_id: &str,
    image_bytes: &[u8],
) -> (Option<String>, Option<String>) {
    let ocr_text = match ocr.recognize(image_bytes) {
        Ok(result) => Some(result.text),
        Err(err) => {
            tracing::warn!(tenant_id, error = %err, "OCR degraded to no text");
            None
        }
    };

    let image_description = describer.and_then(|d| match d.describe(image_bytes) {
        Ok(desc) => Some(desc),
        Err(err) => {
            tracing::warn!(tenant_id, error = %err, "image description degraded to none");
            None
        }
    });

    (ocr_text, image_description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_engine_degrades_to_none() {
        let (text, desc) = process_image(&UnavailableOcrEngine, None, "t1", b"fake-bytes");
        assert!(text.is_none());
        assert!(desc.is_none());
    }
}
