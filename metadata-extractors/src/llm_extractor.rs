//! Entities and keywords via an external language model (spec §4.B).
//! Model timeouts and malformed responses degrade to empty sets rather
//! than failing ingestion.

use std::collections::BTreeSet;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum EntityExtractionError {
    #[error("model call failed: {0}")]
    ProviderFailure(String),
    #[error("model returned malformed JSON: {0}")]
    MalformedResponse(String),
}

/// A bounded-size entities/keywords extraction. Implementations wrap an
/// actual LLM call; `NullEntityExtractor` is the always-empty fallback used
/// when no model is configured.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<EntityExtraction, EntityExtractionError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityExtraction {
    #[serde(default)]
    pub entities: BTreeSet<String>,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
}

/// Maximum entities/keywords accepted from a single model response, bounding
/// an adversarial or malformed model output.
pub const MAX_ITEMS_PER_FIELD: usize = 32;

impl EntityExtraction {
    fn truncated(mut self) -> Self {
        while self.entities.len() > MAX_ITEMS_PER_FIELD {
            let last = self.entities.iter().next_back().cloned();
            if let Some(item) = last {
                self.entities.remove(&item);
            } else {
                break;
            }
        }
        while self.keywords.len() > MAX_ITEMS_PER_FIELD {
            let last = self.keywords.iter().next_back().cloned();
            if let Some(item) = last {
                self.keywords.remove(&item);
            } else {
                break;
            }
        }
        self
    }
}

/// Always returns empty sets without making a call; used when no model is
/// configured, or as the last-resort fallback after a provider failure.
pub struct NullEntityExtractor;

impl EntityExtractor for NullEntityExtractor {
    fn extract(&self, _text: &str) -> Result<EntityExtraction, EntityExtractionError> {
        Ok(EntityExtraction::default())
    }
}

/// Runs `extractor` and degrades to empty sets on any error, logging the
/// failure (spec §4.B "Failure: Model timeouts -> empty entities/keywords,
/// logged, ingestion continues").
pub fn extract_entities_best_effort(
    extractor: &dyn EntityExtractor,
    tenant_id: &str,
    text: &str,
) -> EntityExtraction {
    match extractor.extract(text) {
        Ok(extraction) => extraction.truncated(),
        Err(err) => {
            tracing::warn!(tenant_id, error = %err, "entity extraction degraded to empty result");
            EntityExtraction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingExtractor;
    impl EntityExtractor for FailingExtractor {
        fn extract(&self, _text: &str) -> Result<EntityExtraction, EntityExtractionError> {
            Err(EntityExtractionError::ProviderFailure("timeout".into()))
        }
    }

    #[test]
    fn failure_degrades_to_empty_sets() {
        let result = extract_entities_best_effort(&FailingExtractor, "t1", "some text");
        assert!(result.entities.is_empty());
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn null_extractor_is_always_empty() {
        let result = extract_entities_best_effort(&NullEntityExtractor, "t1", "some text");
        assert!(result.entities.is_empty());
    }
}
