use serde::{Deserialize, Serialize};

use crate::ids::{ChunkId, ResourceId, TenantId};

/// One searchable unit of a [`crate::resource::Resource`]. See spec §3 "Chunk".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub parent_resource_id: ResourceId,
    pub tenant_id: TenantId,
    pub chunk_index: u32,
    pub char_start: u32,
    pub char_end: u32,

    pub text: String,
    pub text_normalized: String,
    pub ocr_text: Option<String>,
    pub ocr_text_normalized: Option<String>,
    pub image_description: Option<String>,
    /// Concatenation of resource name + summary + tags + keywords + chunk
    /// text, all normalized. Refreshed by the Reindex Coordinator whenever
    /// the parent's contributing fields change (spec §4.D invariant).
    pub searchable_text: String,
    pub page_number: Option<u32>,
    pub row_index: Option<u32>,
    pub chunk_embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn text_field(&self, field: ChunkTextField) -> Option<&str> {
        match field {
            ChunkTextField::SearchableText => Some(&self.searchable_text),
            ChunkTextField::TextNormalized => Some(&self.text_normalized),
            ChunkTextField::OcrTextNormalized => self.ocr_text_normalized.as_deref(),
            ChunkTextField::ImageDescription => self.image_description.as_deref(),
        }
    }
}

/// The chunk text fields that exact-phrase / partial-word search may target,
/// in the fixed base-score order from spec §4.J's scoring table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkTextField {
    SearchableText,
    OcrTextNormalized,
    TextNormalized,
    ImageDescription,
}

impl ChunkTextField {
    pub const ALL: [ChunkTextField; 4] = [
        ChunkTextField::SearchableText,
        ChunkTextField::OcrTextNormalized,
        ChunkTextField::TextNormalized,
        ChunkTextField::ImageDescription,
    ];

    /// Base score for an exact-phrase hit on this field (spec §4.J).
    pub fn exact_phrase_score(self) -> f32 {
        match self {
            ChunkTextField::SearchableText => 1.00,
            ChunkTextField::OcrTextNormalized => 0.98,
            ChunkTextField::TextNormalized => 0.95,
            ChunkTextField::ImageDescription => 0.93,
        }
    }

    /// Base score (before overlap ratio) for a partial-word hit on this field.
    /// `image_description` never participates in partial-word scoring per the
    /// spec's scoring table.
    pub fn partial_words_base_score(self) -> Option<f32> {
        match self {
            ChunkTextField::SearchableText => Some(0.50),
            ChunkTextField::OcrTextNormalized => Some(0.45),
            ChunkTextField::TextNormalized => Some(0.40),
            ChunkTextField::ImageDescription => None,
        }
    }
}
