//! File Processors (spec §4.C) and Chunker (spec §4.D): turn raw bytes into
//! per-unit text plus technical metadata, then split that text into
//! searchable [`Chunk`]s.

pub mod ocr;
pub mod reader_csv;
pub mod reader_pdf;
#[cfg(feature = "pdfium")]
pub mod reader_pdf_pdfium;
#[cfg(feature = "pure-pdf")]
pub mod reader_pdf_pure;
pub mod reader_txt;
pub mod text_segmenter;
pub mod unified_blocks;

use std::path::Path;

use doc_model::normalize::normalize;
use doc_model::{Chunk, ChunkId, Resource, ResourceId, TenantId};
use ocr::{ImageDescriber, OcrEngine};
use sha2::Digest;
use unified_blocks::{BlockKind, UnifiedBlock};

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("processor failed: {0}")]
    ProcessorError(String),
}

/// The result of running a File Processor variant over one resource's bytes
/// (spec §4.C: `process(bytes) -> (raw_text, per_unit_texts, technical_metadata)`).
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub raw_text: String,
    /// `(unit_key, unit_text)` — a page number, row index, or monotonic index.
    pub per_unit_texts: Vec<(u32, String)>,
    pub technical_metadata: serde_json::Value,
}

/// Maximum accepted upload size before a file is rejected at the ingestion
/// boundary, never reaching a processor (spec §4.C "Size policy").
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Processes a PDF file at `path`. One unit per page; pages whose reader
/// backend produced no extractable text fall back to OCR via `ocr`.
pub fn process_pdf(path: &Path, ocr: &dyn OcrEngine, tenant_id: &str) -> Result<ProcessedFile, ProcessorError> {
    let path_str = path.to_string_lossy();
    let blocks = reader_pdf::read_pdf_to_blocks(&path_str);
    let backend = match reader_pdf::default_backend() {
        reader_pdf::PdfBackend::Pdfium => "pdfium",
        reader_pdf::PdfBackend::PureRust => "pure-pdf",
        reader_pdf::PdfBackend::Stub => "stub",
    };

    let mut per_unit_texts: Vec<(u32, String)> = Vec::new();
    let mut raw_text = String::new();
    let mut ocr_used = false;
    for (i, block) in blocks.iter().enumerate() {
        let page = block.page_start.unwrap_or(i as u32 + 1);
        let mut text = block.text.clone();
        if text.trim().is_empty() {
            if let Ok(bytes) = std::fs::read(path) {
                if let Ok(result) = ocr.recognize(&bytes) {
                    text = result.text;
                    ocr_used = true;
                } else {
                    tracing::warn!(tenant_id, page, "PDF page had no extractable text and OCR fallback failed");
                }
            }
        }
        raw_text.push_str(&text);
        raw_text.push('\n');
        per_unit_texts.push((page, text));
    }

    let technical_metadata = serde_json::json!({
        "reader_backend": backend,
        "ocr_used": ocr_used,
        "page_count": per_unit_texts.len(),
    });

    Ok(ProcessedFile { raw_text, per_unit_texts, technical_metadata })
}

/// Processes an image file: OCR for `ocr_text`, optional image-description
/// model for `image_description`. Neither ever touches user `summary`.
pub fn process_image(
    path: &Path,
    ocr: &dyn OcrEngine,
    describer: Option<&dyn ImageDescriber>,
    tenant_id: &str,
) -> Result<ProcessedFile, ProcessorError> {
    let bytes = std::fs::read(path).map_err(|e| ProcessorError::ProcessorError(e.to_string()))?;
    let (ocr_text, image_description) = ocr::process_image(ocr, describer, tenant_id, &bytes);

    let raw_text = ocr_text.clone().unwrap_or_default();
    let technical_metadata = serde_json::json!({
        "ocr_used": ocr_text.is_some(),
        "image_description_used": image_description.is_some(),
        "content_sha256": sha256_hex(&bytes),
    });

    let mut per_unit_texts = Vec::new();
    per_unit_texts.push((0u32, raw_text.clone()));

    let mut metadata = technical_metadata;
    if let Some(desc) = &image_description {
        metadata["image_description"] = serde_json::Value::String(desc.clone());
    }

    Ok(ProcessedFile { raw_text, per_unit_texts, technical_metadata: metadata })
}

/// Processes a CSV file: one unit per row, formatted as
/// `"col1: v1 | col2: v2 | ..."` (spec §4.C).
pub fn process_csv(path: &Path) -> Result<ProcessedFile, ProcessorError> {
    let rows = reader_csv::read_csv_to_rows(&path.to_string_lossy())
        .map_err(|e| ProcessorError::ProcessorError(e.to_string()))?;

    let raw_text = rows.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>().join("\n");
    let technical_metadata = serde_json::json!({ "row_count": rows.len() });

    Ok(ProcessedFile { raw_text, per_unit_texts: rows, technical_metadata })
}

/// Processes a plain text/Markdown file: a single unit covering the whole file.
pub fn process_text(path: &Path) -> Result<ProcessedFile, ProcessorError> {
    let blocks = reader_txt::read_txt_to_blocks(&path.to_string_lossy());
    let raw_text = blocks.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n\n");
    let technical_metadata = serde_json::json!({ "paragraph_count": blocks.len() });

    Ok(ProcessedFile {
        raw_text,
        per_unit_texts: vec![(0, blocks.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n\n"))],
        technical_metadata,
    })
}

/// Processes a user-authored snippet: title + body as a single unit.
pub fn process_snippet(title: &str, body: &str) -> ProcessedFile {
    let raw_text = format!("{}\n\n{}", title, body);
    ProcessedFile {
        raw_text: raw_text.clone(),
        per_unit_texts: vec![(0, raw_text)],
        technical_metadata: serde_json::json!({ "title_len": title.len(), "body_len": body.len() }),
    }
}

/// Per-unit window size for the Chunker (spec §4.D "roughly 400-800 tokens
/// with 10-20% overlap"). The teacher's segmenter counts characters, not
/// tokens; we carry that convention forward.
pub fn default_chunk_params() -> text_segmenter::TextChunkParams {
    text_segmenter::TextChunkParams::default()
}

const OVERLAP_RATIO: f32 = 0.15;

fn with_overlap(segments: Vec<String>, max_chars: usize) -> Vec<String> {
    if segments.len() <= 1 {
        return segments;
    }
    let overlap_chars = (max_chars as f32 * OVERLAP_RATIO) as usize;
    let mut out = Vec::with_capacity(segments.len());
    let mut prev_tail = String::new();
    for seg in segments {
        let combined = if prev_tail.is_empty() {
            seg.clone()
        } else {
            format!("{}{}", prev_tail, seg)
        };
        let tail_start = seg.char_indices().rev().nth(overlap_chars.saturating_sub(1)).map(|(i, _)| i).unwrap_or(0);
        prev_tail = seg[tail_start..].to_string();
        out.push(combined);
    }
    out
}

/// Splits one unit's text into one or more chunk texts. Units at or below
/// `params.max_chars` are emitted whole; longer units are windowed with
/// overlap. `atomic` forces a single chunk regardless of length (CSV rows).
fn chunk_unit_text(unit_text: &str, params: &text_segmenter::TextChunkParams, atomic: bool) -> Vec<String> {
    let trimmed = unit_text.trim();
    if trimmed.is_empty() {
        return vec![String::new()];
    }
    if atomic || trimmed.chars().count() <= params.max_chars {
        return vec![trimmed.to_string()];
    }
    let block = UnifiedBlock::new(BlockKind::Paragraph, trimmed, 0, "", "");
    let segments: Vec<String> = text_segmenter::chunk_blocks_to_segments(&[block], params)
        .into_iter()
        .map(|(t, _, _)| t)
        .collect();
    with_overlap(segments, params.max_chars)
}

/// Builds a `searchable_text` string per the composition rule in spec §4.D.
pub fn compose_searchable_text(resource: &Resource, chunk_text: &str, ocr_text: Option<&str>) -> String {
    let mut parts = vec![
        resource.file_name.clone(),
        resource.summary.clone(),
        resource.tags.iter().cloned().collect::<Vec<_>>().join(" "),
        resource.keywords.iter().cloned().collect::<Vec<_>>().join(" "),
        chunk_text.to_string(),
    ];
    if let Some(ocr) = ocr_text {
        parts.push(ocr.to_string());
    }
    normalize(&parts.join(" "))
}

/// Turns `per_unit_texts` into [`Chunk`]s for `resource`. `is_csv` makes
/// every row its own chunk regardless of length; `row_index` vs
/// `page_number` is chosen accordingly.
pub fn build_chunks(
    resource: &Resource,
    per_unit_texts: &[(u32, String)],
    ocr_text: Option<&str>,
    is_csv: bool,
    params: &text_segmenter::TextChunkParams,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut chunk_index = 0u32;
    let mut cursor = 0u32;

    for (unit_key, unit_text) in per_unit_texts {
        for text in chunk_unit_text(unit_text, params, is_csv) {
            let char_len = text.chars().count() as u32;
            let text_normalized = normalize(&text);
            let searchable_text = compose_searchable_text(resource, &text, ocr_text);
            let ocr_text_normalized = ocr_text.map(normalize);

            chunks.push(Chunk {
                chunk_id: ChunkId::from(format!("{}#{}", resource.resource_id.as_str(), chunk_index)),
                parent_resource_id: ResourceId::from(resource.resource_id.as_str()),
                tenant_id: TenantId::from(resource.tenant_id.as_str()),
                chunk_index,
                char_start: cursor,
                char_end: cursor + char_len,
                text,
                text_normalized,
                ocr_text: ocr_text.map(str::to_string),
                ocr_text_normalized,
                image_description: None,
                searchable_text,
                page_number: if is_csv { None } else { Some(*unit_key) },
                row_index: if is_csv { Some(*unit_key) } else { None },
                chunk_embedding: None,
            });

            chunk_index += 1;
            cursor += char_len;
        }
    }

    if chunks.is_empty() {
        chunks.push(Chunk {
            chunk_id: ChunkId::from(format!("{}#0", resource.resource_id.as_str())),
            parent_resource_id: ResourceId::from(resource.resource_id.as_str()),
            tenant_id: TenantId::from(resource.tenant_id.as_str()),
            chunk_index: 0,
            char_start: 0,
            char_end: 0,
            text: String::new(),
            text_normalized: String::new(),
            ocr_text: None,
            ocr_text_normalized: None,
            image_description: None,
            searchable_text: compose_searchable_text(resource, "", None),
            page_number: None,
            row_index: None,
            chunk_embedding: None,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doc_model::FileType;
    use std::collections::BTreeSet;

    fn sample_resource() -> Resource {
        Resource {
            resource_id: ResourceId::from("r1"),
            tenant_id: TenantId::from("t1"),
            file_id: None,
            file_name: "invoice.pdf".into(),
            mime_type: "application/pdf".into(),
            file_type: FileType::Pdf,
            size_bytes: 100,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            summary: "Quarterly invoice".into(),
            technical_metadata: serde_json::json!({}),
            tags: BTreeSet::new(),
            vendor: None,
            entities: BTreeSet::new(),
            keywords: BTreeSet::new(),
            amounts_cents: BTreeSet::new(),
            currency: None,
            dates: BTreeSet::new(),
            content: String::new(),
            document_embedding: None,
        }
    }

    #[test]
    fn short_unit_becomes_one_chunk() {
        let resource = sample_resource();
        let params = default_chunk_params();
        let chunks = build_chunks(&resource, &[(1, "Short page text.".into())], None, false, &params);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page_number, Some(1));
        assert!(chunks[0].searchable_text.contains("invoice"));
    }

    #[test]
    fn csv_rows_never_split() {
        let resource = sample_resource();
        let params = default_chunk_params();
        let long_row = "a".repeat(5000);
        let chunks = build_chunks(&resource, &[(0, long_row.clone())], None, true, &params);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].row_index, Some(0));
        assert_eq!(chunks[0].text, long_row);
    }

    #[test]
    fn long_unit_splits_with_overlap() {
        let resource = sample_resource();
        let params = default_chunk_params();
        let long_text = "Sentence number filler. ".repeat(80);
        let chunks = build_chunks(&resource, &[(1, long_text)], None, false, &params);
        assert!(chunks.len() > 1);
    }
}
