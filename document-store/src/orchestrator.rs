//! Coordinates writes to the primary SQLite store with the pluggable text
//! and vector indexes so a caller never has to remember the ordering
//! (store first, indexes second; indexes best-effort on delete).

use doc_model::{Chunk, Resource, ResourceId, TenantId};

use crate::sqlite_repo::SqliteRepo;
use crate::{StoreError, TextIndexMaintainer, VectorIndexMaintainer};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("index error: {0}")]
    Index(String),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteReport {
    pub chunks_deleted: usize,
    pub text_delete_attempts: usize,
    pub vector_delete_attempts: usize,
}

/// Deletes a resource and its chunks from the primary store, then from
/// every text and vector index. Index deletes are best-effort: a failure
/// there is logged by the maintainer and does not roll back the store
/// delete (spec §4.F "delete_resource... cascades to chunks").
pub fn delete_resource_orchestrated(
    repo: &SqliteRepo,
    tenant: &TenantId,
    resource_id: &ResourceId,
    text_indexes: &[&dyn TextIndexMaintainer],
    vector_indexes: &mut [&mut dyn VectorIndexMaintainer],
) -> Result<DeleteReport, OrchestratorError> {
    let mut report = DeleteReport::default();
    let ids = repo.delete_chunks_for_resource(tenant, resource_id)?;
    repo.delete_resource(tenant, resource_id)?;
    report.chunks_deleted = ids.len();

    if ids.is_empty() {
        return Ok(report);
    }
    for ti in text_indexes {
        if let Err(err) = ti.delete_by_ids(&ids) {
            tracing::warn!(resource_id = resource_id.as_str(), error = %err, "text index delete failed");
        }
        report.text_delete_attempts += ids.len();
    }
    for vi in vector_indexes.iter_mut() {
        if let Err(err) = vi.delete_by_ids(tenant, &ids) {
            tracing::warn!(resource_id = resource_id.as_str(), error = %err, "vector index delete failed");
        }
        report.vector_delete_attempts += ids.len();
    }
    Ok(report)
}

/// Ingests a resource and its chunks: upserts the resource row, bulk-upserts
/// chunk rows (which refreshes the FTS5 shadow table via triggers), then
/// pushes the same chunks into every pluggable text index and, when vectors
/// are available, every vector index (spec §4.K).
pub fn ingest_resource_orchestrated(
    repo: &SqliteRepo,
    resource: &Resource,
    chunks: &[Chunk],
    text_indexes: &[&dyn TextIndexMaintainer],
    vector_indexes: &mut [&mut dyn VectorIndexMaintainer],
) -> Result<(), OrchestratorError> {
    repo.put_resource(resource)?;
    if chunks.is_empty() {
        return Ok(());
    }
    repo.put_chunks_bulk(chunks)?;

    for ti in text_indexes {
        ti.upsert(chunks).map_err(|e| OrchestratorError::Index(format!("{e}")))?;
    }

    let vectors: Vec<_> = chunks
        .iter()
        .filter_map(|c| c.chunk_embedding.clone().map(|v| (c.chunk_id.clone(), c.parent_resource_id.clone(), v)))
        .collect();
    if !vectors.is_empty() {
        for vi in vector_indexes.iter_mut() {
            vi.upsert_vectors(&resource.tenant_id, &vectors)
                .map_err(|e| OrchestratorError::Index(format!("{e}")))?;
        }
    }
    Ok(())
}
