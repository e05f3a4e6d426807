//! Default keyword `TextSearcher`, backed by the `chunks_fts` FTS5 shadow
//! table maintained by [`crate::sqlite_repo::SqliteRepo`] triggers. Used
//! when the `tantivy-impl` feature is not compiled in.

use std::sync::Arc;

use crate::sqlite_repo::SqliteRepo;
use crate::{ChunkStoreRead, IndexCaps, SearchOptions, StoreError, TextIndexMaintainer, TextMatch, TextSearcher};
use doc_model::{ChunkId, TenantId};

/// Thin wrapper that always searches through its own `SqliteRepo` handle
/// rather than the generic `store` parameter, since the FTS5 shadow table
/// lives in the same SQLite file as the chunk rows.
pub struct Fts5Index {
    repo: Arc<SqliteRepo>,
}

impl Fts5Index {
    pub fn new(repo: Arc<SqliteRepo>) -> Self {
        Self { repo }
    }

    pub fn search_simple(&self, tenant: &TenantId, query_normalized: &str, limit: usize) -> Vec<TextMatch> {
        let fetch_n = limit.max(1);
        self.repo
            .search_fts(tenant, query_normalized, fetch_n)
            .unwrap_or_default()
            .into_iter()
            .map(|(chunk_id, score, occurrences)| TextMatch {
                chunk_id,
                score,
                raw_score: score,
                occurrences,
            })
            .collect()
    }
}

impl TextSearcher for Fts5Index {
    fn name(&self) -> &'static str {
        "fts5"
    }

    fn caps(&self) -> IndexCaps {
        IndexCaps {
            can_prefilter_resource_id_eq: false,
            can_prefilter_resource_id_in: false,
            can_prefilter_vendor: false,
            can_prefilter_range_date: false,
        }
    }

    fn search_ids(
        &self,
        _store: &dyn ChunkStoreRead,
        tenant: &TenantId,
        query_normalized: &str,
        _filters: &[crate::FilterClause],
        opts: &SearchOptions,
    ) -> Vec<TextMatch> {
        let fetch_n = opts.top_k.saturating_mul(opts.fetch_factor).max(opts.top_k);
        self.search_simple(tenant, query_normalized, fetch_n)
    }
}

/// The `chunks_fts` shadow table is kept in sync by SQLite triggers on the
/// `chunks` table itself, so there is nothing extra to push here; this impl
/// exists only so `Fts5Index` satisfies the same `TextIndexMaintainer`
/// contract as every other pluggable index the orchestrator iterates over.
impl TextIndexMaintainer for Fts5Index {
    fn upsert(&self, _chunks: &[doc_model::Chunk]) -> Result<(), StoreError> {
        Ok(())
    }

    fn delete_by_ids(&self, _ids: &[ChunkId]) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Chunk, ChunkId, FileId, FileType, Resource, ResourceId};
    use std::collections::BTreeSet;

    #[test]
    fn wraps_repo_search_and_builds_text_matches() {
        let repo = Arc::new(SqliteRepo::open_in_memory().unwrap());
        let tenant = TenantId::from("acme");
        let resource = Resource {
            resource_id: ResourceId::from("r1"),
            tenant_id: tenant.clone(),
            file_id: Some(FileId::from("2026/01/abc")),
            file_name: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            file_type: FileType::Pdf,
            size_bytes: 10,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            summary: String::new(),
            technical_metadata: serde_json::Value::Null,
            tags: BTreeSet::new(),
            vendor: None,
            entities: BTreeSet::new(),
            keywords: BTreeSet::new(),
            amounts_cents: BTreeSet::new(),
            currency: None,
            dates: BTreeSet::new(),
            content: String::new(),
            document_embedding: None,
        };
        repo.put_resource(&resource).unwrap();
        let chunk = Chunk {
            chunk_id: ChunkId::from("r1#0"),
            parent_resource_id: resource.resource_id.clone(),
            tenant_id: tenant.clone(),
            chunk_index: 0,
            char_start: 0,
            char_end: 20,
            text: "quarterly numbers".to_string(),
            text_normalized: "quarterly numbers".to_string(),
            ocr_text: None,
            ocr_text_normalized: None,
            image_description: None,
            searchable_text: "report.pdf quarterly numbers".to_string(),
            page_number: Some(1),
            row_index: None,
            chunk_embedding: None,
        };
        repo.put_chunks_bulk(&[chunk]).unwrap();

        let index = Fts5Index::new(repo);
        let hits = index.search_simple(&tenant, "quarterly", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id.as_str(), "r1#0");
    }
}
