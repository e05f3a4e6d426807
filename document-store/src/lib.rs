//! Document Store (spec §4.F): tenant-scoped persistence for Resources,
//! Chunks, and Categories, plus pluggable text and vector search backends.

pub mod fts5_index;
pub mod hnsw_index;
pub mod orchestrator;
pub mod sqlite_repo;
pub mod suggestion_index;
pub mod tantivy_index;

use doc_model::{Category, CategoryType, Chunk, ChunkId, ResourceId, TenantId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("resource not found: tenant={tenant}, resource_id={resource_id}")]
    NotFound { tenant: String, resource_id: String },
    #[error("conflict: {0} already exists")]
    Conflict(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Combinator for a single predicate in a [`FilterClause`] list; `Must`
/// clauses are ANDed, `Should` clauses are ORed within their own group
/// (spec §4.F "filter_search... exact-match predicates").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Must,
    Should,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    ResourceIdEq(ResourceId),
    ResourceIdIn(Vec<ResourceId>),
    VendorEq(String),
    AmountCentsEq(i64),
    KeywordIn(String),
    FileNamePrefix(String),
    RangeIsoDate {
        key: String,
        start: Option<String>,
        end: Option<String>,
        start_incl: bool,
        end_incl: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub kind: FilterKind,
    pub op: FilterOp,
}

/// Backend capability advertisement, mirroring the corpus convention of
/// letting callers decide which filters a `TextSearcher` can push down
/// versus apply as a post-filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexCaps {
    pub can_prefilter_resource_id_eq: bool,
    pub can_prefilter_resource_id_in: bool,
    pub can_prefilter_vendor: bool,
    pub can_prefilter_range_date: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub top_k: usize,
    pub fetch_factor: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { top_k: 20, fetch_factor: 4 }
    }
}

#[derive(Debug, Clone)]
pub struct TextMatch {
    pub chunk_id: ChunkId,
    pub score: f32,
    pub raw_score: f32,
    pub occurrences: u32,
}

#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub chunk_id: Option<ChunkId>,
    pub resource_id: ResourceId,
    pub score: f32,
}

pub trait ChunkStoreRead: Send + Sync {
    fn get_chunks_by_ids(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>, StoreError>;
}

pub trait TextSearcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn caps(&self) -> IndexCaps;
    fn search_ids(
        &self,
        store: &dyn ChunkStoreRead,
        tenant: &TenantId,
        query_normalized: &str,
        filters: &[FilterClause],
        opts: &SearchOptions,
    ) -> Vec<TextMatch>;
}

pub trait TextIndexMaintainer: Send + Sync {
    fn upsert(&self, chunks: &[Chunk]) -> Result<(), StoreError>;
    fn delete_by_ids(&self, ids: &[ChunkId]) -> Result<(), StoreError>;
}

pub trait VectorSearcher: Send + Sync {
    fn search(&self, tenant: &TenantId, vector: &[f32], top_k: usize) -> Vec<VectorMatch>;
}

pub trait VectorIndexMaintainer: Send + Sync {
    fn upsert_vectors(&mut self, tenant: &TenantId, vectors: &[(ChunkId, ResourceId, Vec<f32>)]) -> Result<(), StoreError>;
    fn delete_by_ids(&mut self, tenant: &TenantId, ids: &[ChunkId]) -> Result<(), StoreError>;
}

/// Seeds the three default categories for a tenant the first time any
/// category is requested and none exist yet (spec §3 "Default seed
/// populated lazily", §4.M).
pub fn default_categories_for(tenant: &TenantId) -> Vec<Category> {
    doc_model::seed_default_categories(tenant)
}

pub(crate) fn category_type_key(ct: &CategoryType) -> String {
    ct.key()
}

pub use sqlite_repo::SqliteRepo;
pub use suggestion_index::SuggestionIndex;
