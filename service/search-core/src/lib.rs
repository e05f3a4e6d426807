//! Search Core (spec §4.K/§4.L/§4.M): the facade that wires every other
//! crate in the workspace together into ingest/reindex/search/category
//! operations a caller-facing binary can drive directly.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Deserialize;

use blob_store::{BlobStore, BlobStoreError};
use doc_model::{AuditAction, CallerId, Category, CategoryType, FileType, Resource, ResourceId, SuggestionEntry, TenantId};
use document_store::fts5_index::Fts5Index;
use document_store::hnsw_index::HnswIndex;
use document_store::orchestrator::{self, OrchestratorError};
use document_store::sqlite_repo::SqliteRepo;
use document_store::{StoreError, SuggestionIndex, TextIndexMaintainer, VectorIndexMaintainer, VectorSearcher};
use embedding_provider::embedder::{
    Embedder, EmbedderError, OnnxHttpConfig, OnnxHttpEmbedder, OnnxStdIoConfig, OnnxStdIoEmbedder,
};
use file_processors::ocr::{ImageDescriber, OcrEngine, UnavailableImageDescriber, UnavailableOcrEngine};
use file_processors::{ProcessedFile, ProcessorError};
use hybrid_searcher::{HybridSearcher, SearchError};
use metadata_extractors::{EntityExtractor, NullEntityExtractor};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Surfaced by callers that layer authentication on top of this facade;
    /// nothing in this crate produces it directly.
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("file too large: {size} bytes exceeds limit of {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("orchestrated write failed: {0}")]
    Orchestrator(#[from] OrchestratorError),
    #[error("blob store error: {0}")]
    Blob(#[from] BlobStoreError),
    #[error("embedder error: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("search error: {0}")]
    Search(#[from] SearchError),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Picks which [`Embedder`] backend `SearchCore::new` builds. `OnnxHttp`
/// needs no local model files, so it's the config default for bring-up and
/// tests; `OnnxStdIo` is for a deployment with a real model on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum EmbedderConfig {
    OnnxStdIo {
        model_path: PathBuf,
        runtime_library_path: PathBuf,
        tokenizer_path: PathBuf,
        dimension: usize,
        max_input_length: usize,
        embedding_model_id: String,
        text_repr_version: String,
    },
    OnnxHttp {
        endpoint: String,
        auth_token: Option<String>,
        dimension: usize,
        max_input_length: usize,
        embedding_model_id: String,
        text_repr_version: String,
    },
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        EmbedderConfig::OnnxHttp {
            endpoint: "http://localhost:8089/embed".to_string(),
            auth_token: None,
            dimension: 768,
            max_input_length: 8192,
            embedding_model_id: "dev-deterministic".to_string(),
            text_repr_version: "v1".to_string(),
        }
    }
}

fn build_embedder(cfg: &EmbedderConfig) -> Result<Arc<dyn Embedder>, CoreError> {
    match cfg {
        EmbedderConfig::OnnxStdIo {
            model_path,
            runtime_library_path,
            tokenizer_path,
            dimension,
            max_input_length,
            embedding_model_id,
            text_repr_version,
        } => {
            let embedder = OnnxStdIoEmbedder::new(OnnxStdIoConfig {
                model_path: model_path.clone(),
                runtime_library_path: runtime_library_path.clone(),
                tokenizer_path: tokenizer_path.clone(),
                dimension: *dimension,
                max_input_length: *max_input_length,
                embedding_model_id: embedding_model_id.clone(),
                text_repr_version: text_repr_version.clone(),
            })?;
            Ok(Arc::new(embedder))
        }
        EmbedderConfig::OnnxHttp {
            endpoint,
            auth_token,
            dimension,
            max_input_length,
            embedding_model_id,
            text_repr_version,
        } => {
            let embedder = OnnxHttpEmbedder::new(OnnxHttpConfig {
                endpoint: endpoint.clone(),
                auth_token: auth_token.clone(),
                dimension: *dimension,
                max_input_length: *max_input_length,
                embedding_model_id: embedding_model_id.clone(),
                text_repr_version: text_repr_version.clone(),
            })?;
            Ok(Arc::new(embedder))
        }
    }
}

/// Top-level TOML configuration, loaded once at process start (spec's
/// ambient configuration layer, following the teacher's convention of one
/// flat file per deployment).
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub blob_root: PathBuf,
    #[serde(default)]
    pub embedder: EmbedderConfig,
}

impl CoreConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CoreError::Config(format!("reading {}: {e}", path.as_ref().display())))?;
        toml::from_str(&text).map_err(|e| CoreError::Config(e.to_string()))
    }
}

/// What's being ingested (spec §4.K: a file upload or a user-authored snippet).
pub enum IngestUpload {
    File { file_name: String, mime_type: String, bytes: Vec<u8> },
    Snippet { title: String, body: String },
}

/// Wires the Document Store's primary repo and pluggable indexes, the Blob
/// Store, the File Processors/Chunker, the Embedding Client and the
/// Metadata Extractors into the Ingestion Coordinator, Reindex Coordinator
/// and Category Admin operations (spec §4.K/§4.L/§4.M).
pub struct SearchCore {
    repo: Arc<SqliteRepo>,
    blob: Arc<BlobStore>,
    embedder: Arc<dyn Embedder>,
    fts: Arc<Fts5Index>,
    hnsw: Arc<Mutex<HnswIndex>>,
    entity_extractor: Arc<dyn EntityExtractor>,
    ocr: Arc<dyn OcrEngine>,
    describer: Option<Arc<dyn ImageDescriber>>,
    /// Per-resource monotonic counter backing the Reindex Coordinator's
    /// latest-wins semantics (spec §4.L "newer events supersede older ones").
    reindex_generations: Arc<Mutex<HashMap<ResourceId, u64>>>,
}

impl SearchCore {
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let repo = Arc::new(SqliteRepo::open_file(&config.db_path)?);
        let blob = Arc::new(BlobStore::new(&config.blob_root));
        let embedder = build_embedder(&config.embedder)?;
        let fts = Arc::new(Fts5Index::new(repo.clone()));
        Ok(Self {
            repo,
            blob,
            embedder,
            fts,
            hnsw: Arc::new(Mutex::new(HnswIndex::new())),
            entity_extractor: Arc::new(NullEntityExtractor),
            ocr: Arc::new(UnavailableOcrEngine),
            describer: None,
            reindex_generations: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn with_entity_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.entity_extractor = extractor;
        self
    }

    pub fn with_ocr_engine(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_image_describer(mut self, describer: Arc<dyn ImageDescriber>) -> Self {
        self.describer = Some(describer);
        self
    }

    fn run_processor(&self, tenant: &TenantId, file_type: FileType, path: &Path) -> Result<ProcessedFile, ProcessorError> {
        match file_type {
            FileType::Pdf => file_processors::process_pdf(path, self.ocr.as_ref(), tenant.as_str()),
            FileType::Image => {
                file_processors::process_image(path, self.ocr.as_ref(), self.describer.as_deref(), tenant.as_str())
            }
            FileType::Csv => file_processors::process_csv(path),
            FileType::Text => file_processors::process_text(path),
            FileType::Snippet => unreachable!("snippets never reach a file processor"),
        }
    }

    /// Ingestion Coordinator (spec §4.K), file-upload path. Steps 1-2 (blob
    /// persist, processor dispatch) must both succeed or the blob is rolled
    /// back; everything after is best-effort and degrades with a warning
    /// log rather than failing the whole ingest.
    pub fn ingest_file(
        &self,
        tenant: &TenantId,
        caller: &CallerId,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        description: Option<String>,
        tags: BTreeSet<String>,
    ) -> Result<ResourceId, CoreError> {
        if bytes.len() as u64 > file_processors::MAX_FILE_SIZE_BYTES {
            return Err(CoreError::TooLarge { size: bytes.len() as u64, limit: file_processors::MAX_FILE_SIZE_BYTES });
        }
        let file_type = FileType::from_mime(mime_type);
        let ext = extension_for(file_name, mime_type);

        let file_id = self.blob.put(tenant, &bytes, &ext)?;
        let path = self.blob.blob_path(tenant, &file_id, &ext);
        let processed = match self.run_processor(tenant, file_type, &path) {
            Ok(p) => p,
            Err(err) => {
                self.blob.delete(tenant, &file_id, &ext);
                return Err(CoreError::Processor(err));
            }
        };

        let ocr_text = (file_type == FileType::Image).then(|| processed.raw_text.clone());
        self.finish_ingest(
            tenant,
            caller,
            file_type,
            file_name.to_string(),
            mime_type.to_string(),
            bytes.len() as u64,
            Some(file_id),
            description,
            tags,
            processed,
            ocr_text,
            file_type == FileType::Csv,
        )
    }

    /// Ingestion Coordinator (spec §4.K), user-authored snippet path. There
    /// is no blob or file processor dispatch; everything else is identical.
    pub fn ingest_snippet(
        &self,
        tenant: &TenantId,
        caller: &CallerId,
        title: &str,
        body: &str,
        description: Option<String>,
        tags: BTreeSet<String>,
    ) -> Result<ResourceId, CoreError> {
        let processed = file_processors::process_snippet(title, body);
        let size_bytes = processed.raw_text.len() as u64;
        self.finish_ingest(
            tenant,
            caller,
            FileType::Snippet,
            title.to_string(),
            "text/plain".to_string(),
            size_bytes,
            None,
            description,
            tags,
            processed,
            None,
            false,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_ingest(
        &self,
        tenant: &TenantId,
        caller: &CallerId,
        file_type: FileType,
        file_name: String,
        mime_type: String,
        size_bytes: u64,
        file_id: Option<doc_model::FileId>,
        description: Option<String>,
        tags: BTreeSet<String>,
        processed: ProcessedFile,
        ocr_text: Option<String>,
        is_csv: bool,
    ) -> Result<ResourceId, CoreError> {
        let resource_id = generate_resource_id(tenant, &file_name);
        let now = Utc::now();

        let text_normalized = doc_model::normalize::normalize(&processed.raw_text);
        let vendor_category = self
            .list_categories(tenant)
            .ok()
            .and_then(|cats| cats.into_iter().find(|c| c.category_type == CategoryType::Vendor));
        let extracted = metadata_extractors::extract_all(
            tenant.as_str(),
            &processed.raw_text,
            &text_normalized,
            self.entity_extractor.as_ref(),
            vendor_category.as_ref(),
        );

        let mut keywords = extracted.keywords;
        keywords.extend(extracted.ids.iter().cloned());
        keywords.extend(extracted.emails.iter().cloned());
        keywords.extend(extracted.ibans.iter().cloned());

        let mut resource = Resource {
            resource_id: resource_id.clone(),
            tenant_id: tenant.clone(),
            file_id,
            file_name,
            mime_type,
            file_type,
            size_bytes,
            created_at: now,
            updated_at: now,
            summary: description.unwrap_or_default(),
            technical_metadata: processed.technical_metadata.clone(),
            tags,
            vendor: extracted.vendor,
            entities: extracted.entities,
            keywords,
            amounts_cents: extracted.money.iter().map(|m| m.cents).collect(),
            currency: extracted.money.first().and_then(|m| m.currency).map(str::to_string),
            dates: extracted.dates.into_iter().collect(),
            content: processed.raw_text,
            document_embedding: None,
        };
        resource.validate_soft().map_err(|e| CoreError::Validation(e.to_string()))?;

        match self.embedder.embed(&resource.content) {
            Ok(vector) => resource.document_embedding = Some(vector),
            Err(err) => {
                tracing::warn!(resource_id = %resource_id, error = %err, "document embedding degraded to none")
            }
        }

        let mut chunks = file_processors::build_chunks(
            &resource,
            &processed.per_unit_texts,
            ocr_text.as_deref(),
            is_csv,
            &file_processors::default_chunk_params(),
        );

        let texts: Vec<&str> = chunks.iter().map(|c| c.searchable_text.as_str()).collect();
        match self.embedder.embed_batch(&texts) {
            Ok(vectors) if vectors.len() == chunks.len() => {
                for (chunk, vector) in chunks.iter_mut().zip(vectors) {
                    chunk.chunk_embedding = Some(vector);
                }
            }
            Ok(_) => {
                tracing::warn!(resource_id = %resource_id, "chunk embedding batch size mismatch, leaving vectors empty")
            }
            Err(err) => {
                tracing::warn!(resource_id = %resource_id, error = %err, "chunk embedding batch degraded to none")
            }
        }

        let text_indexes: [&dyn TextIndexMaintainer; 1] = [self.fts.as_ref()];
        {
            let mut hnsw = self.hnsw.lock().expect("hnsw mutex poisoned");
            let mut vector_indexes: [&mut dyn VectorIndexMaintainer; 1] = [&mut *hnsw];
            if let Err(err) =
                orchestrator::ingest_resource_orchestrated(&self.repo, &resource, &chunks, &text_indexes, &mut vector_indexes)
            {
                tracing::warn!(resource_id = %resource_id, error = %err, "resource store write degraded");
            }
        }

        let suggestions = SuggestionIndex::new(&self.repo);
        if let Err(err) = suggestions.index_resource(tenant, &resource) {
            tracing::warn!(resource_id = %resource_id, error = %err, "suggestion indexing degraded");
        }

        tracing::info!(
            tenant_id = tenant.as_str(),
            caller_id = caller.as_str(),
            resource_id = %resource_id,
            action = ?AuditAction::Ingest,
            "resource ingested",
        );

        Ok(resource_id)
    }

    /// Deletes a resource, its chunks, and their entries in every pluggable
    /// index. Suggestion terms are left in place (spec §4.H best-effort).
    pub fn delete_resource(&self, tenant: &TenantId, caller: &CallerId, resource_id: &ResourceId) -> Result<(), CoreError> {
        let text_indexes: [&dyn TextIndexMaintainer; 1] = [self.fts.as_ref()];
        {
            let mut hnsw = self.hnsw.lock().expect("hnsw mutex poisoned");
            let mut vector_indexes: [&mut dyn VectorIndexMaintainer; 1] = [&mut *hnsw];
            orchestrator::delete_resource_orchestrated(&self.repo, tenant, resource_id, &text_indexes, &mut vector_indexes)?;
        }
        SuggestionIndex::new(&self.repo).remove_resource(tenant, resource_id)?;
        tracing::info!(
            tenant_id = tenant.as_str(),
            caller_id = caller.as_str(),
            resource_id = %resource_id,
            action = ?AuditAction::Delete,
            "resource deleted",
        );
        Ok(())
    }

    pub fn get_resource(&self, tenant: &TenantId, resource_id: &ResourceId) -> Result<Resource, CoreError> {
        self.repo
            .get_resource(tenant, resource_id)?
            .ok_or_else(|| CoreError::NotFound(format!("resource {resource_id}")))
    }

    pub fn list_resources(&self, tenant: &TenantId, offset: u32, limit: u32) -> Result<Vec<Resource>, CoreError> {
        Ok(self.repo.list_resources(tenant, offset, limit)?)
    }

    /// Reindex Coordinator (spec §4.L). Returns immediately; the actual work
    /// runs on a background thread so it never blocks the caller's mutation.
    /// `changed_fields` should name entries from
    /// [`Resource::searchable_field_names`].
    pub fn request_reindex(&self, tenant: &TenantId, resource_id: &ResourceId, changed_fields: &[&str]) {
        let generation = {
            let mut gens = self.reindex_generations.lock().expect("reindex generation mutex poisoned");
            let next = gens.get(resource_id).copied().unwrap_or(0) + 1;
            gens.insert(resource_id.clone(), next);
            next
        };

        let repo = self.repo.clone();
        let fts = self.fts.clone();
        let hnsw = self.hnsw.clone();
        let embedder = self.embedder.clone();
        let generations = self.reindex_generations.clone();
        let tenant = tenant.clone();
        let resource_id = resource_id.clone();
        let changed: Vec<String> = changed_fields.iter().map(|s| s.to_string()).collect();

        std::thread::spawn(move || {
            reindex_resource(&repo, &fts, &hnsw, embedder.as_ref(), &tenant, &resource_id, &changed, generation, &generations);
        });
    }

    /// Category Admin (spec §4.M). Seeds the three default categories on
    /// first access for a tenant that has none yet.
    pub fn list_categories(&self, tenant: &TenantId) -> Result<Vec<Category>, CoreError> {
        let mut cats = self.repo.get_categories(tenant)?;
        if cats.is_empty() {
            let defaults = document_store::default_categories_for(tenant);
            for category in &defaults {
                self.repo.upsert_category(category)?;
            }
            cats = defaults;
        }
        Ok(cats)
    }

    pub fn get_category(&self, tenant: &TenantId, category_type: &CategoryType) -> Result<Category, CoreError> {
        self.list_categories(tenant)?
            .into_iter()
            .find(|c| &c.category_type == category_type)
            .ok_or_else(|| CoreError::NotFound(format!("category {category_type}")))
    }

    pub fn upsert_category(&self, category: &Category) -> Result<(), CoreError> {
        Ok(self.repo.upsert_category(category)?)
    }

    pub fn add_entity(&self, tenant: &TenantId, category_type: &CategoryType, entity: &str) -> Result<(), CoreError> {
        let mut category = self.get_category(tenant, category_type)?;
        category.entities.insert(entity.to_string());
        self.upsert_category(&category)
    }

    pub fn remove_entity(&self, tenant: &TenantId, category_type: &CategoryType, entity: &str) -> Result<(), CoreError> {
        let mut category = self.get_category(tenant, category_type)?;
        category.entities.remove(entity);
        self.upsert_category(&category)
    }

    pub fn set_ignored_words(&self, tenant: &TenantId, category_type: &CategoryType, words: BTreeSet<String>) -> Result<(), CoreError> {
        let mut category = self.get_category(tenant, category_type)?;
        category.ignored_words = words;
        self.upsert_category(&category)
    }

    pub fn set_trigger_keywords(
        &self,
        tenant: &TenantId,
        category_type: &CategoryType,
        keywords: BTreeSet<String>,
    ) -> Result<(), CoreError> {
        let mut category = self.get_category(tenant, category_type)?;
        category.trigger_keywords = keywords;
        self.upsert_category(&category)
    }

    /// Runs the Query Analyzer then the Hybrid Searcher against `raw_query`
    /// (spec §4.I/§4.J combined as a single facade call).
    pub fn search(&self, tenant: &TenantId, raw_query: &str, limit: usize) -> Result<Vec<doc_model::SearchResult>, CoreError> {
        let categories = self.list_categories(tenant)?;
        let analyzed = query_analyzer::analyze(raw_query, &categories);
        let hnsw = self.hnsw.lock().expect("hnsw mutex poisoned");
        let searcher = HybridSearcher::new(&self.repo, Some(&*hnsw as &dyn VectorSearcher), Some(self.embedder.as_ref()));
        let results = searcher.search(tenant, &analyzed, limit)?;
        tracing::info!(
            tenant_id = tenant.as_str(),
            query = raw_query,
            hits = results.len(),
            action = ?AuditAction::Search,
            "search executed",
        );
        Ok(results)
    }

    /// Suggestion Index prefix lookup (spec §4.H).
    pub fn suggest(&self, tenant: &TenantId, prefix: &str, limit: usize) -> Vec<SuggestionEntry> {
        let normalized_prefix = doc_model::normalize::normalize(prefix);
        SuggestionIndex::new(&self.repo).query_prefix(tenant, &normalized_prefix, limit)
    }
}

/// Reindex Coordinator decision tree (spec §4.L): which downstream artifacts
/// need recomputing depends on which [`Resource::searchable_field_names`]
/// changed. Runs off the calling thread; a generation check right before
/// each write lets a newer `request_reindex` call for the same resource
/// supersede this one without the two racing to persist stale data.
#[allow(clippy::too_many_arguments)]
fn reindex_resource(
    repo: &SqliteRepo,
    fts: &Fts5Index,
    hnsw: &Mutex<HnswIndex>,
    embedder: &dyn Embedder,
    tenant: &TenantId,
    resource_id: &ResourceId,
    changed_fields: &[String],
    generation: u64,
    generations: &Mutex<HashMap<ResourceId, u64>>,
) {
    if changed_fields.is_empty() || changed_fields.iter().all(|f| f == "technical_metadata") {
        return;
    }

    let is_current = || {
        generations
            .lock()
            .map(|g| g.get(resource_id).copied() == Some(generation))
            .unwrap_or(false)
    };
    if !is_current() {
        tracing::info!(resource_id = %resource_id, "reindex superseded before starting");
        return;
    }

    let Ok(Some(resource)) = repo.get_resource(tenant, resource_id) else {
        tracing::warn!(resource_id = %resource_id, "reindex skipped: resource no longer exists");
        return;
    };

    let touches = |field: &str| changed_fields.iter().any(|c| c == field);
    let needs_embeddings = touches("content") || touches("summary");
    let needs_searchable_text = needs_embeddings || touches("tags") || touches("file_name") || touches("vendor");
    let needs_suggestions = touches("file_name") || touches("vendor") || touches("tags");

    if needs_searchable_text {
        let Ok(mut chunks) = repo.get_chunks_for_resource(tenant, resource_id) else {
            tracing::warn!(resource_id = %resource_id, "reindex skipped: could not load chunks");
            return;
        };
        for chunk in &mut chunks {
            chunk.searchable_text =
                file_processors::compose_searchable_text(&resource, &chunk.text, chunk.ocr_text.as_deref());
        }

        if needs_embeddings {
            let texts: Vec<&str> = chunks.iter().map(|c| c.searchable_text.as_str()).collect();
            match embedder.embed_batch(&texts) {
                Ok(vectors) if vectors.len() == chunks.len() => {
                    for (chunk, vector) in chunks.iter_mut().zip(vectors) {
                        chunk.chunk_embedding = Some(vector);
                    }
                }
                _ => tracing::warn!(resource_id = %resource_id, "reindex embedding batch degraded"),
            }
        }

        if !is_current() {
            tracing::info!(resource_id = %resource_id, "reindex superseded, discarding stale write");
            return;
        }

        if let Err(err) = repo.put_chunks_bulk(&chunks) {
            tracing::warn!(resource_id = %resource_id, error = %err, "reindex chunk persist failed");
            return;
        }
        if let Err(err) = fts.upsert(&chunks) {
            tracing::warn!(resource_id = %resource_id, error = %err, "reindex text index upsert failed");
        }
        let vectors: Vec<_> = chunks
            .iter()
            .filter_map(|c| c.chunk_embedding.clone().map(|v| (c.chunk_id.clone(), c.parent_resource_id.clone(), v)))
            .collect();
        if !vectors.is_empty() {
            if let Ok(mut hnsw) = hnsw.lock() {
                if let Err(err) = hnsw.upsert_vectors(tenant, &vectors) {
                    tracing::warn!(resource_id = %resource_id, error = %err, "reindex vector index upsert failed");
                }
            }
        }
    }

    if needs_suggestions {
        if let Err(err) = SuggestionIndex::new(repo).index_resource(tenant, &resource) {
            tracing::warn!(resource_id = %resource_id, error = %err, "reindex suggestion update failed");
        }
    }
}

fn extension_for(file_name: &str, mime_type: &str) -> String {
    if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
        return ext.to_string();
    }
    match mime_type {
        "application/pdf" => "pdf".to_string(),
        "text/csv" => "csv".to_string(),
        m if m.starts_with("image/") => m.trim_start_matches("image/").to_string(),
        _ => "bin".to_string(),
    }
}

/// Generates a resource id from a hash of the tenant/name plus the current
/// timestamp, the way the teacher's CLI derives document ids from content.
fn generate_resource_id(tenant: &TenantId, seed_text: &str) -> ResourceId {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    tenant.as_str().hash(&mut hasher);
    seed_text.hash(&mut hasher);
    let digest = hasher.finish();
    let ts = Utc::now().timestamp_millis();
    ResourceId::from(format!("res-{ts:x}-{digest:08x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> CoreConfig {
        CoreConfig {
            db_path: dir.join("core.db"),
            blob_root: dir.join("blobs"),
            embedder: EmbedderConfig::default(),
        }
    }

    #[test]
    fn ingest_snippet_then_search_finds_it() {
        let dir = tempfile::tempdir().unwrap();
        let core = SearchCore::new(test_config(dir.path())).unwrap();
        let tenant = TenantId::from("acme-tenant");
        let caller = CallerId::from("tester");

        let resource_id = core
            .ingest_snippet(&tenant, &caller, "meeting notes", "discussed the google invoice renewal", None, BTreeSet::new())
            .unwrap();

        let fetched = core.get_resource(&tenant, &resource_id).unwrap();
        assert_eq!(fetched.file_type, FileType::Snippet);

        let results = core.search(&tenant, "google invoice", 10).unwrap();
        assert!(results.iter().any(|r| r.resource_id == resource_id));
    }

    #[test]
    fn search_by_invoice_id_finds_the_ingested_document() {
        let dir = tempfile::tempdir().unwrap();
        let core = SearchCore::new(test_config(dir.path())).unwrap();
        let tenant = TenantId::from("acme-tenant");
        let caller = CallerId::from("tester");

        let resource_id = core
            .ingest_snippet(&tenant, &caller, "vendor invoice", "invoice INV-2024-8841 due next week", None, BTreeSet::new())
            .unwrap();

        let results = core.search(&tenant, "INV-2024-8841", 10).unwrap();
        let hit = results.iter().find(|r| r.resource_id == resource_id).expect("invoice id should match");
        assert_eq!(hit.match_type, doc_model::MatchType::ExactId);
        assert_eq!(hit.score, 1.0);
    }

    #[test]
    fn list_categories_lazily_seeds_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let core = SearchCore::new(test_config(dir.path())).unwrap();
        let tenant = TenantId::from("acme-tenant");
        let cats = core.list_categories(&tenant).unwrap();
        assert_eq!(cats.len(), 3);
        assert!(core.get_category(&tenant, &CategoryType::Vendor).is_ok());
    }

    #[test]
    fn add_entity_persists_on_the_category() {
        let dir = tempfile::tempdir().unwrap();
        let core = SearchCore::new(test_config(dir.path())).unwrap();
        let tenant = TenantId::from("acme-tenant");
        core.add_entity(&tenant, &CategoryType::People, "Jane Doe").unwrap();
        let cat = core.get_category(&tenant, &CategoryType::People).unwrap();
        assert!(cat.entities.contains("Jane Doe"));
    }

    #[test]
    fn delete_resource_removes_it_from_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let core = SearchCore::new(test_config(dir.path())).unwrap();
        let tenant = TenantId::from("acme-tenant");
        let caller = CallerId::from("tester");
        let resource_id = core.ingest_snippet(&tenant, &caller, "note", "body text", None, BTreeSet::new()).unwrap();
        core.delete_resource(&tenant, &caller, &resource_id).unwrap();
        assert!(core.get_resource(&tenant, &resource_id).is_err());
    }

    #[test]
    fn suggest_finds_filename_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let core = SearchCore::new(test_config(dir.path())).unwrap();
        let tenant = TenantId::from("acme-tenant");
        let caller = CallerId::from("tester");
        core.ingest_snippet(&tenant, &caller, "quarterly report", "contents", None, BTreeSet::new()).unwrap();
        let hits = core.suggest(&tenant, "quar", 10);
        assert!(hits.iter().any(|h| h.term.starts_with("quar")));
    }
}
