//! Hybrid Searcher (spec §4.J): fans out a [`query_analyzer::AnalyzedQuery`]
//! across exact, category and semantic strategies, merges the results per
//! resource, and ranks the survivors.

use std::collections::{HashMap, HashSet};

use doc_model::chunk::ChunkTextField;
use doc_model::{
    build_highlight, Chunk, ChunkId, MatchType, MoneyAmount, Resource, ResourceId, SearchResult, TenantId,
};
use document_store::sqlite_repo::SqliteRepo;
use document_store::{SearchOptions, StoreError, VectorSearcher};
use embedding_provider::embedder::Embedder;
use query_analyzer::AnalyzedQuery;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

const NOISE_FLOOR: f32 = 0.50;
const TIE_BREAK_MARGIN: f32 = 0.05;
const PARTIAL_WORDS_MIN_OVERLAP: f32 = 0.5;

/// One raw hit produced by a single strategy, before dedup/ranking.
#[derive(Debug, Clone)]
struct StrategyHit {
    resource_id: ResourceId,
    chunk_id: Option<ChunkId>,
    match_type: MatchType,
    score: f32,
    matched_value: String,
}

fn is_content_level(match_type: MatchType) -> bool {
    !matches!(
        match_type,
        MatchType::VendorMatch | MatchType::PeopleMatch | MatchType::PriceMatch
    )
}

fn is_semantic(match_type: MatchType) -> bool {
    matches!(match_type, MatchType::SemanticDoc | MatchType::SemanticChunk)
}

fn is_keyword(match_type: MatchType) -> bool {
    matches!(match_type, MatchType::ExactPhrase | MatchType::PartialWords | MatchType::ExactKeyword)
}

/// Builds the `hybrid` strategy hit for a resource group (spec §4.J scoring
/// table: "0.6 × semantic + 0.4 × keyword, when both non-zero"). Only
/// considered when the group has at least one semantic hit and one keyword
/// hit; takes the strongest of each.
fn hybrid_candidate(group: &[StrategyHit]) -> Option<StrategyHit> {
    let semantic = group.iter().filter(|h| is_semantic(h.match_type)).max_by(|a, b| a.score.total_cmp(&b.score))?;
    let keyword = group.iter().filter(|h| is_keyword(h.match_type)).max_by(|a, b| a.score.total_cmp(&b.score))?;
    let score = 0.6 * semantic.score + 0.4 * keyword.score;
    Some(StrategyHit {
        resource_id: keyword.resource_id.clone(),
        chunk_id: keyword.chunk_id.clone().or_else(|| semantic.chunk_id.clone()),
        match_type: MatchType::Hybrid,
        score,
        matched_value: keyword.matched_value.clone(),
    })
}

/// Wires the Document Store's primary repo and vector search backend, plus
/// the Embedding Client, together into the fan-out described by spec §4.J.
/// Exact-phrase and partial-word strategies scan chunk text directly (they
/// need the per-field base scores from [`doc_model::chunk::ChunkTextField`],
/// which the generic `TextSearcher` plugin interface doesn't expose) rather
/// than going through a pluggable text index. Holds borrowed references
/// only; callers own the store, index and embedder.
pub struct HybridSearcher<'a> {
    repo: &'a SqliteRepo,
    vector_searcher: Option<&'a dyn VectorSearcher>,
    embedder: Option<&'a dyn Embedder>,
}

impl<'a> HybridSearcher<'a> {
    pub fn new(
        repo: &'a SqliteRepo,
        vector_searcher: Option<&'a dyn VectorSearcher>,
        embedder: Option<&'a dyn Embedder>,
    ) -> Self {
        Self { repo, vector_searcher, embedder }
    }

    /// Runs the full strategy fan-out for `analyzed` and returns the ranked,
    /// deduplicated hits (spec §4.J).
    pub fn search(&self, tenant: &TenantId, analyzed: &AnalyzedQuery, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let intent = &analyzed.intent;
        let has_strong_signal = intent.has_strong_signal();
        let clean_tokens = doc_model::normalize::tokenize(&intent.clean_text);

        // Strategy selector (spec §4.J "Strategy selector"): exact/category
        // strategies always run (they're cheap resource-field scans); the
        // semantic strategies only run when the query looks substantial
        // enough to benefit (strong signal, or more than two clean tokens).
        let run_content = !intent.clean_text.is_empty();
        let run_semantic = has_strong_signal || clean_tokens.len() > 2;

        let resources = self.repo.scan_resources(tenant)?;
        let chunks = if run_content { self.repo.scan_chunks(tenant)? } else { Vec::new() };

        // Three independent strategy groups fan out concurrently and are
        // joined before ranking (spec §5 "fans out strategies concurrently").
        let content_group = || -> Vec<StrategyHit> {
            let mut out = exact_phrase_strategy(&chunks, &intent.clean_text);
            if clean_tokens.len() > 1 {
                out.extend(partial_words_strategy(&chunks, &clean_tokens));
            }
            out
        };
        let exact_category_group = || -> Vec<StrategyHit> {
            let mut out = exact_identifier_strategy(&resources, intent);
            out.extend(money_strategy(&resources, &intent.money));
            out.extend(category_strategy(&resources, analyzed));
            out
        };
        let semantic_group = || -> Vec<StrategyHit> {
            if !run_semantic {
                return Vec::new();
            }
            let Some(embedder) = self.embedder else { return Vec::new() };
            match embedder.embed(&intent.clean_text) {
                Ok(qvec) => {
                    let mut out = semantic_document_strategy(&resources, &qvec);
                    if let Some(vs) = self.vector_searcher {
                        out.extend(semantic_chunk_strategy(vs, tenant, &qvec));
                    }
                    out
                }
                Err(err) => {
                    tracing::warn!(error = %err, "semantic strategies skipped: embedding failed");
                    Vec::new()
                }
            }
        };

        let (content_hits, (exact_category_hits, semantic_hits)) =
            rayon::join(content_group, || rayon::join(exact_category_group, semantic_group));

        let mut hits = content_hits;
        hits.extend(exact_category_hits);
        hits.extend(semantic_hits);

        let apply_noise_floor = clean_tokens.len() > 1 && !has_strong_signal;
        self.finish(tenant, hits, apply_noise_floor, limit)
    }

    fn finish(
        &self,
        tenant: &TenantId,
        hits: Vec<StrategyHit>,
        apply_noise_floor: bool,
        limit: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        // Group by resource, applying the tie-break and max-score rules.
        let mut groups: HashMap<ResourceId, Vec<StrategyHit>> = HashMap::new();
        for hit in hits {
            groups.entry(hit.resource_id.clone()).or_default().push(hit);
        }

        let mut winners: Vec<(ResourceId, StrategyHit, Vec<ChunkId>, u32)> = Vec::with_capacity(groups.len());
        for (resource_id, group) in groups {
            let mut best: Option<&StrategyHit> = None;
            for hit in &group {
                best = Some(match best {
                    None => hit,
                    Some(current) => pick_winner(current, hit),
                });
            }
            let mut best = best.expect("group is non-empty").clone();
            if let Some(hybrid) = hybrid_candidate(&group) {
                if hybrid.score > best.score {
                    best = hybrid;
                }
            }
            let matching_chunks: Vec<ChunkId> = dedup_chunk_ids(group.iter().filter_map(|h| h.chunk_id.clone()));
            let occurrences = group.len() as u32;
            winners.push((resource_id, best, matching_chunks, occurrences));
        }

        if apply_noise_floor {
            winners.retain(|(_, best, _, _)| best.score >= NOISE_FLOOR);
        }

        winners.sort_by(|a, b| b.1.score.partial_cmp(&a.1.score).unwrap_or(std::cmp::Ordering::Equal));
        winners.truncate(limit);

        let mut results = Vec::with_capacity(winners.len());
        for (resource_id, best, matching_chunks, occurrences) in winners {
            let Some(resource) = self.repo.get_resource(tenant, &resource_id)? else { continue };
            let (page_number, row_index, highlights) = self.best_chunk_detail(tenant, &best, &resource);
            results.push(SearchResult {
                resource_id: resource.resource_id,
                file_name: resource.file_name,
                file_id: resource.file_id,
                mime_type: resource.mime_type,
                summary: resource.summary,
                vendor: resource.vendor,
                score: best.score,
                match_type: best.match_type,
                matched_value: best.matched_value,
                occurrences,
                matching_chunks,
                page_number,
                row_index,
                highlights,
            });
        }
        Ok(results)
    }

    fn best_chunk_detail(
        &self,
        tenant: &TenantId,
        best: &StrategyHit,
        resource: &Resource,
    ) -> (Option<u32>, Option<u32>, Vec<doc_model::Highlight>) {
        let Some(chunk_id) = &best.chunk_id else { return (None, None, Vec::new()) };
        let Ok(chunks) = self.repo.get_chunks_for_resource(tenant, &resource.resource_id) else {
            return (None, None, Vec::new());
        };
        let Some(chunk) = chunks.into_iter().find(|c| &c.chunk_id == chunk_id) else {
            return (None, None, Vec::new());
        };
        let highlights = match best.match_type {
            MatchType::ExactPhrase | MatchType::PartialWords | MatchType::Hybrid => {
                build_chunk_highlight(&chunk, &best.matched_value).into_iter().collect()
            }
            _ => Vec::new(),
        };
        (chunk.page_number, chunk.row_index, highlights)
    }
}

fn dedup_chunk_ids(iter: impl Iterator<Item = ChunkId>) -> Vec<ChunkId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in iter {
        if seen.insert(id.clone()) {
            out.push(id);
        }
    }
    out
}

/// Tie-break rule (spec §4.J step 3): when two hits for the same resource are
/// within 5 points of each other, prefer the content-level one.
fn pick_winner<'h>(current: &'h StrategyHit, candidate: &'h StrategyHit) -> &'h StrategyHit {
    let diff = (current.score - candidate.score).abs();
    if diff <= TIE_BREAK_MARGIN {
        let current_content = is_content_level(current.match_type);
        let candidate_content = is_content_level(candidate.match_type);
        if candidate_content && !current_content {
            return candidate;
        }
        if current_content && !candidate_content {
            return current;
        }
    }
    if candidate.score > current.score {
        candidate
    } else {
        current
    }
}

fn build_chunk_highlight(chunk: &Chunk, matched_value: &str) -> Option<doc_model::Highlight> {
    let needle = doc_model::normalize::normalize(matched_value);
    if needle.is_empty() {
        return None;
    }
    let start = chunk.searchable_text.find(&needle)?;
    let end = start + needle.len();
    Some(build_highlight("searchable_text", &chunk.searchable_text, start, end))
}

fn exact_phrase_strategy(chunks: &[Chunk], clean_text: &str) -> Vec<StrategyHit> {
    let needle = doc_model::normalize::normalize(clean_text);
    if needle.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for chunk in chunks {
        for field in ChunkTextField::ALL {
            if let Some(text) = chunk.text_field(field) {
                if text.contains(&needle) {
                    out.push(StrategyHit {
                        resource_id: chunk.parent_resource_id.clone(),
                        chunk_id: Some(chunk.chunk_id.clone()),
                        match_type: MatchType::ExactPhrase,
                        score: field.exact_phrase_score(),
                        matched_value: clean_text.to_string(),
                    });
                    break;
                }
            }
        }
    }
    out
}

fn partial_words_strategy(chunks: &[Chunk], clean_tokens: &[String]) -> Vec<StrategyHit> {
    if clean_tokens.is_empty() {
        return Vec::new();
    }
    let total = clean_tokens.len() as f32;
    let mut out = Vec::new();
    for chunk in chunks {
        for field in [ChunkTextField::SearchableText, ChunkTextField::OcrTextNormalized, ChunkTextField::TextNormalized] {
            let Some(base_score) = field.partial_words_base_score() else { continue };
            let Some(text) = chunk.text_field(field) else { continue };
            let field_tokens: HashSet<&str> = text.split_whitespace().collect();
            let matched = clean_tokens.iter().filter(|t| field_tokens.contains(t.as_str())).count() as f32;
            let overlap_ratio = matched / total;
            if overlap_ratio >= PARTIAL_WORDS_MIN_OVERLAP {
                out.push(StrategyHit {
                    resource_id: chunk.parent_resource_id.clone(),
                    chunk_id: Some(chunk.chunk_id.clone()),
                    match_type: MatchType::PartialWords,
                    score: base_score * overlap_ratio,
                    matched_value: clean_tokens.join(" "),
                });
            }
        }
    }
    out
}

fn exact_identifier_strategy(resources: &[Resource], intent: &doc_model::QueryIntent) -> Vec<StrategyHit> {
    let mut needles: Vec<&str> = Vec::new();
    needles.extend(intent.ids.iter().map(|s| s.as_str()));
    needles.extend(intent.emails.iter().map(|s| s.as_str()));
    needles.extend(intent.ibans.iter().map(|s| s.as_str()));
    if needles.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for resource in resources {
        for needle in &needles {
            if resource.keywords.contains(*needle) {
                out.push(StrategyHit {
                    resource_id: resource.resource_id.clone(),
                    chunk_id: None,
                    match_type: MatchType::ExactId,
                    score: 1.0,
                    matched_value: needle.to_string(),
                });
            }
        }
    }
    out
}

fn money_strategy(resources: &[Resource], money: &[MoneyAmount]) -> Vec<StrategyHit> {
    if money.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for resource in resources {
        for amount in money {
            if !resource.amounts_cents.contains(&amount.cents) {
                continue;
            }
            if let (Some(query_currency), Some(resource_currency)) = (amount.currency, resource.currency.as_deref()) {
                if !query_currency.eq_ignore_ascii_case(resource_currency) {
                    continue;
                }
            }
            out.push(StrategyHit {
                resource_id: resource.resource_id.clone(),
                chunk_id: None,
                match_type: MatchType::ExactAmount,
                score: 1.0,
                matched_value: format!("{}", amount.cents),
            });
        }
    }
    out
}

fn category_strategy(resources: &[Resource], analyzed: &AnalyzedQuery) -> Vec<StrategyHit> {
    let mut out = Vec::new();
    for activation in &analyzed.activations {
        match &activation.category_type {
            doc_model::CategoryType::Vendor => {
                for resource in resources {
                    if let Some(vendor) = &resource.vendor {
                        let normalized = doc_model::normalize::normalize(vendor);
                        if activation.matched_entities.iter().any(|e| doc_model::normalize::normalize(e) == normalized) {
                            out.push(StrategyHit {
                                resource_id: resource.resource_id.clone(),
                                chunk_id: None,
                                match_type: MatchType::VendorMatch,
                                score: 0.88,
                                matched_value: vendor.clone(),
                            });
                        }
                    }
                }
            }
            doc_model::CategoryType::People => {
                for resource in resources {
                    let matched = resource.entities.iter().find(|e| {
                        let normalized = doc_model::normalize::normalize(e);
                        activation.matched_entities.iter().any(|m| doc_model::normalize::normalize(m) == normalized)
                    });
                    if let Some(entity) = matched {
                        out.push(StrategyHit {
                            resource_id: resource.resource_id.clone(),
                            chunk_id: None,
                            match_type: MatchType::PeopleMatch,
                            score: 0.85,
                            matched_value: entity.clone(),
                        });
                    }
                }
            }
            doc_model::CategoryType::Price => {
                for resource in resources {
                    if !resource.amounts_cents.is_empty() {
                        out.push(StrategyHit {
                            resource_id: resource.resource_id.clone(),
                            chunk_id: None,
                            match_type: MatchType::PriceMatch,
                            score: 0.90,
                            matched_value: "price".to_string(),
                        });
                    }
                }
            }
            doc_model::CategoryType::Custom(_) => {
                // Custom categories use the same entity-set match as `people`
                // until a richer configured-match-field mechanism exists.
                for resource in resources {
                    let matched = resource.entities.iter().find(|e| {
                        let normalized = doc_model::normalize::normalize(e);
                        activation.matched_entities.iter().any(|m| doc_model::normalize::normalize(m) == normalized)
                    });
                    if let Some(entity) = matched {
                        out.push(StrategyHit {
                            resource_id: resource.resource_id.clone(),
                            chunk_id: None,
                            match_type: MatchType::PeopleMatch,
                            score: 0.80,
                            matched_value: entity.clone(),
                        });
                    }
                }
            }
        }
    }
    out
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn semantic_document_strategy(resources: &[Resource], query_vector: &[f32]) -> Vec<StrategyHit> {
    let mut out = Vec::new();
    for resource in resources {
        let Some(doc_vec) = &resource.document_embedding else { continue };
        let score = cosine_similarity(query_vector, doc_vec);
        if score > 0.0 {
            out.push(StrategyHit {
                resource_id: resource.resource_id.clone(),
                chunk_id: None,
                match_type: MatchType::SemanticDoc,
                score,
                matched_value: "semantic".to_string(),
            });
        }
    }
    out
}

fn semantic_chunk_strategy(vector_searcher: &dyn VectorSearcher, tenant: &TenantId, query_vector: &[f32]) -> Vec<StrategyHit> {
    let opts = SearchOptions::default();
    vector_searcher
        .search(tenant, query_vector, opts.top_k)
        .into_iter()
        .map(|m| StrategyHit {
            resource_id: m.resource_id,
            chunk_id: m.chunk_id,
            match_type: MatchType::SemanticChunk,
            score: m.score,
            matched_value: "semantic".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doc_model::{seed_default_categories, Category, FileType, TenantId};

    fn sample_resource(tenant: &TenantId, id: &str, vendor: Option<&str>) -> Resource {
        Resource {
            resource_id: ResourceId::from(id),
            tenant_id: tenant.clone(),
            file_id: None,
            file_name: format!("{id}.txt"),
            mime_type: "text/plain".to_string(),
            file_type: FileType::Text,
            size_bytes: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            summary: "a note".to_string(),
            technical_metadata: serde_json::json!({}),
            tags: Default::default(),
            vendor: vendor.map(|v| v.to_string()),
            entities: Default::default(),
            keywords: Default::default(),
            amounts_cents: Default::default(),
            currency: None,
            dates: Default::default(),
            content: "quarterly invoice details".to_string(),
            document_embedding: None,
        }
    }

    fn sample_chunk(resource: &Resource, text: &str) -> Chunk {
        let normalized = doc_model::normalize::normalize(text);
        Chunk {
            chunk_id: ChunkId::from(format!("{}#0", resource.resource_id.as_str())),
            parent_resource_id: resource.resource_id.clone(),
            tenant_id: resource.tenant_id.clone(),
            chunk_index: 0,
            char_start: 0,
            char_end: text.len() as u32,
            text: text.to_string(),
            text_normalized: normalized.clone(),
            ocr_text: None,
            ocr_text_normalized: None,
            image_description: None,
            searchable_text: normalized,
            page_number: None,
            row_index: None,
            chunk_embedding: None,
        }
    }

    #[test]
    fn exact_phrase_wins_over_partial_words_within_tie_margin() {
        let a = StrategyHit {
            resource_id: ResourceId::from("r1"),
            chunk_id: None,
            match_type: MatchType::VendorMatch,
            score: 0.88,
            matched_value: "google".into(),
        };
        let b = StrategyHit {
            resource_id: ResourceId::from("r1"),
            chunk_id: None,
            match_type: MatchType::ExactPhrase,
            score: 0.86,
            matched_value: "invoice".into(),
        };
        let winner = pick_winner(&a, &b);
        assert_eq!(winner.match_type, MatchType::ExactPhrase);
    }

    #[test]
    fn vendor_category_search_finds_resource_with_matching_vendor() {
        let tenant = TenantId::from("acme-tenant");
        let repo = SqliteRepo::open_in_memory().unwrap();
        let resource = sample_resource(&tenant, "r1", Some("google"));
        repo.put_resource(&resource).unwrap();
        let chunk = sample_chunk(&resource, "quarterly financial summary");
        repo.put_chunks_bulk(&[chunk]).unwrap();

        let categories: Vec<Category> = seed_default_categories(&tenant);
        let analyzed = query_analyzer::analyze("google invoice", &categories);

        let searcher = HybridSearcher::new(&repo, None, None);
        let results = searcher.search(&tenant, &analyzed, 10).unwrap();
        assert!(results.iter().any(|r| r.resource_id.as_str() == "r1" && r.match_type == MatchType::VendorMatch));
    }

    #[test]
    fn exact_phrase_in_content_outranks_vendor_category() {
        let tenant = TenantId::from("acme-tenant");
        let repo = SqliteRepo::open_in_memory().unwrap();
        let resource = sample_resource(&tenant, "r1", Some("google"));
        repo.put_resource(&resource).unwrap();
        let chunk = sample_chunk(&resource, "google invoice total due for this order");
        repo.put_chunks_bulk(&[chunk]).unwrap();

        let categories: Vec<Category> = seed_default_categories(&tenant);
        let analyzed = query_analyzer::analyze("google invoice total", &categories);

        let searcher = HybridSearcher::new(&repo, None, None);
        let results = searcher.search(&tenant, &analyzed, 10).unwrap();
        let hit = results.iter().find(|r| r.resource_id.as_str() == "r1").expect("resource present");
        assert_eq!(hit.match_type, MatchType::ExactPhrase);
    }

    #[test]
    fn non_contiguous_category_phrase_falls_back_to_vendor_match() {
        let tenant = TenantId::from("acme-tenant");
        let repo = SqliteRepo::open_in_memory().unwrap();
        let resource = sample_resource(&tenant, "r1", Some("google"));
        repo.put_resource(&resource).unwrap();
        let chunk = sample_chunk(&resource, "google cloud invoice pdf");
        repo.put_chunks_bulk(&[chunk]).unwrap();

        let categories: Vec<Category> = seed_default_categories(&tenant);
        let analyzed = query_analyzer::analyze("google invoice", &categories);

        let searcher = HybridSearcher::new(&repo, None, None);
        let results = searcher.search(&tenant, &analyzed, 10).unwrap();
        let hit = results.iter().find(|r| r.resource_id.as_str() == "r1").expect("resource present");
        assert_eq!(hit.match_type, MatchType::VendorMatch);
        assert!((hit.score - 0.88).abs() < 1e-6);
    }
}
