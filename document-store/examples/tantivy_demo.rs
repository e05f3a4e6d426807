#![cfg(feature = "tantivy-impl")]
//! Standalone demo of the Tantivy-backed `TextSearcher`, independent of the
//! SQLite primary store.

use doc_model::{Chunk, ChunkId, ResourceId, TenantId};
use document_store::tantivy_index::TantivyIndex;
use document_store::{ChunkStoreRead, SearchOptions, StoreError, TextSearcher};

struct NullStore;

impl ChunkStoreRead for NullStore {
    fn get_chunks_by_ids(&self, _ids: &[ChunkId]) -> Result<Vec<Chunk>, StoreError> {
        Ok(Vec::new())
    }
}

fn make_chunk(id: &str, text: &str) -> Chunk {
    Chunk {
        chunk_id: ChunkId::from(id),
        parent_resource_id: ResourceId::from("doc-001"),
        tenant_id: TenantId::from("demo-tenant"),
        chunk_index: 0,
        char_start: 0,
        char_end: text.len() as u32,
        text: text.to_string(),
        text_normalized: doc_model::normalize::normalize(text),
        ocr_text: None,
        ocr_text_normalized: None,
        image_description: None,
        searchable_text: doc_model::normalize::normalize(text),
        page_number: None,
        row_index: None,
        chunk_embedding: None,
    }
}

fn main() {
    let idx = TantivyIndex::new_ram().expect("init tantivy index");
    let chunks = vec![
        make_chunk("c1", "hello world"),
        make_chunk("c2", "greetings earth"),
        make_chunk("c3", "hello rust"),
    ];
    idx.upsert_chunks(&chunks).expect("upsert chunks");

    let opts = SearchOptions { top_k: 5, fetch_factor: 5 };
    let store = NullStore;
    let tenant = TenantId::from("demo-tenant");
    let hits = idx.search_ids(&store, &tenant, "hello", &[], &opts);

    println!("hits: {}", hits.len());
    for hit in hits {
        println!("id={} score={:.4} raw={:.4}", hit.chunk_id, hit.score, hit.raw_score);
    }
}
