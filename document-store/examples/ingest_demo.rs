//! Ingests a couple of sample resources into a SQLite-backed document store
//! and optionally runs a keyword search against them.
//!
//! Usage: ingest_demo [db_path] [--search QUERY]

use std::env;
use std::sync::Arc;

use chrono::Utc;
use doc_model::{Chunk, ChunkId, FileType, Resource, ResourceId, TenantId};
use document_store::fts5_index::Fts5Index;
use document_store::orchestrator::ingest_resource_orchestrated;
use document_store::sqlite_repo::SqliteRepo;
use document_store::TextSearcher;

fn sample_resource(tenant: &TenantId) -> (Resource, Vec<Chunk>) {
    let resource = Resource {
        resource_id: ResourceId::from("demo-1"),
        tenant_id: tenant.clone(),
        file_id: None,
        file_name: "welcome.txt".to_string(),
        mime_type: "text/plain".to_string(),
        file_type: FileType::Text,
        size_bytes: 42,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        summary: "a short welcome note".to_string(),
        technical_metadata: serde_json::json!({"reader": "text"}),
        tags: Default::default(),
        vendor: None,
        entities: Default::default(),
        keywords: Default::default(),
        amounts_cents: Default::default(),
        currency: None,
        dates: Default::default(),
        content: "hello world, this is a sample English chunk".to_string(),
        document_embedding: None,
    };
    let chunk = Chunk {
        chunk_id: ChunkId::from("demo-1#0"),
        parent_resource_id: resource.resource_id.clone(),
        tenant_id: tenant.clone(),
        chunk_index: 0,
        char_start: 0,
        char_end: resource.content.len() as u32,
        text: resource.content.clone(),
        text_normalized: doc_model::normalize::normalize(&resource.content),
        ocr_text: None,
        ocr_text_normalized: None,
        image_description: None,
        searchable_text: doc_model::normalize::normalize(&format!("{} {}", resource.file_name, resource.content)),
        page_number: None,
        row_index: None,
        chunk_embedding: None,
    };
    (resource, vec![chunk])
}

fn main() {
    let mut args = env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| "target/demo/documents.db".to_string());
    let search_query = args.find(|a| a == "--search").and(env::args().last());

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let repo = Arc::new(SqliteRepo::open_file(&db_path).expect("open sqlite repo"));
    let tenant = TenantId::from("demo-tenant");
    let (resource, chunks) = sample_resource(&tenant);

    let fts = Fts5Index::new(repo.clone());
    let text_indexes: [&dyn document_store::TextIndexMaintainer; 1] = [&fts];
    let mut vector_indexes: [&mut dyn document_store::VectorIndexMaintainer; 0] = [];

    ingest_resource_orchestrated(&repo, &resource, &chunks, &text_indexes, &mut vector_indexes)
        .expect("ingest resource");
    println!("Ingested resource '{}' with {} chunk(s)", resource.resource_id, chunks.len());

    if let Some(query) = search_query {
        let opts = document_store::SearchOptions::default();
        let hits = fts.search_ids(&*repo, &tenant, &doc_model::normalize::normalize(&query), &[], &opts);
        println!("Search '{}' -> {} hit(s)", query, hits.len());
        for hit in hits {
            println!("- {} score={:.4}", hit.chunk_id, hit.score);
        }
    }
}
