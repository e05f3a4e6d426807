use std::collections::BTreeSet;

use doc_model::{CallerId, TenantId};
use search_core::{CoreConfig, EmbedderConfig, SearchCore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run -p search-core --example ingest_and_search -- <FILE> <QUERY>");
        std::process::exit(1);
    }
    let path = &args[1];
    let query = &args[2];

    let dir = std::env::temp_dir().join("search-core-example");
    let cfg = CoreConfig {
        db_path: dir.join("core.db"),
        blob_root: dir.join("blobs"),
        embedder: EmbedderConfig::default(),
    };
    let core = SearchCore::new(cfg)?;
    let tenant = TenantId::from("example-tenant");
    let caller = CallerId::from("example-cli");

    let bytes = std::fs::read(path)?;
    let file_name = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let mime_type = mime_guess_from_extension(path);
    let resource_id = core.ingest_file(&tenant, &caller, &file_name, mime_type, bytes, None, BTreeSet::new())?;
    println!("ingested {resource_id}");

    let hits = core.search(&tenant, query, 10)?;
    println!("Results: {}", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.matched_value.chars().take(80).collect();
        println!("{:>2}. [{}] {:.4} {}", i + 1, hit.resource_id, hit.score, preview);
    }
    Ok(())
}

fn mime_guess_from_extension(path: &str) -> &'static str {
    match std::path::Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "text/plain",
    }
}
