//! Deletes a resource (and its chunks) from a SQLite-backed document store.
//!
//! Usage: delete_demo [db_path] --resource-id ID

use std::env;

use document_store::orchestrator::delete_resource_orchestrated;
use document_store::sqlite_repo::SqliteRepo;
use doc_model::{ResourceId, TenantId};

fn print_usage() {
    eprintln!("Usage: delete_demo [db_path] --resource-id ID");
}

fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let db_path = if args.first().map(|s| !s.starts_with('-')).unwrap_or(false) {
        args.remove(0)
    } else {
        "target/demo/documents.db".to_string()
    };

    let resource_id = match args.iter().position(|a| a == "--resource-id") {
        Some(i) if i + 1 < args.len() => args[i + 1].clone(),
        _ => {
            print_usage();
            return;
        }
    };

    let repo = SqliteRepo::open_file(&db_path).expect("open sqlite repo");
    let tenant = TenantId::from("demo-tenant");
    let text_indexes: [&dyn document_store::TextIndexMaintainer; 0] = [];
    let mut vector_indexes: [&mut dyn document_store::VectorIndexMaintainer; 0] = [];

    let report = delete_resource_orchestrated(
        &repo,
        &tenant,
        &ResourceId::from(resource_id.as_str()),
        &text_indexes,
        &mut vector_indexes,
    )
    .expect("orchestrated delete");

    println!(
        "Delete completed: chunks_deleted={}, text_delete_attempts={}, vector_delete_attempts={}",
        report.chunks_deleted, report.text_delete_attempts, report.vector_delete_attempts
    );
}
