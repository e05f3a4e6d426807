use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use doc_model::{CallerId, TenantId};
use search_core::{CoreConfig, EmbedderConfig, SearchCore};

fn print_usage() {
    eprintln!(
        "Usage:\n\
         search-cli ingest-text [db_path] --text TEXT [--title TITLE] [--tenant T]\n\
         search-cli ingest-file [db_path] --path FILE [--mime TYPE] [--tenant T]\n\
         search-cli search [db_path] --query Q [--k N] [--tenant T]\n\
         search-cli suggest [db_path] --prefix P [--k N] [--tenant T]\n\
         search-cli categories [db_path] [--tenant T]\n\
         \n\
         Notes: db_path defaults to target/demo/core.db; blobs are stored alongside it.\n\
         --tenant defaults to \"default-tenant\".\n"
    );
}

fn derive_blob_root(db_path: &Path) -> PathBuf {
    let mut s = db_path.as_os_str().to_string_lossy().to_string();
    s.push_str(".blobs");
    PathBuf::from(s)
}

fn open_core(db_path: PathBuf) -> Result<SearchCore, String> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let blob_root = derive_blob_root(&db_path);
    let cfg = CoreConfig { db_path, blob_root, embedder: EmbedderConfig::default() };
    SearchCore::new(cfg).map_err(|e| e.to_string())
}

/// Splits an optional leading positional `db_path` off a flag-only tail, the
/// way the teacher's CLI lets `db_path` default without a dedicated flag.
fn split_db_path(mut tail: Vec<String>) -> (PathBuf, Vec<String>) {
    if !tail.is_empty() && !tail[0].starts_with('-') {
        (PathBuf::from(tail.remove(0)), tail)
    } else {
        (PathBuf::from("target/demo/core.db"), tail)
    }
}

fn take_flag(args: &[String], name: &str) -> Option<String> {
    args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
}

fn tenant_from_args(args: &[String]) -> TenantId {
    TenantId::from(take_flag(args, "--tenant").unwrap_or_else(|| "default-tenant".to_string()).as_str())
}

fn do_ingest_text(tail: Vec<String>) -> Result<(), String> {
    let (db_path, rest) = split_db_path(tail);
    let text = take_flag(&rest, "--text").ok_or("--text requires a value")?;
    let title = take_flag(&rest, "--title").unwrap_or_else(|| "untitled note".to_string());
    let tenant = tenant_from_args(&rest);

    let core = open_core(db_path)?;
    let caller = CallerId::from("search-cli");
    let resource_id = core
        .ingest_snippet(&tenant, &caller, &title, &text, None, BTreeSet::new())
        .map_err(|e| e.to_string())?;
    println!("Ingested resource: {resource_id}");
    Ok(())
}

fn do_ingest_file(tail: Vec<String>) -> Result<(), String> {
    let (db_path, rest) = split_db_path(tail);
    let path = take_flag(&rest, "--path").ok_or("--path requires a value")?;
    let mime_type = take_flag(&rest, "--mime").unwrap_or_else(|| guess_mime(&path));
    let tenant = tenant_from_args(&rest);

    let bytes = std::fs::read(&path).map_err(|e| format!("reading {path}: {e}"))?;
    let file_name = Path::new(&path).file_name().and_then(|n| n.to_str()).unwrap_or("upload").to_string();

    let core = open_core(db_path)?;
    let caller = CallerId::from("search-cli");
    let resource_id = core
        .ingest_file(&tenant, &caller, &file_name, &mime_type, bytes, None, BTreeSet::new())
        .map_err(|e| e.to_string())?;
    println!("Ingested resource: {resource_id}");
    Ok(())
}

fn do_search(tail: Vec<String>) -> Result<(), String> {
    let (db_path, rest) = split_db_path(tail);
    let query = take_flag(&rest, "--query").ok_or("--query requires a value")?;
    let k: usize = take_flag(&rest, "--k").and_then(|s| s.parse().ok()).unwrap_or(10);
    let tenant = tenant_from_args(&rest);

    let core = open_core(db_path)?;
    let hits = core.search(&tenant, &query, k).map_err(|e| e.to_string())?;
    println!("Results: {}", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let preview = truncate_chars(&hit.matched_value, 60);
        println!("{:>2}. [{}] score={:.4} {}", i + 1, hit.resource_id, hit.score, preview);
    }
    Ok(())
}

fn do_suggest(tail: Vec<String>) -> Result<(), String> {
    let (db_path, rest) = split_db_path(tail);
    let prefix = take_flag(&rest, "--prefix").ok_or("--prefix requires a value")?;
    let k: usize = take_flag(&rest, "--k").and_then(|s| s.parse().ok()).unwrap_or(10);
    let tenant = tenant_from_args(&rest);

    let core = open_core(db_path)?;
    let hits = core.suggest(&tenant, &prefix, k);
    println!("Suggestions: {}", hits.len());
    for hit in &hits {
        println!("  {} ({:?}, freq={})", hit.display_term, hit.category, hit.frequency);
    }
    Ok(())
}

fn do_categories(tail: Vec<String>) -> Result<(), String> {
    let (db_path, rest) = split_db_path(tail);
    let tenant = tenant_from_args(&rest);

    let core = open_core(db_path)?;
    let categories = core.list_categories(&tenant).map_err(|e| e.to_string())?;
    for category in &categories {
        println!("{:?}: {} entities, {} trigger keywords", category.category_type, category.entities.len(), category.trigger_keywords.len());
    }
    Ok(())
}

fn guess_mime(path: &str) -> String {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "text/plain",
    }
    .to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let mut it = s.chars();
    let truncated: String = it.by_ref().take(max_chars).collect();
    if it.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return;
    }
    let cmd = args.remove(0);
    let res = match cmd.as_str() {
        "ingest-text" => do_ingest_text(args),
        "ingest-file" => do_ingest_file(args),
        "search" => do_search(args),
        "suggest" => do_suggest(args),
        "categories" => do_categories(args),
        _ => {
            print_usage();
            return;
        }
    };
    if let Err(err) = res {
        eprintln!("Error: {err}");
        print_usage();
        std::process::exit(1);
    }
}
