//! rusqlite-backed primary store for Resources, Chunks, and Categories
//! (spec §4.F). A single file or in-memory database per process; callers
//! are expected to scope every query by `tenant_id`.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use doc_model::{Category, CategoryType, Chunk, ChunkId, FileId, FileType, Resource, ResourceId, TenantId};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{ChunkStoreRead, StoreError};

pub struct SqliteRepo {
    conn: Mutex<Connection>,
}

impl SqliteRepo {
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn: Mutex::new(conn) };
        repo.migrate()?;
        Ok(repo)
    }

    pub fn open_file(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let repo = Self { conn: Mutex::new(conn) };
        repo.migrate()?;
        Ok(repo)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS resources (
                resource_id TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                file_id TEXT,
                file_name TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                file_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                summary TEXT NOT NULL,
                technical_metadata TEXT NOT NULL,
                tags TEXT NOT NULL,
                vendor TEXT,
                entities TEXT NOT NULL,
                keywords TEXT NOT NULL,
                amounts_cents TEXT NOT NULL,
                currency TEXT,
                dates TEXT NOT NULL,
                content TEXT NOT NULL,
                document_embedding TEXT,
                PRIMARY KEY (tenant_id, resource_id)
            );
            CREATE INDEX IF NOT EXISTS idx_resources_tenant ON resources(tenant_id);

            CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT NOT NULL,
                parent_resource_id TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                char_start INTEGER NOT NULL,
                char_end INTEGER NOT NULL,
                text TEXT NOT NULL,
                text_normalized TEXT NOT NULL,
                ocr_text TEXT,
                ocr_text_normalized TEXT,
                image_description TEXT,
                searchable_text TEXT NOT NULL,
                page_number INTEGER,
                row_index INTEGER,
                chunk_embedding TEXT,
                PRIMARY KEY (tenant_id, chunk_id)
            );
            CREATE INDEX IF NOT EXISTS idx_chunks_resource ON chunks(tenant_id, parent_resource_id);

            CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
                searchable_text, ocr_text_normalized, text_normalized, image_description,
                content='chunks', content_rowid='rowid'
            );
            CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
                INSERT INTO chunks_fts(rowid, searchable_text, ocr_text_normalized, text_normalized, image_description)
                VALUES (new.rowid, new.searchable_text, new.ocr_text_normalized, new.text_normalized, new.image_description);
            END;
            CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
                INSERT INTO chunks_fts(chunks_fts, rowid, searchable_text, ocr_text_normalized, text_normalized, image_description)
                VALUES ('delete', old.rowid, old.searchable_text, old.ocr_text_normalized, old.text_normalized, old.image_description);
            END;
            CREATE TRIGGER IF NOT EXISTS chunks_au AFTER UPDATE ON chunks BEGIN
                INSERT INTO chunks_fts(chunks_fts, rowid, searchable_text, ocr_text_normalized, text_normalized, image_description)
                VALUES ('delete', old.rowid, old.searchable_text, old.ocr_text_normalized, old.text_normalized, old.image_description);
                INSERT INTO chunks_fts(rowid, searchable_text, ocr_text_normalized, text_normalized, image_description)
                VALUES (new.rowid, new.searchable_text, new.ocr_text_normalized, new.text_normalized, new.image_description);
            END;

            CREATE TABLE IF NOT EXISTS categories (
                tenant_id TEXT NOT NULL,
                category_key TEXT NOT NULL,
                entities TEXT NOT NULL,
                ignored_words TEXT NOT NULL,
                trigger_keywords TEXT NOT NULL,
                max_non_category_words INTEGER NOT NULL,
                match_score REAL NOT NULL,
                enabled INTEGER NOT NULL,
                PRIMARY KEY (tenant_id, category_key)
            );

            CREATE TABLE IF NOT EXISTS suggestions (
                tenant_id TEXT NOT NULL,
                category TEXT NOT NULL,
                term TEXT NOT NULL,
                display_term TEXT NOT NULL,
                frequency INTEGER NOT NULL,
                PRIMARY KEY (tenant_id, category, term)
            );
            CREATE INDEX IF NOT EXISTS idx_suggestions_prefix ON suggestions(tenant_id, category, term);
            "#,
        )?;
        Ok(())
    }

    pub fn put_resource(&self, r: &Resource) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            r#"INSERT INTO resources (
                resource_id, tenant_id, file_id, file_name, mime_type, file_type,
                size_bytes, created_at, updated_at, summary, technical_metadata,
                tags, vendor, entities, keywords, amounts_cents, currency, dates,
                content, document_embedding
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20)
            ON CONFLICT(tenant_id, resource_id) DO UPDATE SET
                file_id = excluded.file_id,
                file_name = excluded.file_name,
                mime_type = excluded.mime_type,
                file_type = excluded.file_type,
                size_bytes = excluded.size_bytes,
                updated_at = excluded.updated_at,
                summary = excluded.summary,
                technical_metadata = excluded.technical_metadata,
                tags = excluded.tags,
                vendor = excluded.vendor,
                entities = excluded.entities,
                keywords = excluded.keywords,
                amounts_cents = excluded.amounts_cents,
                currency = excluded.currency,
                dates = excluded.dates,
                content = excluded.content,
                document_embedding = excluded.document_embedding
            "#,
            params![
                r.resource_id.as_str(),
                r.tenant_id.as_str(),
                r.file_id.as_ref().map(|f| f.as_str()),
                r.file_name,
                r.mime_type,
                file_type_key(r.file_type),
                r.size_bytes as i64,
                r.created_at.to_rfc3339(),
                r.updated_at.to_rfc3339(),
                r.summary,
                r.technical_metadata.to_string(),
                serde_json::to_string(&r.tags)?,
                r.vendor,
                serde_json::to_string(&r.entities)?,
                serde_json::to_string(&r.keywords)?,
                serde_json::to_string(&r.amounts_cents)?,
                r.currency,
                serde_json::to_string(&r.dates)?,
                r.content,
                r.document_embedding.as_ref().map(serde_json::to_string).transpose()?,
            ],
        )?;
        Ok(())
    }

    pub fn get_resource(&self, tenant: &TenantId, resource_id: &ResourceId) -> Result<Option<Resource>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let row = conn
            .query_row(
                "SELECT resource_id, tenant_id, file_id, file_name, mime_type, file_type, size_bytes,
                        created_at, updated_at, summary, technical_metadata, tags, vendor, entities,
                        keywords, amounts_cents, currency, dates, content, document_embedding
                 FROM resources WHERE tenant_id = ?1 AND resource_id = ?2",
                params![tenant.as_str(), resource_id.as_str()],
                row_to_resource,
            )
            .optional()?;
        Ok(row)
    }

    pub fn list_resources(&self, tenant: &TenantId, offset: u32, limit: u32) -> Result<Vec<Resource>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT resource_id, tenant_id, file_id, file_name, mime_type, file_type, size_bytes,
                    created_at, updated_at, summary, technical_metadata, tags, vendor, entities,
                    keywords, amounts_cents, currency, dates, content, document_embedding
             FROM resources WHERE tenant_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
            .query_map(params![tenant.as_str(), limit as i64, offset as i64], row_to_resource)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_resource(&self, tenant: &TenantId, resource_id: &ResourceId) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "DELETE FROM chunks WHERE tenant_id = ?1 AND parent_resource_id = ?2",
            params![tenant.as_str(), resource_id.as_str()],
        )?;
        conn.execute(
            "DELETE FROM resources WHERE tenant_id = ?1 AND resource_id = ?2",
            params![tenant.as_str(), resource_id.as_str()],
        )?;
        Ok(())
    }

    pub fn put_chunks_bulk(&self, chunks: &[Chunk]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        for c in chunks {
            tx.execute(
                r#"INSERT INTO chunks (
                    chunk_id, parent_resource_id, tenant_id, chunk_index, char_start, char_end,
                    text, text_normalized, ocr_text, ocr_text_normalized, image_description,
                    searchable_text, page_number, row_index, chunk_embedding
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)
                ON CONFLICT(tenant_id, chunk_id) DO UPDATE SET
                    chunk_index = excluded.chunk_index,
                    char_start = excluded.char_start,
                    char_end = excluded.char_end,
                    text = excluded.text,
                    text_normalized = excluded.text_normalized,
                    ocr_text = excluded.ocr_text,
                    ocr_text_normalized = excluded.ocr_text_normalized,
                    image_description = excluded.image_description,
                    searchable_text = excluded.searchable_text,
                    page_number = excluded.page_number,
                    row_index = excluded.row_index,
                    chunk_embedding = excluded.chunk_embedding
                "#,
                params![
                    c.chunk_id.as_str(),
                    c.parent_resource_id.as_str(),
                    c.tenant_id.as_str(),
                    c.chunk_index,
                    c.char_start,
                    c.char_end,
                    c.text,
                    c.text_normalized,
                    c.ocr_text,
                    c.ocr_text_normalized,
                    c.image_description,
                    c.searchable_text,
                    c.page_number,
                    c.row_index,
                    c.chunk_embedding.as_ref().map(serde_json::to_string).transpose()?,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_chunks_for_resource(&self, tenant: &TenantId, resource_id: &ResourceId) -> Result<Vec<ChunkId>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare("SELECT chunk_id FROM chunks WHERE tenant_id = ?1 AND parent_resource_id = ?2")?;
        let ids: Vec<ChunkId> = stmt
            .query_map(params![tenant.as_str(), resource_id.as_str()], |row| {
                Ok(ChunkId::from(row.get::<_, String>(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        conn.execute(
            "DELETE FROM chunks WHERE tenant_id = ?1 AND parent_resource_id = ?2",
            params![tenant.as_str(), resource_id.as_str()],
        )?;
        Ok(ids)
    }

    pub fn update_chunk_searchable_text(&self, tenant: &TenantId, chunk_id: &ChunkId, searchable_text: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "UPDATE chunks SET searchable_text = ?1 WHERE tenant_id = ?2 AND chunk_id = ?3",
            params![searchable_text, tenant.as_str(), chunk_id.as_str()],
        )?;
        Ok(())
    }

    pub fn get_chunks_for_resource(&self, tenant: &TenantId, resource_id: &ResourceId) -> Result<Vec<Chunk>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT chunk_id, parent_resource_id, tenant_id, chunk_index, char_start, char_end,
                    text, text_normalized, ocr_text, ocr_text_normalized, image_description,
                    searchable_text, page_number, row_index, chunk_embedding
             FROM chunks WHERE tenant_id = ?1 AND parent_resource_id = ?2 ORDER BY chunk_index ASC",
        )?;
        let rows = stmt
            .query_map(params![tenant.as_str(), resource_id.as_str()], row_to_chunk)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All resources for a tenant, used by the Hybrid Searcher's exact-id,
    /// money-amount and category strategies which must scan resource-level
    /// fields rather than chunk text (spec §4.J steps 2-4).
    pub fn scan_resources(&self, tenant: &TenantId) -> Result<Vec<Resource>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT resource_id, tenant_id, file_id, file_name, mime_type, file_type, size_bytes,
                    created_at, updated_at, summary, technical_metadata, tags, vendor, entities,
                    keywords, amounts_cents, currency, dates, content, document_embedding
             FROM resources WHERE tenant_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![tenant.as_str()], row_to_resource)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All chunks for a tenant, used by the Hybrid Searcher's exact-phrase
    /// and partial-word strategies which scan chunk text fields directly
    /// rather than going through an index (spec §4.J steps 1 and 5).
    pub fn scan_chunks(&self, tenant: &TenantId) -> Result<Vec<Chunk>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT chunk_id, parent_resource_id, tenant_id, chunk_index, char_start, char_end,
                    text, text_normalized, ocr_text, ocr_text_normalized, image_description,
                    searchable_text, page_number, row_index, chunk_embedding
             FROM chunks WHERE tenant_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![tenant.as_str()], row_to_chunk)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Increments one term's frequency in the Suggestion Index (spec §4.H
    /// "index_resource... increment the appropriate set's member score").
    pub fn bump_suggestion_term(&self, tenant: &TenantId, category_key: &str, term: &str, display_term: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            r#"INSERT INTO suggestions (tenant_id, category, term, display_term, frequency)
               VALUES (?1, ?2, ?3, ?4, 1)
               ON CONFLICT(tenant_id, category, term) DO UPDATE SET
                   frequency = frequency + 1,
                   display_term = excluded.display_term
            "#,
            params![tenant.as_str(), category_key, term, display_term],
        )?;
        Ok(())
    }

    /// Lexicographic prefix scan over one Suggestion Index set (spec §4.H
    /// "retrieve members whose normalized form starts with prefix_normalized
    /// using the set's lexicographic ordering").
    pub fn query_suggestion_prefix(
        &self,
        tenant: &TenantId,
        category_key: &str,
        prefix_normalized: &str,
        limit: usize,
    ) -> Result<Vec<(String, String, u64)>, StoreError> {
        let upper = prefix_upper_bound(prefix_normalized);
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT term, display_term, frequency FROM suggestions
             WHERE tenant_id = ?1 AND category = ?2 AND term >= ?3 AND term < ?4
             ORDER BY term LIMIT ?5",
        )?;
        let rows = stmt
            .query_map(params![tenant.as_str(), category_key, prefix_normalized, upper, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_categories(&self, tenant: &TenantId) -> Result<Vec<Category>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT category_key, entities, ignored_words, trigger_keywords, max_non_category_words, match_score, enabled
             FROM categories WHERE tenant_id = ?1",
        )?;
        let tenant_owned = tenant.clone();
        let rows = stmt
            .query_map(params![tenant.as_str()], move |row| {
                let category_key: String = row.get(0)?;
                let entities: String = row.get(1)?;
                let ignored_words: String = row.get(2)?;
                let trigger_keywords: String = row.get(3)?;
                Ok(Category {
                    tenant_id: tenant_owned.clone(),
                    category_type: CategoryType::from_key(&category_key),
                    entities: serde_json::from_str(&entities).unwrap_or_default(),
                    ignored_words: serde_json::from_str(&ignored_words).unwrap_or_default(),
                    trigger_keywords: serde_json::from_str(&trigger_keywords).unwrap_or_default(),
                    max_non_category_words: row.get(4)?,
                    match_score: row.get(5)?,
                    enabled: row.get::<_, i64>(6)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn upsert_category(&self, category: &Category) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            r#"INSERT INTO categories (
                tenant_id, category_key, entities, ignored_words,
                trigger_keywords, max_non_category_words, match_score, enabled
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)
            ON CONFLICT(tenant_id, category_key) DO UPDATE SET
                entities = excluded.entities,
                ignored_words = excluded.ignored_words,
                trigger_keywords = excluded.trigger_keywords,
                max_non_category_words = excluded.max_non_category_words,
                match_score = excluded.match_score,
                enabled = excluded.enabled
            "#,
            params![
                category.tenant_id.as_str(),
                category.category_type.key(),
                serde_json::to_string(&category.entities)?,
                serde_json::to_string(&category.ignored_words)?,
                serde_json::to_string(&category.trigger_keywords)?,
                category.max_non_category_words,
                category.match_score,
                category.enabled as i64,
            ],
        )?;
        Ok(())
    }

    /// Keyword-overlap search over the FTS5 shadow index (spec §4.J
    /// "partial-word keyword overlap"). Returns `(chunk_id, transformed_score, matched_token_count)`.
    pub fn search_fts(&self, tenant: &TenantId, query_normalized: &str, fetch_n: usize) -> Result<Vec<(ChunkId, f32, u32)>, StoreError> {
        let tokens = doc_model::normalize::tokenize(query_normalized);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let match_expr = tokens
            .iter()
            .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR ");

        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT c.chunk_id, bm25(chunks_fts) as rank
             FROM chunks_fts
             JOIN chunks c ON c.rowid = chunks_fts.rowid
             WHERE chunks_fts MATCH ?1 AND c.tenant_id = ?2
             ORDER BY rank
             LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![match_expr, tenant.as_str(), fetch_n as i64], |row| {
                let chunk_id: String = row.get(0)?;
                let raw: f64 = row.get(1)?;
                Ok((ChunkId::from(chunk_id), raw as f32))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(id, raw)| {
                let score = 1.0f32 / (1.0f32 + raw.exp());
                let occurrences = tokens.len() as u32;
                (id, score, occurrences)
            })
            .collect())
    }
}

impl ChunkStoreRead for SqliteRepo {
    fn get_chunks_by_ids(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT chunk_id, parent_resource_id, tenant_id, chunk_index, char_start, char_end,
                    text, text_normalized, ocr_text, ocr_text_normalized, image_description,
                    searchable_text, page_number, row_index, chunk_embedding
             FROM chunks WHERE chunk_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let id_strs: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(id_strs), row_to_chunk)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn file_type_key(ft: FileType) -> &'static str {
    match ft {
        FileType::Pdf => "pdf",
        FileType::Image => "image",
        FileType::Csv => "csv",
        FileType::Text => "text",
        FileType::Snippet => "snippet",
    }
}

fn file_type_from_key(key: &str) -> FileType {
    match key {
        "pdf" => FileType::Pdf,
        "image" => FileType::Image,
        "csv" => FileType::Csv,
        "snippet" => FileType::Snippet,
        _ => FileType::Text,
    }
}

fn row_to_resource(row: &rusqlite::Row) -> rusqlite::Result<Resource> {
    let tags_json: String = row.get(11)?;
    let entities_json: String = row.get(13)?;
    let keywords_json: String = row.get(14)?;
    let amounts_json: String = row.get(15)?;
    let dates_json: String = row.get(17)?;
    let embedding_json: Option<String> = row.get(19)?;
    let tech_meta_json: String = row.get(10)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    let file_type_key_str: String = row.get(5)?;

    Ok(Resource {
        resource_id: ResourceId::from(row.get::<_, String>(0)?),
        tenant_id: TenantId::from(row.get::<_, String>(1)?),
        file_id: row.get::<_, Option<String>>(2)?.map(FileId::from),
        file_name: row.get(3)?,
        mime_type: row.get(4)?,
        file_type: file_type_from_key(&file_type_key_str),
        size_bytes: row.get::<_, i64>(6)? as u64,
        created_at: parse_rfc3339(&created_at),
        updated_at: parse_rfc3339(&updated_at),
        summary: row.get(9)?,
        technical_metadata: serde_json::from_str(&tech_meta_json).unwrap_or(serde_json::Value::Null),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        vendor: row.get(12)?,
        entities: serde_json::from_str(&entities_json).unwrap_or_default(),
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
        amounts_cents: serde_json::from_str(&amounts_json).unwrap_or_default(),
        currency: row.get(16)?,
        dates: serde_json::from_str::<BTreeSet<NaiveDate>>(&dates_json).unwrap_or_default(),
        content: row.get(18)?,
        document_embedding: embedding_json.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn row_to_chunk(row: &rusqlite::Row) -> rusqlite::Result<Chunk> {
    let embedding_json: Option<String> = row.get(14)?;
    Ok(Chunk {
        chunk_id: ChunkId::from(row.get::<_, String>(0)?),
        parent_resource_id: ResourceId::from(row.get::<_, String>(1)?),
        tenant_id: TenantId::from(row.get::<_, String>(2)?),
        chunk_index: row.get(3)?,
        char_start: row.get(4)?,
        char_end: row.get(5)?,
        text: row.get(6)?,
        text_normalized: row.get(7)?,
        ocr_text: row.get(8)?,
        ocr_text_normalized: row.get(9)?,
        image_description: row.get(10)?,
        searchable_text: row.get(11)?,
        page_number: row.get(12)?,
        row_index: row.get(13)?,
        chunk_embedding: embedding_json.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

/// Exclusive upper bound for a lexicographic prefix range scan: increments
/// the last character so `term >= prefix AND term < upper_bound` matches
/// exactly the strings starting with `prefix`.
fn prefix_upper_bound(prefix: &str) -> String {
    let mut chars: Vec<char> = prefix.chars().collect();
    if let Some(last) = chars.pop() {
        if let Some(next) = char::from_u32(last as u32 + 1) {
            chars.push(next);
            return chars.into_iter().collect();
        }
    }
    format!("{prefix}\u{10FFFF}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn sample_resource(tenant: &TenantId) -> Resource {
        Resource {
            resource_id: ResourceId::from("r1"),
            tenant_id: tenant.clone(),
            file_id: Some(FileId::from("2026/01/abc")),
            file_name: "invoice.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            file_type: FileType::Pdf,
            size_bytes: 1024,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            summary: "an invoice".to_string(),
            technical_metadata: serde_json::json!({"pages": 2}),
            tags: BTreeSet::from(["finance".to_string()]),
            vendor: Some("acme".to_string()),
            entities: BTreeSet::new(),
            keywords: BTreeSet::from(["invoice".to_string()]),
            amounts_cents: BTreeSet::from([1999]),
            currency: Some("USD".to_string()),
            dates: BTreeSet::new(),
            content: "invoice content".to_string(),
            document_embedding: Some(vec![0.1, 0.2, 0.3]),
        }
    }

    #[test]
    fn put_then_get_resource_roundtrips() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        let resource = sample_resource(&tenant);
        repo.put_resource(&resource).unwrap();
        let fetched = repo.get_resource(&tenant, &resource.resource_id).unwrap().unwrap();
        assert_eq!(fetched.file_name, "invoice.pdf");
        assert_eq!(fetched.amounts_cents, resource.amounts_cents);
        assert_eq!(fetched.document_embedding, resource.document_embedding);
    }

    #[test]
    fn delete_resource_cascades_to_chunks() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        let resource = sample_resource(&tenant);
        repo.put_resource(&resource).unwrap();
        let chunk = Chunk {
            chunk_id: ChunkId::from("r1#0"),
            parent_resource_id: resource.resource_id.clone(),
            tenant_id: tenant.clone(),
            chunk_index: 0,
            char_start: 0,
            char_end: 10,
            text: "hello".to_string(),
            text_normalized: "hello".to_string(),
            ocr_text: None,
            ocr_text_normalized: None,
            image_description: None,
            searchable_text: "invoice.pdf hello".to_string(),
            page_number: Some(1),
            row_index: None,
            chunk_embedding: None,
        };
        repo.put_chunks_bulk(&[chunk]).unwrap();
        repo.delete_resource(&tenant, &resource.resource_id).unwrap();
        assert!(repo.get_resource(&tenant, &resource.resource_id).unwrap().is_none());
        assert!(repo.get_chunks_for_resource(&tenant, &resource.resource_id).unwrap().is_empty());
    }

    #[test]
    fn search_fts_finds_matching_chunk() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        let resource = sample_resource(&tenant);
        repo.put_resource(&resource).unwrap();
        let chunk = Chunk {
            chunk_id: ChunkId::from("r1#0"),
            parent_resource_id: resource.resource_id.clone(),
            tenant_id: tenant.clone(),
            chunk_index: 0,
            char_start: 0,
            char_end: 30,
            text: "Invoice total due next month".to_string(),
            text_normalized: "invoice total due next month".to_string(),
            ocr_text: None,
            ocr_text_normalized: None,
            image_description: None,
            searchable_text: "invoice.pdf an invoice invoice total due next month".to_string(),
            page_number: Some(1),
            row_index: None,
            chunk_embedding: None,
        };
        repo.put_chunks_bulk(&[chunk]).unwrap();
        let hits = repo.search_fts(&tenant, "invoice total", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.as_str(), "r1#0");
    }

    #[test]
    fn suggestion_prefix_scan_finds_bumped_term() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        repo.bump_suggestion_term(&tenant, "vendors", "google", "Google").unwrap();
        repo.bump_suggestion_term(&tenant, "vendors", "google", "Google").unwrap();
        repo.bump_suggestion_term(&tenant, "vendors", "gondor", "Gondor").unwrap();
        repo.bump_suggestion_term(&tenant, "vendors", "amazon", "Amazon").unwrap();

        let hits = repo.query_suggestion_prefix(&tenant, "vendors", "go", 10).unwrap();
        assert_eq!(hits.len(), 2);
        let google = hits.iter().find(|(term, _, _)| term == "google").unwrap();
        assert_eq!(google.2, 2);
    }

    #[test]
    fn categories_roundtrip_including_custom() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        let mut custom = Category::new(tenant.clone(), CategoryType::Custom("project_codes".to_string()));
        custom.entities.insert("PROJ-1".to_string());
        repo.upsert_category(&custom).unwrap();
        let cats = repo.get_categories(&tenant).unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].category_type, CategoryType::Custom("project_codes".to_string()));
        assert!(cats[0].entities.contains("PROJ-1"));
    }
}
