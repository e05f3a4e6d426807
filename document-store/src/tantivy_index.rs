#![allow(dead_code)]

// Real Tantivy-backed searcher is provided behind the `tantivy-impl` feature.
// The default build compiles a stub to keep the crate lightweight and portable.

#[cfg(feature = "tantivy-impl")]
pub use real::TantivyIndex;

#[cfg(not(feature = "tantivy-impl"))]
pub struct TantivyIndex;

#[cfg(not(feature = "tantivy-impl"))]
impl TantivyIndex {
    pub fn new_ram() -> Result<Self, ()> {
        Ok(Self)
    }
    pub fn upsert_chunks(&self, _chunks: &[doc_model::Chunk]) -> Result<(), ()> {
        Ok(())
    }
}

#[cfg(not(feature = "tantivy-impl"))]
impl crate::TextIndexMaintainer for TantivyIndex {
    fn upsert(&self, chunks: &[doc_model::Chunk]) -> Result<(), crate::StoreError> {
        let _ = self.upsert_chunks(chunks);
        Ok(())
    }
    fn delete_by_ids(&self, _ids: &[doc_model::ChunkId]) -> Result<(), crate::StoreError> {
        Ok(())
    }
}

#[cfg(not(feature = "tantivy-impl"))]
impl crate::TextSearcher for TantivyIndex {
    fn name(&self) -> &'static str {
        "tantivy"
    }
    fn caps(&self) -> crate::IndexCaps {
        crate::IndexCaps {
            can_prefilter_resource_id_eq: true,
            can_prefilter_resource_id_in: true,
            can_prefilter_vendor: false,
            can_prefilter_range_date: true,
        }
    }
    fn search_ids(
        &self,
        _store: &dyn crate::ChunkStoreRead,
        _tenant: &doc_model::TenantId,
        _query: &str,
        _filters: &[crate::FilterClause],
        _opts: &crate::SearchOptions,
    ) -> Vec<crate::TextMatch> {
        Vec::new()
    }
}

#[cfg(feature = "tantivy-impl")]
mod real {
    use chrono::DateTime;
    use doc_model::{Chunk, ChunkId, TenantId};
    use tantivy::doc;
    use tantivy::collector::TopDocs;
    use tantivy::query::QueryParser;
    use tantivy::schema::{NumericOptions, Schema, STORED, STRING, TEXT};
    use tantivy::Index;

    use crate::{ChunkStoreRead, FilterClause, FilterOp, IndexCaps, SearchOptions, TextMatch, TextSearcher};

    pub struct TantivyIndex {
        schema: Schema,
        index: Index,
        reader: tantivy::IndexReader,
        f_searchable_text: tantivy::schema::Field,
        f_chunk_id: tantivy::schema::Field,
        f_tenant_id: tantivy::schema::Field,
        f_resource_id: tantivy::schema::Field,
        f_updated_at: tantivy::schema::Field,
        f_updated_at_ts: tantivy::schema::Field,
    }

    impl TantivyIndex {
        pub fn new_ram() -> tantivy::Result<Self> {
            let mut schema_builder = Schema::builder();
            let searchable_text = schema_builder.add_text_field("searchable_text", TEXT);
            let chunk_id = schema_builder.add_text_field("chunk_id", STRING | STORED);
            let tenant_id = schema_builder.add_text_field("tenant_id", STRING);
            let resource_id = schema_builder.add_text_field("resource_id", STRING);
            let updated_at = schema_builder.add_text_field("updated_at", STRING);
            let num_opts = NumericOptions::default().set_fast().set_indexed();
            let updated_at_ts = schema_builder.add_i64_field("updated_at_ts", num_opts);
            let schema = schema_builder.build();
            let index = Index::create_in_ram(schema.clone());
            let reader = index.reader()?;
            Ok(Self {
                schema,
                index,
                reader,
                f_searchable_text: searchable_text,
                f_chunk_id: chunk_id,
                f_tenant_id: tenant_id,
                f_resource_id: resource_id,
                f_updated_at: updated_at,
                f_updated_at_ts: updated_at_ts,
            })
        }

        pub fn upsert_chunks(&self, chunks: &[Chunk]) -> tantivy::Result<()> {
            let mut writer = self.index.writer(50_000_000)?;
            let now = chrono::Utc::now().to_rfc3339();
            for chunk in chunks {
                let mut d = doc! {
                    self.f_chunk_id => chunk.chunk_id.as_str(),
                    self.f_tenant_id => chunk.tenant_id.as_str(),
                    self.f_resource_id => chunk.parent_resource_id.as_str(),
                    self.f_updated_at => now.clone(),
                    self.f_searchable_text => chunk.searchable_text.clone(),
                };
                if let Some(ts) = parse_rfc3339_to_ts(&now) {
                    d.add_i64(self.f_updated_at_ts, ts);
                }
                let _ = writer.add_document(d);
            }
            writer.commit()?;
            self.reader.reload()?;
            Ok(())
        }
    }

    impl crate::TextIndexMaintainer for TantivyIndex {
        fn upsert(&self, chunks: &[Chunk]) -> Result<(), crate::StoreError> {
            let _ = self.upsert_chunks(chunks);
            Ok(())
        }

        fn delete_by_ids(&self, ids: &[ChunkId]) -> Result<(), crate::StoreError> {
            if ids.is_empty() {
                return Ok(());
            }
            if let Ok(mut writer) = self.index.writer(50_000_000) {
                for id in ids {
                    let term = tantivy::Term::from_field_text(self.f_chunk_id, id.as_str());
                    writer.delete_term(term);
                }
                let _ = writer.commit();
                let _ = self.reader.reload();
            }
            Ok(())
        }
    }

    impl TextSearcher for TantivyIndex {
        fn name(&self) -> &'static str {
            "tantivy"
        }

        fn caps(&self) -> IndexCaps {
            IndexCaps {
                can_prefilter_resource_id_eq: true,
                can_prefilter_resource_id_in: true,
                can_prefilter_vendor: false,
                can_prefilter_range_date: true,
            }
        }

        fn search_ids(
            &self,
            _store: &dyn ChunkStoreRead,
            tenant: &TenantId,
            query: &str,
            filters: &[FilterClause],
            opts: &SearchOptions,
        ) -> Vec<TextMatch> {
            if query.trim().is_empty() || opts.top_k == 0 {
                return Vec::new();
            }
            let mut q = query.trim().to_string();
            q.push_str(&format!(" tenant_id:\"{}\"", escape_q(tenant.as_str())));

            let mut resource_parts: Vec<String> = Vec::new();
            for fc in filters {
                if let FilterOp::ResourceIdEq(v) = &fc.op {
                    resource_parts.push(format!("resource_id:\"{}\"", escape_q(v.as_str())));
                }
            }
            for fc in filters {
                if let FilterOp::ResourceIdIn(vs) = &fc.op {
                    for v in vs {
                        resource_parts.push(format!("resource_id:\"{}\"", escape_q(v.as_str())));
                    }
                }
            }
            if !resource_parts.is_empty() {
                q.push(' ');
                if resource_parts.len() > 1 {
                    q.push('(');
                }
                q.push_str(&resource_parts.join(" OR "));
                if resource_parts.len() > 1 {
                    q.push(')');
                }
            }
            for fc in filters {
                if let FilterOp::RangeIsoDate { key, start, end, .. } = &fc.op {
                    if key == "updated_at" {
                        let lower = start.as_deref().and_then(parse_rfc3339_to_ts);
                        let upper = end.as_deref().and_then(parse_rfc3339_to_ts);
                        let mut part = String::from(" updated_at_ts:[");
                        part.push_str(&lower.map(|v| v.to_string()).unwrap_or_else(|| i64::MIN.to_string()));
                        part.push_str(" TO ");
                        part.push_str(&upper.map(|v| v.to_string()).unwrap_or_else(|| i64::MAX.to_string()));
                        part.push(']');
                        q.push_str(&part);
                    }
                }
            }

            let parser = QueryParser::for_index(
                &self.index,
                vec![self.f_searchable_text, self.f_tenant_id, self.f_resource_id, self.f_updated_at_ts],
            );
            let parsed = match parser.parse_query(&q) {
                Ok(parsed) => parsed,
                Err(_) => return Vec::new(),
            };
            let searcher = self.reader.searcher();
            let fetch_n = opts.top_k.saturating_mul(opts.fetch_factor).max(opts.top_k);
            let top_docs = match searcher.search(&parsed, &TopDocs::with_limit(fetch_n)) {
                Ok(hits) => hits,
                Err(_) => return Vec::new(),
            };
            let mut out = Vec::with_capacity(top_docs.len());
            for (raw_score, addr) in top_docs {
                if let Ok(d) = searcher.doc::<tantivy::schema::document::TantivyDocument>(addr) {
                    if let Some(v) = d.get_first(self.f_chunk_id) {
                        if let tantivy::schema::OwnedValue::Str(cid) = v {
                            let score = 1.0f32 / (1.0f32 + (-raw_score).exp());
                            out.push(TextMatch {
                                chunk_id: ChunkId::from(cid.to_string()),
                                score,
                                raw_score,
                                occurrences: 1,
                            });
                        }
                    }
                }
            }
            out
        }
    }

    fn escape_q(s: &str) -> String {
        s.replace('"', "\\\"")
    }

    fn parse_rfc3339_to_ts(s: &str) -> Option<i64> {
        if s.is_empty() {
            None
        } else {
            DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp())
        }
    }
}
