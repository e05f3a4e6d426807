//! Suggestion Index (spec §4.H): five per-tenant, lexicographically-ordered
//! term sets (`filenames`, `vendors`, `entities`, `keywords`, `all_terms`)
//! used to back autocomplete. Backed by the same sqlite connection as the
//! rest of the Document Store; a prefix query is a `term >= ? AND term < ?`
//! range scan per set, merged across sets in descending priority order.

use std::collections::HashMap;

use doc_model::{Resource, ResourceId, SuggestionCategory, SuggestionEntry, TenantId};

use crate::sqlite_repo::SqliteRepo;
use crate::StoreError;

pub struct SuggestionIndex<'a> {
    repo: &'a SqliteRepo,
}

impl<'a> SuggestionIndex<'a> {
    pub fn new(repo: &'a SqliteRepo) -> Self {
        Self { repo }
    }

    /// Indexes every term extracted from `resource` into its category's set
    /// (spec §4.H "index_resource").
    pub fn index_resource(&self, tenant: &TenantId, resource: &Resource) -> Result<(), StoreError> {
        self.bump(tenant, SuggestionCategory::Filenames, &resource.file_name)?;
        if let Some(vendor) = &resource.vendor {
            self.bump(tenant, SuggestionCategory::Vendors, vendor)?;
        }
        for entity in &resource.entities {
            self.bump(tenant, SuggestionCategory::Entities, entity)?;
        }
        for keyword in &resource.keywords {
            self.bump(tenant, SuggestionCategory::Keywords, keyword)?;
        }
        let normalized_content = doc_model::normalize::normalize(&resource.content);
        for token in doc_model::normalize::tokenize(&normalized_content) {
            self.bump_normalized(tenant, SuggestionCategory::AllTerms, &token, &token)?;
        }
        Ok(())
    }

    fn bump(&self, tenant: &TenantId, category: SuggestionCategory, display_term: &str) -> Result<(), StoreError> {
        let term = doc_model::normalize::normalize(display_term);
        self.bump_normalized(tenant, category, &term, display_term)
    }

    fn bump_normalized(&self, tenant: &TenantId, category: SuggestionCategory, term: &str, display_term: &str) -> Result<(), StoreError> {
        if term.is_empty() {
            return Ok(());
        }
        self.repo.bump_suggestion_term(tenant, category.key(), term, display_term)
    }

    /// Best-effort removal (spec §4.H). Term-to-resource membership isn't
    /// tracked, so residual terms may remain after the owning resource is
    /// gone; they stay suggestible but harmless, per spec.
    pub fn remove_resource(&self, _tenant: &TenantId, _resource_id: &ResourceId) -> Result<(), StoreError> {
        Ok(())
    }

    /// Prefix query across all five sets, merged and deduplicated by
    /// highest-priority category per term, ordered by `priority * frequency`
    /// (spec §4.H "query_prefix"). Never errors: a set that fails to query
    /// is simply skipped, degrading toward fewer suggestions rather than a
    /// failed request.
    pub fn query_prefix(&self, tenant: &TenantId, prefix_normalized: &str, max_results: usize) -> Vec<SuggestionEntry> {
        if prefix_normalized.len() < 2 {
            return Vec::new();
        }
        let mut best: HashMap<String, SuggestionEntry> = HashMap::new();
        for category in SuggestionCategory::ALL {
            let Ok(rows) = self.repo.query_suggestion_prefix(tenant, category.key(), prefix_normalized, max_results) else {
                continue;
            };
            for (term, display_term, frequency) in rows {
                best.entry(term.clone()).or_insert_with(|| SuggestionEntry {
                    tenant_id: tenant.clone(),
                    category,
                    term,
                    display_term,
                    frequency,
                });
            }
        }
        let mut out: Vec<SuggestionEntry> = best.into_values().collect();
        out.sort_by(|a, b| b.rank().partial_cmp(&a.rank()).unwrap_or(std::cmp::Ordering::Equal));
        out.truncate(max_results);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doc_model::FileType;
    use std::collections::BTreeSet;

    fn sample_resource(tenant: &TenantId) -> Resource {
        Resource {
            resource_id: ResourceId::from("r1"),
            tenant_id: tenant.clone(),
            file_id: None,
            file_name: "google-invoice.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            file_type: FileType::Pdf,
            size_bytes: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            summary: "an invoice".to_string(),
            technical_metadata: serde_json::json!({}),
            tags: BTreeSet::new(),
            vendor: Some("google".to_string()),
            entities: BTreeSet::from(["Jane Doe".to_string()]),
            keywords: BTreeSet::from(["invoice".to_string()]),
            amounts_cents: BTreeSet::new(),
            currency: None,
            dates: BTreeSet::new(),
            content: "quarterly invoice from google".to_string(),
            document_embedding: None,
        }
    }

    #[test]
    fn indexed_resource_is_suggestible_by_vendor_prefix() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        let index = SuggestionIndex::new(&repo);
        index.index_resource(&tenant, &sample_resource(&tenant)).unwrap();

        let hits = index.query_prefix(&tenant, "goo", 10);
        assert!(hits.iter().any(|h| h.category == SuggestionCategory::Vendors && h.term == "google"));
    }

    #[test]
    fn short_prefix_yields_no_suggestions() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        let index = SuggestionIndex::new(&repo);
        index.index_resource(&tenant, &sample_resource(&tenant)).unwrap();
        assert!(index.query_prefix(&tenant, "g", 10).is_empty());
    }

    #[test]
    fn removing_a_resource_does_not_error() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let tenant = TenantId::from("acme-tenant");
        let index = SuggestionIndex::new(&repo);
        index.index_resource(&tenant, &sample_resource(&tenant)).unwrap();
        index.remove_resource(&tenant, &ResourceId::from("r1")).unwrap();
        assert!(index.query_prefix(&tenant, "goo", 10).iter().any(|h| h.term == "google"));
    }
}
