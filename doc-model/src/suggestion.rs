use serde::{Deserialize, Serialize};

use crate::ids::TenantId;

/// The five autocomplete buckets a tenant's Suggestion Index is partitioned
/// into (spec §4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Filenames,
    Vendors,
    Entities,
    Keywords,
    AllTerms,
}

impl SuggestionCategory {
    pub const ALL: [SuggestionCategory; 5] = [
        SuggestionCategory::Filenames,
        SuggestionCategory::Vendors,
        SuggestionCategory::Entities,
        SuggestionCategory::Keywords,
        SuggestionCategory::AllTerms,
    ];

    /// Fixed weight applied on top of raw frequency when ranking suggestions
    /// across categories (spec §4.H "type_priority x frequency").
    pub fn type_priority(self) -> f32 {
        match self {
            SuggestionCategory::Filenames => 1.0,
            SuggestionCategory::Vendors => 0.9,
            SuggestionCategory::Entities => 0.8,
            SuggestionCategory::Keywords => 0.7,
            SuggestionCategory::AllTerms => 0.5,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SuggestionCategory::Filenames => "filenames",
            SuggestionCategory::Vendors => "vendors",
            SuggestionCategory::Entities => "entities",
            SuggestionCategory::Keywords => "keywords",
            SuggestionCategory::AllTerms => "all_terms",
        }
    }
}

/// A single term tracked in the Suggestion Index for one tenant/category pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionEntry {
    pub tenant_id: TenantId,
    pub category: SuggestionCategory,
    /// Normalized term, used as the prefix-sort key.
    pub term: String,
    /// Original-case display form, e.g. for filenames and vendor names.
    pub display_term: String,
    pub frequency: u64,
}

impl SuggestionEntry {
    /// Combined rank used to order suggestions sharing a prefix
    /// (spec §4.H: `type_priority * frequency`).
    pub fn rank(&self) -> f64 {
        self.category.type_priority() as f64 * self.frequency as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_priority_orders_filenames_above_all_terms() {
        assert!(SuggestionCategory::Filenames.type_priority() > SuggestionCategory::AllTerms.type_priority());
    }

    #[test]
    fn rank_multiplies_priority_by_frequency() {
        let entry = SuggestionEntry {
            tenant_id: TenantId::from("t1"),
            category: SuggestionCategory::Vendors,
            term: "acme".into(),
            display_term: "ACME".into(),
            frequency: 10,
        };
        assert_eq!(entry.rank(), 9.0);
    }
}
