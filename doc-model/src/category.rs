use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{CategoryType, TenantId};

/// Per-tenant configuration of entity recognition. See spec §3 "Category"
/// and §4.M for default seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub tenant_id: TenantId,
    pub category_type: CategoryType,
    pub entities: BTreeSet<String>,
    pub ignored_words: BTreeSet<String>,
    pub trigger_keywords: BTreeSet<String>,
    pub max_non_category_words: u32,
    pub match_score: f32,
    pub enabled: bool,
}

impl Category {
    pub fn new(tenant_id: TenantId, category_type: CategoryType) -> Self {
        let match_score = match &category_type {
            CategoryType::Vendor => 0.88,
            CategoryType::People => 0.85,
            CategoryType::Price => 0.90,
            CategoryType::Custom(_) => 0.80,
        };
        Self {
            tenant_id,
            category_type,
            entities: BTreeSet::new(),
            ignored_words: BTreeSet::new(),
            trigger_keywords: BTreeSet::new(),
            max_non_category_words: 1,
            match_score,
            enabled: true,
        }
    }
}

/// Well-known vendor seed list used when a tenant has no `vendor` category yet
/// (spec §4.M "curated well-known-vendor seed list").
pub const DEFAULT_VENDOR_SEED: &[&str] = &[
    "google", "amazon", "microsoft", "apple", "adobe", "dropbox", "slack",
    "zoom", "github", "gitlab", "atlassian", "stripe", "paypal", "salesforce",
    "notion", "figma", "openai", "anthropic", "digitalocean", "cloudflare",
];

pub const DEFAULT_VENDOR_IGNORED_WORDS: &[&str] = &[
    "invoice", "bill", "payment", "contract", "subscription", "from", "by",
    "provider", "service",
];

pub const DEFAULT_PEOPLE_IGNORED_WORDS: &[&str] = &[
    "email", "from", "to", "cc", "contact", "person", "sent", "received",
    "by", "author", "sender",
];

pub const DEFAULT_PRICE_TRIGGER_KEYWORDS: &[&str] = &[
    "price", "cost", "amount", "number", "how much", "what price",
];

/// Build the three default categories for a tenant that has none yet
/// (spec §4.M "Default seeding" / §3 "Default seed populated lazily").
pub fn seed_default_categories(tenant_id: &TenantId) -> Vec<Category> {
    let mut vendor = Category::new(tenant_id.clone(), CategoryType::Vendor);
    vendor.entities = DEFAULT_VENDOR_SEED.iter().map(|s| s.to_string()).collect();
    vendor.ignored_words = DEFAULT_VENDOR_IGNORED_WORDS.iter().map(|s| s.to_string()).collect();

    let mut people = Category::new(tenant_id.clone(), CategoryType::People);
    people.ignored_words = DEFAULT_PEOPLE_IGNORED_WORDS.iter().map(|s| s.to_string()).collect();

    let mut price = Category::new(tenant_id.clone(), CategoryType::Price);
    price.trigger_keywords = DEFAULT_PRICE_TRIGGER_KEYWORDS.iter().map(|s| s.to_string()).collect();

    vec![vendor, people, price]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_three_default_categories() {
        let tenant = TenantId::from("t1");
        let cats = seed_default_categories(&tenant);
        assert_eq!(cats.len(), 3);
        assert!(cats.iter().any(|c| c.category_type == CategoryType::Vendor && c.entities.contains("google")));
        assert!(cats.iter().any(|c| c.category_type == CategoryType::People));
        assert!(cats.iter().any(|c| c.category_type == CategoryType::Price && c.trigger_keywords.contains("price")));
    }
}
