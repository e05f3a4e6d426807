//! Matches extracted/normalized text against a tenant's `vendor` Category
//! (spec §4.B "vendor: matched against the current tenant's vendor Category
//! entities").

use doc_model::{normalize::normalize, Category, CategoryType};

/// Returns the first vendor entity found as a normalized substring of
/// `text_normalized`, or `None` if the category is disabled, missing, or no
/// entity matches. `category` must be the tenant's `vendor` category; callers
/// are expected to have fetched it via the Document Store.
pub fn match_vendor(category: &Category, text_normalized: &str) -> Option<String> {
    if category.category_type != CategoryType::Vendor || !category.enabled {
        return None;
    }
    category
        .entities
        .iter()
        .find(|entity| text_normalized.contains(normalize(entity).as_str()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::TenantId;

    #[test]
    fn matches_known_vendor_case_insensitively() {
        let mut cat = Category::new(TenantId::from("t1"), CategoryType::Vendor);
        cat.entities.insert("Google".to_string());
        let normalized = normalize("Invoice from Google Cloud Services");
        assert_eq!(match_vendor(&cat, &normalized), Some("Google".to_string()));
    }

    #[test]
    fn disabled_category_never_matches() {
        let mut cat = Category::new(TenantId::from("t1"), CategoryType::Vendor);
        cat.entities.insert("Google".to_string());
        cat.enabled = false;
        let normalized = normalize("Invoice from Google Cloud Services");
        assert_eq!(match_vendor(&cat, &normalized), None);
    }
}
