//! Query Analyzer (spec §4.I): turns a raw search string into a
//! [`doc_model::QueryIntent`] plus the category-activation detail the
//! Hybrid Searcher needs (matched entities per active category).

use std::collections::{BTreeSet, HashSet};

use doc_model::normalize::{normalize, tokenize};
use doc_model::{Category, CategoryType, FileType, QueryIntent};
use metadata_extractors::regex_extractors::{extract_dates, extract_emails, extract_ibans, extract_ids, extract_money};

/// One category that the activation algorithm (spec §4.I step 3) judged
/// active for this query, along with which of its entities matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryActivation {
    pub category_type: CategoryType,
    pub matched_entities: BTreeSet<String>,
    pub triggered: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzedQuery {
    pub intent: QueryIntent,
    pub activations: Vec<CategoryActivation>,
}

const FILE_TYPE_HINTS: &[(&str, FileType)] = &[
    ("pdf", FileType::Pdf),
    ("image", FileType::Image),
    ("img", FileType::Image),
    ("photo", FileType::Image),
    ("picture", FileType::Image),
    ("csv", FileType::Csv),
    ("spreadsheet", FileType::Csv),
    ("text", FileType::Text),
    ("txt", FileType::Text),
    ("note", FileType::Text),
    ("snippet", FileType::Snippet),
];

/// Parses `raw_text` into a [`AnalyzedQuery`] for `categories` (already
/// seeded/loaded by the caller — see `document_store::default_categories_for`
/// for lazy seeding, spec §4.M).
pub fn analyze(raw_text: &str, categories: &[Category]) -> AnalyzedQuery {
    let normalized = normalize(raw_text);
    let tokens = tokenize(&normalized);

    let ids = extract_ids(raw_text);
    let emails = extract_emails(raw_text);
    let ibans = extract_ibans(raw_text);
    let money = extract_money(raw_text);
    let dates = extract_dates(raw_text);

    let mut file_types = Vec::new();
    let mut hint_tokens: HashSet<String> = HashSet::new();
    for (hint, file_type) in FILE_TYPE_HINTS {
        if tokens.iter().any(|t| t == hint) {
            file_types.push(*file_type);
            hint_tokens.insert(hint.to_string());
        }
    }

    let recognized_tokens = recognized_token_set(&ids, &emails, &ibans);

    let mut activations = Vec::new();
    let mut active_keys = Vec::new();
    let mut removal_tokens: HashSet<String> = hint_tokens.clone();

    for category in categories.iter().filter(|c| c.enabled) {
        let matched_entities: BTreeSet<String> = category
            .entities
            .iter()
            .filter(|e| entity_matches(&normalized, &tokens, e))
            .cloned()
            .collect();
        let triggered = category
            .trigger_keywords
            .iter()
            .any(|kw| normalized.contains(&normalize(kw)));

        let matched_or_trigger_tokens: HashSet<String> = matched_entities
            .iter()
            .flat_map(|e| tokenize(&normalize(e)))
            .chain(category.trigger_keywords.iter().flat_map(|kw| tokenize(&normalize(kw))))
            .collect();
        let ignored_tokens: HashSet<String> = category.ignored_words.iter().map(|w| normalize(w)).collect();

        let non_category_words = tokens
            .iter()
            .filter(|t| {
                !matched_or_trigger_tokens.contains(*t)
                    && !ignored_tokens.contains(*t)
                    && !recognized_tokens.contains(*t)
                    && !hint_tokens.contains(*t)
            })
            .count() as u32;

        let active = (!matched_entities.is_empty() || triggered) && non_category_words <= category.max_non_category_words;
        if active {
            active_keys.push(category.category_type.key());
            activations.push(CategoryActivation {
                category_type: category.category_type.clone(),
                matched_entities,
                triggered,
            });
        }
    }

    removal_tokens.extend(recognized_tokens);

    let clean_text = tokens
        .iter()
        .filter(|t| !removal_tokens.contains(*t))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    let intent = QueryIntent {
        raw_text: raw_text.to_string(),
        clean_text,
        ids,
        emails,
        ibans,
        money,
        dates,
        file_types,
        categories: active_keys,
    };

    AnalyzedQuery { intent, activations }
}

fn recognized_token_set(ids: &[String], emails: &[String], ibans: &[String]) -> HashSet<String> {
    let mut out = HashSet::new();
    for id in ids {
        out.extend(tokenize(&normalize(id)));
    }
    for email in emails {
        out.extend(tokenize(&normalize(email)));
    }
    for iban in ibans {
        out.extend(tokenize(&normalize(iban)));
    }
    out
}

/// Whole-token or hyphenated-token match per spec §4.I step 3: the entity's
/// normalized form must appear as a standalone token, or as a token within
/// a hyphen-joined compound (e.g. entity `acme` matches query token `acme-inc`).
fn entity_matches(normalized_query: &str, query_tokens: &[String], entity: &str) -> bool {
    let entity_norm = normalize(entity);
    if entity_norm.is_empty() {
        return false;
    }
    let entity_tokens = tokenize(&entity_norm);
    if entity_tokens.len() > 1 {
        return normalized_query.contains(&entity_norm);
    }
    let needle = entity_tokens[0].as_str();
    query_tokens.iter().any(|t| t.as_str() == needle)
        || normalized_query.split('-').any(|part| part == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::seed_default_categories;
    use doc_model::ids::TenantId;

    #[test]
    fn vendor_category_activates_with_one_ignored_word() {
        let tenant = TenantId::from("t1");
        let categories = seed_default_categories(&tenant);
        let analyzed = analyze("google invoice", &categories);
        assert!(analyzed.intent.categories.contains(&"vendor".to_string()));
        assert!(analyzed.activations.iter().any(|a| a.category_type == CategoryType::Vendor));
    }

    #[test]
    fn vendor_category_does_not_activate_with_too_many_non_category_words() {
        let tenant = TenantId::from("t1");
        let categories = seed_default_categories(&tenant);
        let analyzed = analyze("google tag manager", &categories);
        assert!(!analyzed.intent.categories.contains(&"vendor".to_string()));
    }

    #[test]
    fn strong_signal_detected_from_email() {
        let analyzed = analyze("invoice from finance@acme.com", &[]);
        assert!(analyzed.intent.has_strong_signal());
        assert_eq!(analyzed.intent.emails, vec!["finance@acme.com".to_string()]);
    }

    #[test]
    fn clean_text_strips_recognized_tokens() {
        let analyzed = analyze("contact finance@acme.com about invoice", &[]);
        assert!(!analyzed.intent.clean_text.contains("finance@acme.com"));
        assert!(analyzed.intent.clean_text.contains("contact"));
    }

    #[test]
    fn file_type_hint_detected() {
        let analyzed = analyze("quarterly report pdf", &[]);
        assert_eq!(analyzed.intent.file_types, vec![FileType::Pdf]);
        assert!(!analyzed.intent.clean_text.contains("pdf"));
    }
}
