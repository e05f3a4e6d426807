//! Metadata Extractors (spec §4.B): regex-based ids/emails/ibans/money/dates
//! extraction plus optional LLM-backed entities/keywords and vendor matching
//! against a tenant's configured Category.

pub mod llm_extractor;
pub mod regex_extractors;
pub mod vendor_match;

pub use llm_extractor::{
    extract_entities_best_effort, EntityExtraction, EntityExtractionError, EntityExtractor,
    NullEntityExtractor,
};
pub use regex_extractors::{extract_dates, extract_emails, extract_ibans, extract_ids, extract_money};
pub use vendor_match::match_vendor;

use chrono::NaiveDate;
use doc_model::{Category, MoneyAmount};

/// The full bundle of metadata produced for one text block, combining every
/// extractor this module exposes.
#[derive(Debug, Clone, Default)]
pub struct ExtractedMetadata {
    pub ids: Vec<String>,
    pub emails: Vec<String>,
    pub ibans: Vec<String>,
    pub money: Vec<MoneyAmount>,
    pub dates: Vec<NaiveDate>,
    pub entities: std::collections::BTreeSet<String>,
    pub keywords: std::collections::BTreeSet<String>,
    pub vendor: Option<String>,
}

/// Runs every extractor over `text`/`text_normalized`. `entity_extractor` is
/// run best-effort (spec §4.B); `vendor_category`, if provided, must be the
/// tenant's `vendor` Category.
pub fn extract_all(
    tenant_id: &str,
    text: &str,
    text_normalized: &str,
    entity_extractor: &dyn EntityExtractor,
    vendor_category: Option<&Category>,
) -> ExtractedMetadata {
    let extraction = extract_entities_best_effort(entity_extractor, tenant_id, text);
    let vendor = vendor_category.and_then(|cat| match_vendor(cat, text_normalized));

    ExtractedMetadata {
        ids: extract_ids(text),
        emails: extract_emails(text),
        ibans: extract_ibans(text),
        money: extract_money(text),
        dates: extract_dates(text),
        entities: extraction.entities,
        keywords: extraction.keywords,
        vendor,
    }
}
