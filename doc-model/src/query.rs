use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ChunkId, FileId, ResourceId};
use crate::resource::FileType;

/// A money value extracted from a query or a document, normalized to minor
/// units so "12.50" and "12,50" compare equal regardless of locale
/// formatting (spec §4.B / §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount {
    pub cents: i64,
    pub currency: Option<&'static str>,
}

/// The parsed, structured form of a raw search query (spec §4.I).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryIntent {
    pub raw_text: String,
    /// Residual text left after stripping recognized ids/emails/ibans/money/
    /// dates and activated category trigger keywords.
    pub clean_text: String,
    pub ids: Vec<String>,
    pub emails: Vec<String>,
    pub ibans: Vec<String>,
    pub money: Vec<MoneyAmount>,
    pub dates: Vec<NaiveDate>,
    pub file_types: Vec<FileType>,
    /// Category keys (see `crate::ids::CategoryType::key`) activated by the
    /// category-activation algorithm.
    pub categories: Vec<String>,
}

impl QueryIntent {
    /// True when at least one of ids/emails/ibans/money was recognized
    /// (spec §4.I "has_strong_signal": "any of ids/emails/ibans/money
    /// non-empty"). Dates and activated categories do not count, so a
    /// category-only query still gets the noise floor and isn't forced into
    /// exact-match preference.
    pub fn has_strong_signal(&self) -> bool {
        !self.ids.is_empty() || !self.emails.is_empty() || !self.ibans.is_empty() || !self.money.is_empty()
    }
}

/// Which search strategy produced a given result (spec §4.J / §9 redesign
/// guidance: "express as a set of variants").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactPhrase,
    ExactId,
    ExactAmount,
    ExactKeyword,
    PriceMatch,
    VendorMatch,
    PeopleMatch,
    SemanticDoc,
    SemanticChunk,
    PartialWords,
    Hybrid,
}

/// A 60-character window of text around the first match span, used for
/// result previews (SPEC_FULL supplemented feature).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub field: String,
    pub snippet: String,
    pub match_start: u32,
    pub match_end: u32,
}

/// One ranked hit returned by the Hybrid Searcher (spec §4.J "Result shape").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub resource_id: ResourceId,
    pub file_name: String,
    pub file_id: Option<FileId>,
    pub mime_type: String,
    pub summary: String,
    pub vendor: Option<String>,
    pub score: f32,
    pub match_type: MatchType,
    pub matched_value: String,
    pub occurrences: u32,
    pub matching_chunks: Vec<ChunkId>,
    pub page_number: Option<u32>,
    pub row_index: Option<u32>,
    pub highlights: Vec<Highlight>,
}

const HIGHLIGHT_WINDOW: usize = 60;

/// Build a fixed-width highlight window around `match_start..match_end`
/// within `field_text`, clamped to char boundaries.
pub fn build_highlight(field: &str, field_text: &str, match_start: usize, match_end: usize) -> Highlight {
    let half = HIGHLIGHT_WINDOW / 2;
    let start = match_start.saturating_sub(half);
    let end = (match_end + half).min(field_text.len());
    let start = floor_char_boundary(field_text, start);
    let end = ceil_char_boundary(field_text, end);
    Highlight {
        field: field.to_string(),
        snippet: field_text[start..end].to_string(),
        match_start: (match_start - start) as u32,
        match_end: (match_end - start) as u32,
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_signal_requires_a_structured_field() {
        let mut intent = QueryIntent::default();
        assert!(!intent.has_strong_signal());
        intent.emails.push("a@b.com".into());
        assert!(intent.has_strong_signal());
    }

    #[test]
    fn highlight_window_clamps_to_string_bounds() {
        let text = "short";
        let h = build_highlight("content", text, 0, 5);
        assert_eq!(h.snippet, "short");
    }
}
