use std::fs;

/// Splits a CSV file into `(row_index, row_text)` pairs, one row per unit
/// (spec §4.C "CSV: one unit per row; emits row text as
/// `\"col1: v1 | col2: v2 | ...\"`"). The first row is treated as the header
/// and used to label subsequent rows; if the file has no rows the header
/// itself is returned as row 0.
pub fn read_csv_to_rows(path: &str) -> std::io::Result<Vec<(u32, String)>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).replace("\r\n", "\n");
    Ok(rows_from_csv_text(&text))
}

pub fn rows_from_csv_text(text: &str) -> Vec<(u32, String)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map(|h| h.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let mut out = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let Ok(record) = record else { continue };
        let row_text = record
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let col = headers.get(i).cloned().unwrap_or_else(|| format!("col{}", i + 1));
                format!("{}: {}", col, value)
            })
            .collect::<Vec<_>>()
            .join(" | ");
        out.push((idx as u32, row_text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rows_as_pipe_joined_pairs() {
        let rows = rows_from_csv_text("vendor,amount\nAcme,12.50\nWidgetCo,7.00\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (0, "vendor: Acme | amount: 12.50".to_string()));
        assert_eq!(rows[1], (1, "vendor: WidgetCo | amount: 7.00".to_string()));
    }
}
