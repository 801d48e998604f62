use anyhow::{Context, Result};
use contracts::projections::p900_dataset_preview::DatasetPreview;
use std::path::Path;

/// Построить предпросмотр датасета: заголовки и первые N строк.
///
/// Снимок строится с локальной копии файла; total_rows считается по всему
/// файлу, чтобы страница показывала реальный размер, а не размер снимка.
pub fn build_preview(path: &str, preview_rows: usize) -> Result<DatasetPreview> {
    let path = Path::new(path);
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open dataset at {}", path.display()))?;

    let headers = reader
        .headers()
        .context("dataset has no header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::with_capacity(preview_rows);
    let mut total_rows = 0usize;
    for record in reader.records() {
        let record = record.context("malformed dataset row")?;
        if rows.len() < preview_rows {
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }
        total_rows += 1;
    }

    Ok(DatasetPreview {
        headers,
        rows,
        total_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_preview_truncates_but_counts_everything() {
        let file = write_dataset(&[
            "trade_id,symbol,volume",
            "1,AAPL,100",
            "2,MSFT,250",
            "3,GOOG,75",
        ]);

        let preview = build_preview(file.path().to_str().unwrap(), 2).unwrap();
        assert_eq!(preview.headers, vec!["trade_id", "symbol", "volume"]);
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[1], vec!["2", "MSFT", "250"]);
        assert_eq!(preview.total_rows, 3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = build_preview("/nonexistent/trades.csv", 10).unwrap_err();
        assert!(err.to_string().contains("cannot open dataset"));
    }
}
