//! Flat-file price provider.
//!
//! Reads a wide CSV (`date,TICKER1,TICKER2,...`) once at construction. Empty
//! cells and `NaN` are treated as missing and removed by the matrix cleaning
//! rules on every request.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{DataError, PriceMatrix, PriceProvider, ProviderId};

pub struct CsvProvider {
    path: PathBuf,
    index: Vec<DateTime<Utc>>,
    tickers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    recent_rows: usize,
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339 timestamps as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DataError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("bad timestamp '{}': {}", raw, e)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::Parse(format!("bad date '{}'", raw)))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn parse_cell(raw: &str) -> Result<Option<f64>, DataError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| DataError::Parse(format!("bad price '{}': {}", raw, e)))
}

impl CsvProvider {
    /// Loads the whole file. `recent_rows` bounds `fetch_recent_bars`.
    pub fn open(path: impl AsRef<Path>, recent_rows: usize) -> Result<Self, DataError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(DataError::Parse(format!(
                "{} needs a date column and at least one ticker column",
                path.display()
            )));
        }
        let tickers: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

        let mut index = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); tickers.len()];
        for record in reader.records() {
            let record = record?;
            index.push(parse_timestamp(record.get(0).unwrap_or_default())?);
            for (j, col) in columns.iter_mut().enumerate() {
                col.push(parse_cell(record.get(j + 1).unwrap_or_default())?);
            }
        }

        info!(
            path = %path.display(),
            rows = index.len(),
            tickers = tickers.len(),
            "Loaded price file"
        );

        Ok(Self {
            path,
            index,
            tickers,
            columns,
            recent_rows,
        })
    }

    fn extract(&self, tickers: &[String], rows: &[usize]) -> Result<PriceMatrix, DataError> {
        let mut picked_tickers = Vec::with_capacity(tickers.len());
        let mut picked_cols = Vec::with_capacity(tickers.len());
        for t in tickers {
            match self.tickers.iter().position(|x| x == t) {
                Some(j) => {
                    picked_tickers.push(t.clone());
                    picked_cols.push(rows.iter().map(|&r| self.columns[j][r]).collect());
                }
                None => warn!(ticker = %t, path = %self.path.display(), "Ticker not in price file"),
            }
        }
        let index = rows.iter().map(|&r| self.index[r]).collect();
        PriceMatrix::from_sparse(index, picked_tickers, picked_cols)
    }
}

#[async_trait]
impl PriceProvider for CsvProvider {
    async fn get_prices(
        &self,
        tickers: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceMatrix, DataError> {
        let rows: Vec<usize> = (0..self.index.len())
            .filter(|&r| self.index[r] >= start && self.index[r] < end)
            .collect();
        self.extract(tickers, &rows)
    }

    async fn fetch_recent_bars(&self, tickers: &[String]) -> Result<PriceMatrix, DataError> {
        let mut rows: Vec<usize> = (0..self.index.len()).collect();
        rows.sort_by_key(|&r| self.index[r]);
        let rows = rows.split_off(rows.len().saturating_sub(self.recent_rows));
        self.extract(tickers, &rows)
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Csv
    }
}

/// Writes `matrix` in the wide layout read by [`CsvProvider`].
pub fn write_wide_csv(matrix: &PriceMatrix, path: impl AsRef<Path>) -> Result<(), DataError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let mut header = vec!["date".to_string()];
    header.extend(matrix.tickers().iter().cloned());
    writer.write_record(&header)?;
    for (row, ts) in matrix.index().iter().enumerate() {
        let mut record = vec![ts.to_rfc3339()];
        record.extend((0..matrix.tickers().len()).map(|j| matrix.column_at(j)[row].to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "date,AAA,BBB,CCC\n\
             2024-01-02,10.0,20.0,\n\
             2024-01-03,10.5,,\n\
             2024-01-04,11.0,21.0,\n\
             2024-01-05,11.5,22.0,NaN"
        )
        .unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_get_prices_filters_range_and_drops_gaps() {
        let (_dir, path) = fixture();
        let provider = CsvProvider::open(&path, 10).unwrap();
        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string(), "ZZZ".to_string()];
        let m = provider
            .get_prices(
                &tickers,
                parse_timestamp("2024-01-02").unwrap(),
                parse_timestamp("2024-01-05").unwrap(),
            )
            .await
            .unwrap();
        // CCC has no observations, ZZZ is absent, the 01-03 row has a gap
        assert_eq!(m.tickers(), &["AAA".to_string(), "BBB".to_string()]);
        assert_eq!(m.column("AAA").unwrap(), &[10.0, 11.0]);
    }

    #[tokio::test]
    async fn test_recent_bars_tail() {
        let (_dir, path) = fixture();
        let provider = CsvProvider::open(&path, 2).unwrap();
        let m = provider.fetch_recent_bars(&["AAA".to_string()]).await.unwrap();
        assert_eq!(m.column("AAA").unwrap(), &[11.0, 11.5]);
    }

    #[test]
    fn test_timestamp_formats() {
        let a = parse_timestamp("2024-03-01").unwrap();
        let b = parse_timestamp("2024-03-01T00:00:00Z").unwrap();
        let c = parse_timestamp("2024-03-01 00:00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(parse_timestamp("03/01/2024").is_err());
    }

    #[tokio::test]
    async fn test_write_then_read_back() {
        let (dir, path) = fixture();
        let provider = CsvProvider::open(&path, 10).unwrap();
        let m = provider.fetch_recent_bars(&["AAA".to_string(), "BBB".to_string()]).await.unwrap();
        let out = dir.path().join("nested/out.csv");
        write_wide_csv(&m, &out).unwrap();
        let again = CsvProvider::open(&out, 10).unwrap();
        let m2 = again.fetch_recent_bars(&["AAA".to_string(), "BBB".to_string()]).await.unwrap();
        assert_eq!(m, m2);
    }
}
