//! CSV price-file adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` with a header row and the columns
//! `date,open,high,low,close,volume` (dates as YYYY-MM-DD).

use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::AdaptraderError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::PriceDataPort;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

impl PriceDataPort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AdaptraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| AdaptraderError::PriceData {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut prices = Vec::new();

        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(|e| AdaptraderError::PriceData {
                reason: format!("CSV parse error: {e}"),
            })?;
            let row = line + 1;

            let date = NaiveDate::parse_from_str(get_field(&record, 0, "date", row)?, "%Y-%m-%d")
                .map_err(|e| AdaptraderError::PriceData {
                    reason: format!("row {row}: invalid date: {e}"),
                })?;

            if date < start_date || date > end_date {
                continue;
            }

            prices.push(PricePoint {
                date,
                open: parse_number(&record, 1, "open", row)?,
                high: parse_number(&record, 2, "high", row)?,
                low: parse_number(&record, 3, "low", row)?,
                close: parse_number(&record, 4, "close", row)?,
                volume: parse_number(&record, 5, "volume", row)?,
            });
        }

        Ok(prices)
    }
}

fn get_field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<&'a str, AdaptraderError> {
    record.get(index).ok_or_else(|| AdaptraderError::PriceData {
        reason: format!("row {row}: missing {name} column"),
    })
}

fn parse_number<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<T, AdaptraderError>
where
    T::Err: std::fmt::Display,
{
    get_field(record, index, name, row)?
        .trim()
        .parse()
        .map_err(|e| AdaptraderError::PriceData {
            reason: format!("row {row}: invalid {name}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
date,open,high,low,close,volume
2024-01-02,100.0,102.0,99.0,101.0,5000
2024-01-03,101.0,104.0,100.0,103.0,6000
2024-01-04,103.0,103.5,98.0,99.0,7000
";

    fn write_csv(dir: &TempDir, symbol: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(format!("{symbol}.csv"))).unwrap();
        write!(file, "{content}").unwrap();
    }

    fn full_range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2100, 1, 1).unwrap(),
        )
    }

    #[test]
    fn reads_all_rows() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "TEST", SAMPLE);
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let (start, end) = full_range();
        let prices = adapter.fetch_prices("TEST", start, end).unwrap();

        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!((prices[1].close - 103.0).abs() < f64::EPSILON);
        assert_eq!(prices[2].volume, 7000);
    }

    #[test]
    fn filters_by_date_range() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "TEST", SAMPLE);
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let prices = adapter.fetch_prices("TEST", start, end).unwrap();

        assert_eq!(prices.len(), 1);
        assert!((prices[0].close - 103.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_file_is_price_data_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let (start, end) = full_range();
        let err = adapter.fetch_prices("NOPE", start, end).unwrap_err();
        assert!(matches!(err, AdaptraderError::PriceData { .. }));
    }

    #[test]
    fn malformed_close_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "BAD",
            "date,open,high,low,close,volume\n2024-01-02,100.0,102.0,99.0,abc,5000\n",
        );
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let (start, end) = full_range();
        let err = adapter.fetch_prices("BAD", start, end).unwrap_err();
        match err {
            AdaptraderError::PriceData { reason } => assert!(reason.contains("close")),
            other => panic!("expected PriceData, got {other:?}"),
        }
    }

    #[test]
    fn missing_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "SHORT",
            "date,open\n2024-01-02,100.0\n",
        );
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let (start, end) = full_range();
        assert!(adapter.fetch_prices("SHORT", start, end).is_err());
    }
}
