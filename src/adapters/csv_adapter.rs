//! CSV file data adapter: instrument reference data and market ticks.
//!
//! Expects `instruments.csv` (`symbol,type,price,sector,issuer,maturity`)
//! and `market_data.csv` (`timestamp,symbol,price`) under one base directory.

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

use crate::domain::error::PapertraderError;
use crate::domain::instrument::{Instrument, InstrumentKind};
use crate::domain::series::MarketTick;
use crate::ports::data_port::DataPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn data_err(reason: String) -> PapertraderError {
        PapertraderError::Data { reason }
    }

    fn field<'a>(
        record: &'a csv::StringRecord,
        idx: usize,
        name: &str,
    ) -> Result<&'a str, PapertraderError> {
        record
            .get(idx)
            .ok_or_else(|| Self::data_err(format!("missing {} column", name)))
    }

    fn optional(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl DataPort for CsvAdapter {
    fn load_instruments(&self) -> Result<Vec<Instrument>, PapertraderError> {
        let path = self.base_path.join("instruments.csv");
        let content = fs::read_to_string(&path).map_err(|e| {
            Self::data_err(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut instruments = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::data_err(format!("CSV parse error: {}", e)))?;

            let symbol = Self::field(&record, 0, "symbol")?.trim().to_string();
            let kind_raw = Self::field(&record, 1, "type")?;

            let maturity = match record.get(5).map(str::trim) {
                Some(raw) if !raw.is_empty() => {
                    Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                        Self::data_err(format!("invalid maturity for {}: {}", symbol, e))
                    })?)
                }
                _ => None,
            };

            let kind = InstrumentKind::parse(kind_raw, maturity).ok_or_else(|| {
                Self::data_err(format!("unsupported instrument type: {}", kind_raw))
            })?;

            let mut instrument = Instrument::new(symbol, kind);
            instrument.sector = record.get(3).and_then(Self::optional);
            instrument.issuer = record.get(4).and_then(Self::optional);
            instruments.push(instrument);
        }

        Ok(instruments)
    }

    fn load_ticks(
        &self,
        symbols: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<MarketTick>, PapertraderError> {
        let path = self.base_path.join("market_data.csv");
        let content = fs::read_to_string(&path).map_err(|e| {
            Self::data_err(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut ticks = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::data_err(format!("CSV parse error: {}", e)))?;

            let symbol = Self::field(&record, 1, "symbol")?.trim().to_string();
            if !symbols.is_empty() && !symbols.contains(&symbol) {
                continue;
            }

            let timestamp_raw = Self::field(&record, 0, "timestamp")?;
            let timestamp = NaiveDateTime::parse_from_str(timestamp_raw, TIMESTAMP_FORMAT)
                .map_err(|e| Self::data_err(format!("invalid timestamp: {}", e)))?;

            let price: f64 = Self::field(&record, 2, "price")?
                .trim()
                .parse()
                .map_err(|e| Self::data_err(format!("invalid price value: {}", e)))?;

            ticks.push(MarketTick {
                timestamp,
                symbol,
                price,
            });

            if let Some(limit) = limit {
                if ticks.len() >= limit {
                    break;
                }
            }
        }

        Ok(ticks)
    }
}
