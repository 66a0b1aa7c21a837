//! Precomputed price/indicator series consumed by the environment.
//!
//! A [`Series`] is validated once on construction and never mutated
//! afterwards. Rows live behind an `Arc`, so cloning a series to hand it to
//! several environment instances is cheap.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::indicators::{deltas, rsi};
use crate::error::{Result, SimError};

/// A single time-indexed row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    /// Observation time, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Price or spread level
    pub price: f64,
    /// Indicator value (RSI, 0-100)
    pub indicator: f64,
    /// Change from the previous row's price
    pub delta: f64,
}

/// Immutable, validated series of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SeriesRow>", into = "Vec<SeriesRow>")]
pub struct Series {
    rows: Arc<[SeriesRow]>,
}

impl Series {
    /// Build a series from prepared rows.
    ///
    /// Rows must be non-empty, finite, carry an indicator within [0, 100]
    /// and, when timestamps are present, be in non-decreasing time order.
    pub fn new(rows: Vec<SeriesRow>) -> Result<Self> {
        validate_rows(&rows)?;
        Ok(Self { rows: rows.into() })
    }

    /// Build a series from raw prices, computing deltas and RSI.
    pub fn from_prices(prices: &[f64], rsi_period: usize) -> Result<Self> {
        let indicator = rsi(prices, rsi_period);
        let delta = deltas(prices);

        let rows = prices
            .iter()
            .zip(indicator)
            .zip(delta)
            .map(|((price, indicator), delta)| SeriesRow {
                timestamp: None,
                price: *price,
                indicator,
                delta,
            })
            .collect();

        Self::new(rows)
    }

    /// Build a series from timestamped prices, computing deltas and RSI.
    pub fn from_points(points: &[(DateTime<Utc>, f64)], rsi_period: usize) -> Result<Self> {
        let prices: Vec<f64> = points.iter().map(|(_, price)| *price).collect();
        let base = Self::from_prices(&prices, rsi_period)?;

        let rows = base
            .rows
            .iter()
            .zip(points)
            .map(|(row, (ts, _))| SeriesRow {
                timestamp: Some(*ts),
                ..*row
            })
            .collect();

        Self::new(rows)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series has no rows (never true for a validated series)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the last row
    pub fn last_index(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Row at `index`
    pub fn get(&self, index: usize) -> Option<&SeriesRow> {
        self.rows.get(index)
    }

    /// All rows
    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    /// Price column
    pub fn prices(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.price).collect()
    }

    /// Load a series previously written with [`Series::write_json`]
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the series as a JSON array of rows
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl TryFrom<Vec<SeriesRow>> for Series {
    type Error = SimError;

    fn try_from(rows: Vec<SeriesRow>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<Series> for Vec<SeriesRow> {
    fn from(series: Series) -> Self {
        series.rows.to_vec()
    }
}

fn validate_rows(rows: &[SeriesRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(SimError::Configuration("series is empty".to_string()));
    }

    let mut last_ts: Option<DateTime<Utc>> = None;
    for (i, row) in rows.iter().enumerate() {
        if !row.price.is_finite() || !row.indicator.is_finite() || !row.delta.is_finite() {
            return Err(SimError::Configuration(format!(
                "row {i}: non-finite value (price={}, indicator={}, delta={})",
                row.price, row.indicator, row.delta
            )));
        }
        if !(0.0..=100.0).contains(&row.indicator) {
            return Err(SimError::Configuration(format!(
                "row {i}: indicator {} outside [0, 100]",
                row.indicator
            )));
        }
        if let Some(ts) = row.timestamp {
            if let Some(prev) = last_ts {
                if ts < prev {
                    return Err(SimError::Configuration(format!(
                        "row {i}: timestamp {ts} is earlier than {prev}"
                    )));
                }
            }
            last_ts = Some(ts);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn row(price: f64) -> SeriesRow {
        SeriesRow {
            timestamp: None,
            price,
            indicator: 50.0,
            delta: 0.0,
        }
    }

    #[test]
    fn test_from_prices() {
        let series = Series::from_prices(&[1.0, 1.5, 1.25, 2.0], 2).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.last_index(), 3);
        assert_eq!(series.get(1).unwrap().delta, 0.5);
        assert_eq!(series.get(0).unwrap().indicator, 50.0);
        assert_eq!(series.prices(), vec![1.0, 1.5, 1.25, 2.0]);
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(matches!(
            Series::new(Vec::new()),
            Err(SimError::Configuration(_))
        ));
        assert!(Series::new(vec![row(1.0), row(f64::NAN)]).is_err());
        assert!(Series::from_prices(&[1.0, f64::INFINITY], 14).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_indicator() {
        let mut bad = row(1.0);
        bad.indicator = 120.0;
        let err = Series::new(vec![row(1.0), bad]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let points = [(t0, 1.0), (t0 - Duration::days(1), 1.1)];
        assert!(Series::from_points(&points, 14).is_err());

        let points = [(t0, 1.0), (t0 + Duration::days(1), 1.1)];
        let series = Series::from_points(&points, 14).unwrap();
        assert_eq!(series.get(1).unwrap().timestamp, Some(t0 + Duration::days(1)));
    }

    #[test]
    fn test_json_rejects_invalid_rows() {
        let json = r#"[{"price": 1.0, "indicator": 500.0, "delta": 0.0}]"#;
        assert!(serde_json::from_str::<Series>(json).is_err());

        let json = r#"[{"price": 1.0, "indicator": 50.0, "delta": 0.0}]"#;
        let series: Series = serde_json::from_str(json).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_clone_shares_rows() {
        let series = Series::from_prices(&[1.0, 2.0, 3.0], 1).unwrap();
        let other = series.clone();
        assert!(std::ptr::eq(series.rows().as_ptr(), other.rows().as_ptr()));
    }
}
