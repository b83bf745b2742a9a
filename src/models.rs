// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, NaiveDate, Utc};

use crate::services::calculations::CalcError;

/// One row of the daily price table as returned by the price provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: f64,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Adjusted closes ordered by strictly increasing date, every price > 0.
///
/// The invariants are checked once at construction; the series is never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, CalcError> {
        for (i, point) in points.iter().enumerate() {
            if !(point.price > 0.0) || !point.price.is_finite() {
                return Err(CalcError::NonPositivePrice { date: point.date, price: point.price });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(CalcError::UnorderedDates { previous: points[i - 1].date, next: point.date });
            }
        }
        Ok(Self { points })
    }

    pub fn from_bars(bars: &[PriceBar]) -> Result<Self, CalcError> {
        Self::new(
            bars.iter()
                .map(|bar| PricePoint { date: bar.date, price: bar.adj_close })
                .collect(),
        )
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// SMA and EMA aligned index-for-index with the source series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothedSeries {
    pub dates: Vec<NaiveDate>,
    pub sma: Vec<Option<f64>>,
    pub ema: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodReturn {
    pub date: NaiveDate,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskReturnSummary {
    /// Percent.
    pub annualized_return: f64,
    /// Percent.
    pub annualized_std_dev: f64,
    pub risk_adjusted_return: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceAnalysis {
    pub smoothed: SmoothedSeries,
    pub returns: Vec<PeriodReturn>,
    pub summary: RiskReturnSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub ticker: String,
    pub shares: u64,
    pub purchase_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchange {
    pub question: String,
    pub response: String,
    pub asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub published: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    pub title_sentiment: f64,
    pub summary_sentiment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementKind {
    pub fn all() -> [StatementKind; 3] {
        [StatementKind::BalanceSheet, StatementKind::IncomeStatement, StatementKind::CashFlow]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementRow {
    pub item: String,
    pub values: Vec<Option<f64>>,
}

/// A financial statement with one column per fiscal period and one row per line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialStatement {
    pub symbol: String,
    pub kind: StatementKind,
    pub fiscal_dates: Vec<String>,
    pub rows: Vec<StatementRow>,
}
