// src/services/calculations.rs
use chrono::NaiveDate;
use log::debug;
use thiserror::Error;

use crate::models::{PeriodReturn, PriceAnalysis, PriceSeries, RiskReturnSummary, SmoothedSeries};

/// Trading days per year. Only meaningful for daily bars; other frequencies
/// are not corrected for.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_SMA_WINDOW: usize = 20;
pub const DEFAULT_EMA_SPAN: usize = 20;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("need at least {required} data points, got {actual}")]
    EmptySeries { required: usize, actual: usize },
    #[error("standard deviation of returns is zero, risk-adjusted return is undefined")]
    DivisionByZero,
    #[error("window must be at least 1, got {0}")]
    InvalidWindow(usize),
    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },
    #[error("price on {date} must be positive, got {price}")]
    NonPositivePrice { date: NaiveDate, price: f64 },
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter()
        .map(|&x| (x - m).powi(2))
        .sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Simple moving average aligned with the series. The first `window - 1`
/// entries have no value.
pub fn compute_sma(series: &PriceSeries, window: usize) -> Result<Vec<Option<f64>>, CalcError> {
    if window == 0 {
        return Err(CalcError::InvalidWindow(window));
    }
    let prices = series.prices();
    let mut sma = vec![None; prices.len()];
    for (i, chunk) in prices.windows(window).enumerate() {
        sma[i + window - 1] = Some(mean(chunk));
    }
    Ok(sma)
}

/// Recursive exponential smoothing with alpha = 2 / (span + 1), seeded with
/// the first price.
pub fn compute_ema(series: &PriceSeries, span: usize) -> Result<Vec<f64>, CalcError> {
    if span == 0 {
        return Err(CalcError::InvalidWindow(span));
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut ema: Vec<f64> = Vec::with_capacity(series.len());
    for point in series.points() {
        let value = match ema.last() {
            Some(&prev) => alpha * point.price + (1.0 - alpha) * prev,
            None => point.price,
        };
        ema.push(value);
    }
    Ok(ema)
}

pub fn compute_period_returns(series: &PriceSeries) -> Result<Vec<PeriodReturn>, CalcError> {
    if series.len() < 2 {
        return Err(CalcError::EmptySeries { required: 2, actual: series.len() });
    }
    Ok(series.points()
        .windows(2)
        .map(|pair| PeriodReturn {
            date: pair[1].date,
            change: pair[1].price / pair[0].price - 1.0,
        })
        .collect())
}

pub fn compute_risk_return_summary(returns: &[PeriodReturn]) -> Result<RiskReturnSummary, CalcError> {
    if returns.is_empty() {
        return Err(CalcError::EmptySeries { required: 1, actual: 0 });
    }
    let changes: Vec<f64> = returns.iter().map(|r| r.change).collect();

    let annualized_return = mean(&changes) * TRADING_DAYS_PER_YEAR * 100.0;
    let annualized_std_dev = population_std_dev(&changes) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
    if annualized_std_dev == 0.0 {
        return Err(CalcError::DivisionByZero);
    }

    debug!(
        "Summary over {} returns: return={:.4}% stdev={:.4}%",
        changes.len(), annualized_return, annualized_std_dev
    );

    Ok(RiskReturnSummary {
        annualized_return,
        annualized_std_dev,
        risk_adjusted_return: annualized_return / annualized_std_dev,
    })
}

pub fn compute_smoothed(series: &PriceSeries, window: usize, span: usize) -> Result<SmoothedSeries, CalcError> {
    Ok(SmoothedSeries {
        dates: series.dates(),
        sma: compute_sma(series, window)?,
        ema: compute_ema(series, span)?,
    })
}

/// Everything the pricing panel shows for one ticker and date range.
pub fn analyze(series: &PriceSeries, window: usize, span: usize) -> Result<PriceAnalysis, CalcError> {
    let smoothed = compute_smoothed(series, window, span)?;
    let returns = compute_period_returns(series)?;
    let summary = compute_risk_return_summary(&returns)?;
    Ok(PriceAnalysis { smoothed, returns, summary })
}
