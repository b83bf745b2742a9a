// src/services/portfolio.rs
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::PortfolioEntry;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("ticker must not be empty")]
    EmptyTicker,
    #[error("number of shares must be greater than zero")]
    NoShares,
    #[error("purchase price must be greater than zero")]
    NonPositivePrice,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPosition {
    pub ticker: String,
    pub shares: u64,
    pub purchase_price: f64,
}

impl NewPosition {
    pub fn validate(self) -> Result<PortfolioEntry, PortfolioError> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(PortfolioError::EmptyTicker);
        }
        if self.shares == 0 {
            return Err(PortfolioError::NoShares);
        }
        if !(self.purchase_price > 0.0) || !self.purchase_price.is_finite() {
            return Err(PortfolioError::NonPositivePrice);
        }
        Ok(PortfolioEntry {
            ticker,
            shares: self.shares,
            purchase_price: self.purchase_price,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioView {
    pub entries: Vec<PortfolioEntry>,
    pub total_cost: f64,
}

/// Holdings entered during this session. Append only.
#[derive(Debug, Default)]
pub struct Portfolio {
    entries: RwLock<Vec<PortfolioEntry>>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, position: NewPosition) -> Result<PortfolioEntry, PortfolioError> {
        let entry = position.validate()?;
        self.entries.write().await.push(entry.clone());
        info!("Added {} x {} @ {} to portfolio", entry.shares, entry.ticker, entry.purchase_price);
        Ok(entry)
    }

    pub async fn view(&self) -> PortfolioView {
        let entries = self.entries.read().await.clone();
        let total_cost = entries.iter()
            .map(|e| e.shares as f64 * e.purchase_price)
            .sum();
        PortfolioView { entries, total_cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(ticker: &str, shares: u64, purchase_price: f64) -> NewPosition {
        NewPosition { ticker: ticker.to_string(), shares, purchase_price }
    }

    #[tokio::test]
    async fn keeps_insertion_order_and_totals() {
        let portfolio = Portfolio::new();
        portfolio.add(position("aapl", 10, 150.0)).await.unwrap();
        portfolio.add(position("MSFT", 2, 300.5)).await.unwrap();

        let view = portfolio.view().await;
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].ticker, "AAPL");
        assert_eq!(view.entries[1].ticker, "MSFT");
        assert!((view.total_cost - 2101.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn invalid_positions_leave_list_unchanged() {
        let portfolio = Portfolio::new();
        assert_eq!(portfolio.add(position("  ", 1, 1.0)).await, Err(PortfolioError::EmptyTicker));
        assert_eq!(portfolio.add(position("AAPL", 0, 1.0)).await, Err(PortfolioError::NoShares));
        assert_eq!(portfolio.add(position("AAPL", 1, 0.0)).await, Err(PortfolioError::NonPositivePrice));
        assert_eq!(portfolio.add(position("AAPL", 1, -3.0)).await, Err(PortfolioError::NonPositivePrice));

        let view = portfolio.view().await;
        assert!(view.entries.is_empty());
        assert_eq!(view.total_cost, 0.0);
    }
}
