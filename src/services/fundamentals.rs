// src/services/fundamentals.rs
use log::{error, info};
use reqwest::Client;
use serde_json::Value;

use super::error::{FetchError, Result};
use crate::models::{FinancialStatement, StatementKind, StatementRow};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Report fields that label a column rather than describe a line item.
const HEADER_FIELDS: [&str; 2] = ["fiscalDateEnding", "reportedCurrency"];

impl StatementKind {
    fn function(&self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "BALANCE_SHEET",
            StatementKind::IncomeStatement => "INCOME_STATEMENT",
            StatementKind::CashFlow => "CASH_FLOW",
        }
    }
}

fn parse_cell(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Reshapes Alpha Vantage annual reports (one object per fiscal year) into a
/// table with one column per fiscal year and one row per line item.
pub fn transpose_annual_reports(symbol: &str, kind: StatementKind, body: &Value) -> Result<FinancialStatement> {
    for key in ["Error Message", "Note", "Information"] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            return Err(FetchError::Api(message.to_string()));
        }
    }

    let reports = body.get("annualReports")
        .and_then(Value::as_array)
        .filter(|reports| !reports.is_empty())
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))?;

    let fiscal_dates: Vec<String> = reports.iter()
        .map(|r| r.get("fiscalDateEnding").and_then(Value::as_str).unwrap_or_default().to_string())
        .collect();

    let mut rows: Vec<StatementRow> = Vec::new();
    if let Some(first) = reports[0].as_object() {
        for item in first.keys().filter(|k| !HEADER_FIELDS.contains(&k.as_str())) {
            let values = reports.iter()
                .map(|r| r.get(item).and_then(parse_cell))
                .collect();
            rows.push(StatementRow { item: item.clone(), values });
        }
    }

    Ok(FinancialStatement {
        symbol: body.get("symbol").and_then(Value::as_str).unwrap_or(symbol).to_string(),
        kind,
        fiscal_dates,
        rows,
    })
}

#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AlphaVantageClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        AlphaVantageClient {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub async fn fetch_statement(&self, symbol: &str, kind: StatementKind) -> Result<FinancialStatement> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey("ALPHA_VANTAGE_API_KEY"))?;
        info!("Fetching {} for {} from Alpha Vantage", kind.function(), symbol);

        let body: Value = self.client
            .get(&self.base_url)
            .query(&[("function", kind.function()), ("symbol", symbol), ("apikey", api_key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        transpose_annual_reports(symbol, kind, &body).map_err(|e| {
            error!("Failed to read {} for {}: {}", kind.function(), symbol, e);
            e
        })
    }

    /// All three statements; each one succeeds or fails on its own.
    pub async fn fetch_all(&self, symbol: &str) -> Vec<(StatementKind, Result<FinancialStatement>)> {
        let mut out = Vec::with_capacity(3);
        for kind in StatementKind::all() {
            out.push((kind, self.fetch_statement(symbol, kind).await));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transposes_reports_into_rows() {
        let body = json!({
            "symbol": "IBM",
            "annualReports": [
                {"fiscalDateEnding": "2023-12-31", "reportedCurrency": "USD", "totalAssets": "135241000000", "goodwill": "None"},
                {"fiscalDateEnding": "2022-12-31", "reportedCurrency": "USD", "totalAssets": "127243000000", "goodwill": "55949000000"}
            ]
        });
        let statement = transpose_annual_reports("IBM", StatementKind::BalanceSheet, &body).unwrap();
        assert_eq!(statement.fiscal_dates, vec!["2023-12-31", "2022-12-31"]);
        assert_eq!(statement.rows.len(), 2);
        assert_eq!(statement.rows[0].item, "totalAssets");
        assert_eq!(statement.rows[0].values, vec![Some(135241000000.0), Some(127243000000.0)]);
        assert_eq!(statement.rows[1].item, "goodwill");
        assert_eq!(statement.rows[1].values, vec![None, Some(55949000000.0)]);
    }

    #[test]
    fn throttle_note_is_an_error() {
        let body = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."});
        assert!(matches!(
            transpose_annual_reports("IBM", StatementKind::CashFlow, &body),
            Err(FetchError::Api(_))
        ));
    }

    #[test]
    fn missing_reports_are_no_data() {
        let body = json!({"symbol": "ZZZZ", "annualReports": []});
        assert!(matches!(
            transpose_annual_reports("ZZZZ", StatementKind::IncomeStatement, &body),
            Err(FetchError::NoData(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = AlphaVantageClient::new(Client::new(), None);
        let err = client.fetch_statement("IBM", StatementKind::BalanceSheet).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey(_)));
    }
}
