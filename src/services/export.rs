// src/services/export.rs
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};
use csv::Writer;
use log::info;

use crate::models::{PriceBar, SmoothedSeries};

const HEADERS: [&str; 9] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume", "SMA", "EMA"];

pub fn export_file_name(ticker: &str) -> String {
    format!("{}_data.csv", ticker)
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the price table with SMA and EMA columns appended. Undefined SMA
/// cells are left empty.
pub fn write_price_csv<W: Write>(out: W, bars: &[PriceBar], smoothed: &SmoothedSeries) -> Result<()> {
    ensure!(
        bars.len() == smoothed.sma.len() && bars.len() == smoothed.ema.len(),
        "price table has {} rows but smoothed series has {}",
        bars.len(),
        smoothed.ema.len()
    );

    let mut wtr = Writer::from_writer(out);
    wtr.write_record(HEADERS)?;
    for ((bar, sma), ema) in bars.iter().zip(&smoothed.sma).zip(&smoothed.ema) {
        wtr.write_record(&[
            bar.date.format("%Y-%m-%d").to_string(),
            cell(bar.open),
            cell(bar.high),
            cell(bar.low),
            cell(bar.close),
            bar.adj_close.to_string(),
            cell(bar.volume),
            cell(*sma),
            ema.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn price_csv_bytes(bars: &[PriceBar], smoothed: &SmoothedSeries) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_price_csv(&mut buf, bars, smoothed)?;
    Ok(buf)
}

/// Writes `<ticker>_data.csv` into `dir` and returns the full path.
pub fn export_to_dir(dir: &Path, ticker: &str, bars: &[PriceBar], smoothed: &SmoothedSeries) -> Result<PathBuf> {
    let path = dir.join(export_file_name(ticker));
    let file = std::fs::File::create(&path)?;
    write_price_csv(file, bars, smoothed)?;
    info!("Wrote {} rows to {}", bars.len(), path.display());
    Ok(path)
}
