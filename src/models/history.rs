//! Price history models

use chrono::NaiveDate;
use serde::Deserialize;

/// A single daily price as returned by `/cg/history`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A history point projected into native chart pixels
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}
