//! Data models shared by the controllers, the chart and the proxy client
//!
//! Wire shapes live in `api::proxy::models`; these are the normalized forms
//! the rest of the application works with.

pub mod row;
pub mod history;

pub use row::Row;
pub use history::{HistoryPoint, PlottedPoint};
