use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

use crate::models::Row;
use crate::utils::compare::{compare, SortValue};
use crate::utils::format::{format_magnitude, format_number, format_percent, format_rank};

/// Sortable columns of the market table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rank,
    Id,
    Symbol,
    Name,
    Price,
    MarketCap,
    Change24h,
}

impl SortKey {
    /// Column order as rendered
    pub const ALL: [SortKey; 7] = [
        SortKey::Rank,
        SortKey::Id,
        SortKey::Symbol,
        SortKey::Name,
        SortKey::Price,
        SortKey::MarketCap,
        SortKey::Change24h,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Rank => "#",
            SortKey::Id => "ID",
            SortKey::Symbol => "Symbol",
            SortKey::Name => "Name",
            SortKey::Price => "Price",
            SortKey::MarketCap => "Market Cap",
            SortKey::Change24h => "24h",
        }
    }

    pub fn value(self, row: &Row) -> SortValue<'_> {
        match self {
            SortKey::Rank => SortValue::from_number(row.rank.map(|r| r as f64)),
            SortKey::Id => SortValue::Text(&row.id),
            SortKey::Symbol => SortValue::Text(&row.symbol),
            SortKey::Name => SortValue::Text(&row.name),
            SortKey::Price => SortValue::from_number(row.price),
            SortKey::MarketCap => SortValue::from_number(row.market_cap),
            SortKey::Change24h => SortValue::from_number(row.change_24h),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rank" | "#" => Ok(SortKey::Rank),
            "id" => Ok(SortKey::Id),
            "symbol" | "sym" => Ok(SortKey::Symbol),
            "name" => Ok(SortKey::Name),
            "price" => Ok(SortKey::Price),
            "market_cap" | "marketcap" | "cap" | "mcap" => Ok(SortKey::MarketCap),
            "change_24h" | "change" | "24h" => Ok(SortKey::Change24h),
            other => Err(format!(
                "Unknown column: '{}'. Use: rank, id, symbol, name, price, market_cap, change_24h",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Direction::Ascending => "▲",
            Direction::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: Direction,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Rank,
            direction: Direction::Ascending,
        }
    }
}

/// What the view needs to draw the table and its status line
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub shown: usize,
    pub total: usize,
    pub cached: bool,
    pub csv_link: Option<String>,
}

/// Indices of rows whose id, name or symbol contains `filter`, case-insensitively.
/// An empty filter keeps everything.
pub fn filter_rows(rows: &[Row], filter: &str) -> Vec<usize> {
    let needle = filter.trim().to_lowercase();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            needle.is_empty()
                || row.id.to_lowercase().contains(&needle)
                || row.name.to_lowercase().contains(&needle)
                || row.symbol.to_lowercase().contains(&needle)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Stable sort of row indices by the active column
pub fn sort_rows(rows: &[Row], indices: &mut [usize], sort: SortState) {
    indices.sort_by(|&a, &b| {
        let ordering = compare(&sort.key.value(&rows[a]), &sort.key.value(&rows[b]));
        sort.direction.apply(ordering)
    });
}

/// Display cells of one row, in `SortKey::ALL` order
pub fn row_cells(row: &Row) -> Vec<String> {
    vec![
        format_rank(row.rank),
        row.id.clone(),
        row.symbol.to_uppercase(),
        row.name.clone(),
        format_number(row.price, 6),
        format_magnitude(row.market_cap),
        format_percent(row.change_24h),
    ]
}

/// Owns the fetched rows and the filter/sort state of the market table
#[derive(Debug, Default)]
pub struct TableController {
    rows: Vec<Row>,
    filter: String,
    sort: SortState,
    visible: Vec<usize>,
    cached: bool,
    csv_link: Option<String>,
}

impl TableController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[cfg(test)]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[cfg(test)]
    pub fn sort(&self) -> SortState {
        self.sort
    }

    /// Rows currently shown, in display order
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.visible.iter().map(move |&i| &self.rows[i])
    }

    /// Replace the whole row set after a successful load
    pub fn replace_rows(&mut self, rows: Vec<Row>, cached: bool, csv_link: Option<String>) {
        debug!("Replacing {} rows with {} (cached: {})", self.rows.len(), rows.len(), cached);
        self.rows = rows;
        self.cached = cached;
        self.csv_link = csv_link;
        self.apply_filter_and_sort();
    }

    /// Drop everything after a failed load
    pub fn clear(&mut self) {
        self.rows.clear();
        self.visible.clear();
        self.cached = false;
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.apply_filter_and_sort();
    }

    /// Header click: same column flips direction, another column sorts ascending
    pub fn click_header(&mut self, key: SortKey) {
        if self.sort.key == key {
            self.sort.direction = self.sort.direction.flipped();
        } else {
            self.sort = SortState {
                key,
                direction: Direction::Ascending,
            };
        }
        self.apply_filter_and_sort();
    }

    /// Recompute the visible set as sort(filter(rows))
    pub fn apply_filter_and_sort(&mut self) -> &[usize] {
        let mut visible = filter_rows(&self.rows, &self.filter);
        sort_rows(&self.rows, &mut visible, self.sort);
        self.visible = visible;
        &self.visible
    }

    /// Up to `limit` loaded coin ids starting with `prefix`
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let prefix = prefix.trim().to_lowercase();
        self.rows
            .iter()
            .map(|r| r.id.as_str())
            .filter(|id| !id.is_empty() && id.starts_with(&prefix))
            .take(limit)
            .collect()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let headers = SortKey::ALL
            .iter()
            .map(|&key| {
                if key == self.sort.key {
                    format!("{} {}", key.label(), self.sort.direction.indicator())
                } else {
                    key.label().to_string()
                }
            })
            .collect();

        TableSnapshot {
            headers,
            rows: self.visible_rows().map(row_cells).collect(),
            shown: self.visible.len(),
            total: self.rows.len(),
            cached: self.cached,
            csv_link: self.csv_link.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rank: Option<i64>, id: &str, symbol: &str, name: &str, price: Option<f64>) -> Row {
        Row {
            rank,
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            market_cap: price.map(|p| p * 1e6),
            change_24h: None,
        }
    }

    fn sample() -> Vec<Row> {
        vec![
            row(Some(1), "bitcoin", "btc", "Bitcoin", Some(65000.0)),
            row(Some(2), "ethereum", "eth", "Ethereum", Some(3200.0)),
            row(None, "wrapped-bitcoin", "wbtc", "Wrapped Bitcoin", Some(64990.0)),
            row(Some(3), "tether", "usdt", "Tether", None),
        ]
    }

    fn visible_ids(table: &TableController) -> Vec<String> {
        table.visible_rows().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_filter_matches_id_name_symbol() {
        let rows = sample();
        assert_eq!(filter_rows(&rows, ""), vec![0, 1, 2, 3]);
        assert_eq!(filter_rows(&rows, "BTC"), vec![0, 2]);
        assert_eq!(filter_rows(&rows, "wrapped"), vec![2]);
        assert_eq!(filter_rows(&rows, "ereum"), vec![1]);
        assert_eq!(filter_rows(&rows, "ether"), vec![1, 3]);
        assert!(filter_rows(&rows, "doge").is_empty());
    }

    #[test]
    fn test_default_sort_is_rank_ascending_nulls_first() {
        let mut table = TableController::new();
        table.replace_rows(sample(), false, None);
        assert_eq!(visible_ids(&table), vec!["wrapped-bitcoin", "bitcoin", "ethereum", "tether"]);
    }

    #[test]
    fn test_header_clicks_toggle_and_reset() {
        let mut table = TableController::new();
        table.replace_rows(sample(), false, None);

        table.click_header(SortKey::Price);
        assert_eq!(table.sort(), SortState { key: SortKey::Price, direction: Direction::Ascending });
        assert_eq!(visible_ids(&table), vec!["tether", "ethereum", "wrapped-bitcoin", "bitcoin"]);

        table.click_header(SortKey::Price);
        assert_eq!(table.sort().direction, Direction::Descending);
        assert_eq!(visible_ids(&table), vec!["bitcoin", "wrapped-bitcoin", "ethereum", "tether"]);

        table.click_header(SortKey::Name);
        assert_eq!(table.sort(), SortState { key: SortKey::Name, direction: Direction::Ascending });
    }

    #[test]
    fn test_resorting_is_idempotent_and_source_untouched() {
        let mut table = TableController::new();
        table.replace_rows(sample(), false, None);
        table.click_header(SortKey::Symbol);

        let first = visible_ids(&table);
        table.apply_filter_and_sort();
        assert_eq!(visible_ids(&table), first);
        assert_eq!(table.rows(), sample().as_slice());
    }

    #[test]
    fn test_filter_then_sort() {
        let mut table = TableController::new();
        table.replace_rows(sample(), true, Some("http://x/cg/top.csv".to_string()));
        table.click_header(SortKey::Price);
        table.click_header(SortKey::Price);
        table.set_filter("bitcoin");

        let snap = table.snapshot();
        assert_eq!(snap.shown, 2);
        assert_eq!(snap.total, 4);
        assert!(snap.cached);
        assert_eq!(snap.rows[0][1], "bitcoin");
        assert_eq!(snap.rows[1][1], "wrapped-bitcoin");
    }

    #[test]
    fn test_indicator_only_on_active_header() {
        let mut table = TableController::new();
        table.click_header(SortKey::MarketCap);
        let snap = table.snapshot();
        let marked: Vec<&String> = snap.headers.iter().filter(|h| h.contains('▲') || h.contains('▼')).collect();
        assert_eq!(marked, vec!["Market Cap ▲"]);
    }

    #[test]
    fn test_bitcoin_scenario_cells() {
        let item = crate::api::proxy::models::TopItem {
            market_cap_rank: Some(1),
            id: Some("bitcoin".to_string()),
            symbol: Some("btc".to_string()),
            name: Some("Bitcoin".to_string()),
            current_price: Some(65000.1234),
            market_cap: Some(1.28e12),
            price_change_percentage_24h: None,
        };
        let cells = row_cells(&Row::from(item));
        assert_eq!(cells, vec!["1", "bitcoin", "BTC", "Bitcoin", "65000.123400", "1.28T", "—"]);
    }

    #[test]
    fn test_clear_and_suggest() {
        let mut table = TableController::new();
        table.replace_rows(sample(), false, None);
        assert_eq!(table.suggest("b", 5), vec!["bitcoin"]);
        assert_eq!(table.suggest("", 2), vec!["bitcoin", "ethereum"]);

        table.clear();
        assert_eq!(table.snapshot().shown, 0);
        assert_eq!(table.snapshot().total, 0);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("market_cap".parse::<SortKey>(), Ok(SortKey::MarketCap));
        assert_eq!("PRICE".parse::<SortKey>(), Ok(SortKey::Price));
        assert!("volume".parse::<SortKey>().is_err());
    }
}
