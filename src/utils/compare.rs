use std::borrow::Cow;
use std::cmp::Ordering;

/// A cell value as seen by the column sorter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Null,
    Number(f64),
    Text(&'a str),
}

impl<'a> SortValue<'a> {
    pub fn from_number(value: Option<f64>) -> Self {
        value.map(SortValue::Number).unwrap_or(SortValue::Null)
    }

    fn coerce(&self) -> Cow<'a, str> {
        match *self {
            SortValue::Null => Cow::Borrowed(""),
            SortValue::Number(n) => Cow::Owned(n.to_string()),
            SortValue::Text(s) => Cow::Borrowed(s),
        }
    }
}

/// Total order over nullable cells.
/// Nulls come first, numbers compare numerically, everything else lexically.
pub fn compare(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Null, SortValue::Null) => Ordering::Equal,
        (SortValue::Null, _) => Ordering::Less,
        (_, SortValue::Null) => Ordering::Greater,
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        _ => compare_text(&a.coerce(), &b.coerce()),
    }
}

/// Case-insensitive first; on a tie lower case sorts before upper case
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
