//! Display formatting for nullable market values

/// Shown wherever a value is missing or not a number
pub const PLACEHOLDER: &str = "—";

/// Fixed-point string with `digits` decimals, or the placeholder
pub fn format_number(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.*}", digits, v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Market-cap style formatting with T/B/M suffixes
/// Examples: 1.28e12 -> "1.28T", 1_500_000_000 -> "1.50B", 999 -> "999"
pub fn format_magnitude(value: Option<f64>) -> String {
    let v = match value {
        Some(v) if !v.is_nan() => v,
        _ => return PLACEHOLDER.to_string(),
    };

    if v >= 1e12 {
        format!("{:.2}T", v / 1e12)
    } else if v >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if v >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else {
        format!("{:.0}", v)
    }
}

pub fn format_rank(rank: Option<i64>) -> String {
    rank.map(|r| r.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Percentage with two decimals and a trailing `%`
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.2}%", v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Shortest decimal form of a user-entered amount (`2`, not `2.0`)
pub fn format_amount(amount: f64) -> String {
    amount.to_string()
}

/// Axis label for a price gridline; precision follows the magnitude
pub fn format_axis_value(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1000.0 {
        format_number(Some(value), 0)
    } else if abs >= 1.0 {
        format_number(Some(value), 2)
    } else {
        format_number(Some(value), 6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(None, 2), "—");
        assert_eq!(format_number(Some(f64::NAN), 2), "—");
        assert_eq!(format_number(Some(3.14159), 2), "3.14");
        assert_eq!(format_number(Some(65000.1234), 6), "65000.123400");
    }

    #[test]
    fn test_format_magnitude() {
        assert_eq!(format_magnitude(Some(1_500_000_000.0)), "1.50B");
        assert_eq!(format_magnitude(Some(999.0)), "999");
        assert_eq!(format_magnitude(Some(1.28e12)), "1.28T");
        assert_eq!(format_magnitude(Some(2_345_678.0)), "2.35M");
        assert_eq!(format_magnitude(None), "—");
        assert_eq!(format_magnitude(Some(f64::NAN)), "—");
    }

    #[test]
    fn test_small_formatters() {
        assert_eq!(format_rank(Some(1)), "1");
        assert_eq!(format_rank(None), "—");
        assert_eq!(format_percent(Some(-1.234)), "-1.23%");
        assert_eq!(format_percent(None), "—");
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_axis_value(65000.4), "65000");
        assert_eq!(format_axis_value(0.25), "0.250000");
    }
}
