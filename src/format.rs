//! Number formatting for dashboard values
//!
//! Currency amounts are grouped with thousands separators ("$1,234.57"),
//! percentages keep two decimals ("-2.50%").

/// Formats `value` with `decimals` fraction digits and comma-grouped thousands
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.00" reads oddly, so only mark values that survive rounding
    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Currency prefix for a vs-currency code ("usd" -> "$")
pub fn currency_prefix(currency: &str) -> String {
    match currency.to_lowercase().as_str() {
        "usd" | "aud" | "cad" => "$".to_string(),
        "eur" => "€".to_string(),
        "gbp" => "£".to_string(),
        other => format!("{} ", other.to_uppercase()),
    }
}

/// Formats a currency amount, e.g. `format_currency(1234.567, "usd", 2)` -> "$1,234.57"
pub fn format_currency(value: f64, currency: &str, decimals: usize) -> String {
    let body = group_thousands(value, decimals);
    let prefix = currency_prefix(currency);
    match body.strip_prefix('-') {
        Some(abs) => format!("-{}{}", prefix, abs),
        None => format!("{}{}", prefix, body),
    }
}

/// Formats a percentage with two decimals, e.g. `-2.5` -> "-2.50%"
pub fn format_percent(value: f64) -> String {
    format!("{}%", group_thousands(value, 2))
}

/// Short form for axis labels, e.g. `281_234_567_890.0` -> "281.2B"
pub fn format_compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    for (scale, suffix) in UNITS {
        if abs >= scale {
            return format!("{}{:.1}{}", sign, abs / scale, suffix);
        }
    }
    format!("{}{:.2}", sign, abs)
}
