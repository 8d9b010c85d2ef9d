/// Format a dollar amount with thousands separators, e.g. `$1,250,000`.
pub fn format_usd(value: f64, decimals: usize) -> String {
    let formatted = match decimals {
        0 => format!("{:.0}", value.abs()),
        _ => format!("{:.2}", value.abs()),
    };

    let (int_part, dec_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    let mut int_with_commas = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            int_with_commas.push(',');
        }
        int_with_commas.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match dec_part {
        Some(d) if decimals > 0 => format!("{sign}${int_with_commas}.{d}"),
        _ => format!("{sign}${int_with_commas}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_usd(1_250_000.0, 0), "$1,250,000");
        assert_eq!(format_usd(999.0, 0), "$999");
        assert_eq!(format_usd(1234.5, 2), "$1,234.50");
        assert_eq!(format_usd(-45_000.0, 0), "-$45,000");
    }
}
