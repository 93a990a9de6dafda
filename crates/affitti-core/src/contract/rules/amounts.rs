//! Amount parsing and formatting in Italian notation.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse an Italian-formatted amount (e.g., "12.360,00", "€ 250" or "1030,50").
///
/// Currency symbols and spaces are ignored; a minus sign before the first
/// digit ("-500", "€ -250") makes the amount negative. Returns `None` when no
/// number can be read, which callers treat as "not found".
pub fn parse_italian_amount(s: &str) -> Option<Decimal> {
    let negative = s
        .split(|c: char| c.is_ascii_digit())
        .next()
        .is_some_and(|prefix| prefix.contains('-'));

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    // Sentence punctuation often trails the captured number.
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ',');
    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => cleaned.to_string(),
        (_, 0) if commas > 1 => cleaned.replace(',', ""),
        (_, 0) => cleaned.replace(',', "."),
        (0, _) if dots > 1 || is_thousands_group(cleaned, '.') => cleaned.replace('.', ""),
        (0, _) => cleaned.to_string(),
        _ => {
            // Both separators: the last one is the decimal separator.
            let comma_pos = cleaned.rfind(',');
            let dot_pos = cleaned.rfind('.');
            match (comma_pos, dot_pos) {
                (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
                _ => cleaned.replace(',', ""),
            }
        }
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Format amount in Italian style (12.360,00).
pub fn format_italian_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let Some((integer_part, decimal_part)) = digits.split_once('.') else {
        return s;
    };

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{}{},{}", sign, formatted, decimal_part)
}

/// Format amount with the euro sign (€12.360,00).
pub fn format_euro(amount: Decimal) -> String {
    format!("€{}", format_italian_amount(amount))
}

/// A single separator followed by exactly three digits reads as thousands.
fn is_thousands_group(s: &str, separator: char) -> bool {
    match s.split_once(separator) {
        Some((head, tail)) => !head.is_empty() && tail.len() == 3,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_italian_amount() {
        assert_eq!(parse_italian_amount("12.360,00"), Some(dec("12360.00")));
        assert_eq!(parse_italian_amount("12360"), Some(dec("12360")));
        assert_eq!(parse_italian_amount("1030,50"), Some(dec("1030.50")));
        assert_eq!(parse_italian_amount("€ 250"), Some(dec("250")));
        assert_eq!(parse_italian_amount("12.360"), Some(dec("12360")));
        assert_eq!(parse_italian_amount("1.234.567,89"), Some(dec("1234567.89")));
    }

    #[test]
    fn test_parse_english_notation() {
        assert_eq!(parse_italian_amount("12,360.00"), Some(dec("12360.00")));
        assert_eq!(parse_italian_amount("1030.50"), Some(dec("1030.50")));
    }

    #[test]
    fn test_parse_trailing_punctuation() {
        assert_eq!(parse_italian_amount("12.360,00."), Some(dec("12360.00")));
        assert_eq!(parse_italian_amount("250,"), Some(dec("250")));
    }

    #[test]
    fn test_parse_negative_amount() {
        assert_eq!(parse_italian_amount("-500"), Some(dec("-500")));
        assert_eq!(parse_italian_amount("€ -1.250,50"), Some(dec("-1250.50")));
        assert_eq!(parse_italian_amount("-0"), Some(Decimal::ZERO));
        // A trailing dash is not a sign.
        assert_eq!(parse_italian_amount("250,- euro"), Some(dec("250")));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert_eq!(parse_italian_amount("euro"), None);
        assert_eq!(parse_italian_amount(""), None);
        assert_eq!(parse_italian_amount("..."), None);
    }

    #[test]
    fn test_format_italian_amount() {
        assert_eq!(format_italian_amount(dec("12360")), "12.360,00");
        assert_eq!(format_italian_amount(dec("370.8")), "370,80");
        assert_eq!(format_italian_amount(dec("1234567.891")), "1.234.567,89");
        assert_eq!(format_italian_amount(dec("-4944")), "-4.944,00");
        assert_eq!(format_euro(dec("250")), "€250,00");
    }
}
