use chrono::NaiveDateTime;

/// Format a price with thousands separators, dropping a zero fraction.
/// `15000.0` becomes `15,000`, `1234.5` becomes `1,234.50`.
pub fn format_price(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative && cents > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, fraction)
    }
}

/// Format a phone number for display
/// Normalizes 10/11-digit mobile numbers to XXX-XXXX-XXXX style
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        11 => format!("{}-{}-{}", &digits[0..3], &digits[3..7], &digits[7..11]),
        10 => format!("{}-{}-{}", &digits[0..3], &digits[3..6], &digits[6..10]),
        _ => phone.to_string(),
    }
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or empty
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

pub fn format_date(date: Option<&NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0.0), "0");
        assert_eq!(format_price(999.0), "999");
        assert_eq!(format_price(15000.0), "15,000");
        assert_eq!(format_price(1234567.0), "1,234,567");
        assert_eq!(format_price(1234.5), "1,234.50");
        assert_eq!(format_price(-2500.0), "-2,500");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("01012345678"), "010-1234-5678");
        assert_eq!(format_phone("010-1234-5678"), "010-1234-5678");
        assert_eq!(format_phone("0212345678"), "021-234-5678");
        assert_eq!(format_phone("123"), "123");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("배송완료입니다", 5), "배송...");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(&Some("Seoul".to_string()), "-"), "Seoul");
        assert_eq!(format_optional(&Some(" ".to_string()), "-"), "-");
        assert_eq!(format_optional(&None, "N/A"), "N/A");
    }

    #[test]
    fn test_format_date() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 30, 15)
            .unwrap();
        assert_eq!(format_date(Some(&dt)), "2024-05-01 14:30");
        assert_eq!(format_date(None), "-");
    }
}
