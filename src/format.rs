/// Amount and address formatting helpers
use crate::error::FlowError;

const NANO_DIGITS: usize = 9;
const NANO_PER_TON: u128 = 1_000_000_000;

/// Convert an integer nanoton string into a decimal TON string
///
/// Examples:
/// - "1500000000" → "1.5"
/// - "42" → "0.000000042"
/// - "3000000000" → "3"
pub fn from_nano(value: &str) -> Result<String, FlowError> {
    let nano: u128 = value
        .trim()
        .parse()
        .map_err(|_| FlowError::InvalidAmount(value.to_string()))?;

    let whole = nano / NANO_PER_TON;
    let frac = nano % NANO_PER_TON;
    if frac == 0 {
        return Ok(whole.to_string());
    }

    let frac = format!("{:0width$}", frac, width = NANO_DIGITS);
    Ok(format!("{}.{}", whole, frac.trim_end_matches('0')))
}

/// Parse a user-entered TON amount into nanotons
pub fn to_nano(amount: &str) -> Result<u128, FlowError> {
    let invalid = || FlowError::InvalidAmount(amount.to_string());
    let trimmed = amount.trim();

    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > NANO_DIGITS
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let frac: u128 = if frac.is_empty() {
        0
    } else {
        format!("{:0<width$}", frac, width = NANO_DIGITS)
            .parse()
            .map_err(|_| invalid())?
    };

    whole
        .checked_mul(NANO_PER_TON)
        .and_then(|n| n.checked_add(frac))
        .ok_or_else(invalid)
}

/// Format a TON value with at most 4 fraction digits and grouped thousands
pub fn format_ton(value: f64) -> String {
    let fixed = format!("{:.4}", value);
    let (whole, frac) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", whole),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

/// Shorten an address to its first and last four characters
pub fn to_short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}....{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nano() {
        assert_eq!(from_nano("1500000000"), Ok("1.5".to_string()));
        assert_eq!(from_nano("3000000000"), Ok("3".to_string()));
        assert_eq!(from_nano("42"), Ok("0.000000042".to_string()));
        assert_eq!(from_nano("0"), Ok("0".to_string()));
        assert!(from_nano("-5").is_err());
        assert!(from_nano("abc").is_err());
    }

    #[test]
    fn test_to_nano() {
        assert_eq!(to_nano("1.5"), Ok(1_500_000_000));
        assert_eq!(to_nano("0.000000001"), Ok(1));
        assert_eq!(to_nano(".5"), Ok(500_000_000));
        assert_eq!(to_nano("12"), Ok(12_000_000_000));
        assert!(to_nano("").is_err());
        assert!(to_nano(".").is_err());
        assert!(to_nano("1.0000000001").is_err());
        assert!(to_nano("1e9").is_err());
        assert!(to_nano("-1").is_err());
    }

    #[test]
    fn test_format_ton() {
        assert_eq!(format_ton(0.0123456), "0.0123");
        assert_eq!(format_ton(1.5), "1.5");
        assert_eq!(format_ton(2.0), "2");
        assert_eq!(format_ton(1234567.25), "1,234,567.25");
    }

    #[test]
    fn test_to_short_address() {
        assert_eq!(
            to_short_address("EQD4FPq-PRDieyQKkizFTRtSDyucUIqrj0v_zXJmqaDp6_0t"),
            "EQD4....6_0t"
        );
        assert_eq!(to_short_address("abcdefgh"), "abcd....efgh");
        assert_eq!(to_short_address("short"), "shor....hort");
    }
}
