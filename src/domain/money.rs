use std::fmt;

/// Money is held as integer cents so long debit/credit accumulations never
/// pick up binary floating-point drift. Rs 50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a plain decimal string: 5000 -> "50.00", -125 -> "-1.25".
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal amount string into cents.
/// "1000" -> 100000, "12.5" -> 1250, ".50" -> 50. Extra decimal digits are
/// truncated, matching how the back office rounds entered amounts.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, frac_str) = match digits.split_once('.') {
        Some((u, f)) => (u, f),
        None => (digits, ""),
    };

    if units_str.is_empty() && frac_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !frac_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let frac: i64 = match frac_str.len() {
        0 => 0,
        1 => {
            frac_str
                .parse::<i64>()
                .map_err(|_| ParseCentsError::InvalidFormat)?
                * 10
        }
        _ => frac_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units * 100 + frac;
    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
