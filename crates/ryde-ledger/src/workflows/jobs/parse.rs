//! Boundary parsers for the free-text forms jobs arrive with. The core
//! model keeps strictly numeric values; everything here runs once at the
//! edge (HTTP requests, CSV imports, CLI arguments).

/// Extract the leading numeric magnitude from a distance string such as
/// "12.4 mi" or "1,204 km". Returns `None` when no digits lead the text.
pub fn parse_distance_miles(raw: &str) -> Option<f64> {
    leading_number(raw)
}

/// Parse duration text of the shape "1 hr 15 mins", "2 hours", "45 min",
/// or a bare integer taken as minutes. Unrecognized text yields `None`.
pub fn parse_duration_minutes(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(minutes) = trimmed.parse::<u32>() {
        return Some(minutes);
    }

    let mut total: Option<u32> = None;
    let mut pending: Option<u32> = None;

    for token in trimmed.split_whitespace() {
        let cleaned = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if cleaned.is_empty() {
            continue;
        }

        if let Ok(value) = cleaned.parse::<u32>() {
            pending = Some(value);
            continue;
        }

        let unit = cleaned.to_ascii_lowercase();
        let value = match pending.take() {
            Some(value) => value,
            None => continue,
        };

        // Overflow means the text was never a real duration.
        if unit.starts_with("h") {
            let minutes = value.checked_mul(60)?;
            total = Some(total.unwrap_or(0).checked_add(minutes)?);
        } else if unit.starts_with("m") {
            total = Some(total.unwrap_or(0).checked_add(value)?);
        }
    }

    total
}

/// Best-effort parse of a currency-formatted amount ("£60", "$12.50",
/// "1,250.00 GBP").
pub fn parse_money(raw: &str) -> Option<f64> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok()
}

fn leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let mut digits = String::new();

    for c in trimmed.chars() {
        match c {
            '0'..='9' | '.' => digits.push(c),
            // Thousands separator inside a number.
            ',' if !digits.is_empty() => continue,
            _ => break,
        }
    }

    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_takes_leading_magnitude() {
        assert_eq!(parse_distance_miles("12.4 mi"), Some(12.4));
        assert_eq!(parse_distance_miles("1,204 km"), Some(1204.0));
        assert_eq!(parse_distance_miles("0 mi"), Some(0.0));
        assert_eq!(parse_distance_miles("about 5 mi"), None);
        assert_eq!(parse_distance_miles(""), None);
    }

    #[test]
    fn duration_understands_hours_and_minutes() {
        assert_eq!(parse_duration_minutes("1 hr 15 mins"), Some(75));
        assert_eq!(parse_duration_minutes("2 hours"), Some(120));
        assert_eq!(parse_duration_minutes("45 min"), Some(45));
        assert_eq!(parse_duration_minutes("90"), Some(90));
        assert_eq!(parse_duration_minutes("soon"), None);
        assert_eq!(parse_duration_minutes(""), None);
    }

    #[test]
    fn oversized_durations_are_rejected_not_wrapped() {
        assert_eq!(parse_duration_minutes("71582789 hours"), None);
        assert_eq!(parse_duration_minutes("4294967295 mins 1 min"), None);
        assert_eq!(parse_duration_minutes("71582788 hours"), Some(71_582_788 * 60));
    }

    #[test]
    fn money_ignores_symbols_and_separators() {
        assert_eq!(parse_money("£60"), Some(60.0));
        assert_eq!(parse_money("$12.50"), Some(12.5));
        assert_eq!(parse_money("1,250.00 GBP"), Some(1250.0));
        assert_eq!(parse_money("tbd"), None);
    }
}
