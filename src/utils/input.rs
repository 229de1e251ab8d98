// utils/input.rs
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveTime};
use num_traits::Zero;
use regex::Regex;
use sqlx::types::BigDecimal;

pub const CHANNEL_PREFIX: &str = "whatsapp:";

pub const CLIENT_TOKENS: &[&str] = &["לקוח", "לקוחה", "client", "1"];
pub const PROVIDER_TOKENS: &[&str] = &["מנקה", "מנקה/ה", "provider", "cleaner", "2"];
pub const AREAS_DONE_TOKENS: &[&str] = &["סיום", "סיימתי", "זהו", "done", "0"];
pub const BOOK_TOKENS: &[&str] = &["הזמנה", "הזמן", "book", "order"];
pub const RESET_TOKENS: &[&str] = &["ביטול", "בטל", "reset", "cancel"];
pub const COMPLETE_TOKENS: &[&str] = &["בוצע", "סיימתי", "done", "completed"];

/// Largest amount a `NUMERIC(10, 2)` column holds.
pub const MAX_AMOUNT: &str = "99999999.99";

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").unwrap())
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([01][0-9]|2[0-3]):([0-5][0-9])$").unwrap())
}

/// Strips the messaging channel qualifier from an inbound sender id.
pub fn bare_phone(from: &str) -> String {
    from.trim()
        .strip_prefix(CHANNEL_PREFIX)
        .unwrap_or(from.trim())
        .to_string()
}

/// Case-folded, trimmed token comparison with trailing punctuation ignored.
pub fn matches_token(text: &str, tokens: &[&str]) -> bool {
    let folded = text
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ','))
        .trim()
        .to_lowercase();
    tokens.iter().any(|token| folded == *token)
}

/// Plain decimal amount rounded to agorot. Accepts a currency sign and a
/// decimal comma; exponent notation is rejected.
fn parse_amount(text: &str) -> Result<BigDecimal, String> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('₪')
        .trim_end_matches('₪')
        .trim()
        .replace(',', ".");

    if cleaned.is_empty() {
        return Err("Price is required".to_string());
    }
    if !amount_pattern().is_match(&cleaned) {
        return Err("Invalid price format".to_string());
    }

    let amount = BigDecimal::from_str(&cleaned)
        .map_err(|_| "Invalid price format".to_string())?
        .round(2)
        .with_scale(2);

    let max = BigDecimal::from_str(MAX_AMOUNT).map_err(|e| e.to_string())?;
    if amount > max {
        return Err(format!("Price cannot exceed {}", MAX_AMOUNT));
    }
    Ok(amount)
}

/// Positive amount after rounding, within the stored column range.
pub fn parse_price(text: &str) -> Result<BigDecimal, String> {
    let amount = parse_amount(text)?;
    if amount <= BigDecimal::zero() {
        return Err("Price must be positive".to_string());
    }
    Ok(amount)
}

/// Like `parse_price` but zero is allowed.
pub fn parse_fee(text: &str) -> Result<BigDecimal, String> {
    let amount = parse_amount(text)?;
    if amount < BigDecimal::zero() {
        return Err("Fee cannot be negative".to_string());
    }
    Ok(amount)
}

/// Strict 24-hour `HH:MM`.
pub fn parse_time(text: &str) -> Result<NaiveTime, String> {
    let trimmed = text.trim();
    let caps = time_pattern()
        .captures(trimmed)
        .ok_or_else(|| "Time must match HH:MM".to_string())?;
    let hour: u32 = caps[1].parse().map_err(|_| "Invalid hour".to_string())?;
    let minute: u32 = caps[2].parse().map_err(|_| "Invalid minute".to_string())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| "Invalid time".to_string())
}

/// `DD/MM`, `DD/MM/YY` or `DD/MM/YYYY` (also with `.` or `-`). A date without
/// a year resolves to its next occurrence on or after `today`.
pub fn parse_date(text: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let parts: Vec<&str> = text
        .trim()
        .split(|c| matches!(c, '/' | '.' | '-'))
        .map(str::trim)
        .collect();

    let number = |s: &str| s.parse::<i32>().map_err(|_| "Invalid date format".to_string());

    let date = match parts.as_slice() {
        [day, month] => {
            let (day, month) = (number(day)?, number(month)?);
            let this_year = NaiveDate::from_ymd_opt(today.year(), month as u32, day as u32)
                .ok_or_else(|| "Invalid date".to_string())?;
            if this_year < today {
                NaiveDate::from_ymd_opt(today.year() + 1, month as u32, day as u32)
                    .ok_or_else(|| "Invalid date".to_string())?
            } else {
                this_year
            }
        }
        [day, month, year] => {
            let (day, month, mut year) = (number(day)?, number(month)?, number(year)?);
            if year < 100 {
                year += 2000;
            }
            NaiveDate::from_ymd_opt(year, month as u32, day as u32)
                .ok_or_else(|| "Invalid date".to_string())?
        }
        _ => return Err("Invalid date format".to_string()),
    };

    if date < today {
        return Err("Date is in the past".to_string());
    }
    Ok(date)
}

pub fn parse_ordinal(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok()
}

pub fn parse_rating(text: &str) -> Option<i16> {
    text.trim()
        .parse::<i16>()
        .ok()
        .filter(|rating| (1..=5).contains(rating))
}
