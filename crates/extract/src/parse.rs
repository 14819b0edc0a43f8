use crate::consts;
use crate::models::SeriesHint;
use std::collections::HashSet;
use time::{Date, Month};

/// Split an embedded keyword string into tags.
///
/// Separators are `,` and `;`. Entries are trimmed, empties dropped, and
/// later entries that differ from an earlier one only by case are dropped.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    consts::KEYWORD_SEPARATOR_REGEX
        .split(raw)
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.to_lowercase()))
        .map(String::from)
        .collect()
}

/// Parse a PDF (`D:YYYYMMDDHHmmSS...`) or ISO (`YYYY-MM-DD`) date.
///
/// Missing month or day default to the first. Anything unparsable is `None`.
pub fn parse_pdf_date(raw: &str) -> Option<Date> {
    let captures = consts::DATE_REGEX.captures(raw.trim())?;
    let year: i32 = captures.get(1)?.as_str().parse().ok()?;
    let month: u8 = captures.get(2).map_or(Some(1), |m| m.as_str().parse().ok())?;
    let day: u8 = captures.get(3).map_or(Some(1), |m| m.as_str().parse().ok())?;
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Guess a series name and volume from a trailing number on `stem`.
pub fn parse_series(stem: &str) -> Option<SeriesHint> {
    let captures = consts::SERIES_REGEX.captures(stem.trim())?;
    let name = captures.get(1)?.as_str().trim_end_matches([' ', '_', '-']).trim();
    if name.is_empty() {
        return None;
    }
    let volume = captures.get(2)?.as_str().parse().ok()?;
    Some(SeriesHint { name: name.to_string(), volume })
}
