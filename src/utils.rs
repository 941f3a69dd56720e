use std::borrow::Cow;

const UTF8_BOM: &str = "\u{feff}";

/// Decodes a fetched source file into text.
///
/// UTF-8 is tried first (a leading byte order mark is dropped). Files that are not valid
/// UTF-8 are read as Latin-1, which is what older exports of the accident atlas use.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text.strip_prefix(UTF8_BOM).unwrap_or(text)),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Trims a raw cell and removes stray carriage returns.
pub(crate) fn clean_cell(raw: &str) -> &str {
    raw.trim().trim_end_matches('\r').trim()
}

/// Parses a decimal number that may use `,` as the decimal separator.
///
/// Returns `None` for anything that does not parse to a finite value.
///
/// # Examples
///
/// ```
/// use velostat::parse_decimal;
///
/// assert_eq!(parse_decimal(" 7,6254\r"), Some(7.6254));
/// assert_eq!(parse_decimal("51.96"), Some(51.96));
/// assert_eq!(parse_decimal(""), None);
/// ```
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned = clean_cell(raw).replace(',', ".");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats minutes since midnight as `HH:MM`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parses `HH:MM` into minutes since midnight.
pub fn parse_clock(text: &str) -> Option<u32> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// The selectable start/end times of a day in quarter hour steps (`00:00` … `23:45`).
pub fn time_options() -> Vec<String> {
    (0..24 * 60).step_by(15).map(format_minutes).collect()
}

/// English month name for `1..=12`.
pub fn month_name(month: u32) -> Option<&'static str> {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Rounds to two decimal places.
pub(crate) fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
