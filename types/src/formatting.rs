//! Number and time formatting for check reports.
//!
//! All user-facing numbers in reports go through this module so the CLI and
//! any other front end print timestamps and accuracy the same way, including
//! European-style number formatting (swapping `.` and `,`).

/// Swap `.` and `,` in a formatted number.
fn europeanize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '.' => ',',
            ',' => '.',
            _ => c,
        })
        .collect()
}

#[inline]
fn maybe_eu(s: String, european: bool) -> String {
    if european { europeanize(&s) } else { s }
}

/// Format a percentage value with 1 decimal place.
///
/// # Examples
/// ```
/// use apl_types::formatting::format_pct;
/// assert_eq!(format_pct(42.7, false), "42.7%");
/// assert_eq!(format_pct(42.7, true), "42,7%");
/// ```
pub fn format_pct(n: f64, european: bool) -> String {
    maybe_eu(format!("{:.1}%", n), european)
}

/// Format an accuracy ratio (0.0..=1.0) as a percentage.
///
/// `None` means there was nothing to measure and is shown as `"-"`.
///
/// # Examples
/// ```
/// use apl_types::formatting::format_accuracy;
/// assert_eq!(format_accuracy(Some(0.75), false), "75.0%");
/// assert_eq!(format_accuracy(Some(0.5), true), "50,0%");
/// assert_eq!(format_accuracy(None, false), "-");
/// ```
pub fn format_accuracy(ratio: Option<f64>, european: bool) -> String {
    match ratio {
        Some(r) => format_pct(r * 100.0, european),
        None => "-".to_string(),
    }
}

/// Format a millisecond timestamp as `M:SS.mmm`.
///
/// Negative values (events before the reference point) get a leading `-`.
///
/// # Examples
/// ```
/// use apl_types::formatting::format_timestamp;
/// assert_eq!(format_timestamp(0, false), "0:00.000");
/// assert_eq!(format_timestamp(125_250, false), "2:05.250");
/// assert_eq!(format_timestamp(125_250, true), "2:05,250");
/// assert_eq!(format_timestamp(-1_500, false), "-0:01.500");
/// ```
pub fn format_timestamp(ms: i64, european: bool) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();
    let mins = ms / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    maybe_eu(format!("{sign}{mins}:{secs:02}.{millis:03}"), european)
}

/// Format a timestamp relative to an optional fight start.
///
/// Without a start the raw timestamp is formatted.
///
/// # Examples
/// ```
/// use apl_types::formatting::format_fight_time;
/// assert_eq!(format_fight_time(11_000, Some(10_000), false), "0:01.000");
/// assert_eq!(format_fight_time(9_000, Some(10_000), false), "-0:01.000");
/// assert_eq!(format_fight_time(9_000, None, false), "0:09.000");
/// ```
pub fn format_fight_time(timestamp: i64, fight_start: Option<i64>, european: bool) -> String {
    format_timestamp(timestamp.saturating_sub(fight_start.unwrap_or(0)), european)
}
