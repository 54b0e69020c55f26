//! Pure normalization of raw recipe form input.
//!
//! None of these functions fail: malformed input collapses to a documented
//! default so a recipe submission is never rejected over formatting.

/// Splits multi-line text into its non-blank lines, preserving order.
///
/// Both `\n` and `\r\n` separate lines. A line is blank when it is empty after
/// trimming; kept lines are returned as typed.
///
/// # Example
///
/// ```
/// use recipebox_core::recipe::split_lines;
///
/// assert_eq!(split_lines("a\n\nb\n "), vec!["a", "b"]);
/// ```
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Coerces free-text numeric input to a non-negative count. Defaults to 0.
///
/// Parsing reads the longest run of leading digits after optional whitespace
/// and an optional `+`, so `"15 min"` is 15 and `"2.5"` is 2. Input without
/// leading digits, or with a leading `-`, yields 0. Values beyond `u32::MAX`
/// saturate.
pub fn parse_count(input: &str) -> u32 {
    let trimmed = input.trim_start();
    let unsigned = match trimmed.as_bytes().first() {
        Some(b'+') => &trimmed[1..],
        Some(b'-') => return 0,
        _ => trimmed,
    };

    let digits_len = unsigned
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return 0;
    }

    unsigned[..digits_len]
        .bytes()
        .fold(0u32, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
        })
}

/// Trims `text` and maps the empty result to `None`.
pub fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
