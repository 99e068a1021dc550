//! Formatting helpers shared by listings and reports.

/// Number of decimal digits needed to print indices `0..count`.
///
/// # Examples
/// ```
/// use pngine_core::utils::width_for_count;
/// assert_eq!(width_for_count(0), 1);
/// assert_eq!(width_for_count(10), 1);
/// assert_eq!(width_for_count(11), 2);
/// ```
pub fn width_for_count(count: usize) -> usize {
    let mut max = count.saturating_sub(1);
    let mut width = 1;
    while max >= 10 {
        max /= 10;
        width += 1;
    }
    width
}

/// Lowercase hex encoding without separators.
pub fn to_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0xF) as usize] as char);
    }
    out
}

/// Decode lowercase or uppercase hex. Returns `None` on odd length or a
/// non-hex digit.
pub fn from_hex(text: &str) -> Option<Vec<u8>> {
    let text = text.as_bytes();
    if text.len() % 2 != 0 {
        return None;
    }
    text.chunks_exact(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

/// Quote a string for listings, escaping `"`, `\` and control characters.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
