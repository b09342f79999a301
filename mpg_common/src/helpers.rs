use chrono::Utc;

/// Truncate `s` to at most `max_bytes`, backing up to the nearest character boundary so the
/// result is always valid UTF-8. Used to keep upstream error bodies to a loggable size.
pub fn truncate_snippet(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// Current unix time in whole seconds, as stamped onto every signed gateway request.
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}
