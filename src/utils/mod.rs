use regex::Regex;
use std::sync::LazyLock;

pub mod html;
pub mod version;

/// Simulation ticks per second of game time.
pub const FRAMES_PER_SECOND: i64 = 40;

static LEADING_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

// Characters the legacy clients never send in free text; '|' would also break the pipe format.
const STRIPPED_CHARS: &[char] = &[
    '$', '%', '^', '&', '_', '+', '{', '}', '|', '"', '<', '>', '?', '[', ']', '\\', ';', '\'',
    '/', '~', '`', '=',
];

pub fn clean_str(text: &str) -> String {
    text.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

/// `clean_str`, cut to at most `max_chars` characters so it fits its column.
pub fn clean_field(text: &str, max_chars: usize) -> String {
    clean_str(text).chars().take(max_chars).collect()
}

/// Integer from the leading digits of `text`; anything unparsable is 0.
pub fn lenient_int(text: &str) -> i64 {
    LEADING_INT
        .captures(text)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .unwrap_or(0)
}

pub fn lenient_i32(text: &str) -> i32 {
    lenient_int(text).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

pub fn lenient_f32(text: &str) -> f32 {
    let cleaned = text.trim();
    match cleaned.parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => lenient_int(cleaned) as f32,
    }
}

pub fn frames_to_minutes(frames: i64) -> f64 {
    frames as f64 / FRAMES_PER_SECOND as f64 / 60.0
}

/// `HH:MM:SS` of game time for a frame count.
pub fn frames_to_time_string(frames: i64) -> String {
    let total_secs = frames.max(0) / FRAMES_PER_SECOND;
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}
