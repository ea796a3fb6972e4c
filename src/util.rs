//! Small helpers shared by the gate, the runner and the console.

/// Score for a correct answer after `elapsed_seconds`: starts at 100, loses a point
/// per second and never drops below 10.
pub fn calculate_score(elapsed_seconds: u64) -> u64 {
  100u64.saturating_sub(elapsed_seconds).max(10)
}

/// Answers are compared server-side in lowercase; trim here so padding never counts.
pub fn normalize_answer(raw: &str) -> String {
  raw.trim().to_lowercase()
}

/// Log-safe truncation for user-provided text.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}
