use serde_json::Value;
use std::time::Duration;

/// Shortest elapsed time used for throughput, so an instant first event
/// never divides by zero
pub const MIN_ELAPSED: Duration = Duration::from_millis(1);

/// Read `usage.completion_tokens` from a response or stream event
pub fn get_completion_tokens(data: &Value) -> Option<u64> {
    data.get("usage")
        .and_then(|usage| usage.get("completion_tokens"))
        .and_then(|v| v.as_u64())
}

/// Tokens per second, rounded to two decimals
pub fn compute_speed(completion_tokens: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.max(MIN_ELAPSED).as_secs_f64();
    let speed = completion_tokens as f64 / seconds;
    (speed * 100.0).round() / 100.0
}

pub fn format_speed(speed: f64) -> String {
    format!("{:.2}", speed)
}

/// Text field of the first choice, treating `null` and absence alike
pub fn first_choice_text<'a>(data: &'a Value, section: &str, field: &str) -> &'a str {
    data.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get(section))
        .and_then(|section| section.get(field))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
}
