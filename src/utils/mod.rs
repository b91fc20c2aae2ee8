use std::time::{Duration, Instant};
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.elapsed()
        );
    }
}

/// Round to 2 decimals for display. Never applied to stored aggregates.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Group an unsigned digit string with thousands separators.
fn group_thousands(digits: &str) -> String {
    let mut result = String::new();
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Format a count with thousands separators.
pub fn fmt_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Format an amount with thousands separators and exactly 2 decimals.
/// 1234567.891 → "1,234,567.89" | -0.000001 → "0.00"
pub fn fmt_amount(x: f64) -> String {
    let rounded = round2(x);
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
}

/// Percentage with 2 decimals, e.g. "91.33%".
pub fn fmt_pct(x: f64) -> String {
    format!("{:.2}%", round2(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_count() {
        assert_eq!(fmt_count(1_234_567), "1,234,567");
        assert_eq!(fmt_count(0), "0");
        assert_eq!(fmt_count(999), "999");
    }

    #[test]
    fn test_fmt_amount() {
        assert_eq!(fmt_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(fmt_amount(13700.0), "13,700.00");
        assert_eq!(fmt_amount(-42_000.5), "-42,000.50");
        assert_eq!(fmt_amount(-0.000001), "0.00");
        assert_eq!(fmt_amount(0.0), "0.00");
    }

    #[test]
    fn test_round2_and_pct() {
        assert_eq!(round2(91.3333), 91.33);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(fmt_pct(40.0), "40.00%");
        assert_eq!(fmt_pct(33.33333), "33.33%");
    }
}
