use chrono::{Datelike, Months, NaiveDate};
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

// ── Calendar months ───────────────────────────────────────────────────────────

/// Number of calendar months touched by `[from, to]`, counting both ends.
/// Zero when `from` is after `to`.
pub fn months_inclusive(from: NaiveDate, to: NaiveDate) -> u32 {
    if from > to {
        return 0;
    }
    let span = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32 + 1;
    span.max(0) as u32
}

/// First day of each month from `to`'s month back to `from`'s, newest first.
pub fn months_descending(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let Some(mut month) = to.with_day(1) else {
        return Vec::new();
    };
    (0..months_inclusive(from, to))
        .map_while(|_| {
            let current = month;
            month = current.checked_sub_months(Months::new(1))?;
            Some(current)
        })
        .collect()
}

/// Format a count with thousands separators.
pub fn fmt_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
