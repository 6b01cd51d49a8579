use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Wall-clock bookkeeping for one run.
///
/// `ended_at` is re-sampled on every tick while the run is live and frozen when
/// it settles. It is only ever written after `started_at`, so elapsed time
/// never goes negative.
#[derive(Debug, Default, Clone)]
pub struct RunTimer {
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    started_wall: Option<DateTime<Utc>>,
}

impl RunTimer {
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.ended_at = None;
        self.started_wall = Some(Utc::now());
    }

    pub fn sample(&mut self) {
        if let Some(started) = self.started_at {
            self.ended_at = Some(Instant::now().max(started));
        }
    }

    pub fn stop(&mut self) {
        self.sample();
    }

    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    pub fn started_wall(&self) -> Option<DateTime<Utc>> {
        self.started_wall
    }
}

/// `"1,234 results in 2.5s."`, with a singular noun for exactly one row.
pub fn format_progress(count: usize, elapsed: Duration) -> String {
    format!(
        "{} result{} in {:.1}s.",
        group_thousands(count),
        if count == 1 { "" } else { "s" },
        elapsed.as_secs_f64()
    )
}

fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
