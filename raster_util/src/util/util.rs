/*
This file is part of the NDVI Tools
Copyright (C) 2022 Novel-T

The NDVI Tools are free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use std::time::{Duration, Instant};
use log::info;

pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    let ms = d.subsec_millis();

    format!("{}h {}m {}s {}ms", hours, minutes, secs, ms)
}

/// Estimates time left from the average time per processed step
pub fn estimate_remaining(elapsed: Duration, num_processed: u32, num_total: u32) -> (Duration, Duration) {
    let time_per_step = elapsed / num_processed.max(1);
    let remaining = time_per_step * num_total.saturating_sub(num_processed);
    let total = time_per_step * num_total;

    (remaining, total)
}

pub fn print_remaining_time(start: &Instant, num_processed: u32, num_total: u32) {
    let elapsed = start.elapsed();
    let (est_remaining, est_total) = estimate_remaining(elapsed, num_processed, num_total);

    info!("Through {} of {}  Elapsed: {}  Est. Remaining: {}  Est total time: {}",
          num_processed, num_total,
          format_duration(elapsed),
          format_duration(est_remaining),
          format_duration(est_total));
}

/// Logs progress at most every `interval_secs`, used inside chunk loops
pub struct ProgressLogger {
    start: Instant,
    last_output: Instant,
    interval_secs: u64,
}

impl ProgressLogger {
    pub fn new(interval_secs: u64) -> Self {
        ProgressLogger {
            start: Instant::now(),
            last_output: Instant::now(),
            interval_secs,
        }
    }

    pub fn step(&mut self, num_processed: usize, num_total: usize) {
        if self.last_output.elapsed().as_secs() >= self.interval_secs {
            self.last_output = Instant::now();
            print_remaining_time(&self.start, num_processed as u32, num_total as u32);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        let d = Duration::from_millis(3_723_045);
        assert_eq!("1h 2m 3s 45ms", format_duration(d));

        assert_eq!("0h 0m 0s 0ms", format_duration(Duration::from_secs(0)));
    }

    #[test]
    fn test_estimate_remaining() {
        let (remaining, total) = estimate_remaining(Duration::from_secs(10), 2, 6);
        assert_eq!(Duration::from_secs(20), remaining);
        assert_eq!(Duration::from_secs(30), total);

        //nothing processed yet, elapsed is taken as the time for one step
        let (remaining, _) = estimate_remaining(Duration::from_secs(4), 0, 3);
        assert_eq!(Duration::from_secs(12), remaining);
    }
}
