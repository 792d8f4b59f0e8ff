use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

/// Logs matrix progress whenever another whole percent of sources is done
#[derive(Debug, Default)]
pub struct ProgressLog {
    last_percent: AtomicUsize,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the percentage if this call crossed a new whole percent
    pub fn update(&self, done: usize, total: usize) -> Option<usize> {
        if total == 0 {
            return None;
        }
        let percent = done * 100 / total;
        let previous = self.last_percent.fetch_max(percent, Ordering::Relaxed);
        if percent > previous {
            info!("{done}/{total} source cells done ({percent}%)");
            Some(percent)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_percent_once() {
        let progress = ProgressLog::new();
        let reported: Vec<_> = (1..=400).filter_map(|done| progress.update(done, 400)).collect();
        assert_eq!(reported, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn small_totals_skip_percentages() {
        let progress = ProgressLog::new();
        assert_eq!(progress.update(1, 3), Some(33));
        assert_eq!(progress.update(2, 3), Some(66));
        assert_eq!(progress.update(3, 3), Some(100));
        assert_eq!(progress.update(3, 3), None);
    }

    #[test]
    fn late_smaller_update_is_ignored() {
        let progress = ProgressLog::new();
        assert_eq!(progress.update(50, 100), Some(50));
        assert_eq!(progress.update(49, 100), None);
    }

    #[test]
    fn empty_total_reports_nothing() {
        assert_eq!(ProgressLog::new().update(0, 0), None);
    }
}
