//! Progress estimation from conversion tool output
//!
//! The tool does not report percentages, so progress is derived from marker
//! substrings in its log lines. The strategy is a trait so it can be swapped
//! or tested without running a process.

/// Derives progress from output lines.
pub trait ProgressEstimator: Send + Sync {
    /// New progress implied by an output line, if any. Implementations must
    /// never return a value below `current`.
    fn advance(&self, line: &str, current: u8) -> Option<u8>;
}

/// Marker-based estimator: each "processing" line nudges the value forward
/// by a fixed step, capped below 100 so a stalled run never looks finished;
/// a completion marker snaps to 100.
#[derive(Debug, Clone)]
pub struct MarkerProgress {
    step: u8,
    cap: u8,
}

impl MarkerProgress {
    pub fn new(step: u8, cap: u8) -> Self {
        Self {
            step,
            cap: cap.min(100),
        }
    }
}

impl Default for MarkerProgress {
    fn default() -> Self {
        Self::new(5, 90)
    }
}

impl ProgressEstimator for MarkerProgress {
    fn advance(&self, line: &str, current: u8) -> Option<u8> {
        let line = line.to_lowercase();
        if line.contains("done") || line.contains("completed") {
            return Some(100);
        }
        if line.contains("processing") {
            let next = current.saturating_add(self.step).min(self.cap);
            if next > current {
                return Some(next);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_marker_steps_forward() {
        let estimator = MarkerProgress::default();
        assert_eq!(estimator.advance("Processing page 3 of 10", 0), Some(5));
        assert_eq!(estimator.advance("processing page 4", 5), Some(10));
    }

    #[test]
    fn test_progress_caps_below_completion() {
        let estimator = MarkerProgress::new(5, 90);
        assert_eq!(estimator.advance("processing", 88), Some(90));
        assert_eq!(estimator.advance("processing", 90), None);
    }

    #[test]
    fn test_completion_marker_snaps_to_100() {
        let estimator = MarkerProgress::default();
        assert_eq!(estimator.advance("conversion done", 42), Some(100));
        assert_eq!(estimator.advance("task completed", 0), Some(100));
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let estimator = MarkerProgress::default();
        assert_eq!(estimator.advance("loading model weights", 10), None);
        assert_eq!(estimator.advance("", 10), None);
    }
}
