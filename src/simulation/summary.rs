use crate::utils::stats::RunningStats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics of the episodes run by one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker: usize,
    /// Number of completed episodes
    pub episodes: usize,
    /// Number of episodes whose update was skipped for a non-finite gradient
    pub skipped_updates: usize,
    /// Episode scores (cumulative rewards)
    pub scores: RunningStats<f64>,
    /// Episode lengths in steps
    pub lengths: RunningStats<f64>,
}

impl WorkerReport {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            episodes: 0,
            skipped_updates: 0,
            scores: RunningStats::new(),
            lengths: RunningStats::new(),
        }
    }
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub skipped_updates: usize,
    pub scores: RunningStats<f64>,
    pub lengths: RunningStats<f64>,
    pub workers: Vec<WorkerReport>,
}

impl TrainingSummary {
    pub fn from_reports(workers: Vec<WorkerReport>) -> Self {
        let mut scores = RunningStats::new();
        let mut lengths = RunningStats::new();
        for report in &workers {
            scores.merge(&report.scores);
            lengths.merge(&report.lengths);
        }
        Self {
            episodes: workers.iter().map(|w| w.episodes).sum(),
            skipped_updates: workers.iter().map(|w| w.skipped_updates).sum(),
            scores,
            lengths,
            workers,
        }
    }
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "episodes:        {}", self.episodes)?;
        writeln!(f, "skipped_updates: {}", self.skipped_updates)?;
        writeln!(
            f,
            "score_mean:      {:.3} (std {:.3})",
            self.scores.mean(),
            self.scores.std_dev()
        )?;
        if let (Some(min), Some(max)) = (self.scores.min(), self.scores.max()) {
            writeln!(f, "score_range:     [{}, {}]", min, max)?;
        }
        writeln!(f, "ep_length_mean:  {:.3}", self.lengths.mean())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_workers() {
        let mut a = WorkerReport::new(0);
        a.episodes = 2;
        a.scores.extend([1.0, 3.0]);
        a.lengths.extend([1.0, 3.0]);
        let mut b = WorkerReport::new(1);
        b.episodes = 1;
        b.skipped_updates = 1;
        b.scores.push(5.0);
        b.lengths.push(5.0);

        let summary = TrainingSummary::from_reports(vec![a, b]);
        assert_eq!(summary.episodes, 3);
        assert_eq!(summary.skipped_updates, 1);
        assert_eq!(summary.scores.count(), 3);
        assert!((summary.scores.mean() - 3.0).abs() < 1e-9);
        assert_eq!(summary.scores.max(), Some(5.0));
        assert!(summary.to_string().contains("episodes:        3"));
    }
}
