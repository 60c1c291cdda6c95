use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Shared episode budget and completion counter.
///
/// Workers claim an episode with [`EpisodeCounter::try_start`] before resetting their
/// environment and report it with [`EpisodeCounter::complete`] after the training update.
/// At most `budget` episodes are ever started and each completion receives a distinct
/// 1-based index.
#[derive(Debug)]
pub struct EpisodeCounter {
    budget: usize,
    started: AtomicUsize,
    completed: AtomicUsize,
    aborted: AtomicBool,
}

impl EpisodeCounter {
    pub const fn new(budget: usize) -> Self {
        Self {
            budget,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
        }
    }

    pub const fn budget(&self) -> usize {
        self.budget
    }

    /// Claim an episode slot.
    ///
    /// Returns `false` once the budget is exhausted or the run is aborted.
    pub fn try_start(&self) -> bool {
        if self.is_aborted() {
            return false;
        }
        self.started
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |started| {
                if started < self.budget {
                    Some(started + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Record a completed episode.
    ///
    /// # Returns
    /// The number of episodes completed so far, including this one.
    pub fn complete(&self) -> usize {
        self.completed.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Stop all further episodes from starting.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    /// Whether no more episodes will complete.
    pub fn is_finished(&self) -> bool {
        self.is_aborted() || self.completed() >= self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn stops_at_budget() {
        let counter = EpisodeCounter::new(2);
        assert!(counter.try_start());
        assert!(counter.try_start());
        assert!(!counter.try_start());
        assert_eq!(counter.complete(), 1);
        assert!(!counter.is_finished());
        assert_eq!(counter.complete(), 2);
        assert!(counter.is_finished());
    }

    #[test]
    fn zero_budget() {
        let counter = EpisodeCounter::new(0);
        assert!(!counter.try_start());
        assert!(counter.is_finished());
    }

    #[test]
    fn abort_prevents_start() {
        let counter = EpisodeCounter::new(10);
        assert!(counter.try_start());
        counter.abort();
        assert!(!counter.try_start());
        assert!(counter.is_finished());
    }

    #[rstest]
    #[case(1, 1)]
    #[case(4, 25)]
    #[case(8, 100)]
    fn concurrent_completions_unique(#[case] num_threads: usize, #[case] per_thread: usize) {
        let counter = EpisodeCounter::new(num_threads * per_thread);
        let mut seen: Vec<usize> = crossbeam::scope(|scope| {
            let handles: Vec<_> = (0..num_threads)
                .map(|_| {
                    let counter = &counter;
                    scope.spawn(move |_| {
                        let mut values = Vec::new();
                        while counter.try_start() {
                            values.push(counter.complete());
                        }
                        values
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        })
        .unwrap();

        seen.sort_unstable();
        let expected: Vec<usize> = (1..=num_threads * per_thread).collect();
        assert_eq!(seen, expected);
    }
}
