use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::events::{Event, EventSender};

/// Item counters shared by every worker of one operation.
///
/// `completed` only moves through `increment`, an atomic add, so concurrent
/// file units never lose updates and the count never decreases.
pub struct ProgressTracker {
    total: AtomicUsize,
    completed: AtomicUsize,
    start_time: Instant,
    event_tx: Option<EventSender>,
}

impl ProgressTracker {
    pub fn new(event_tx: Option<EventSender>) -> Self {
        Self {
            total: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            start_time: Instant::now(),
            event_tx,
        }
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Release);
        self.notify(self.snapshot());
    }

    pub fn increment(&self) {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        let total = self.total.load(Ordering::Acquire);
        self.notify(ProgressSnapshot::new(completed, total, self.elapsed()));
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.completed(), self.total(), self.elapsed())
    }

    // Fire-and-forget: an unbounded send never blocks the worker.
    fn notify(&self, snapshot: ProgressSnapshot) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(Event::Progress {
                completed: snapshot.completed,
                total: snapshot.total,
                percentage: snapshot.percentage,
                status_text: snapshot.status_text(),
            });
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    pub fn new(completed: usize, total: usize, elapsed: Duration) -> Self {
        Self {
            completed,
            total,
            percentage: percentage(completed, total),
            elapsed,
        }
    }

    pub fn status_text(&self) -> String {
        format!(
            "Processing: {}/{} ({}%)",
            self.completed, self.total, self.percentage
        )
    }
}

/// `floor(completed / total * 100)` clamped to 0..=100; 0 when `total` is 0.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as u128 * 100) / total as u128;
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::events::create_event_channel;

    #[test]
    fn percentage_floors_and_clamps() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 66);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(7, 3), 100);
    }

    #[test]
    fn set_total_and_increment_notify() {
        let (tx, mut rx) = create_event_channel();
        let tracker = ProgressTracker::new(Some(tx));
        tracker.set_total(4);
        tracker.increment();

        match rx.try_recv() {
            Ok(Event::Progress { completed, total, .. }) => {
                assert_eq!((completed, total), (0, 4));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.try_recv() {
            Ok(Event::Progress {
                completed,
                percentage,
                status_text,
                ..
            }) => {
                assert_eq!(completed, 1);
                assert_eq!(percentage, 25);
                assert_eq!(status_text, "Processing: 1/4 (25%)");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn works_without_subscriber() {
        let tracker = ProgressTracker::new(None);
        tracker.set_total(2);
        tracker.increment();
        let snap = tracker.snapshot();
        assert_eq!((snap.completed, snap.total, snap.percentage), (1, 2, 50));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let tracker = Arc::new(ProgressTracker::new(None));
        tracker.set_total(8 * 1000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        tracker.increment();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(tracker.completed(), 8000);
        assert_eq!(tracker.snapshot().percentage, 100);
    }
}
