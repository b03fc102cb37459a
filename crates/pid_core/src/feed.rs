use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::metrics::TickRecord;

/// Thread-safe buffer of recent ticks for live observers.
///
/// Drivers push every tick; front ends poll `latest`/`get_recent` at their
/// own pace. Clones share the same buffer.
#[derive(Clone)]
pub struct LiveFeed {
    data: Arc<Mutex<VecDeque<TickRecord>>>,
    max_size: usize,
}

impl LiveFeed {
    pub fn new(max_size: usize) -> Self {
        Self {
            data: Arc::new(Mutex::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<TickRecord>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, item: TickRecord) {
        let mut buffer = self.buffer();
        buffer.push_back(item);

        // Keep only the most recent data
        while buffer.len() > self.max_size {
            buffer.pop_front();
        }
    }

    pub fn latest(&self) -> Option<TickRecord> {
        self.buffer().back().cloned()
    }

    pub fn get_recent(&self, count: usize) -> Vec<TickRecord> {
        let buffer = self.buffer();
        let start = buffer.len().saturating_sub(count);
        buffer.iter().skip(start).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::plant::PlantKind;
    use crate::simulation::Simulation;

    #[test]
    fn recent_window_is_bounded_and_ordered() {
        let t0 = Instant::now();
        let mut sim = Simulation::with_seed(PlantKind::Car, Some(5), t0);
        let feed = LiveFeed::new(8);
        for i in 1..=20u32 {
            if let Some(r) = sim.tick(t0 + Duration::from_millis(16) * i) {
                feed.add(TickRecord::new("test", &r));
            }
        }

        assert_eq!(feed.len(), 8);
        let recent = feed.get_recent(3);
        let ticks: Vec<u64> = recent.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![18, 19, 20]);
        assert_eq!(feed.latest().map(|r| r.tick), Some(20));
        assert_eq!(feed.get_recent(100).len(), 8);
    }
}
