//! Rolling CPU history per container, feeding the detail sparkline

use std::collections::{HashMap, VecDeque};

/// Samples kept per container
pub const HISTORY_CAPACITY: usize = 30;

/// Fixed-capacity FIFO of CPU percentages keyed by container id.
///
/// Series are created on first sample and never removed explicitly;
/// [`HistoryRing::prune`] drops series for containers that disappeared.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    series: HashMap<String, VecDeque<f64>>,
    capacity: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, id: &str, cpu_percent: f64) {
        let series = self
            .series
            .entry(id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        series.push_back(cpu_percent);
        while series.len() > self.capacity {
            series.pop_front();
        }
    }

    /// Samples oldest first; empty for unknown ids
    pub fn samples(&self, id: &str) -> impl Iterator<Item = f64> + '_ {
        self.series.get(id).into_iter().flatten().copied()
    }

    pub fn len(&self, id: &str) -> usize {
        self.series.get(id).map(VecDeque::len).unwrap_or(0)
    }

    pub fn tracked(&self) -> usize {
        self.series.len()
    }

    pub fn prune<'a, I>(&mut self, live_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let live: std::collections::HashSet<&str> = live_ids.into_iter().collect();
        self.series.retain(|id, _| live.contains(id.as_str()));
    }
}
