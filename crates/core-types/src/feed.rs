use crate::structs::StrategyCandle;
use chrono::{DateTime, Duration, Utc};
use std::ops::Range;
use std::sync::Arc;

/// The coarse strategy feed, shared read-only between sweep tasks.
///
/// Bars are kept sorted by timestamp so the trailing reference lookup is a
/// binary search instead of a scan per tick. A windowed feed is a range over
/// the same storage.
#[derive(Debug, Clone, Default)]
pub struct StrategyFeed {
    storage: Arc<[StrategyCandle]>,
    range: Range<usize>,
}

impl StrategyFeed {
    pub fn new(mut bars: Vec<StrategyCandle>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);
        let range = 0..bars.len();
        Self {
            storage: bars.into(),
            range,
        }
    }

    pub fn bars(&self) -> &[StrategyCandle] {
        &self.storage[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Index of the bar whose interval contains `time`.
    ///
    /// A bar covers `(bar.timestamp, next.timestamp - 1s]`. The final bar has
    /// no known end and never contains anything.
    pub fn containing_index(&self, time: DateTime<Utc>) -> Option<usize> {
        let bars = self.bars();
        let after = bars.partition_point(|bar| bar.timestamp < time);
        let index = after.checked_sub(1)?;
        let next = bars.get(after)?;
        (time <= next.timestamp - Duration::seconds(1)).then_some(index)
    }

    /// The bar immediately preceding the one that contains `time`.
    pub fn reference_bar(&self, time: DateTime<Utc>) -> Option<&StrategyCandle> {
        let index = self.containing_index(time)?;
        index.checked_sub(1).map(|prior| &self.bars()[prior])
    }

    /// True when at least one bar carries the named field.
    pub fn has_field(&self, name: &str) -> bool {
        self.bars().iter().any(|bar| bar.has_field(name))
    }

    /// The bars within `[start, end]`, sharing this feed's storage.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let bars = self.bars();
        let first = bars.partition_point(|bar| bar.timestamp < start);
        let last = bars.partition_point(|bar| bar.timestamp <= end).max(first);
        let offset = self.range.start;
        Self {
            storage: Arc::clone(&self.storage),
            range: offset + first..offset + last,
        }
    }
}

impl From<Vec<StrategyCandle>> for StrategyFeed {
    fn from(bars: Vec<StrategyCandle>) -> Self {
        Self::new(bars)
    }
}
