use chrono::{DateTime, Utc};
use configuration::TimeRange;
use core_types::{Candle, StrategyCandle, StrategyFeed};
use std::ops::Range;
use std::sync::Arc;

/// The two feeds of one (symbol, timeframe) pair.
///
/// Cloning and trimming are cheap: both feeds are views over shared storage,
/// so every sweep task over the same pair reads the same memory.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    /// Minute candles that drive the simulation clock.
    clock: Arc<[Candle]>,
    window: Range<usize>,
    /// Candles of the strategy timeframe, used for reference-column trailing.
    strategy: StrategyFeed,
}

impl MarketData {
    pub fn new(mut clock: Vec<Candle>, strategy: Vec<StrategyCandle>) -> Self {
        clock.sort_by_key(|candle| candle.timestamp);
        let window = 0..clock.len();
        Self {
            clock: clock.into(),
            window,
            strategy: StrategyFeed::new(strategy),
        }
    }

    pub fn clock(&self) -> &[Candle] {
        &self.clock[self.window.clone()]
    }

    pub fn strategy(&self) -> &StrategyFeed {
        &self.strategy
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.clock().last().map(|candle| candle.timestamp)
    }

    /// Both feeds restricted to `range` before the last clock candle.
    pub fn trimmed(&self, range: TimeRange) -> Self {
        let Some(end) = self.last_time() else {
            return self.clone();
        };
        let Some(start) = range.start_from(end) else {
            return self.clone();
        };
        let first = self.clock().partition_point(|candle| candle.timestamp < start);
        let offset = self.window.start;
        Self {
            clock: Arc::clone(&self.clock),
            window: offset + first..self.window.end,
            strategy: self.strategy.window(start, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn market() -> MarketData {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = (0..120)
            .map(|day| Candle {
                timestamp: start + Duration::days(day),
                open: dec!(1.1),
                high: dec!(1.2),
                low: dec!(1.0),
                close: dec!(1.1),
            })
            .collect();
        let strategy = (0..4)
            .map(|month| {
                StrategyCandle::from(Candle {
                    timestamp: start + Duration::days(30 * month),
                    open: dec!(1.1),
                    high: dec!(1.2),
                    low: dec!(1.0),
                    close: dec!(1.1),
                })
            })
            .collect();
        MarketData::new(clock, strategy)
    }

    #[test]
    fn trimming_keeps_the_trailing_window() {
        let trimmed = market().trimmed(TimeRange::OneMonth);
        let last = Utc.with_ymd_and_hms(2024, 4, 29, 0, 0, 0).unwrap();
        assert_eq!(trimmed.last_time(), Some(last));
        assert_eq!(
            trimmed.clock()[0].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(trimmed.clock().len(), 32);
        assert_eq!(trimmed.strategy().len(), 1);
    }

    #[test]
    fn trimmed_views_share_the_source_feed() {
        let source = market();
        let first = source.trimmed(TimeRange::OneMonth);
        let second = source.trimmed(TimeRange::OneMonth);

        assert!(Arc::ptr_eq(&source.clock, &first.clock));
        assert!(Arc::ptr_eq(&first.clock, &second.clock));
        assert_eq!(first.clock(), second.clock());
        assert_eq!(source.trimmed(TimeRange::All).clock().len(), 120);
    }
}
