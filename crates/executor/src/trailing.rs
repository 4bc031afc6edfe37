use crate::error::ExecutorError;
use chrono::{DateTime, Utc};
use configuration::{TrailingConfig, TrailingPolicy};
use core_types::{Candle, OpenTrade, StrategyFeed, TrailingMode, TrailingUpdate};
use rust_decimal::Decimal;

/// A favorable move of a protective level, before it is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelUpdate {
    pub new_level: Decimal,
    pub mode: TrailingMode,
    pub offset: Option<Decimal>,
    pub reference_time: Option<DateTime<Utc>>,
}

impl LevelUpdate {
    /// The log entry recording this move.
    pub fn record(&self, time: DateTime<Utc>, previous_level: Decimal) -> TrailingUpdate {
        TrailingUpdate {
            time,
            previous_level,
            new_level: self.new_level,
            mode: self.mode,
            offset: self.offset,
            reference_time: self.reference_time,
        }
    }
}

/// A trailing policy with its pip distance already converted to price.
#[derive(Debug, Clone, PartialEq)]
enum Rule {
    Pips(Decimal),
    Percent(Decimal),
    ReferenceColumn(String),
}

impl Rule {
    fn resolve(policy: &TrailingPolicy, pip_size: Decimal) -> Result<Self, ExecutorError> {
        match policy {
            TrailingPolicy::Pips(pips) => {
                if pip_size <= Decimal::ZERO {
                    return Err(ExecutorError::InvalidTrailing(
                        "pips trailing needs a positive pip size".to_string(),
                    ));
                }
                if *pips <= Decimal::ZERO {
                    return Err(ExecutorError::InvalidTrailing(format!(
                        "pips distance must be positive, got {pips}"
                    )));
                }
                Ok(Rule::Pips(*pips * pip_size))
            }
            TrailingPolicy::Percent(fraction) => {
                if *fraction <= Decimal::ZERO {
                    return Err(ExecutorError::InvalidTrailing(format!(
                        "percent fraction must be positive, got {fraction}"
                    )));
                }
                Ok(Rule::Percent(*fraction))
            }
            TrailingPolicy::ReferenceColumn(column) if column.trim().is_empty() => Err(
                ExecutorError::InvalidTrailing("reference column name is empty".to_string()),
            ),
            TrailingPolicy::ReferenceColumn(column) => Ok(Rule::ReferenceColumn(column.clone())),
        }
    }

    fn mode(&self) -> TrailingMode {
        match self {
            Rule::Pips(_) => TrailingMode::Pips,
            Rule::Percent(_) => TrailingMode::Percent,
            Rule::ReferenceColumn(_) => TrailingMode::ReferenceColumn,
        }
    }

    /// Price distance for the offset modes. `None` for reference columns.
    fn offset(&self, trade: &OpenTrade) -> Option<Decimal> {
        match self {
            Rule::Pips(offset) => Some(*offset),
            Rule::Percent(fraction) => Some(*fraction * trade.stop_price),
            Rule::ReferenceColumn(_) => None,
        }
    }
}

/// Proposes trailing moves of a trade's stop-loss and take-profit.
///
/// Levels only ever move in the trade's favor: a BUY's stop-loss and
/// take-profit rise, a SELL's fall.
#[derive(Debug, Clone, Default)]
pub struct TrailingAdjuster {
    stop_loss: Option<Rule>,
    take_profit: Option<Rule>,
}

impl TrailingAdjuster {
    pub fn new(config: &TrailingConfig, pip_size: Decimal) -> Result<Self, ExecutorError> {
        let resolve = |policy: &Option<TrailingPolicy>| {
            policy
                .as_ref()
                .map(|policy| Rule::resolve(policy, pip_size))
                .transpose()
        };
        Ok(Self {
            stop_loss: resolve(&config.stop_loss)?,
            take_profit: resolve(&config.take_profit)?,
        })
    }

    pub fn is_active(&self) -> bool {
        self.stop_loss.is_some() || self.take_profit.is_some()
    }

    /// Fails when a reference-column policy names a field the feed lacks.
    pub fn check_feed(&self, feed: &StrategyFeed) -> Result<(), ExecutorError> {
        for rule in [&self.stop_loss, &self.take_profit].into_iter().flatten() {
            if let Rule::ReferenceColumn(column) = rule {
                if !feed.is_empty() && !feed.has_field(column) {
                    return Err(ExecutorError::UnknownColumn(column.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn adjust_stop_loss(
        &self,
        candle: &Candle,
        trade: &OpenTrade,
        feed: &StrategyFeed,
    ) -> Option<LevelUpdate> {
        let rule = self.stop_loss.as_ref()?;
        let long = trade.order_type.is_long();

        let proposal = match rule.offset(trade) {
            Some(offset) => {
                let candidate = if long {
                    // Pips mode only trails once price has moved a full offset away.
                    if matches!(rule, Rule::Pips(_)) && candle.high - trade.stop_loss <= offset {
                        return None;
                    }
                    candle.high - offset
                } else {
                    if matches!(rule, Rule::Pips(_)) && trade.stop_loss - candle.low <= offset {
                        return None;
                    }
                    candle.low + offset
                };
                // Reject a level this candle has already reached.
                let reached = if long {
                    candle.low <= candidate
                } else {
                    candle.high >= candidate
                };
                if reached {
                    return None;
                }
                Some((candidate, None))
            }
            None => reference_level(rule, candle, feed),
        };

        proposal.and_then(|(candidate, reference_time)| {
            let improves = if long {
                candidate > trade.stop_loss
            } else {
                candidate < trade.stop_loss
            };
            improves.then(|| LevelUpdate {
                new_level: candidate,
                mode: rule.mode(),
                offset: rule.offset(trade),
                reference_time,
            })
        })
    }

    pub fn adjust_take_profit(
        &self,
        candle: &Candle,
        trade: &OpenTrade,
        feed: &StrategyFeed,
    ) -> Option<LevelUpdate> {
        let rule = self.take_profit.as_ref()?;
        let long = trade.order_type.is_long();

        let proposal = match rule.offset(trade) {
            Some(offset) if long => Some((candle.high + offset, None)),
            Some(offset) => Some((candle.low - offset, None)),
            None => reference_level(rule, candle, feed),
        };

        proposal.and_then(|(candidate, reference_time)| {
            let improves = if long {
                candidate > trade.take_profit
            } else {
                candidate < trade.take_profit
            };
            improves.then(|| LevelUpdate {
                new_level: candidate,
                mode: rule.mode(),
                offset: rule.offset(trade),
                reference_time,
            })
        })
    }
}

/// Reads the rule's column from the strategy bar preceding the candle's bar.
///
/// A reference bar without a value (indicator warm-up) proposes nothing.
fn reference_level(
    rule: &Rule,
    candle: &Candle,
    feed: &StrategyFeed,
) -> Option<(Decimal, Option<DateTime<Utc>>)> {
    let Rule::ReferenceColumn(column) = rule else {
        return None;
    };
    let bar = feed.reference_bar(candle.timestamp)?;
    let level = bar.field(column)?;
    Some((level, Some(bar.timestamp)))
}
