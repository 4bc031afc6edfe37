use crate::enums::{ExitReason, OrderType, TrailingMode};
use crate::error::CoreError;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Keyword used on the wire for orders without an expiry.
pub const GOOD_TILL_CANCEL: &str = "GTC";

/// A single OHLC bar. The clock feed is a time-ordered sequence of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// A bar of the coarser strategy feed, carrying the indicator columns the
/// signal generator computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyCandle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Indicator values. Warm-up rows written as `null` are left out.
    #[serde(default, deserialize_with = "skip_null_columns")]
    pub columns: BTreeMap<String, Decimal>,
}

fn skip_null_columns<'de, D>(deserializer: D) -> Result<BTreeMap<String, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<Decimal>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect())
}

impl StrategyCandle {
    /// Reads a price field or a named indicator column.
    pub fn field(&self, name: &str) -> Option<Decimal> {
        match name {
            "open" => Some(self.open),
            "high" => Some(self.high),
            "low" => Some(self.low),
            "close" => Some(self.close),
            other => self.columns.get(other).copied(),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

impl From<Candle> for StrategyCandle {
    fn from(candle: Candle) -> Self {
        Self {
            timestamp: candle.timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            columns: BTreeMap::new(),
        }
    }
}

/// When a pending order stops being eligible to trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCancelTime", into = "RawCancelTime")]
pub enum CancelTime {
    GoodTillCancel,
    At(DateTime<Utc>),
}

impl CancelTime {
    /// True once `time` has reached the cancellation instant.
    pub fn has_passed(&self, time: DateTime<Utc>) -> bool {
        match self {
            CancelTime::GoodTillCancel => false,
            CancelTime::At(cancel) => time >= *cancel,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCancelTime {
    Timestamp(DateTime<Utc>),
    Keyword(String),
}

impl TryFrom<RawCancelTime> for CancelTime {
    type Error = CoreError;

    fn try_from(raw: RawCancelTime) -> Result<Self, Self::Error> {
        match raw {
            RawCancelTime::Timestamp(at) => Ok(CancelTime::At(at)),
            RawCancelTime::Keyword(word) if word.eq_ignore_ascii_case(GOOD_TILL_CANCEL) => {
                Ok(CancelTime::GoodTillCancel)
            }
            RawCancelTime::Keyword(word) => {
                Err(CoreError::InvalidInput("cancel_time".to_string(), word))
            }
        }
    }
}

impl From<CancelTime> for RawCancelTime {
    fn from(cancel: CancelTime) -> Self {
        match cancel {
            CancelTime::GoodTillCancel => RawCancelTime::Keyword(GOOD_TILL_CANCEL.to_string()),
            CancelTime::At(at) => RawCancelTime::Timestamp(at),
        }
    }
}

/// A relative cancellation rule, resolved against each order's creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCancelWindow", into = "RawCancelWindow")]
pub enum CancelWindow {
    GoodTillCancel,
    Minutes(u32),
}

impl CancelWindow {
    pub fn resolve(&self, creation_time: DateTime<Utc>) -> CancelTime {
        match self {
            CancelWindow::GoodTillCancel => CancelTime::GoodTillCancel,
            CancelWindow::Minutes(minutes) => {
                CancelTime::At(creation_time + Duration::minutes(i64::from(*minutes)))
            }
        }
    }
}

impl FromStr for CancelWindow {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(GOOD_TILL_CANCEL) {
            return Ok(CancelWindow::GoodTillCancel);
        }
        trimmed
            .parse::<u32>()
            .map(CancelWindow::Minutes)
            .map_err(|_| CoreError::InvalidInput("cancel_window".to_string(), s.to_string()))
    }
}

impl fmt::Display for CancelWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelWindow::GoodTillCancel => write!(f, "{GOOD_TILL_CANCEL}"),
            CancelWindow::Minutes(minutes) => write!(f, "{minutes}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCancelWindow {
    Minutes(u32),
    Keyword(String),
}

impl TryFrom<RawCancelWindow> for CancelWindow {
    type Error = CoreError;

    fn try_from(raw: RawCancelWindow) -> Result<Self, Self::Error> {
        match raw {
            RawCancelWindow::Minutes(minutes) => Ok(CancelWindow::Minutes(minutes)),
            RawCancelWindow::Keyword(word) => word.parse(),
        }
    }
}

impl From<CancelWindow> for RawCancelWindow {
    fn from(window: CancelWindow) -> Self {
        match window {
            CancelWindow::GoodTillCancel => RawCancelWindow::Keyword(GOOD_TILL_CANCEL.to_string()),
            CancelWindow::Minutes(minutes) => RawCancelWindow::Minutes(minutes),
        }
    }
}

/// A pending stop order proposed by the signal generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedOrder {
    pub order_type: OrderType,
    pub creation_time: DateTime<Utc>,
    pub stop_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub cancel_time: CancelTime,
}

/// One recorded move of a trailing stop-loss or take-profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingUpdate {
    pub time: DateTime<Utc>,
    pub previous_level: Decimal,
    pub new_level: Decimal,
    pub mode: TrailingMode,
    /// Price offset for the pips/percent modes.
    pub offset: Option<Decimal>,
    /// Timestamp of the strategy bar the level was read from.
    pub reference_time: Option<DateTime<Utc>>,
}

/// A filled order with live protective levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTrade {
    pub trade_id: usize,
    /// Position of the originating order in the proposed-order sequence.
    pub order_index: usize,
    pub order_type: OrderType,
    pub order_time: DateTime<Utc>,
    pub stop_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub original_stop_loss: Decimal,
    pub original_take_profit: Decimal,
    pub lot_size: Decimal,
    /// Balance set aside when the trade opened.
    pub reserved_amount: Decimal,
    pub open_time: DateTime<Utc>,
    pub trailing_stop_log: Vec<TrailingUpdate>,
    pub trailing_take_profit_log: Vec<TrailingUpdate>,
}

impl OpenTrade {
    pub fn from_order(
        order: &ProposedOrder,
        order_index: usize,
        trade_id: usize,
        lot_size: Decimal,
        reserved_amount: Decimal,
        open_time: DateTime<Utc>,
    ) -> Self {
        Self {
            trade_id,
            order_index,
            order_type: order.order_type,
            order_time: order.creation_time,
            stop_price: order.stop_price,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            original_stop_loss: order.stop_loss,
            original_take_profit: order.take_profit,
            lot_size,
            reserved_amount,
            open_time,
            trailing_stop_log: Vec::new(),
            trailing_take_profit_log: Vec::new(),
        }
    }

    /// The price the trade exits at for the given terminal event.
    pub fn exit_price(&self, reason: ExitReason) -> Decimal {
        match reason {
            ExitReason::StopLoss => self.stop_loss,
            ExitReason::TakeProfit => self.take_profit,
        }
    }

    pub fn close(
        self,
        reason: ExitReason,
        closing_time: DateTime<Utc>,
        profit: Decimal,
    ) -> CompletedTrade {
        CompletedTrade {
            closing_price: self.exit_price(reason),
            closing_time,
            exit_reason: reason,
            profit,
            win: profit > Decimal::ZERO,
            trade: self,
        }
    }
}

/// A trade after its terminal event. Never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTrade {
    #[serde(flatten)]
    pub trade: OpenTrade,
    pub closing_price: Decimal,
    pub closing_time: DateTime<Utc>,
    pub exit_reason: ExitReason,
    pub profit: Decimal,
    pub win: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 10, minute, 0).unwrap()
    }

    #[test]
    fn cancel_time_reads_gtc_and_timestamps() {
        let gtc: CancelTime = serde_json::from_str("\"GTC\"").unwrap();
        assert_eq!(gtc, CancelTime::GoodTillCancel);

        let fixed: CancelTime = serde_json::from_str("\"2024-01-02T10:05:00Z\"").unwrap();
        assert_eq!(fixed, CancelTime::At(at(5)));

        assert!(serde_json::from_str::<CancelTime>("\"tomorrow\"").is_err());
        assert_eq!(serde_json::to_string(&gtc).unwrap(), "\"GTC\"");
    }

    #[test]
    fn cancel_time_passes_at_the_boundary() {
        let cancel = CancelTime::At(at(5));
        assert!(!cancel.has_passed(at(4)));
        assert!(cancel.has_passed(at(5)));
        assert!(!CancelTime::GoodTillCancel.has_passed(at(59)));
    }

    #[test]
    fn cancel_window_resolves_relative_minutes() {
        assert_eq!(CancelWindow::Minutes(16).resolve(at(0)), CancelTime::At(at(16)));
        assert_eq!(
            CancelWindow::GoodTillCancel.resolve(at(0)),
            CancelTime::GoodTillCancel
        );
        assert_eq!("gtc".parse::<CancelWindow>().unwrap(), CancelWindow::GoodTillCancel);
        assert_eq!(serde_json::from_str::<CancelWindow>("\"30\"").unwrap(), CancelWindow::Minutes(30));
        assert_eq!(serde_json::from_str::<CancelWindow>("45").unwrap(), CancelWindow::Minutes(45));
        assert!("soon".parse::<CancelWindow>().is_err());
    }

    #[test]
    fn strategy_candle_resolves_price_and_indicator_fields() {
        let mut bar = StrategyCandle::from(Candle {
            timestamp: at(0),
            open: dec!(1.1),
            high: dec!(1.2),
            low: dec!(1.0),
            close: dec!(1.15),
        });
        bar.columns.insert("ema_50".to_string(), dec!(1.12));

        assert_eq!(bar.field("low"), Some(dec!(1.0)));
        assert_eq!(bar.field("ema_50"), Some(dec!(1.12)));
        assert!(!bar.has_field("macd"));
    }

    #[test]
    fn warm_up_columns_written_as_null_are_skipped() {
        let bar: StrategyCandle = serde_json::from_str(
            r#"{
                "timestamp": "2024-01-02T10:00:00Z",
                "open": 1.1, "high": 1.2, "low": 1.0, "close": 1.15,
                "columns": { "ema_50": null, "rsi_14": 48.5 }
            }"#,
        )
        .unwrap();
        assert!(!bar.has_field("ema_50"));
        assert_eq!(bar.field("rsi_14"), Some(dec!(48.5)));
    }

    #[test]
    fn closing_a_trade_keeps_the_original_levels() {
        let order = ProposedOrder {
            order_type: OrderType::BuyStop,
            creation_time: at(0),
            stop_price: dec!(1.1050),
            stop_loss: dec!(1.1000),
            take_profit: dec!(1.1150),
            cancel_time: CancelTime::GoodTillCancel,
        };
        let mut trade = OpenTrade::from_order(&order, 0, 0, dec!(1.0), dec!(100), at(1));
        trade.stop_loss = dec!(1.1060);

        let closed = trade.close(ExitReason::StopLoss, at(7), dec!(100));
        assert_eq!(closed.closing_price, dec!(1.1060));
        assert_eq!(closed.trade.original_stop_loss, dec!(1.1000));
        assert!(closed.win);
    }
}
