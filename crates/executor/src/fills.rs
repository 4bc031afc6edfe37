//! Trigger and exit predicates evaluated against a single candle.

use core_types::{Candle, ExitReason, OpenTrade, OrderType, ProposedOrder};
use chrono::{DateTime, Utc};

/// True when the candle's range reaches the order's stop price.
pub fn order_triggers(candle: &Candle, order: &ProposedOrder) -> bool {
    candle.low <= order.stop_price && order.stop_price <= candle.high
}

/// An order is eligible strictly after its creation and until its cancel time.
pub fn order_is_live(candle_time: DateTime<Utc>, order: &ProposedOrder) -> bool {
    candle_time > order.creation_time && !order.cancel_time.has_passed(candle_time)
}

pub fn order_has_expired(candle_time: DateTime<Utc>, order: &ProposedOrder) -> bool {
    order.cancel_time.has_passed(candle_time)
}

pub fn stop_loss_hit(candle: &Candle, trade: &OpenTrade) -> bool {
    match trade.order_type {
        OrderType::BuyStop => candle.low <= trade.stop_loss,
        OrderType::SellStop => candle.high >= trade.stop_loss,
    }
}

pub fn take_profit_hit(candle: &Candle, trade: &OpenTrade) -> bool {
    match trade.order_type {
        OrderType::BuyStop => candle.high >= trade.take_profit,
        OrderType::SellStop => candle.low <= trade.take_profit,
    }
}

/// The terminal event this candle produces for `trade`, if any.
///
/// The candle's path inside the bar is unknown, so a bar reaching both
/// levels is resolved as a stop-loss.
pub fn evaluate_exit(candle: &Candle, trade: &OpenTrade) -> Option<ExitReason> {
    if stop_loss_hit(candle, trade) {
        Some(ExitReason::StopLoss)
    } else if take_profit_hit(candle, trade) {
        Some(ExitReason::TakeProfit)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::CancelTime;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, minute, 0).unwrap()
    }

    fn candle(minute: u32, low: Decimal, high: Decimal) -> Candle {
        Candle {
            timestamp: at(minute),
            open: low,
            high,
            low,
            close: high,
        }
    }

    fn order(order_type: OrderType, cancel_time: CancelTime) -> ProposedOrder {
        let (stop_loss, take_profit) = match order_type {
            OrderType::BuyStop => (dec!(1.1950), dec!(1.2050)),
            OrderType::SellStop => (dec!(1.2050), dec!(1.1950)),
        };
        ProposedOrder {
            order_type,
            creation_time: at(0),
            stop_price: dec!(1.2000),
            stop_loss,
            take_profit,
            cancel_time,
        }
    }

    fn trade(order_type: OrderType) -> OpenTrade {
        OpenTrade::from_order(
            &order(order_type, CancelTime::GoodTillCancel),
            0,
            0,
            dec!(1),
            dec!(100),
            at(1),
        )
    }

    #[test]
    fn orders_are_not_live_at_their_creation_instant() {
        let order = order(OrderType::BuyStop, CancelTime::At(at(5)));
        assert!(!order_is_live(at(0), &order));
        assert!(order_is_live(at(1), &order));
        assert!(order_is_live(at(4), &order));
        assert!(!order_is_live(at(5), &order));
        assert!(order_has_expired(at(5), &order));
    }

    #[test]
    fn good_till_cancel_never_expires() {
        let order = order(OrderType::SellStop, CancelTime::GoodTillCancel);
        assert!(order_is_live(at(59), &order));
        assert!(!order_has_expired(at(59), &order));
    }

    #[test]
    fn a_bar_reaching_both_levels_is_a_stop_loss() {
        let wide = candle(2, dec!(1.1900), dec!(1.2100));
        assert_eq!(evaluate_exit(&wide, &trade(OrderType::BuyStop)), Some(ExitReason::StopLoss));
        assert_eq!(evaluate_exit(&wide, &trade(OrderType::SellStop)), Some(ExitReason::StopLoss));
    }

    #[test]
    fn take_profit_is_directional() {
        let up = candle(2, dec!(1.2000), dec!(1.2060));
        assert_eq!(evaluate_exit(&up, &trade(OrderType::BuyStop)), Some(ExitReason::TakeProfit));
        // The same bar is the stop-loss side for a short.
        assert_eq!(evaluate_exit(&up, &trade(OrderType::SellStop)), Some(ExitReason::StopLoss));

        let quiet = candle(2, dec!(1.1990), dec!(1.2010));
        assert_eq!(evaluate_exit(&quiet, &trade(OrderType::BuyStop)), None);
    }

    proptest! {
        #[test]
        fn trigger_iff_range_contains_stop_price(
            low in 11_000i64..13_000,
            span in 0i64..500,
            stop in 10_500i64..13_500,
            long in any::<bool>(),
        ) {
            let low = Decimal::new(low, 4);
            let high = low + Decimal::new(span, 4);
            let order_type = if long { OrderType::BuyStop } else { OrderType::SellStop };
            let mut order = order(order_type, CancelTime::GoodTillCancel);
            order.stop_price = Decimal::new(stop, 4);

            let expected = low <= order.stop_price && order.stop_price <= high;
            prop_assert_eq!(order_triggers(&candle(1, low, high), &order), expected);
        }
    }
}
