use core_types::OrderType;
use rust_decimal::Decimal;

/// Signed profit of a position opened at `stop_price` and closed at `closing_price`.
pub fn trade_profit(
    order_type: OrderType,
    stop_price: Decimal,
    closing_price: Decimal,
    lot_size: Decimal,
    contract_size: Decimal,
) -> Decimal {
    let move_in_favor = match order_type {
        OrderType::BuyStop => closing_price - stop_price,
        OrderType::SellStop => stop_price - closing_price,
    };
    move_in_favor * lot_size * contract_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn long_round_trip() {
        let take_profit = trade_profit(OrderType::BuyStop, dec!(1.1050), dec!(1.1150), dec!(1.0), dec!(100000));
        assert_eq!(take_profit, dec!(1000.0));

        let stop_loss = trade_profit(OrderType::BuyStop, dec!(1.1050), dec!(1.1000), dec!(1.0), dec!(100000));
        assert_eq!(stop_loss, dec!(-500.0));
    }

    #[test]
    fn short_profits_when_price_falls() {
        let profit = trade_profit(OrderType::SellStop, dec!(1.2000), dec!(1.1950), dec!(0.5), dec!(100000));
        assert_eq!(profit, dec!(250));
    }
}
