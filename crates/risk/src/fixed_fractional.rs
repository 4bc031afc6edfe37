use crate::PositionSizer;
use crate::error::RiskError;
use configuration::{RiskManagement, SymbolSpec};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// The full breakdown of a sizing decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LotSizing {
    pub lot_size: Decimal,
    pub risk_amount: Decimal,
    pub pip_value: Decimal,
    pub stop_distance_pips: Decimal,
}

/// Risks a fixed fraction of the current balance on every trade.
///
/// The money at risk is spread over the stop distance in pips to get the
/// value of one pip, which the symbol's class scales into lots.
#[derive(Debug, Clone)]
pub struct FixedFractionalSizer {
    params: RiskManagement,
    account_currency: String,
}

impl FixedFractionalSizer {
    pub fn new(params: RiskManagement, account_currency: impl Into<String>) -> Result<Self, RiskError> {
        // Validate that risk parameters are logical.
        if params.risk_per_trade_pct <= Decimal::ZERO || params.risk_per_trade_pct >= Decimal::ONE {
            return Err(RiskError::InvalidParameters(
                "risk_per_trade_pct must be between 0 and 1".to_string(),
            ));
        }
        if params.max_lot_size <= Decimal::ZERO {
            return Err(RiskError::InvalidParameters(
                "max_lot_size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            params,
            account_currency: account_currency.into(),
        })
    }
}

impl PositionSizer for FixedFractionalSizer {
    fn size_lot(
        &self,
        balance: Decimal,
        stop_price: Decimal,
        stop_loss: Decimal,
        symbol: &SymbolSpec,
    ) -> Result<LotSizing, RiskError> {
        // --- 1. Validation ---
        if balance <= Decimal::ZERO {
            return Err(RiskError::InsufficientBalance(balance));
        }
        if symbol.pip_size <= Decimal::ZERO {
            return Err(RiskError::InvalidPipSize(symbol.symbol.clone()));
        }
        if symbol.lot_divisor <= Decimal::ZERO {
            return Err(RiskError::InvalidParameters(format!(
                "lot divisor for {} must be greater than 0",
                symbol.symbol
            )));
        }

        // --- 2. Money at risk and stop distance ---
        let risk_amount = balance * self.params.risk_per_trade_pct;
        let stop_distance_pips = (stop_price - stop_loss).abs() / symbol.pip_size;
        if stop_distance_pips.is_zero() {
            return Err(RiskError::DegenerateStop { stop_price, stop_loss });
        }

        // --- 3. Value of one pip in the account currency ---
        let mut pip_value = risk_amount / stop_distance_pips;
        if !symbol.base_currency.eq_ignore_ascii_case(&self.account_currency) {
            let rate = symbol.exchange_rate.ok_or_else(|| RiskError::MissingExchangeRate {
                symbol: symbol.symbol.clone(),
                currency: symbol.base_currency.clone(),
            })?;
            pip_value *= rate;
        }

        // --- 4. Scale into lots, round to broker granularity and clamp ---
        let lot_size = (pip_value / symbol.lot_divisor)
            .round_dp_with_strategy(self.params.lot_decimals, RoundingStrategy::MidpointNearestEven)
            .min(self.params.max_lot_size);

        tracing::debug!(
            symbol = %symbol.symbol,
            %risk_amount,
            %stop_distance_pips,
            %pip_value,
            %lot_size,
            "Sized lot"
        );

        Ok(LotSizing {
            lot_size,
            risk_amount,
            pip_value,
            stop_distance_pips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn params() -> RiskManagement {
        RiskManagement {
            risk_per_trade_pct: dec!(0.01),
            max_lot_size: dec!(9.99),
            lot_decimals: 2,
        }
    }

    fn eurusd() -> SymbolSpec {
        SymbolSpec {
            symbol: "EURUSD".to_string(),
            pip_size: dec!(0.0001),
            contract_size: dec!(100000),
            base_currency: "USD".to_string(),
            lot_divisor: dec!(10),
            exchange_rate: None,
        }
    }

    fn sizer() -> FixedFractionalSizer {
        FixedFractionalSizer::new(params(), "USD").unwrap()
    }

    #[test]
    fn one_percent_over_fifty_pips() {
        let sizing = sizer()
            .size_lot(dec!(10000), dec!(1.1050), dec!(1.1000), &eurusd())
            .unwrap();

        assert_eq!(sizing.risk_amount, dec!(100));
        assert_eq!(sizing.stop_distance_pips, dec!(50));
        assert_eq!(sizing.pip_value, dec!(2));
        assert_eq!(sizing.lot_size, dec!(0.2));
    }

    #[test]
    fn jpy_class_scales_by_its_divisor() {
        let usdjpy = SymbolSpec {
            symbol: "USDJPY".to_string(),
            pip_size: dec!(0.01),
            lot_divisor: dec!(1000),
            ..eurusd()
        };
        // 100 / 50 pips = 2 per pip, 2 / 1000 rounds to zero lots.
        let sizing = sizer()
            .size_lot(dec!(10000), dec!(150.50), dec!(150.00), &usdjpy)
            .unwrap();
        assert_eq!(sizing.lot_size, dec!(0.00));
    }

    #[test]
    fn lot_is_clamped_to_the_ceiling() {
        // 1000 risked over a single pip.
        let sizing = sizer()
            .size_lot(dec!(100000), dec!(1.1001), dec!(1.1000), &eurusd())
            .unwrap();
        assert_eq!(sizing.lot_size, dec!(9.99));
    }

    #[test]
    fn zero_stop_distance_fails_fast() {
        let result = sizer().size_lot(dec!(10000), dec!(1.1), dec!(1.1), &eurusd());
        assert!(matches!(result, Err(RiskError::DegenerateStop { .. })));
    }

    #[test]
    fn foreign_quote_currency_needs_a_rate() {
        let eurgbp = SymbolSpec {
            base_currency: "GBP".to_string(),
            ..eurusd()
        };
        let result = sizer().size_lot(dec!(10000), dec!(0.8550), dec!(0.8500), &eurgbp);
        assert!(matches!(result, Err(RiskError::MissingExchangeRate { .. })));

        let priced = SymbolSpec {
            exchange_rate: Some(dec!(1.25)),
            ..eurgbp
        };
        let sizing = sizer()
            .size_lot(dec!(10000), dec!(0.8550), dec!(0.8500), &priced)
            .unwrap();
        assert_eq!(sizing.pip_value, dec!(2.5));
        assert_eq!(sizing.lot_size, dec!(0.25));
    }

    #[test]
    fn risk_fraction_outside_the_unit_interval_is_rejected() {
        let mut bad = params();
        bad.risk_per_trade_pct = dec!(1.5);
        assert!(FixedFractionalSizer::new(bad, "USD").is_err());
    }

    proptest! {
        #[test]
        fn lot_never_exceeds_the_ceiling(
            balance in 1u32..10_000_000,
            distance in 1u32..5_000,
        ) {
            let stop_price = dec!(1.5);
            let stop_loss = stop_price - Decimal::from(distance) * dec!(0.0001);
            let sizing = sizer()
                .size_lot(Decimal::from(balance), stop_price, stop_loss, &eurusd())
                .unwrap();
            prop_assert!(sizing.lot_size <= dec!(9.99));
            prop_assert!(sizing.lot_size >= Decimal::ZERO);
        }
    }
}
