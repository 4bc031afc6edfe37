use crate::error::OptimizerError;
use crate::generator::ParameterSet;
use configuration::normalize_symbol;
use core_types::ProposedOrder;
use std::collections::HashMap;
use std::sync::Arc;

/// Supplies the proposed orders a strategy emits for one parameter combination.
///
/// `Ok(None)` means the source has nothing for this (symbol, timeframe); the
/// sweep records such a task as a zero-profit result.
pub trait OrderSource: Send + Sync {
    fn orders(
        &self,
        symbol: &str,
        timeframe: &str,
        parameters: &ParameterSet,
    ) -> Result<Option<Vec<ProposedOrder>>, OptimizerError>;
}

/// Serves orders generated ahead of time by the signal generator.
///
/// The files are produced with unit multipliers, so the stop-loss and
/// take-profit distances from the stop price are scaled by the combination's
/// multipliers. Every order's cancel time is re-derived from the
/// combination's cancel window.
#[derive(Debug, Clone, Default)]
pub struct StaticOrderSource {
    orders: HashMap<(String, String), Arc<[ProposedOrder]>>,
}

impl StaticOrderSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, timeframe: &str, orders: Vec<ProposedOrder>) {
        self.orders.insert(
            (normalize_symbol(symbol).to_string(), timeframe.to_string()),
            orders.into(),
        );
    }
}

impl OrderSource for StaticOrderSource {
    fn orders(
        &self,
        symbol: &str,
        timeframe: &str,
        parameters: &ParameterSet,
    ) -> Result<Option<Vec<ProposedOrder>>, OptimizerError> {
        let key = (normalize_symbol(symbol).to_string(), timeframe.to_string());
        let Some(orders) = self.orders.get(&key) else {
            return Ok(None);
        };

        let adjusted = orders
            .iter()
            .map(|order| ProposedOrder {
                stop_loss: order.stop_price
                    + (order.stop_loss - order.stop_price) * parameters.stop_loss_multiplier,
                take_profit: order.stop_price
                    + (order.take_profit - order.stop_price) * parameters.take_profit_multiplier,
                cancel_time: parameters.cancel_window.resolve(order.creation_time),
                ..order.clone()
            })
            .collect();
        Ok(Some(adjusted))
    }
}
