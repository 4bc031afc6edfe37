use crate::error::OptimizerError;
use configuration::{ParameterAxis, ParameterRange, ParameterSpace, TrailingConfig, TrailingPolicy};
use core_types::CancelWindow;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// One point of the parameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub take_profit_multiplier: Decimal,
    pub stop_loss_multiplier: Decimal,
    pub fast_period: u32,
    pub slow_period: u32,
    pub signal_period: u32,
    pub cancel_window: CancelWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop_pips: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_take_profit_pips: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_take_profit_percent: Option<Decimal>,
}

impl ParameterSet {
    /// Checks the rules a single combination must satisfy to be simulated.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.fast_period >= self.slow_period {
            return Err(OptimizerError::InvalidParameters(format!(
                "fast period {} must be shorter than slow period {}",
                self.fast_period, self.slow_period
            )));
        }
        if self.take_profit_multiplier <= Decimal::ZERO || self.stop_loss_multiplier <= Decimal::ZERO {
            return Err(OptimizerError::InvalidParameters(
                "take-profit and stop-loss multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The trailing rules for this combination. Grid values replace the base policy.
    pub fn trailing(&self, base: &TrailingConfig) -> Result<TrailingConfig, OptimizerError> {
        let stop_loss = pick_policy(
            "stop-loss",
            self.trailing_stop_pips,
            self.trailing_stop_percent,
            &base.stop_loss,
        )?;
        let take_profit = pick_policy(
            "take-profit",
            self.trailing_take_profit_pips,
            self.trailing_take_profit_percent,
            &base.take_profit,
        )?;
        Ok(TrailingConfig { stop_loss, take_profit })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn pick_policy(
    level: &str,
    pips: Option<Decimal>,
    percent: Option<Decimal>,
    base: &Option<TrailingPolicy>,
) -> Result<Option<TrailingPolicy>, OptimizerError> {
    match (pips, percent) {
        (Some(_), Some(_)) => Err(OptimizerError::InvalidParameters(format!(
            "trailing {level} cannot use both pips and percent"
        ))),
        (Some(pips), None) => Ok(Some(TrailingPolicy::Pips(pips))),
        (None, Some(percent)) => Ok(Some(TrailingPolicy::Percent(percent))),
        (None, None) => Ok(base.clone()),
    }
}

/// Generates every combination of the parameter space, in declared axis order.
///
/// Axes not marked `optimize` contribute only their first value.
pub fn generate_parameter_sets(space: &ParameterSpace) -> Result<Vec<ParameterSet>, OptimizerError> {
    // 1. Convert all parameter ranges into concrete lists of values.
    let mut param_names = Vec::new();
    let mut value_lists = Vec::new();
    for (name, axis) in space.axes() {
        let mut values = axis_values(name, axis)?;
        if !axis.optimize {
            values.truncate(1);
        }
        param_names.push(name);
        value_lists.push(values);
    }

    // 2. Use itertools::multi_cartesian_product to generate all combinations.
    value_lists
        .into_iter()
        .multi_cartesian_product()
        .map(|product| {
            let mut map = Map::new();
            for (name, value) in param_names.iter().zip(product) {
                map.insert((*name).to_string(), value);
            }
            serde_json::from_value::<ParameterSet>(Value::Object(map))
                .map_err(|e| OptimizerError::ParameterGeneration(e.to_string()))
        })
        .collect()
}

fn axis_values(name: &str, axis: &ParameterAxis) -> Result<Vec<Value>, OptimizerError> {
    let values: Vec<Value> = match &axis.values {
        ParameterRange::DiscreteInt(vals) => vals.iter().map(|&v| json!(v)).collect(),
        ParameterRange::DiscreteDecimal(vals) => vals.iter().map(|v| json!(v)).collect(),
        ParameterRange::Keywords(vals) => vals.iter().map(|v| json!(v)).collect(),
        ParameterRange::LinearInt { start, end, step } => {
            if *step <= 0 {
                return Err(OptimizerError::ParameterGeneration(format!(
                    "Step for '{name}' must be positive."
                )));
            }
            (*start..=*end).step_by(*step as usize).map(|v| json!(v)).collect()
        }
        ParameterRange::LinearDecimal { start, end, step } => {
            if step.is_sign_negative() || step.is_zero() {
                return Err(OptimizerError::ParameterGeneration(format!(
                    "Step for '{name}' must be positive."
                )));
            }
            let mut vals = Vec::new();
            let mut current = *start;
            while current <= *end {
                vals.push(json!(current));
                current += *step;
            }
            vals
        }
    };
    if values.is_empty() {
        return Err(OptimizerError::ParameterGeneration(format!(
            "Parameter '{name}' has no values."
        )));
    }
    Ok(values)
}
