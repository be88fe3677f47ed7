// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Domain attributes of components, and the memoized reduction formulas that
//! aggregates use to derive their attributes from their constituents.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Node;

/// A named domain attribute of a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    /// Length of a pipe run, in m.
    Length,
    /// Inner diameter, in m.
    Diameter,
    /// Water volume, in m³.
    Volume,
    /// Rated thermal or electrical power, in kW.
    RatedPower,
    /// Rated delivery head of a pump, in m.
    RatedHeight,
    /// Rated volume flow, in m³/h.
    RatedVolumeFlow,
    /// Rated electrical power of the pumps of a circuit, in kW.
    RatedPumpPower,
    /// Design flow temperature, in °C.
    FlowTemperature,
    /// Design return temperature, in °C.
    ReturnTemperature,
    /// Net floor area of a zone, in m².
    NetArea,
    /// Heating set point of a zone, in °C.
    HeatingSetPoint,
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A reduction formula that computes one or more attributes of an aggregate
/// from its constituents.
///
/// All outputs of a formula are computed together, and cached together.
pub struct Formula {
    pub(crate) name: &'static str,
    pub(crate) outputs: &'static [Attribute],
    pub(crate) compute: fn(&[&dyn Node]) -> Vec<Option<f64>>,
}

impl Formula {
    /// Returns the attributes computed by the formula, in output order.
    pub fn outputs(&self) -> &'static [Attribute] {
        self.outputs
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A memoization table from formula name to the full output tuple of the
/// formula.
#[derive(Debug, Default)]
pub(crate) struct AttributeMemo {
    values: RefCell<BTreeMap<&'static str, Vec<Option<f64>>>>,
}

impl AttributeMemo {
    /// Returns the value of `attribute` from the first formula in `formulas`
    /// that outputs it, evaluating the formula only the first time any of its
    /// outputs is requested.
    pub(crate) fn resolve<'a>(
        &self,
        formulas: &[Formula],
        attribute: Attribute,
        constituents: impl FnOnce() -> Vec<&'a dyn Node>,
    ) -> Option<f64> {
        let formula = formulas.iter().find(|f| f.outputs.contains(&attribute))?;
        let position = formula.outputs.iter().position(|a| *a == attribute)?;

        let cached = self
            .values
            .borrow()
            .get(formula.name)
            .map(|values| values.get(position).copied().flatten());
        if let Some(value) = cached {
            return value;
        }

        let values = (formula.compute)(&constituents());
        if values.len() != formula.outputs.len() {
            tracing::warn!(
                "Formula {} returned {} values for {} outputs.",
                formula.name,
                values.len(),
                formula.outputs.len()
            );
        }
        let value = values.get(position).copied().flatten();
        self.values.borrow_mut().insert(formula.name, values);
        value
    }

    /// Returns true if the given formula was already evaluated.
    #[cfg(test)]
    pub(crate) fn is_cached(&self, formula: &str) -> bool {
        self.values.borrow().contains_key(formula)
    }
}

/// Returns the sum of the given attribute over the constituents that have it,
/// or `None` if none of them has it.  Constituents without the attribute are
/// logged and skipped.
pub(crate) fn sum_of(constituents: &[&dyn Node], attribute: Attribute) -> Option<f64> {
    values_of(constituents, attribute).reduce(|a, b| a + b)
}

/// Returns the values of the given attribute of the constituents that have
/// it.  Constituents without the attribute are logged and skipped.
pub(crate) fn values_of<'a>(
    constituents: &'a [&'a dyn Node],
    attribute: Attribute,
) -> impl Iterator<Item = f64> + 'a {
    constituents.iter().filter_map(move |c| {
        let value = c.attribute(attribute);
        if value.is_none() {
            tracing::warn!(
                "{}:{} has no {}, skipping it.",
                c.category(),
                c.component_id(),
                attribute
            );
        }
        value
    })
}

/// Returns the arithmetic mean of the given attribute over the constituents
/// that have it.
pub(crate) fn mean_of(constituents: &[&dyn Node], attribute: Attribute) -> Option<f64> {
    let values = values_of(constituents, attribute).collect::<Vec<_>>();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Returns the mean of `attribute` weighted by `weight`, skipping
/// constituents that lack either.
pub(crate) fn weighted_mean_of(
    constituents: &[&dyn Node],
    attribute: Attribute,
    weight: Attribute,
) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for c in constituents {
        match (c.attribute(attribute), c.attribute(weight)) {
            (Some(value), Some(w)) => {
                weighted += value * w;
                total += w;
            }
            _ => tracing::warn!(
                "{}:{} lacks {} or {}, skipping it.",
                c.category(),
                c.component_id(),
                attribute,
                weight
            ),
        }
    }
    (total > 0.0).then(|| weighted / total)
}
