// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Aggregated zones: thermal zones with equal conditions, as a single zone.

use std::collections::BTreeMap;

use crate::attributes::{sum_of, weighted_mean_of, Formula};
use crate::{
    AggregationKind, Attribute, ComponentCategory, Error, Match, MatchMetadata, Node,
    TopologyGraph,
};

use super::Aggregation;

pub(super) const AGGREGATABLE: &[ComponentCategory] = &[
    ComponentCategory::ThermalZone,
    ComponentCategory::Aggregate(AggregationKind::AggregatedZone),
];

pub(super) const FORMULAS: &[Formula] = &[
    Formula {
        name: "zone_size",
        outputs: &[Attribute::NetArea, Attribute::Volume],
        compute: zone_size,
    },
    Formula {
        name: "zone_set_point",
        outputs: &[Attribute::HeatingSetPoint],
        compute: zone_set_point,
    },
];

fn zone_size(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    vec![
        sum_of(constituents, Attribute::NetArea),
        sum_of(constituents, Attribute::Volume),
    ]
}

/// The set point, weighted by floor area.
fn zone_set_point(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    vec![weighted_mean_of(
        constituents,
        Attribute::HeatingSetPoint,
        Attribute::NetArea,
    )]
}

/// Replaces every group of thermal zones with an equal value of an attribute
/// with a single zone.
#[derive(Clone, Debug)]
pub struct AggregatedZone {
    pub group_by: Attribute,
    /// Groups of this many zones or fewer are left alone.
    pub min_group_size: usize,
}

impl Default for AggregatedZone {
    fn default() -> Self {
        Self {
            group_by: Attribute::HeatingSetPoint,
            min_group_size: 1,
        }
    }
}

impl Aggregation for AggregatedZone {
    fn kind(&self) -> AggregationKind {
        AggregationKind::AggregatedZone
    }

    fn find_matches<N: Node>(&self, graph: &TopologyGraph<N>) -> Result<Vec<Match>, Error> {
        let mut groups: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        for zone in graph
            .components()
            .filter(|c| AGGREGATABLE.contains(&c.category()))
        {
            match zone.attribute(self.group_by) {
                Some(value) => groups
                    .entry(value.to_bits())
                    .or_default()
                    .push(zone.component_id()),
                None => tracing::warn!(
                    "Zone {} has no {}, leaving it alone.",
                    zone.component_id(),
                    self.group_by
                ),
            }
        }

        let mut groups = groups
            .into_values()
            .filter(|zones| zones.len() > self.min_group_size)
            .map(|mut zones| {
                zones.sort_unstable();
                zones
            })
            .collect::<Vec<_>>();
        groups.sort();

        Ok(groups
            .into_iter()
            .map(|zones| Match::new(self.kind(), zones, MatchMetadata::None))
            .collect())
    }
}
