// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Parallel pumps: groups of pumps connected in parallel, with their
//! branches.

use crate::attributes::{sum_of, values_of, Formula};
use crate::component_category::CategoryPredicates;
use crate::{
    AggregatePlan, AggregationKind, Attribute, ComponentCategory, Error, Match, Node, TopologyGraph,
};

use super::{parallel_matches, plan_parallel, Aggregation};

pub(super) const AGGREGATABLE: &[ComponentCategory] = &[
    ComponentCategory::Pump,
    ComponentCategory::Pipe,
    ComponentCategory::PipeFitting,
    ComponentCategory::Valve,
    ComponentCategory::Aggregate(AggregationKind::PipeStrand),
    ComponentCategory::Aggregate(AggregationKind::MergedJunction),
    ComponentCategory::Aggregate(AggregationKind::ParallelPumps),
];

pub(super) const FORMULAS: &[Formula] = &[
    Formula {
        name: "pump_rating",
        outputs: &[
            Attribute::RatedPower,
            Attribute::RatedHeight,
            Attribute::RatedVolumeFlow,
        ],
        compute: pump_rating,
    },
    Formula {
        name: "pump_diameter",
        outputs: &[Attribute::Diameter],
        compute: pump_diameter,
    },
];

fn pumps<'a>(constituents: &[&'a dyn Node]) -> Vec<&'a dyn Node> {
    constituents
        .iter()
        .copied()
        .filter(|c| c.is_pump())
        .collect()
}

/// Powers and flows add up, while the head is limited by the weakest pump.
fn pump_rating(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    let pumps = pumps(constituents);
    vec![
        sum_of(&pumps, Attribute::RatedPower),
        values_of(&pumps, Attribute::RatedHeight).reduce(f64::min),
        sum_of(&pumps, Attribute::RatedVolumeFlow),
    ]
}

/// The diameter of a single pipe with the cross section of all pumps.
fn pump_diameter(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    let pumps = pumps(constituents);
    vec![values_of(&pumps, Attribute::Diameter)
        .map(|d| d * d)
        .reduce(|a, b| a + b)
        .map(f64::sqrt)]
}

/// Replaces every group of pumps in parallel with a single aggregate.
#[derive(Clone, Debug)]
pub struct ParallelPumps {
    /// The categories that may sit on the branches between the pumps.
    pub inert: Vec<ComponentCategory>,
    /// Splits the groups by equal value of this attribute.
    pub group_by: Option<Attribute>,
    /// Groups of this many pumps or fewer are left alone.
    pub min_group_size: Option<usize>,
}

impl Default for ParallelPumps {
    fn default() -> Self {
        Self {
            inert: vec![
                ComponentCategory::Pipe,
                ComponentCategory::PipeFitting,
                ComponentCategory::Valve,
                ComponentCategory::Aggregate(AggregationKind::PipeStrand),
            ],
            group_by: None,
            min_group_size: None,
        }
    }
}

impl Aggregation for ParallelPumps {
    fn kind(&self) -> AggregationKind {
        AggregationKind::ParallelPumps
    }

    fn find_matches<N: Node>(&self, graph: &TopologyGraph<N>) -> Result<Vec<Match>, Error> {
        let groups = graph.parallel_groups(
            &[
                ComponentCategory::Pump,
                ComponentCategory::Aggregate(AggregationKind::ParallelPumps),
            ],
            &self.inert,
            self.group_by,
            self.min_group_size,
        );
        Ok(parallel_matches(self.kind(), groups))
    }

    fn plan<N: Node>(
        &self,
        graph: &TopologyGraph<N>,
        found: &Match,
    ) -> Result<Vec<AggregatePlan>, Error> {
        plan_parallel(graph, self.kind(), found)
    }
}
