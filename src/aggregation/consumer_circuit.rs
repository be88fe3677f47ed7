// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Consumer circuits: everything between the distributors that feeds a
//! consumer, as a single consumer.

use crate::attributes::{values_of, Formula};
use crate::component_category::CategoryPredicates;
use crate::{
    AggregationKind, Attribute, ComponentCategory, Error, Match, MatchMetadata, Node, PortId,
    TopologyGraph,
};

use super::parallel_consumers::consumer_demand;
use super::Aggregation;

/// Density of water times standard gravity, per 3600 s/h and 1000 W/kW.
const PUMP_POWER_FACTOR: f64 = 9.81 / 3600.0;

pub(super) const AGGREGATABLE: &[ComponentCategory] = &[
    ComponentCategory::Pipe,
    ComponentCategory::PipeFitting,
    ComponentCategory::Valve,
    ComponentCategory::Pump,
    ComponentCategory::SpaceHeater,
    ComponentCategory::Storage,
    ComponentCategory::Aggregate(AggregationKind::PipeStrand),
    ComponentCategory::Aggregate(AggregationKind::ParallelPumps),
    ComponentCategory::Aggregate(AggregationKind::MergedJunction),
    ComponentCategory::Aggregate(AggregationKind::ParallelConsumers),
    ComponentCategory::Aggregate(AggregationKind::ConsumerCircuit),
];

pub(super) const FORMULAS: &[Formula] = &[
    Formula {
        name: "consumer_demand",
        outputs: &[
            Attribute::RatedPower,
            Attribute::FlowTemperature,
            Attribute::ReturnTemperature,
        ],
        compute: consumer_demand,
    },
    Formula {
        name: "circuit_pumps",
        outputs: &[
            Attribute::RatedPumpPower,
            Attribute::RatedVolumeFlow,
            Attribute::RatedHeight,
        ],
        compute: circuit_pumps,
    },
];

/// The summed electrical power of the pumps of the circuit, with the largest
/// flow and head among them.
///
/// A pump without a rated power contributes its hydraulic power, from its
/// rated flow and head.
fn circuit_pumps(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    let pumps = constituents
        .iter()
        .copied()
        .filter(|c| c.is_pump())
        .collect::<Vec<_>>();

    let power = pumps
        .iter()
        .filter_map(|pump| {
            let power = pump.attribute(Attribute::RatedPower).or_else(|| {
                let flow = pump.attribute(Attribute::RatedVolumeFlow)?;
                let height = pump.attribute(Attribute::RatedHeight)?;
                tracing::debug!(
                    "Inferring the power of {}:{} from its flow and head.",
                    pump.category(),
                    pump.component_id()
                );
                Some(flow * height * PUMP_POWER_FACTOR)
            });
            if power.is_none() {
                tracing::warn!(
                    "{}:{} has no RatedPower, skipping it.",
                    pump.category(),
                    pump.component_id()
                );
            }
            power
        })
        .reduce(|a, b| a + b);

    vec![
        power,
        values_of(&pumps, Attribute::RatedVolumeFlow).reduce(f64::max),
        values_of(&pumps, Attribute::RatedHeight).reduce(f64::max),
    ]
}

/// Replaces every region between the boundary components that feeds a
/// consumer with a single aggregate.
#[derive(Clone, Debug)]
pub struct ConsumerCircuit {
    /// The categories at which the graph is cut into regions.
    pub boundary: Vec<ComponentCategory>,
    /// Regions holding one of these categories are consumer circuits.
    pub whitelist: Vec<ComponentCategory>,
    /// Regions holding only these categories are generator circuits.
    pub blacklist: Vec<ComponentCategory>,
}

impl Default for ConsumerCircuit {
    fn default() -> Self {
        Self {
            boundary: vec![ComponentCategory::Distributor],
            whitelist: vec![
                ComponentCategory::SpaceHeater,
                ComponentCategory::Aggregate(AggregationKind::ParallelConsumers),
            ],
            blacklist: vec![
                ComponentCategory::Boiler,
                ComponentCategory::HeatPump,
                ComponentCategory::Chiller,
                ComponentCategory::Chp,
            ],
        }
    }
}

impl Aggregation for ConsumerCircuit {
    fn kind(&self) -> AggregationKind {
        AggregationKind::ConsumerCircuit
    }

    fn find_matches<N: Node>(&self, graph: &TopologyGraph<N>) -> Result<Vec<Match>, Error> {
        let partition =
            graph.boundary_partition(&self.boundary, &self.whitelist, &self.blacklist)?;

        let mut matches = vec![];
        for region in partition.consumers {
            if region.outer_connections.is_empty() {
                tracing::debug!(
                    "Consumer region {:?} is not connected to the boundary, skipping it.",
                    region.members
                );
                continue;
            }
            if let Some(cid) = region
                .members
                .iter()
                .find(|cid| !graph.has_category(**cid, AGGREGATABLE))
            {
                tracing::warn!(
                    "Consumer region {:?} holds component {cid}, which a {} can't absorb, \
                     skipping it.",
                    region.members,
                    self.kind()
                );
                continue;
            }
            matches.push(Match::new(
                self.kind(),
                region.members.into_iter().collect(),
                MatchMetadata::OuterConnections(region.outer_connections),
            ));
        }
        Ok(matches)
    }

    /// The region-side ports of the connections to the boundary.
    fn edge_ports<N: Node>(
        &self,
        _graph: &TopologyGraph<N>,
        found: &Match,
    ) -> Result<Vec<PortId>, Error> {
        match &found.metadata {
            MatchMetadata::OuterConnections(connections) => {
                Ok(connections.iter().map(|c| c.region_port).collect())
            }
            other => Err(Error::contract_violation(format!(
                "{} match {:?} carries {other:?} instead of its outer connections.",
                self.kind(),
                found.elements
            ))),
        }
    }
}
