// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Merged junctions: junctions joined by short pass-through paths, merged
//! into a single junction.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use crate::attributes::Formula;
use crate::component_category::CategoryPredicates;
use crate::{
    AggregatePlan, AggregationKind, Attribute, ComponentCategory, Error, Match, MatchMetadata,
    Node, PortId, TopologyGraph,
};

use super::{outward_ports, Aggregation};

pub(super) const AGGREGATABLE: &[ComponentCategory] = &[
    ComponentCategory::PipeFitting,
    ComponentCategory::Distributor,
    ComponentCategory::Pipe,
    ComponentCategory::Valve,
    ComponentCategory::Aggregate(AggregationKind::PipeStrand),
    ComponentCategory::Aggregate(AggregationKind::MergedJunction),
];

pub(super) const FORMULAS: &[Formula] = &[Formula {
    name: "junction_volume",
    outputs: &[Attribute::Volume],
    compute: junction_volume,
}];

/// The water volume of the constituents.  Pipes without a volume contribute
/// their inner volume.
fn junction_volume(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    let volumes = constituents
        .iter()
        .filter_map(|c| {
            let volume = c.attribute(Attribute::Volume).or_else(|| {
                if !c.is_pipe() {
                    return None;
                }
                let (length, diameter) =
                    (c.attribute(Attribute::Length)?, c.attribute(Attribute::Diameter)?);
                Some(PI / 4.0 * diameter * diameter * length)
            });
            if volume.is_none() {
                tracing::warn!(
                    "{}:{} has no Volume, skipping it.",
                    c.category(),
                    c.component_id()
                );
            }
            volume
        })
        .collect::<Vec<_>>();
    vec![volumes.into_iter().reduce(|a, b| a + b)]
}

/// Merges junctions that are connected through pass-through components only.
#[derive(Clone, Debug)]
pub struct MergedJunction {
    /// The categories of the junctions to merge.
    pub wanted: Vec<ComponentCategory>,
    /// The categories that may sit on the paths between the junctions.
    pub inert: Vec<ComponentCategory>,
    /// Edge ports that merge into a single port of their aggregate.  The
    /// other edge ports stay separate.
    pub aggr_ports: Vec<PortId>,
}

impl Default for MergedJunction {
    fn default() -> Self {
        Self {
            wanted: vec![
                ComponentCategory::PipeFitting,
                ComponentCategory::Aggregate(AggregationKind::MergedJunction),
            ],
            inert: vec![
                ComponentCategory::Pipe,
                ComponentCategory::Valve,
                ComponentCategory::Aggregate(AggregationKind::PipeStrand),
            ],
            aggr_ports: vec![],
        }
    }
}

impl Aggregation for MergedJunction {
    fn kind(&self) -> AggregationKind {
        AggregationKind::MergedJunction
    }

    fn find_matches<N: Node>(&self, graph: &TopologyGraph<N>) -> Result<Vec<Match>, Error> {
        let is_junction =
            |cid: u64| graph.component(cid).is_ok_and(|c| c.is_junction());
        let view = graph.element_view().restricted(|cid| {
            graph.has_category(cid, &self.wanted) || graph.has_category(cid, &self.inert)
        });
        let junctions = view
            .component_ids()
            .into_iter()
            .filter(|cid| graph.has_category(*cid, &self.wanted) && is_junction(*cid))
            .collect::<BTreeSet<_>>();

        let mut groups: Vec<BTreeSet<u64>> = vec![];
        for path in view.direct_paths(&junctions, &junctions, is_junction) {
            let mut merged = path.into_iter().collect::<BTreeSet<_>>();
            groups.retain(|group| {
                if group.is_disjoint(&merged) {
                    return true;
                }
                merged.extend(group.iter().copied());
                false
            });
            groups.push(merged);
        }
        groups.sort();

        let mut matches = vec![];
        for group in groups {
            let mut aggr_ports = vec![];
            for port in &self.aggr_ports {
                if group.contains(&graph.port(*port)?.owner()) {
                    aggr_ports.push(*port);
                }
            }
            let metadata = if aggr_ports.is_empty() {
                MatchMetadata::None
            } else {
                MatchMetadata::AggregatedPorts(aggr_ports)
            };
            matches.push(Match::new(self.kind(), group.into_iter().collect(), metadata));
        }
        Ok(matches)
    }

    fn plan<N: Node>(
        &self,
        graph: &TopologyGraph<N>,
        found: &Match,
    ) -> Result<Vec<AggregatePlan>, Error> {
        let combined = match &found.metadata {
            MatchMetadata::AggregatedPorts(ports) => vec![ports.clone()],
            _ => vec![],
        };
        Ok(vec![junction_plan(graph, found.elements.clone(), combined)?])
    }
}

/// Plans a merged junction of the given members with one port for each of
/// the `combined` groups of edge ports, followed by one port for each of the
/// remaining edge ports.
pub(super) fn junction_plan<N: Node>(
    graph: &TopologyGraph<N>,
    members: Vec<u64>,
    combined: Vec<Vec<PortId>>,
) -> Result<AggregatePlan, Error> {
    let edge_ports = outward_ports(graph, &members)?;
    if let Some(port) = combined.iter().flatten().find(|p| !edge_ports.contains(p)) {
        return Err(Error::contract_violation(format!(
            "{port} is not an edge port of the junctions {members:?}."
        )));
    }

    let mut port_groups = combined
        .into_iter()
        .filter(|group| !group.is_empty())
        .collect::<Vec<_>>();
    let taken = port_groups.concat();
    port_groups.extend(
        edge_ports
            .into_iter()
            .filter(|p| !taken.contains(p))
            .map(|p| vec![p]),
    );

    Ok(AggregatePlan {
        kind: AggregationKind::MergedJunction,
        members,
        port_groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_utils::{ComponentHandle, TestComponent, TopologyGraphBuilder};
    use crate::ErrorKind;

    /// Two tees joined by a short pipe, each with two more branches.
    fn twin_tees() -> (TopologyGraphBuilder, [ComponentHandle; 3]) {
        let mut builder = TopologyGraphBuilder::new();
        let a = builder.add(
            TestComponent::new(0, ComponentCategory::PipeFitting, 3).with(Attribute::Volume, 0.001),
        );
        let link = builder.pipe(0.2, 0.1);
        let b = builder.fitting(3);
        builder.series(&[a, link]).connect(link, 1, b, 0);
        for (tee, port) in [(a, 0), (a, 2), (b, 1), (b, 2)] {
            let branch = builder.pipe(1.0, 0.02);
            builder.connect(tee, port, branch, 0);
        }
        (builder, [a, link, b])
    }

    #[test]
    fn test_merged_junction() -> Result<(), Error> {
        let (builder, [a, link, b]) = twin_tees();
        let mut graph = builder.build(None)?;

        let matches = MergedJunction::default().find_matches(&graph)?;
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].elements(),
            [a.component_id(), link.component_id(), b.component_id()]
        );
        assert_eq!(
            MergedJunction::default()
                .edge_ports(&graph, &matches[0])?
                .len(),
            4
        );

        let created = graph.aggregate(&MergedJunction::default())?;
        let junction = graph.component(created[0])?;
        assert_eq!(junction.port_count(), 4);
        assert!(junction.is_junction());
        // The unnamed tee has no volume and is skipped.
        let expected = 0.001 + PI / 4.0 * 0.1 * 0.1 * 0.2;
        assert!(junction
            .attribute(Attribute::Volume)
            .is_some_and(|v| (v - expected).abs() < 1e-12));
        assert_eq!(graph.element_view().degree(created[0]), 4);

        Ok(())
    }

    #[test]
    fn test_aggr_ports() -> Result<(), Error> {
        let (builder, [a, _, b]) = twin_tees();
        let mut graph = builder.build(None)?;
        let a_ports = graph.ports(a.component_id())?.to_vec();
        let b_ports = graph.ports(b.component_id())?.to_vec();

        let aggregation = MergedJunction {
            aggr_ports: vec![a_ports[2], b_ports[2]],
            ..Default::default()
        };
        let matches = aggregation.find_matches(&graph)?;
        assert_eq!(
            matches[0].metadata(),
            &MatchMetadata::AggregatedPorts(vec![a_ports[2], b_ports[2]])
        );
        let plans = aggregation.plan(&graph, &matches[0])?;
        assert_eq!(
            plans[0].port_groups,
            vec![
                vec![a_ports[2], b_ports[2]],
                vec![a_ports[0]],
                vec![b_ports[1]]
            ]
        );

        // The combined port would be connected to both branches.
        let before = graph.links().count();
        assert!(graph
            .aggregate(&aggregation)
            .is_err_and(|e| e.kind() == ErrorKind::ContractViolation));
        assert_eq!(graph.links().count(), before);
        assert_eq!(graph.aggregates().count(), 0);

        Ok(())
    }

    #[test]
    fn test_aggr_ports_must_be_edge_ports() -> Result<(), Error> {
        let (builder, [a, ..]) = twin_tees();
        let mut graph = builder.build(None)?;

        // The port of tee A towards the short pipe is internal.
        let aggregation = MergedJunction {
            aggr_ports: vec![graph.ports(a.component_id())?[1]],
            ..Default::default()
        };
        assert!(graph
            .aggregate(&aggregation)
            .is_err_and(|e| e.kind() == ErrorKind::ContractViolation));
        assert_eq!(graph.aggregates().count(), 0);

        Ok(())
    }
}
