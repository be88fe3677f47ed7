// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The aggregation framework: finding structural motifs in a
//! [`TopologyGraph`] and replacing each of them with an aggregate.
//!
//! Every aggregation kind implements the [`Aggregation`] trait, and
//! [`TopologyGraph::aggregate`] runs one of them end to end.  The closed set
//! of kinds is listed by [`AggregationKind`], which also dispatches to the
//! constituent types and reduction formulas of each kind.

mod aggregated_zone;
mod consumer_circuit;
mod merged_junction;
mod parallel_consumers;
mod parallel_pumps;
mod pipe_strand;

pub use aggregated_zone::AggregatedZone;
pub use consumer_circuit::ConsumerCircuit;
pub use merged_junction::MergedJunction;
pub use parallel_consumers::ParallelConsumers;
pub use parallel_pumps::ParallelPumps;
pub use pipe_strand::PipeStrand;

use std::collections::{BTreeMap, BTreeSet};

use crate::attributes::Formula;
use crate::component_category::CategoryPredicates;
use crate::{
    AggregationKind, ComponentCategory, Error, Node, OuterConnection, ParallelGroup, PortId,
    TopologyGraph,
};

use merged_junction::junction_plan;

/// A match of an aggregation in a graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub(crate) kind: AggregationKind,
    pub(crate) elements: Vec<u64>,
    pub(crate) metadata: MatchMetadata,
}

impl Match {
    pub fn new(kind: AggregationKind, elements: Vec<u64>, metadata: MatchMetadata) -> Self {
        Self {
            kind,
            elements,
            metadata,
        }
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    /// Returns the ids of the matched components, in match order.
    pub fn elements(&self) -> &[u64] {
        &self.elements
    }

    pub fn metadata(&self) -> &MatchMetadata {
        &self.metadata
    }
}

/// What an aggregation found out about a match while finding it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MatchMetadata {
    #[default]
    None,
    /// The connections between the match and the surrounding boundary.
    OuterConnections(Vec<OuterConnection>),
    /// Edge ports of the match that merge into a single aggregate port.
    AggregatedPorts(Vec<PortId>),
    /// The regions of parallel groups that share junctions, each of which
    /// becomes its own aggregate.
    ParallelGroups(Vec<Vec<u64>>),
}

/// One aggregate to be created: the components it absorbs, and the edge
/// ports of those components that each of its ports replaces.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatePlan {
    pub kind: AggregationKind,
    pub members: Vec<u64>,
    pub port_groups: Vec<Vec<PortId>>,
}

/// An aggregation kind.
pub trait Aggregation {
    fn kind(&self) -> AggregationKind;

    /// Returns the matches in the given graph.  Doesn't change the graph.
    fn find_matches<N: Node>(&self, graph: &TopologyGraph<N>) -> Result<Vec<Match>, Error>;

    /// Returns the ports of the matched components that stay visible after
    /// aggregation.
    ///
    /// By default these are the ports connected to components outside the
    /// match.
    fn edge_ports<N: Node>(
        &self,
        graph: &TopologyGraph<N>,
        found: &Match,
    ) -> Result<Vec<PortId>, Error> {
        outward_ports(graph, &found.elements)
    }

    /// Returns the aggregates that replace the given match.  They are
    /// committed together.
    ///
    /// By default this is a single aggregate with one port per edge port.
    fn plan<N: Node>(
        &self,
        graph: &TopologyGraph<N>,
        found: &Match,
    ) -> Result<Vec<AggregatePlan>, Error> {
        Ok(vec![AggregatePlan {
            kind: self.kind(),
            members: found.elements.clone(),
            port_groups: self
                .edge_ports(graph, found)?
                .into_iter()
                .map(|port| vec![port])
                .collect(),
        }])
    }
}

impl AggregationKind {
    /// Returns the categories of the components that an aggregate of this
    /// kind can absorb.
    pub fn aggregatable_elements(&self) -> &'static [ComponentCategory] {
        match self {
            AggregationKind::PipeStrand => pipe_strand::AGGREGATABLE,
            AggregationKind::ParallelPumps => parallel_pumps::AGGREGATABLE,
            AggregationKind::MergedJunction => merged_junction::AGGREGATABLE,
            AggregationKind::ParallelConsumers => parallel_consumers::AGGREGATABLE,
            AggregationKind::ConsumerCircuit => consumer_circuit::AGGREGATABLE,
            AggregationKind::AggregatedZone => aggregated_zone::AGGREGATABLE,
        }
    }

    /// Returns the reduction formulas that derive the attributes of an
    /// aggregate of this kind from its constituents.
    pub fn formulas(&self) -> &'static [Formula] {
        match self {
            AggregationKind::PipeStrand => pipe_strand::FORMULAS,
            AggregationKind::ParallelPumps => parallel_pumps::FORMULAS,
            AggregationKind::MergedJunction => merged_junction::FORMULAS,
            AggregationKind::ParallelConsumers => parallel_consumers::FORMULAS,
            AggregationKind::ConsumerCircuit => consumer_circuit::FORMULAS,
            AggregationKind::AggregatedZone => aggregated_zone::FORMULAS,
        }
    }
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Finds all matches of the given aggregation and replaces each of them
    /// with an aggregate.
    ///
    /// Matches are found on the graph as it is before the first
    /// replacement.  A match with a component that an earlier replacement
    /// already absorbed is skipped.
    ///
    /// Returns the ids of the new aggregates.
    pub fn aggregate<A: Aggregation>(&mut self, aggregation: &A) -> Result<Vec<u64>, Error> {
        let matches = aggregation.find_matches(self)?;
        tracing::debug!("Found {} {} matches.", matches.len(), aggregation.kind());

        let mut created = vec![];
        for found in matches {
            if let Some(gone) = found
                .elements
                .iter()
                .find(|cid| self.component(**cid).is_err())
            {
                tracing::warn!(
                    "Skipping {} match {:?}, component {gone} is already aggregated.",
                    found.kind,
                    found.elements
                );
                continue;
            }

            let plans = aggregation.plan(self, &found)?;
            for plan in &plans {
                self.ensure_no_internal_edge_ports(
                    &plan.members.iter().copied().collect(),
                    &plan.port_groups.concat(),
                )?;
            }
            created.extend(self.commit(plans)?);
        }

        Ok(created)
    }

    /// Runs the default aggregations in sequence: pipe strands, parallel
    /// pumps, parallel consumers, consumer circuits and aggregated zones.
    ///
    /// Returns the ids of the new aggregates.
    pub fn simplify(&mut self) -> Result<Vec<u64>, Error> {
        let mut created = self.aggregate(&PipeStrand::default())?;
        created.extend(self.aggregate(&ParallelPumps::default())?);
        created.extend(self.aggregate(&ParallelConsumers::default())?);
        created.extend(self.aggregate(&PipeStrand::default())?);
        created.extend(self.aggregate(&ConsumerCircuit::default())?);
        created.extend(self.aggregate(&AggregatedZone::default())?);
        Ok(created)
    }
}

/// Returns the ports of the given components that are connected to a
/// component outside of them, in component and position order.
///
/// Unconnected ports are left out, so an aggregate only exposes the ports
/// that face other components, and loose ends disappear into it.
pub(crate) fn outward_ports<N: Node>(
    graph: &TopologyGraph<N>,
    members: &[u64],
) -> Result<Vec<PortId>, Error> {
    let set = members.iter().copied().collect::<BTreeSet<_>>();
    let mut ports = vec![];
    for cid in members {
        for port in graph.ports(*cid)? {
            if let Some(connection) = graph.port(*port)?.connection() {
                if !set.contains(&graph.port(connection)?.owner()) {
                    ports.push(*port);
                }
            }
        }
    }
    Ok(ports)
}

/// Turns parallel groups into matches.  Groups whose regions overlap share a
/// junction, and end up in a single match that is planned as a whole.
pub(crate) fn parallel_matches(kind: AggregationKind, groups: Vec<ParallelGroup>) -> Vec<Match> {
    let regions = groups
        .into_iter()
        .map(|group| group.region)
        .collect::<Vec<_>>();

    let mut label = (0..regions.len()).collect::<Vec<_>>();
    for i in 0..regions.len() {
        for j in 0..i {
            if regions[i].is_disjoint(&regions[j]) || label[i] == label[j] {
                continue;
            }
            let (from, to) = (label[i], label[j]);
            for l in label.iter_mut().filter(|l| **l == from) {
                *l = to;
            }
        }
    }
    let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, l) in label.into_iter().enumerate() {
        clusters.entry(l).or_default().push(index);
    }
    let mut clusters = clusters.into_values().collect::<Vec<_>>();
    clusters.sort();

    clusters
        .into_iter()
        .map(|indices| {
            let elements = indices
                .iter()
                .flat_map(|i| regions[*i].iter().copied())
                .collect::<BTreeSet<_>>();
            let metadata = if indices.len() > 1 {
                MatchMetadata::ParallelGroups(
                    indices
                        .iter()
                        .map(|i| regions[*i].iter().copied().collect())
                        .collect(),
                )
            } else {
                MatchMetadata::None
            };
            Match::new(kind, elements.into_iter().collect(), metadata)
        })
        .collect()
}

/// Plans the aggregates of a parallel match, one per group.
///
/// The outer ports of a group are the ports of its junctions that are
/// connected outside the group.  A junction is split off into a merged
/// junction if it is shared by several groups, or if its group has more
/// than two outer ports and it holds several of them.  A split junction
/// gets one combined port per group, facing the members of that group, and
/// keeps its other ports.  Each group then gets one port per outside port
/// it is connected to, with all ports facing a split junction combined.
///
/// All plans are committed together, the merged junctions first.
pub(crate) fn plan_parallel<N: Node>(
    graph: &TopologyGraph<N>,
    kind: AggregationKind,
    found: &Match,
) -> Result<Vec<AggregatePlan>, Error> {
    let groups = match &found.metadata {
        MatchMetadata::ParallelGroups(groups) => groups.clone(),
        _ => vec![found.elements.clone()],
    };
    let regions = groups
        .iter()
        .map(|group| group.iter().copied().collect::<BTreeSet<_>>())
        .collect::<Vec<_>>();
    let owner_of = |port: PortId| -> Result<Option<u64>, Error> {
        match graph.port(port)?.connection() {
            Some(connection) => Ok(Some(graph.port(connection)?.owner())),
            None => Ok(None),
        }
    };
    let splittable = |cid: u64| {
        graph
            .component(cid)
            .is_ok_and(|c| c.is_junction() && !c.is_pump())
    };

    let mut split = BTreeSet::new();
    for (index, region) in regions.iter().enumerate() {
        let mut outer: BTreeMap<u64, usize> = BTreeMap::new();
        for cid in region {
            if regions
                .iter()
                .enumerate()
                .any(|(other, r)| other != index && r.contains(cid))
            {
                if !splittable(*cid) {
                    return Err(Error::contract_violation(format!(
                        "Component {cid} is shared by several {kind} groups of {:?}, \
                         but isn't a junction.",
                        found.elements
                    )));
                }
                split.insert(*cid);
                continue;
            }
            if !splittable(*cid) {
                continue;
            }
            for port in graph.ports(*cid)? {
                if owner_of(*port)?.is_some_and(|owner| !region.contains(&owner)) {
                    *outer.entry(*cid).or_default() += 1;
                }
            }
        }
        if outer.values().sum::<usize>() > 2 {
            for (junction, count) in outer {
                if count > 1 {
                    split.insert(junction);
                }
            }
        }
    }

    let mut plans = vec![];
    for junction in &split {
        let mut combined = vec![];
        for region in regions.iter().filter(|r| r.contains(junction)) {
            let mut facing = vec![];
            for port in graph.ports(*junction)? {
                if owner_of(*port)?
                    .is_some_and(|owner| region.contains(&owner) && !split.contains(&owner))
                {
                    facing.push(*port);
                }
            }
            if !facing.is_empty() {
                combined.push(facing);
            }
        }
        tracing::debug!(
            "Splitting junction {junction} off the {kind} groups, combining {combined:?}."
        );
        plans.push(junction_plan(graph, vec![*junction], combined)?);
    }

    for region in &regions {
        let remaining = region
            .iter()
            .copied()
            .filter(|cid| !split.contains(cid))
            .collect::<Vec<_>>();
        let mut by_neighbor: BTreeMap<(u64, Option<PortId>), Vec<PortId>> = BTreeMap::new();
        for port in outward_ports(graph, &remaining)? {
            let Some(connection) = graph.port(port)?.connection() else {
                continue;
            };
            let owner = graph.port(connection)?.owner();
            let key = if split.contains(&owner) {
                (owner, None)
            } else {
                (owner, Some(connection))
            };
            by_neighbor.entry(key).or_default().push(port);
        }
        plans.push(AggregatePlan {
            kind,
            members: remaining,
            port_groups: by_neighbor.into_values().collect(),
        });
    }
    Ok(plans)
}
