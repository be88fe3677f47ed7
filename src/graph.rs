// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of the ports of the components of a heating or
//! cooling network, and the connections between them.

mod creation;
mod element_view;
mod flow_side;
pub mod iterators;
mod merge;
mod retrieval;
mod serialization;
mod structure;
mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

pub use element_view::ElementGraph;
pub use merge::ReplacementMapping;
pub use serialization::{AdjacencyList, AggregateEntry, LinkEntry, PortEntry};
pub use structure::{BoundaryPartition, OuterConnection, ParallelGroup, PartitionRegion};

use std::collections::{BTreeMap, HashMap};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;

use crate::{Element, Error, Link, Node, Port, PortId, TopologyGraphConfig};

/// Ports stored in a `StableUnGraph` instance can be addressed with
/// `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any `PortId` that
/// is currently a node of the graph.
pub(crate) type NodeIndexMap = HashMap<PortId, NodeIndex>;

/// The port-level part of a `TopologyGraph`: the arena of all ports ever
/// created, and the graph over the ports that are currently linked.
///
/// This is the part that a merge rewrites, so it is kept cloneable.
#[derive(Clone, Debug, Default)]
pub(crate) struct PortGraph {
    pub(crate) graph: StableUnGraph<PortId, Link>,
    pub(crate) node_indices: NodeIndexMap,
    pub(crate) ports: BTreeMap<PortId, Port>,
}

impl PortGraph {
    pub(crate) fn port(&self, id: PortId) -> Result<&Port, Error> {
        self.ports
            .get(&id)
            .ok_or_else(|| Error::port_not_found(format!("{id} not found.")))
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Result<&mut Port, Error> {
        self.ports
            .get_mut(&id)
            .ok_or_else(|| Error::port_not_found(format!("{id} not found.")))
    }

    /// Returns the node index of the given port, adding the port to the graph
    /// if it isn't a node yet.
    pub(crate) fn ensure_node(&mut self, id: PortId) -> NodeIndex {
        if let Some(index) = self.node_indices.get(&id) {
            return *index;
        }
        let index = self.graph.add_node(id);
        self.node_indices.insert(id, index);
        index
    }

    /// Links two ports, adding them to the graph if necessary.  Linking the
    /// same pair twice keeps a single edge, and a connection is never
    /// downgraded to an inner link.
    pub(crate) fn add_link(&mut self, a: PortId, b: PortId, link: Link) {
        let a = self.ensure_node(a);
        let b = self.ensure_node(b);
        if let Some(edge) = self.graph.find_edge(a, b) {
            if self.graph[edge] == Link::Connection {
                return;
            }
        }
        self.graph.update_edge(a, b, link);
    }

    /// Removes the given port from the graph, together with its links.
    pub(crate) fn remove_node(&mut self, id: PortId) {
        if let Some(index) = self.node_indices.remove(&id) {
            self.graph.remove_node(index);
        }
    }

    /// Returns the ports linked to the given port, together with the kind of
    /// the link.  Ports that aren't nodes of the graph have no links.
    pub(crate) fn links(&self, id: PortId) -> Vec<(PortId, Link)> {
        let Some(&index) = self.node_indices.get(&id) else {
            return vec![];
        };
        let mut links = self
            .graph
            .edges(index)
            .map(|edge| {
                let other = if edge.source() == index {
                    edge.target()
                } else {
                    edge.source()
                };
                (self.graph[other], *edge.weight())
            })
            .collect::<Vec<_>>();
        links.sort_by_key(|(port, _)| *port);
        links
    }
}

/// A graph representation of a heating or cooling network: the ports of the
/// components are the nodes, and the connections between components as well
/// as the pass-throughs inside components are the edges.
///
/// The graph owns its components.  Components absorbed by an aggregate move
/// into that aggregate.
pub struct TopologyGraph<N>
where
    N: Node,
{
    topology: PortGraph,
    elements: BTreeMap<u64, Element<N>>,
    element_ports: BTreeMap<u64, Vec<PortId>>,
    next_port_id: u64,
    next_component_id: u64,
    config: TopologyGraphConfig,
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns a fresh port id.
    fn allocate_port(&mut self) -> PortId {
        let id = PortId(self.next_port_id);
        self.next_port_id += 1;
        id
    }
}
