// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The component-level view of a [`TopologyGraph`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::Bfs;

use crate::{Node, TopologyGraph};

use super::PortGraph;

/// An undirected graph whose nodes are component ids.  Two components are
/// adjacent if a link of the port graph joins a port of one to a port of the
/// other.
///
/// The view is derived on demand and is not updated when the `TopologyGraph`
/// changes.
#[derive(Clone, Debug, Default)]
pub struct ElementGraph {
    graph: StableUnGraph<u64, ()>,
    node_indices: HashMap<u64, NodeIndex>,
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns the element view of the current graph.
    pub fn element_view(&self) -> ElementGraph {
        ElementGraph::from_ports(&self.topology)
    }
}

impl ElementGraph {
    pub(super) fn from_ports(topology: &PortGraph) -> Self {
        let owners = topology
            .graph
            .node_indices()
            .filter_map(|index| topology.ports.get(&topology.graph[index]))
            .map(|port| port.owner)
            .collect::<BTreeSet<_>>();

        let mut view = Self::with_nodes(owners);
        for edge in topology.graph.edge_indices() {
            let Some((a, b)) = topology.graph.edge_endpoints(edge) else {
                continue;
            };
            let (Some(a), Some(b)) = (
                topology.ports.get(&topology.graph[a]),
                topology.ports.get(&topology.graph[b]),
            ) else {
                continue;
            };
            if a.owner != b.owner {
                view.add_edge(a.owner, b.owner);
            }
        }
        view
    }

    fn with_nodes(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut view = Self::default();
        for id in ids {
            let index = view.graph.add_node(id);
            view.node_indices.insert(id, index);
        }
        view
    }

    fn add_edge(&mut self, a: u64, b: u64) {
        if let (Some(&a), Some(&b)) = (self.node_indices.get(&a), self.node_indices.get(&b)) {
            self.graph.update_edge(a, b, ());
        }
    }

    /// Returns true if the given component is a node of the view.
    pub fn contains(&self, component_id: u64) -> bool {
        self.node_indices.contains_key(&component_id)
    }

    /// Returns the ids of the components in the view, in ascending order.
    pub fn component_ids(&self) -> Vec<u64> {
        let mut ids = self.node_indices.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the neighbors of the given component, in ascending order.
    pub fn neighbors(&self, component_id: u64) -> Vec<u64> {
        let Some(&index) = self.node_indices.get(&component_id) else {
            return vec![];
        };
        let mut neighbors = self
            .graph
            .neighbors(index)
            .map(|n| self.graph[n])
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Returns the number of distinct neighbors of the given component.
    pub fn degree(&self, component_id: u64) -> usize {
        self.neighbors(component_id).len()
    }

    pub fn has_edge(&self, a: u64, b: u64) -> bool {
        match (self.node_indices.get(&a), self.node_indices.get(&b)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Removes the given component and its edges from the view.
    pub(crate) fn remove(&mut self, component_id: u64) {
        if let Some(index) = self.node_indices.remove(&component_id) {
            self.graph.remove_node(index);
        }
    }

    /// Removes the edge between the given components, if there is one.
    pub(crate) fn remove_edge(&mut self, a: u64, b: u64) {
        if let (Some(&a), Some(&b)) = (self.node_indices.get(&a), self.node_indices.get(&b)) {
            if let Some(edge) = self.graph.find_edge(a, b) {
                self.graph.remove_edge(edge);
            }
        }
    }

    /// Returns the subgraph induced by the components that satisfy the given
    /// predicate.
    pub(crate) fn restricted(&self, mut keep: impl FnMut(u64) -> bool) -> Self {
        let kept = self
            .component_ids()
            .into_iter()
            .filter(|id| keep(*id))
            .collect::<Vec<_>>();
        let mut view = Self::with_nodes(kept.iter().copied());
        for id in &kept {
            for neighbor in self.neighbors(*id) {
                if *id < neighbor {
                    view.add_edge(*id, neighbor);
                }
            }
        }
        view
    }

    /// Returns the connected components of the view, ordered by their
    /// smallest component id.
    pub(crate) fn connected_components(&self) -> Vec<BTreeSet<u64>> {
        let mut seen = BTreeSet::new();
        let mut components = vec![];
        for id in self.component_ids() {
            if seen.contains(&id) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut bfs = Bfs::new(&self.graph, self.node_indices[&id]);
            while let Some(index) = bfs.next(&self.graph) {
                component.insert(self.graph[index]);
            }
            seen.extend(component.iter().copied());
            components.push(component);
        }
        components
    }

    /// Returns the adjacency lists of the view.
    pub(crate) fn adjacency(&self) -> BTreeMap<u64, Vec<u64>> {
        self.component_ids()
            .into_iter()
            .map(|id| (id, self.neighbors(id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_utils::TopologyGraphBuilder;
    use crate::Error;

    #[test]
    fn test_element_view() -> Result<(), Error> {
        let mut builder = TopologyGraphBuilder::new();
        let pipes = builder.pipe_run(3);
        let tee = builder.fitting(3);
        let heater = builder.space_heater(1.0);
        builder.connect(pipes[2], 1, tee, 0);
        builder.connect(tee, 1, heater, 0);
        let lonely = builder.pump(0.1, 2.0, 1.0);
        let zone = builder.zone(20.0, 50.0, 20.0);
        let graph = builder.build(None)?;

        let view = graph.element_view();
        // The zone has no ports, so it is not part of the view.
        assert!(!view.contains(zone.component_id()));
        assert!(view.contains(lonely.component_id()));
        assert_eq!(view.node_count(), 6);
        assert_eq!(view.edge_count(), 4);
        assert_eq!(view.degree(lonely.component_id()), 0);
        assert_eq!(
            view.neighbors(tee.component_id()),
            vec![pipes[2].component_id(), heater.component_id()]
        );
        assert!(view.has_edge(pipes[0].component_id(), pipes[1].component_id()));
        assert!(!view.has_edge(pipes[0].component_id(), pipes[2].component_id()));

        let components = view.connected_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[1], BTreeSet::from([lonely.component_id()]));

        let mut cut = view.restricted(|id| id != tee.component_id());
        assert_eq!(cut.connected_components().len(), 3);
        cut.remove(heater.component_id());
        assert_eq!(cut.node_count(), 4);
        assert_eq!(cut.edge_count(), 2);

        Ok(())
    }
}
