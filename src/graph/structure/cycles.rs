// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Cycle bases of the port graph and of the element view.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Node, PortId, TopologyGraph};

/// Returns a cycle basis of the undirected graph given by its adjacency
/// lists, using Paton's spanning-tree algorithm.
///
/// Roots are taken in ascending order, so the basis is deterministic.
pub(crate) fn cycle_basis<T>(adjacency: &BTreeMap<T, Vec<T>>) -> Vec<Vec<T>>
where
    T: Ord + Copy,
{
    let mut remaining = adjacency.keys().copied().collect::<BTreeSet<_>>();
    let mut cycles = vec![];

    while let Some(root) = remaining.pop_first() {
        let mut stack = vec![root];
        let mut pred = BTreeMap::from([(root, root)]);
        let mut used: BTreeMap<T, BTreeSet<T>> = BTreeMap::from([(root, BTreeSet::new())]);

        while let Some(z) = stack.pop() {
            let Some(neighbors) = adjacency.get(&z) else {
                continue;
            };
            for &nbr in neighbors {
                if !used.contains_key(&nbr) {
                    pred.insert(nbr, z);
                    stack.push(nbr);
                    used.insert(nbr, BTreeSet::from([z]));
                } else if nbr == z {
                    cycles.push(vec![z]);
                } else if !used.get(&z).is_some_and(|zused| zused.contains(&nbr)) {
                    let mut cycle = vec![nbr, z];
                    let mut p = pred[&z];
                    while !used.get(&nbr).is_some_and(|pn| pn.contains(&p)) {
                        cycle.push(p);
                        p = pred[&p];
                    }
                    cycle.push(p);
                    cycles.push(cycle);
                    used.entry(nbr).or_default().insert(z);
                }
            }
        }

        for node in pred.keys() {
            remaining.remove(node);
        }
    }

    cycles
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns a cycle basis of the port graph, keeping only the cycles that
    /// run through more than one component.
    pub fn cycles(&self) -> Vec<Vec<PortId>> {
        let adjacency = self
            .port_nodes()
            .map(|port| {
                (
                    port,
                    self.topology
                        .links(port)
                        .into_iter()
                        .map(|(other, _)| other)
                        .collect(),
                )
            })
            .collect::<BTreeMap<_, Vec<_>>>();

        cycle_basis(&adjacency)
            .into_iter()
            .filter(|cycle| {
                cycle
                    .iter()
                    .filter_map(|port| self.topology.ports.get(port))
                    .map(|port| port.owner)
                    .collect::<BTreeSet<_>>()
                    .len()
                    > 1
            })
            .collect()
    }
}
