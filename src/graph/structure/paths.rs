// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Direct paths between sets of components.

use std::collections::BTreeSet;

use crate::graph::ElementGraph;
use crate::{Node, TopologyGraph};

impl ElementGraph {
    /// Returns the paths that lead from a component in `from` to a component
    /// in `to` through components with exactly two neighbors.
    ///
    /// Each path is returned once, starting at its end with the smaller id.
    /// `stop` marks components that no path may pass through.
    pub(crate) fn direct_paths(
        &self,
        from: &BTreeSet<u64>,
        to: &BTreeSet<u64>,
        stop: impl Fn(u64) -> bool,
    ) -> Vec<Vec<u64>> {
        let mut paths = BTreeSet::new();

        for &source in from.iter().filter(|cid| self.contains(**cid)) {
            for first in self.neighbors(source) {
                let mut path = vec![source, first];
                let mut previous = source;
                let mut current = first;
                loop {
                    if to.contains(&current) && current != source {
                        if path.first() > path.last() {
                            path.reverse();
                        }
                        paths.insert(path);
                        break;
                    }
                    if stop(current) || self.degree(current) != 2 {
                        break;
                    }
                    let Some(next) = self
                        .neighbors(current)
                        .into_iter()
                        .find(|n| *n != previous)
                    else {
                        break;
                    };
                    if path.contains(&next) {
                        break;
                    }
                    path.push(next);
                    previous = current;
                    current = next;
                }
            }
        }

        paths.into_iter().collect()
    }
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns the paths in the element view that lead from a component in
    /// `from` to a component in `to` and pass only through components with
    /// two neighbors.
    pub fn direct_paths(&self, from: &[u64], to: &[u64]) -> Vec<Vec<u64>> {
        self.element_view().direct_paths(
            &from.iter().copied().collect(),
            &to.iter().copied().collect(),
            |_| false,
        )
    }
}
