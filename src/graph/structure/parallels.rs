// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Detection of components connected in parallel.

use std::collections::{BTreeMap, BTreeSet};

use super::cycles::cycle_basis;
use crate::graph::ElementGraph;
use crate::{Attribute, ComponentCategory, Node, TopologyGraph};

/// A group of wanted components connected in parallel, together with the
/// region of the element view that holds their branches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParallelGroup {
    pub wanted: BTreeSet<u64>,
    pub region: BTreeSet<u64>,
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns the groups of components of the `wanted` categories that are
    /// connected in parallel, through components of the `inert` categories.
    ///
    /// Cycles of the restricted element view with at least two wanted
    /// components are the building blocks of the groups.  Cycles with fewer
    /// wanted components are treated as bypasses: the paths between their
    /// junctions that hold no wanted component are cut away once, and the
    /// cycles are recomputed.
    ///
    /// With `group_by`, the components of a group are further split by equal
    /// value of the given attribute, and each split's region is rebuilt from
    /// the branches of its components.  Groups of `min_group_size` (default
    /// 1) or fewer wanted components are discarded.
    pub fn parallel_groups(
        &self,
        wanted: &[ComponentCategory],
        inert: &[ComponentCategory],
        group_by: Option<Attribute>,
        min_group_size: Option<usize>,
    ) -> Vec<ParallelGroup> {
        let is_wanted = |cid: u64| self.has_category(cid, wanted);
        let wanted_in = |cycle: &[u64]| cycle.iter().filter(|cid| is_wanted(**cid)).count();

        let mut view = self
            .element_view()
            .restricted(|cid| is_wanted(cid) || self.has_category(cid, inert));

        let mut cycles = cycle_basis(&view.adjacency());
        if cycles.iter().any(|cycle| wanted_in(cycle.as_slice()) < 2) {
            let mut bypasses = BTreeSet::new();
            for cycle in cycles.iter().filter(|cycle| wanted_in(cycle.as_slice()) < 2) {
                let junctions = cycle
                    .iter()
                    .copied()
                    .filter(|cid| view.degree(*cid) > 2)
                    .collect::<BTreeSet<_>>();
                for path in view.direct_paths(&junctions, &junctions, |_| false) {
                    if !path.iter().any(|cid| is_wanted(*cid)) {
                        bypasses.insert(path);
                    }
                }
            }
            if !bypasses.is_empty() {
                for path in &bypasses {
                    tracing::debug!("Cutting bypass {path:?} off the parallel search.");
                    match path.as_slice() {
                        [a, b] => view.remove_edge(*a, *b),
                        [_, interior @ .., _] => {
                            interior.iter().for_each(|cid| view.remove(*cid));
                        }
                        _ => {}
                    }
                }
                cycles = cycle_basis(&view.adjacency());
            }
        }

        let mut parent = BTreeMap::new();
        for cycle in cycles.iter().filter(|cycle| wanted_in(cycle.as_slice()) >= 2) {
            let mut members = cycle.iter().copied().filter(|cid| is_wanted(*cid));
            let Some(first) = members.next() else {
                continue;
            };
            for other in members {
                union(&mut parent, first, other);
            }
        }

        let mut regions: BTreeMap<u64, ParallelGroup> = BTreeMap::new();
        for cycle in cycles.iter().filter(|cycle| wanted_in(cycle.as_slice()) >= 2) {
            let Some(first) = cycle.iter().copied().find(|cid| is_wanted(*cid)) else {
                continue;
            };
            let root = find(&mut parent, first);
            let group = regions.entry(root).or_insert_with(|| ParallelGroup {
                wanted: BTreeSet::new(),
                region: BTreeSet::new(),
            });
            group.region.extend(cycle.iter().copied());
            group
                .wanted
                .extend(cycle.iter().copied().filter(|cid| is_wanted(*cid)));
        }

        let mut groups = vec![];
        for group in regions.into_values() {
            let Some(attribute) = group_by else {
                groups.push(group);
                continue;
            };
            let mut by_value: BTreeMap<u64, BTreeSet<u64>> = BTreeMap::new();
            for cid in &group.wanted {
                match self.component(*cid).ok().and_then(|c| c.attribute(attribute)) {
                    Some(value) => {
                        by_value.entry(value.to_bits()).or_default().insert(*cid);
                    }
                    None => tracing::warn!(
                        "Component {cid} has no {attribute}, leaving it out of its parallel group."
                    ),
                }
            }
            for wanted in by_value.into_values() {
                let region = strands(&view, &wanted);
                groups.push(ParallelGroup { wanted, region });
            }
        }

        let min_group_size = min_group_size.unwrap_or(1);
        groups.retain(|group| group.wanted.len() > min_group_size);
        groups.sort_by_key(|group| group.wanted.first().copied());
        groups
    }
}

/// Returns the given components together with their branches: the paths
/// from each of them up to and including the next junction.
fn strands(view: &ElementGraph, members: &BTreeSet<u64>) -> BTreeSet<u64> {
    let mut region = members.clone();
    for &member in members {
        for first in view.neighbors(member) {
            let mut previous = member;
            let mut current = first;
            loop {
                if !region.insert(current) {
                    break;
                }
                if view.degree(current) != 2 {
                    break;
                }
                let Some(next) = view.neighbors(current).into_iter().find(|n| *n != previous)
                else {
                    break;
                };
                previous = current;
                current = next;
            }
        }
    }
    region
}

fn find(parent: &mut BTreeMap<u64, u64>, cid: u64) -> u64 {
    let mut root = cid;
    while let Some(&next) = parent.get(&root) {
        if next == root {
            break;
        }
        root = next;
    }
    parent.insert(cid, root);
    root
}

fn union(parent: &mut BTreeMap<u64, u64>, a: u64, b: u64) {
    let (a, b) = (find(parent, a), find(parent, b));
    if a != b {
        parent.insert(a.max(b), a.min(b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_utils::{ComponentHandle, TopologyGraphBuilder};
    use crate::Error;

    const PUMPS: &[ComponentCategory] = &[ComponentCategory::Pump];
    const INERT: &[ComponentCategory] = &[ComponentCategory::Pipe, ComponentCategory::PipeFitting];

    /// boiler -> pipe -> cross A -> pumps -> cross B -> pipe -> heater, with
    /// the pumps' heights given, and a bypass pipe between A and B.
    fn pump_bank(
        heights: &[f64],
    ) -> (
        TopologyGraphBuilder,
        ComponentHandle,
        ComponentHandle,
        Vec<ComponentHandle>,
        ComponentHandle,
    ) {
        let mut builder = TopologyGraphBuilder::new();
        let boiler = builder.boiler();
        let supply = builder.pipe(3.0, 0.03);
        let a = builder.fitting(heights.len() + 2);
        let b = builder.fitting(heights.len() + 2);
        let ret = builder.pipe(3.0, 0.03);
        let heater = builder.space_heater(10.0);
        let bypass = builder.pipe(0.5, 0.01);
        builder
            .connect(boiler, 1, supply, 0)
            .connect(supply, 1, a, 0)
            .connect(b, 0, ret, 0)
            .connect(ret, 1, heater, 0)
            .connect(heater, 1, boiler, 0)
            .connect(a, 1, bypass, 0)
            .connect(bypass, 1, b, 1);
        let pumps = heights
            .iter()
            .enumerate()
            .map(|(i, height)| {
                let pump = builder.pump(0.15, *height, 3.0);
                builder.connect(a, i + 2, pump, 0).connect(pump, 1, b, i + 2);
                pump
            })
            .collect();
        (builder, a, b, pumps, bypass)
    }

    #[test]
    fn test_bypass_is_cut_off() -> Result<(), Error> {
        let (builder, a, b, pumps, bypass) = pump_bank(&[6.0, 12.0]);
        let graph = builder.build(None)?;

        let groups = graph.parallel_groups(PUMPS, INERT, None, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].wanted,
            pumps.iter().map(|p| p.component_id()).collect()
        );
        assert_eq!(
            groups[0].region,
            BTreeSet::from([
                a.component_id(),
                b.component_id(),
                pumps[0].component_id(),
                pumps[1].component_id()
            ])
        );
        assert!(!groups[0].region.contains(&bypass.component_id()));

        Ok(())
    }

    #[test]
    fn test_group_by_attribute() -> Result<(), Error> {
        let (builder, a, b, pumps, _) = pump_bank(&[6.0, 12.0, 6.0]);
        let graph = builder.build(None)?;

        let groups = graph.parallel_groups(PUMPS, INERT, None, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].wanted.len(), 3);

        let groups = graph.parallel_groups(PUMPS, INERT, Some(Attribute::RatedHeight), None);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].wanted,
            BTreeSet::from([pumps[0].component_id(), pumps[2].component_id()])
        );
        assert_eq!(
            groups[0].region,
            BTreeSet::from([
                a.component_id(),
                b.component_id(),
                pumps[0].component_id(),
                pumps[2].component_id()
            ])
        );

        assert!(graph
            .parallel_groups(PUMPS, INERT, Some(Attribute::RatedHeight), Some(2))
            .is_empty());

        Ok(())
    }

    #[test]
    fn test_pumps_in_series_are_not_parallel() -> Result<(), Error> {
        let mut builder = TopologyGraphBuilder::new();
        let boiler = builder.boiler();
        let first = builder.pump(0.1, 5.0, 2.0);
        let second = builder.pump(0.1, 5.0, 2.0);
        builder.series(&[boiler, first, second, boiler]);
        let graph = builder.build(None)?;

        assert!(graph.parallel_groups(PUMPS, INERT, None, None).is_empty());

        Ok(())
    }
}
