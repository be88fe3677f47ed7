// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Partitioning of a [`TopologyGraph`] into the regions between boundary
//! components.

use std::collections::{BTreeMap, BTreeSet};

use crate::{ComponentCategory, Error, Node, PortId, TopologyGraph};

/// A connection between a port of a boundary component and a port of a
/// region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OuterConnection {
    pub boundary_port: PortId,
    pub region_port: PortId,
}

/// A connected region left after removing the boundary components.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionRegion {
    pub members: BTreeSet<u64>,
    pub outer_connections: Vec<OuterConnection>,
}

impl PartitionRegion {
    /// Returns the region-side ports of the outer connections.
    pub fn edge_ports(&self) -> Vec<PortId> {
        self.outer_connections
            .iter()
            .map(|c| c.region_port)
            .collect()
    }
}

/// The regions of a graph between its boundary components.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundaryPartition {
    /// Regions holding a whitelisted component.
    pub consumers: Vec<PartitionRegion>,
    /// Regions holding blacklisted but no whitelisted components.  These are
    /// not processed further.
    pub generators: Vec<BTreeSet<u64>>,
    /// All other regions.
    pub undefined: Vec<PartitionRegion>,
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Cuts the element view at the components of the `boundary` categories
    /// and classifies the remaining connected regions.
    ///
    /// Returns an error if an undefined region has an odd number of
    /// connections to the boundary, i.e. a loose end.
    pub fn boundary_partition(
        &self,
        boundary: &[ComponentCategory],
        whitelist: &[ComponentCategory],
        blacklist: &[ComponentCategory],
    ) -> Result<BoundaryPartition, Error> {
        let view = self.element_view();
        let boundary_ids = view
            .component_ids()
            .into_iter()
            .filter(|cid| self.has_category(*cid, boundary))
            .collect::<BTreeSet<_>>();

        let mut outer: BTreeMap<u64, Vec<OuterConnection>> = BTreeMap::new();
        for cid in &boundary_ids {
            for port in self.ports(*cid)? {
                let Some(connection) = self.port(*port)?.connection else {
                    continue;
                };
                let owner = self.port(connection)?.owner;
                if !boundary_ids.contains(&owner) {
                    outer.entry(owner).or_default().push(OuterConnection {
                        boundary_port: *port,
                        region_port: connection,
                    });
                }
            }
        }

        let mut partition = BoundaryPartition::default();
        let cut = view.restricted(|cid| !boundary_ids.contains(&cid));
        for members in cut.connected_components() {
            let mut outer_connections = members
                .iter()
                .filter_map(|cid| outer.get(cid))
                .flatten()
                .copied()
                .collect::<Vec<_>>();
            outer_connections.sort();

            let has_white = members.iter().any(|cid| self.has_category(*cid, whitelist));
            let has_black = members.iter().any(|cid| self.has_category(*cid, blacklist));

            let region = PartitionRegion {
                members,
                outer_connections,
            };
            if has_white {
                self.ensure_no_internal_edge_ports(&region.members, &region.edge_ports())?;
                partition.consumers.push(region);
            } else if has_black {
                tracing::debug!("Not processing generator region {:?}.", region.members);
                partition.generators.push(region.members);
            } else {
                if region.outer_connections.len() % 2 == 1 {
                    return Err(Error::odd_partition(format!(
                        "Region {:?} has {} connections to the boundary.",
                        region.members,
                        region.outer_connections.len()
                    )));
                }
                partition.undefined.push(region);
            }
        }

        Ok(partition)
    }
}
