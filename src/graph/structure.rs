// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Structural queries over a [`TopologyGraph`]: cycles, chains, direct paths,
//! parallel groups and boundary partitions.
//!
//! The queries don't change the graph.  Except for [`TopologyGraph::cycles`],
//! they work on the element view.

mod chains;
mod cycles;
mod parallels;
mod partition;
mod paths;

pub use parallels::ParallelGroup;
pub use partition::{BoundaryPartition, OuterConnection, PartitionRegion};

use std::collections::BTreeSet;

use crate::{ComponentCategory, Error, Node, PortId, TopologyGraph};

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns true if the given component exists and has one of the given
    /// categories.
    pub(crate) fn has_category(&self, component_id: u64, categories: &[ComponentCategory]) -> bool {
        self.elements
            .get(&component_id)
            .is_some_and(|element| categories.contains(&element.category()))
    }

    /// Checks that none of the given edge ports is connected to a port of
    /// one of the given members.
    pub(crate) fn ensure_no_internal_edge_ports(
        &self,
        members: &BTreeSet<u64>,
        edge_ports: &[PortId],
    ) -> Result<(), Error> {
        for port in edge_ports {
            let Some(connection) = self.port(*port)?.connection else {
                continue;
            };
            let owner = self.port(connection)?.owner;
            if members.contains(&owner) {
                return Err(Error::contract_violation(format!(
                    "Edge port {port} is connected to {connection} of member {owner}."
                )));
            }
        }
        Ok(())
    }
}
