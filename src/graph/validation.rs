// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating a [`TopologyGraph`].

mod invariant_checks;
mod validate_graph;

use crate::{Error, Node, TopologyGraph};

use super::PortGraph;

pub(crate) struct PortGraphValidator<'a> {
    topology: &'a PortGraph,
}

/// Validates the port-level invariants: every graph node is a known port,
/// connections are mutual, and a port has at most one connection link.
pub(crate) fn validate_ports(topology: &PortGraph) -> Result<(), Error> {
    let validator = PortGraphValidator { topology };

    validator.validate_node_indices()?;
    validator.validate_connections()?;

    Ok(())
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Validates the whole graph: the port-level invariants, and that every
    /// port in the graph belongs to a component of the graph.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        validate_ports(&self.topology)?;

        for port in self.port_nodes() {
            let owner = self.topology.port(port)?.owner;
            let owned = self
                .element_ports
                .get(&owner)
                .is_some_and(|ports| ports.contains(&port));
            if !self.elements.contains_key(&owner) || !owned {
                return Err(Error::internal(format!(
                    "{port} is linked, but its owner {owner} is not part of the graph."
                )));
            }
        }

        Ok(())
    }
}
