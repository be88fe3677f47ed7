// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating the consistency of the port graph of a
//! [`TopologyGraph`][crate::TopologyGraph].

use crate::Error;

use super::PortGraphValidator;

impl PortGraphValidator<'_> {
    /// Validates that every node of the graph is a known port, and that the
    /// index map agrees with the graph.
    pub(super) fn validate_node_indices(&self) -> Result<(), Error> {
        let graph = &self.topology.graph;
        for index in graph.node_indices() {
            let port = graph[index];
            if !self.topology.ports.contains_key(&port) {
                return Err(Error::invalid_graph(format!(
                    "Graph node {port} is not a known port."
                )));
            }
            if self.topology.node_indices.get(&port) != Some(&index) {
                return Err(Error::internal(format!(
                    "Node index of {port} is out of sync."
                )));
            }
        }
        if self.topology.node_indices.len() != graph.node_count() {
            return Err(Error::internal(format!(
                "Index map has {} entries for {} graph nodes.",
                self.topology.node_indices.len(),
                graph.node_count()
            )));
        }
        Ok(())
    }

    /// Validates the connections of all ports.
    pub(super) fn validate_connections(&self) -> Result<(), Error> {
        for port in self.topology.ports.values() {
            self.ensure_mutual_connection(port)?;
            self.ensure_single_connection_link(port)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::validation::validate_ports;
    use crate::graph::PortGraph;
    use crate::{Error, Link, Port, PortId};

    fn two_ports() -> PortGraph {
        let mut topology = PortGraph::default();
        topology.ports.insert(PortId(0), Port::new(PortId(0), 1, 0));
        topology.ports.insert(PortId(1), Port::new(PortId(1), 2, 0));
        topology.ports.insert(PortId(2), Port::new(PortId(2), 3, 0));
        topology
    }

    #[test]
    fn test_connection_validation() {
        let mut topology = two_ports();
        assert!(validate_ports(&topology).is_ok());

        if let Some(port) = topology.ports.get_mut(&PortId(0)) {
            port.connection = Some(PortId(1));
        }
        assert!(validate_ports(&topology).is_err_and(|e| e
            == Error::invalid_graph(
                "Port:0(1.0) is connected to Port:1(2.0), but not the other way around."
            )));

        if let Some(port) = topology.ports.get_mut(&PortId(1)) {
            port.connection = Some(PortId(0));
        }
        assert!(validate_ports(&topology).is_err_and(|e| e
            == Error::invalid_graph(
                "Port:0(1.0) is connected to Some(PortId(1)), but linked to []."
            )));

        topology.add_link(PortId(0), PortId(1), Link::Connection);
        assert!(validate_ports(&topology).is_ok());

        topology.add_link(PortId(0), PortId(2), Link::Connection);
        assert!(validate_ports(&topology).is_err_and(|e| e
            == Error::invalid_graph(
                "Port:0(1.0) has 2 connection links: [PortId(1), PortId(2)]."
            )));
    }

    #[test]
    fn test_unknown_node() {
        let mut topology = two_ports();
        topology.add_link(PortId(0), PortId(7), Link::Inner);
        assert!(validate_ports(&topology)
            .is_err_and(|e| e == Error::invalid_graph("Graph node Port:7 is not a known port.")));
    }
}
