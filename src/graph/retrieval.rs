// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving components, ports and links from a
//! [`TopologyGraph`].

use petgraph::visit::IntoEdgeReferences;

use crate::iterators::{Aggregates, Components, Links};
use crate::{Element, Error, Node, Port, PortId, TopologyGraph, TopologyGraphConfig};

/// Component, port and link retrieval.
impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns the component with the given `component_id`, if it exists.
    pub fn component(&self, component_id: u64) -> Result<&Element<N>, Error> {
        self.elements.get(&component_id).ok_or_else(|| {
            Error::component_not_found(format!("Component with id {} not found.", component_id))
        })
    }

    /// Returns an iterator over the components in the graph, in id order.
    pub fn components(&self) -> Components<N> {
        Components {
            iter: self.elements.values(),
        }
    }

    /// Returns an iterator over the aggregates in the graph.
    pub fn aggregates(&self) -> Aggregates<N> {
        Aggregates {
            iter: self.components(),
        }
    }

    /// Returns the port with the given id.  Ports absorbed into an aggregate
    /// remain retrievable, but are detached.
    pub fn port(&self, port: PortId) -> Result<&Port, Error> {
        self.topology.port(port)
    }

    /// Returns the ports of the given component, in position order.
    pub fn ports(&self, component_id: u64) -> Result<&[PortId], Error> {
        self.element_ports
            .get(&component_id)
            .map(|ports| ports.as_slice())
            .ok_or_else(|| {
                Error::component_not_found(format!(
                    "Component with id {} not found.",
                    component_id
                ))
            })
    }

    /// Returns the component that owns the given port.
    pub fn owner(&self, port: PortId) -> Result<&Element<N>, Error> {
        self.component(self.port(port)?.owner)
    }

    /// Returns an iterator over the ports that are nodes of the graph.
    pub fn port_nodes(&self) -> impl Iterator<Item = PortId> + '_ {
        self.topology
            .graph
            .node_indices()
            .map(|index| self.topology.graph[index])
    }

    /// Returns an iterator over the links between ports.
    pub fn links(&self) -> Links {
        Links {
            graph: &self.topology.graph,
            iter: self.topology.graph.edge_references(),
        }
    }

    /// Returns the ports linked to the given port, sorted by id.
    pub fn linked_ports(&self, port: PortId) -> Result<Vec<(PortId, crate::Link)>, Error> {
        self.topology.port(port)?;
        Ok(self.topology.links(port))
    }

    /// Returns the configuration of the graph.
    pub fn config(&self) -> &TopologyGraphConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_utils::TopologyGraphBuilder;
    use crate::{ComponentCategory, Link};

    #[test]
    fn test_component() -> Result<(), Error> {
        let mut builder = TopologyGraphBuilder::new();
        let pipe = builder.pipe(2.0, 0.02);
        let pump = builder.pump(0.15, 6.0, 3.0);
        builder.connect(pipe, 1, pump, 0);
        let graph = builder.build(None)?;

        assert_eq!(
            graph.component(pipe.component_id())?.category(),
            ComponentCategory::Pipe
        );
        assert_eq!(
            graph.component(9).err(),
            Some(Error::component_not_found("Component with id 9 not found."))
        );
        assert!(graph
            .components()
            .map(|c| c.component_id())
            .eq([pipe.component_id(), pump.component_id()]));
        assert_eq!(graph.aggregates().count(), 0);

        Ok(())
    }

    #[test]
    fn test_ports() -> Result<(), Error> {
        let mut builder = TopologyGraphBuilder::new();
        let pipe = builder.pipe(2.0, 0.02);
        let pump = builder.pump(0.15, 6.0, 3.0);
        builder.connect(pipe, 1, pump, 0);
        let graph = builder.build(None)?;

        let pipe_ports = graph.ports(pipe.component_id())?.to_vec();
        let pump_ports = graph.ports(pump.component_id())?.to_vec();
        assert_eq!(graph.port(pipe_ports[1])?.connection(), Some(pump_ports[0]));
        assert_eq!(graph.port(pump_ports[0])?.connection(), Some(pipe_ports[1]));
        assert_eq!(
            graph.owner(pump_ports[0])?.component_id(),
            pump.component_id()
        );
        assert_eq!(
            graph.linked_ports(pipe_ports[1])?,
            vec![(pipe_ports[0], Link::Inner), (pump_ports[0], Link::Connection)]
        );
        assert_eq!(graph.port_nodes().count(), 4);
        assert!(graph
            .port(PortId(99))
            .is_err_and(|e| e == Error::port_not_found("Port:99 not found.")));

        Ok(())
    }
}
