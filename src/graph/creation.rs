// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`TopologyGraph`] instances from given components and
//! connections.

use std::collections::BTreeMap;

use crate::{
    component_category::CategoryPredicates, Edge, Element, Error, Link, Node, Port, PortId,
    PortRef, TopologyGraphConfig,
};

use super::{PortGraph, TopologyGraph};

/// `TopologyGraph` instantiation.
impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Creates a new [`TopologyGraph`] from the given components and
    /// connections.
    ///
    /// Every port that takes part in a connection becomes a node of the graph,
    /// and every inner connection of every component becomes an edge, so
    /// components without any connected port are still present.
    ///
    /// Returns an error if the graph is invalid.
    pub fn try_new<
        NodeIterator: IntoIterator<Item = N>,
        EdgeIterator: IntoIterator<Item = E>,
        E: Edge,
    >(
        components: NodeIterator,
        connections: EdgeIterator,
        config: TopologyGraphConfig,
    ) -> Result<Self, Error> {
        let mut tg = Self::with_components(components, config)?;
        tg.add_connections(connections)?;
        tg.add_inner_connections()?;

        tg.validate()?;

        Ok(tg)
    }

    /// Creates a graph that owns the given components and their ports, but
    /// has no edges yet.
    pub(super) fn with_components(
        components: impl IntoIterator<Item = N>,
        config: TopologyGraphConfig,
    ) -> Result<Self, Error> {
        let mut tg = Self {
            topology: PortGraph::default(),
            elements: BTreeMap::new(),
            element_ports: BTreeMap::new(),
            next_port_id: 0,
            next_component_id: 0,
            config,
        };

        for component in components {
            let cid = component.component_id();

            if component.is_unspecified() && !tg.config.allow_unspecified_components {
                return Err(Error::invalid_component(format!(
                    "ComponentCategory not specified for component: {cid}"
                )));
            }
            if tg.elements.contains_key(&cid) {
                return Err(Error::invalid_graph(format!(
                    "Duplicate component ID found: {cid}"
                )));
            }

            let mut ports = Vec::with_capacity(component.port_count());
            for position in 0..component.port_count() {
                let id = tg.allocate_port();
                let mut port = Port::new(id, cid, position);
                if let Some(direction) = component.port_flow_direction(position) {
                    port.flow_direction = direction;
                    port.direction_locked = true;
                }
                tg.topology.ports.insert(id, port);
                ports.push(id);
            }

            tg.element_ports.insert(cid, ports);
            tg.elements.insert(cid, Element::Original(component));
        }

        tg.next_component_id = tg.elements.keys().next_back().map_or(0, |cid| cid + 1);

        Ok(tg)
    }

    /// Returns the id of the port at the given position of the given
    /// component.
    pub(super) fn resolve_port(&self, port: PortRef) -> Result<PortId, Error> {
        let ports = self.element_ports.get(&port.component_id).ok_or_else(|| {
            Error::component_not_found(format!(
                "Component with id {} not found.",
                port.component_id
            ))
        })?;
        ports.get(port.position).copied().ok_or_else(|| {
            Error::port_not_found(format!(
                "Component {} has no port at position {}.",
                port.component_id, port.position
            ))
        })
    }

    /// Connects two ports of different components to each other.
    pub(super) fn connect(&mut self, source: PortRef, destination: PortRef) -> Result<(), Error> {
        let (sid, did) = (source.component_id, destination.component_id);
        if sid == did {
            return Err(Error::invalid_connection(format!(
                "Connection:({source}, {destination}) Can't connect a component to itself."
            )));
        }

        let source_port = self.resolve_port(source).map_err(|e| {
            Error::invalid_connection(format!(
                "Connection:({source}, {destination}) {}",
                e.description()
            ))
        })?;
        let destination_port = self.resolve_port(destination).map_err(|e| {
            Error::invalid_connection(format!(
                "Connection:({source}, {destination}) {}",
                e.description()
            ))
        })?;

        for (port, other) in [(source_port, destination_port), (destination_port, source_port)] {
            match self.topology.port(port)?.connection {
                Some(existing) if existing == other => return Ok(()),
                Some(existing) => {
                    return Err(Error::invalid_connection(format!(
                        "Connection:({source}, {destination}) {port} is already connected \
                         to {existing}."
                    )))
                }
                None => {}
            }
        }

        self.topology.port_mut(source_port)?.connection = Some(destination_port);
        self.topology.port_mut(destination_port)?.connection = Some(source_port);
        self.topology
            .add_link(source_port, destination_port, Link::Connection);

        Ok(())
    }

    fn add_connections<E: Edge>(
        &mut self,
        connections: impl IntoIterator<Item = E>,
    ) -> Result<(), Error> {
        for connection in connections {
            self.connect(connection.source(), connection.destination())?;
        }
        Ok(())
    }

    /// Links the ports of the given component according to its inner
    /// connections.
    pub(super) fn link_inner(&mut self, cid: u64, pairs: &[(usize, usize)]) -> Result<(), Error> {
        for &(a, b) in pairs {
            if a == b {
                return Err(Error::invalid_component(format!(
                    "Inner connection ({a}, {b}) of component {cid} links a port to itself."
                )));
            }
            let pa = self.resolve_port(PortRef::new(cid, a))?;
            let pb = self.resolve_port(PortRef::new(cid, b))?;
            self.topology.add_link(pa, pb, Link::Inner);
        }
        Ok(())
    }

    fn add_inner_connections(&mut self) -> Result<(), Error> {
        let inner = self
            .elements
            .iter()
            .map(|(cid, element)| (*cid, element.inner_connections()))
            .collect::<Vec<_>>();
        for (cid, pairs) in inner {
            self.link_inner(cid, &pairs)?;
        }
        Ok(())
    }
}
