// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the crate.
//!
//! - the `TestComponent` and `TestConnection` types, which implement the `Node`
//!   and `Edge` traits respectively.
//! - the `TopologyGraphBuilder`, which can declaratively build complex network
//!   configurations for use in tests.

use std::collections::BTreeMap;

use crate::{
    Attribute, ComponentCategory, Edge, Error, FlowDirection, Node, PortRef, TopologyGraph,
    TopologyGraphConfig,
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TestComponent {
    id: u64,
    category: ComponentCategory,
    ports: usize,
    attributes: BTreeMap<Attribute, f64>,
    directions: BTreeMap<usize, FlowDirection>,
}

impl TestComponent {
    pub(crate) fn new(id: u64, category: ComponentCategory, ports: usize) -> Self {
        TestComponent {
            id,
            category,
            ports,
            attributes: BTreeMap::new(),
            directions: BTreeMap::new(),
        }
    }

    /// Returns the component with the given attribute set.
    pub(crate) fn with(mut self, attribute: Attribute, value: f64) -> Self {
        self.attributes.insert(attribute, value);
        self
    }

    /// Returns the component with the direction of the given port fixed.
    pub(crate) fn with_direction(mut self, position: usize, direction: FlowDirection) -> Self {
        self.directions.insert(position, direction);
        self
    }
}

impl Node for TestComponent {
    fn component_id(&self) -> u64 {
        self.id
    }

    fn category(&self) -> ComponentCategory {
        self.category
    }

    fn port_count(&self) -> usize {
        self.ports
    }

    fn attribute(&self, attribute: Attribute) -> Option<f64> {
        self.attributes.get(&attribute).copied()
    }

    fn port_flow_direction(&self, position: usize) -> Option<FlowDirection> {
        self.directions.get(&position).copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TestConnection(PortRef, PortRef);

impl TestConnection {
    pub(crate) fn new(source: (u64, usize), destination: (u64, usize)) -> Self {
        TestConnection(
            PortRef::new(source.0, source.1),
            PortRef::new(destination.0, destination.1),
        )
    }
}

impl Edge for TestConnection {
    fn source(&self) -> PortRef {
        self.0
    }

    fn destination(&self) -> PortRef {
        self.1
    }
}

/// Represents a component added to the `TopologyGraphBuilder`.
#[derive(Debug, Eq, Hash, PartialEq, Copy, Clone)]
pub(crate) struct ComponentHandle(u64);

impl ComponentHandle {
    /// Returns the component ID of the component.
    pub(crate) fn component_id(&self) -> u64 {
        self.0
    }
}

/// A builder for creating complex network configurations easily, for use in
/// tests.
pub(crate) struct TopologyGraphBuilder {
    components: Vec<TestComponent>,
    connections: Vec<TestConnection>,
    next_id: u64,
}

impl TopologyGraphBuilder {
    /// Creates a new `TopologyGraphBuilder`.
    pub(crate) fn new() -> Self {
        TopologyGraphBuilder {
            components: Vec::new(),
            connections: Vec::new(),
            next_id: 0,
        }
    }

    /// Adds the given component, with a fresh id, and returns its handle.
    pub(crate) fn add(&mut self, component: TestComponent) -> ComponentHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.components.push(TestComponent { id, ..component });
        ComponentHandle(id)
    }

    /// Adds a component without attributes and returns its handle.
    pub(crate) fn add_component(
        &mut self,
        category: ComponentCategory,
        ports: usize,
    ) -> ComponentHandle {
        self.add(TestComponent::new(0, category, ports))
    }

    /// Adds a pipe with the given length and diameter, in m.
    pub(crate) fn pipe(&mut self, length: f64, diameter: f64) -> ComponentHandle {
        self.add(
            TestComponent::new(0, ComponentCategory::Pipe, 2)
                .with(Attribute::Length, length)
                .with(Attribute::Diameter, diameter),
        )
    }

    /// Adds a pipe fitting with the given number of ports.
    pub(crate) fn fitting(&mut self, ports: usize) -> ComponentHandle {
        self.add_component(ComponentCategory::PipeFitting, ports)
    }

    /// Adds a two-port valve.
    pub(crate) fn valve(&mut self) -> ComponentHandle {
        self.add_component(ComponentCategory::Valve, 2)
    }

    /// Adds a pump with the given rated power (kW), height (m) and volume flow
    /// (m³/h).
    pub(crate) fn pump(&mut self, power: f64, height: f64, flow: f64) -> ComponentHandle {
        self.add(
            TestComponent::new(0, ComponentCategory::Pump, 2)
                .with(Attribute::RatedPower, power)
                .with(Attribute::RatedHeight, height)
                .with(Attribute::RatedVolumeFlow, flow),
        )
    }

    /// Adds a boiler.
    pub(crate) fn boiler(&mut self) -> ComponentHandle {
        self.add_component(ComponentCategory::Boiler, 2)
    }

    /// Adds a space heater with the given rated power, in kW.
    pub(crate) fn space_heater(&mut self, power: f64) -> ComponentHandle {
        self.add(
            TestComponent::new(0, ComponentCategory::SpaceHeater, 2)
                .with(Attribute::RatedPower, power),
        )
    }

    /// Adds a distributor with the given number of ports.
    pub(crate) fn distributor(&mut self, ports: usize) -> ComponentHandle {
        self.add_component(ComponentCategory::Distributor, ports)
    }

    /// Adds a thermal zone with the given net area (m²), volume (m³) and
    /// heating set point (°C).
    pub(crate) fn zone(&mut self, area: f64, volume: f64, set_point: f64) -> ComponentHandle {
        self.add(
            TestComponent::new(0, ComponentCategory::ThermalZone, 0)
                .with(Attribute::NetArea, area)
                .with(Attribute::Volume, volume)
                .with(Attribute::HeatingSetPoint, set_point),
        )
    }

    /// Connects a port of one component to a port of another.
    pub(crate) fn connect(
        &mut self,
        from: ComponentHandle,
        from_port: usize,
        to: ComponentHandle,
        to_port: usize,
    ) -> &mut Self {
        self.connections
            .push(TestConnection::new((from.0, from_port), (to.0, to_port)));
        self
    }

    /// Connects the given two-port components in series, the second port of
    /// each to the first port of the next.
    pub(crate) fn series(&mut self, handles: &[ComponentHandle]) -> &mut Self {
        for pair in handles.windows(2) {
            self.connect(pair[0], 1, pair[1], 0);
        }
        self
    }

    /// Adds `count` pipes connected in series and returns their handles.
    pub(crate) fn pipe_run(&mut self, count: usize) -> Vec<ComponentHandle> {
        let pipes = (0..count)
            .map(|i| self.pipe(1.0 + i as f64, 0.02))
            .collect::<Vec<_>>();
        self.series(&pipes);
        pipes
    }

    /// Returns the components added so far.
    pub(crate) fn components(&self) -> Vec<TestComponent> {
        self.components.clone()
    }

    /// Builds and returns the topology graph from the components and
    /// connections added to the builder.
    pub(crate) fn build(
        &self,
        config: Option<TopologyGraphConfig>,
    ) -> Result<TopologyGraph<TestComponent>, Error> {
        TopologyGraph::try_new(
            self.components.clone(),
            self.connections.clone(),
            config.unwrap_or_default(),
        )
    }
}
