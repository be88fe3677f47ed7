// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the traits that need to be implemented by the types
//! that represent a component and a connection.

use serde::{Deserialize, Serialize};

use crate::{Attribute, ComponentCategory, FlowDirection};

/**
This trait needs to be implemented by the type that represents a component.

Read more about why this is necessary [here][crate#the-node-and-edge-traits].

Ports are addressed positionally: a component with `port_count() == 3` owns
the ports `0`, `1` and `2`, and the order is preserved by the graph.

<details>
<summary>Example implementation for a classified building model element:</summary>

```ignore
impl hvac_topology_graph::Node for bim::HvacElement {
    fn component_id(&self) -> u64 {
        self.guid_hash
    }

    fn category(&self) -> hvac_topology_graph::ComponentCategory {
        use hvac_topology_graph::ComponentCategory as Cat;
        match self.ifc_type.as_str() {
            "IfcPipeSegment" => Cat::Pipe,
            "IfcPipeFitting" => Cat::PipeFitting,
            "IfcValve" => Cat::Valve,
            "IfcPump" => Cat::Pump,
            "IfcBoiler" => Cat::Boiler,
            "IfcSpaceHeater" => Cat::SpaceHeater,
            _ => Cat::Unspecified,
        }
    }

    fn port_count(&self) -> usize {
        self.ports.len()
    }

    fn attribute(&self, attribute: hvac_topology_graph::Attribute) -> Option<f64> {
        use hvac_topology_graph::Attribute as Attr;
        match attribute {
            Attr::Length => self.quantity("Length").map(|q| q.to_meters()),
            Attr::Diameter => self.quantity("NominalDiameter").map(|q| q.to_meters()),
            Attr::RatedPower => self.quantity("RatedPower").map(|q| q.to_kilowatts()),
            _ => None,
        }
    }
}
```

</details>
*/
pub trait Node {
    /// Returns the component id of the component.
    fn component_id(&self) -> u64;

    /// Returns the category of the component.
    fn category(&self) -> ComponentCategory;

    /// Returns the number of ports owned by the component.
    fn port_count(&self) -> usize;

    /// Returns the pairs of port positions that are linked inside the
    /// component.
    ///
    /// By default, every port is linked to the first port.
    fn inner_connections(&self) -> Vec<(usize, usize)> {
        (1..self.port_count()).map(|position| (0, position)).collect()
    }

    /// Returns the value of the given attribute, if the component has one.
    ///
    /// This may be called several times for the same attribute and must
    /// return the same value each time.
    fn attribute(&self, attribute: Attribute) -> Option<f64>;

    /// Returns the flow direction of the port at the given position, if the
    /// component fixes it.  Ports with a fixed direction can't be redirected
    /// later.
    fn port_flow_direction(&self, _position: usize) -> Option<FlowDirection> {
        None
    }

    /// Returns true if the flow side inverts across the component because it
    /// delivers heat.
    fn is_consumer(&self) -> bool {
        self.category().is_consumer()
    }

    /// Returns true if the flow side inverts across the component because it
    /// produces heat or cold.
    fn is_generator(&self) -> bool {
        self.category().is_generator()
    }
}

/// Identifies a port by the id of its owning component and its position in
/// that component's port list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    pub component_id: u64,
    pub position: usize,
}

impl PortRef {
    pub fn new(component_id: u64, position: usize) -> Self {
        Self {
            component_id,
            position,
        }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.component_id, self.position)
    }
}

/**
This trait needs to be implemented by the type that represents a connection
between two ports.

Read more about why this is necessary [here][crate#the-node-and-edge-traits].

<details>
<summary>Example implementation:</summary>

```ignore
impl hvac_topology_graph::Edge for bim::PortConnection {
    fn source(&self) -> hvac_topology_graph::PortRef {
        hvac_topology_graph::PortRef::new(self.relating_element, self.relating_port)
    }

    fn destination(&self) -> hvac_topology_graph::PortRef {
        hvac_topology_graph::PortRef::new(self.related_element, self.related_port)
    }
}
```

</details>
*/
pub trait Edge {
    /// Returns the port on one end of the connection.
    fn source(&self) -> PortRef;
    /// Returns the port on the other end of the connection.
    fn destination(&self) -> PortRef;
}
