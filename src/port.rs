// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Ports are the typed connection points that components own, and the nodes
//! of the [`TopologyGraph`][crate::TopologyGraph].

use serde::{Deserialize, Serialize};

/// A stable handle to a port in a `TopologyGraph`.
///
/// Ids are never reused within a graph, so a `PortId` of a port that was
/// absorbed into an aggregate keeps pointing to the detached port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub(crate) u64);

impl PortId {
    /// Returns the raw value of the id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Port:{}", self.0)
    }
}

/// The direction in which the medium passes a port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    /// The medium leaves the component through the port.
    Source,
    /// The medium enters the component through the port.
    Sink,
    /// The medium may pass in both directions.
    Undirected,
    #[default]
    Unknown,
}

/// Whether a port lies on the supply or the return side of a circuit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowSide {
    Supply,
    Return,
    #[default]
    Unknown,
}

impl FlowSide {
    /// Returns `+1` for supply, `-1` for return and `0` for unknown.
    pub fn sign(&self) -> i8 {
        match self {
            FlowSide::Supply => 1,
            FlowSide::Return => -1,
            FlowSide::Unknown => 0,
        }
    }

    /// Returns the opposite side.  `Unknown` stays `Unknown`.
    pub fn inverted(&self) -> Self {
        match self {
            FlowSide::Supply => FlowSide::Return,
            FlowSide::Return => FlowSide::Supply,
            FlowSide::Unknown => FlowSide::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != FlowSide::Unknown
    }
}

/// The kind of an edge between two ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Link {
    /// A connection between ports of two different components.
    Connection,
    /// A pass-through between two ports of the same component.
    Inner,
}

/// A connection point owned by exactly one component.
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub(crate) id: PortId,
    pub(crate) owner: u64,
    pub(crate) position: usize,
    pub(crate) connection: Option<PortId>,
    pub(crate) flow_direction: FlowDirection,
    pub(crate) direction_locked: bool,
    pub(crate) flow_side: FlowSide,
}

impl Port {
    pub(crate) fn new(id: PortId, owner: u64, position: usize) -> Self {
        Self {
            id,
            owner,
            position,
            connection: None,
            flow_direction: FlowDirection::Unknown,
            direction_locked: false,
            flow_side: FlowSide::Unknown,
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    /// Returns the id of the component that owns the port.
    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// Returns the position of the port in its owner's port list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the port on the other end of the connection, if any.
    pub fn connection(&self) -> Option<PortId> {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn flow_direction(&self) -> FlowDirection {
        self.flow_direction
    }

    /// Returns true if the owning component fixed the flow direction.
    pub fn is_direction_locked(&self) -> bool {
        self.direction_locked
    }

    pub fn flow_side(&self) -> FlowSide {
        self.flow_side
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}.{})", self.id, self.owner, self.position)
    }
}
