// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `ComponentCategory` enum, which represents the
//! category of a component, and the `AggregationKind` enum, which represents
//! the kind of an aggregate component.

use crate::graph_traits::Node;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Represents the kind of an aggregate component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AggregationKind {
    /// A straight run of pass-through components.
    PipeStrand,
    /// Pumps in parallel, together with their branch strands.
    ParallelPumps,
    /// Several directly connected junctions, or the caller-selected ports of
    /// a single junction.
    MergedJunction,
    /// Heat consumers in parallel, together with their branch strands.
    ParallelConsumers,
    /// A consumer circuit hanging off a distributor.
    ConsumerCircuit,
    /// Thermal zones sharing a heating set point.
    AggregatedZone,
}

impl Display for AggregationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationKind::PipeStrand => write!(f, "PipeStrand"),
            AggregationKind::ParallelPumps => write!(f, "ParallelPumps"),
            AggregationKind::MergedJunction => write!(f, "MergedJunction"),
            AggregationKind::ParallelConsumers => write!(f, "ParallelConsumers"),
            AggregationKind::ConsumerCircuit => write!(f, "ConsumerCircuit"),
            AggregationKind::AggregatedZone => write!(f, "AggregatedZone"),
        }
    }
}

/// Represents the category of a component.
///
/// Values of the classification layer's component types need to be converted
/// to this type, so that they can be used in the `TopologyGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentCategory {
    Unspecified,
    Pipe,
    PipeFitting,
    Valve,
    Pump,
    Boiler,
    HeatPump,
    Chiller,
    Chp,
    SpaceHeater,
    Storage,
    Distributor,
    ThermalZone,
    Aggregate(AggregationKind),
}

impl ComponentCategory {
    /// Returns true if components of this category deliver heat to the
    /// building, i.e. the flow side inverts across them.
    pub fn is_consumer(&self) -> bool {
        matches!(
            self,
            ComponentCategory::SpaceHeater
                | ComponentCategory::Aggregate(AggregationKind::ParallelConsumers)
                | ComponentCategory::Aggregate(AggregationKind::ConsumerCircuit)
        )
    }

    /// Returns true if components of this category produce heat or cold, i.e.
    /// the flow side inverts across them.
    pub fn is_generator(&self) -> bool {
        matches!(
            self,
            ComponentCategory::Boiler
                | ComponentCategory::HeatPump
                | ComponentCategory::Chiller
                | ComponentCategory::Chp
        )
    }
}

impl Display for ComponentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentCategory::Unspecified => write!(f, "Unspecified"),
            ComponentCategory::Pipe => write!(f, "Pipe"),
            ComponentCategory::PipeFitting => write!(f, "PipeFitting"),
            ComponentCategory::Valve => write!(f, "Valve"),
            ComponentCategory::Pump => write!(f, "Pump"),
            ComponentCategory::Boiler => write!(f, "Boiler"),
            ComponentCategory::HeatPump => write!(f, "HeatPump"),
            ComponentCategory::Chiller => write!(f, "Chiller"),
            ComponentCategory::Chp => write!(f, "CHP"),
            ComponentCategory::SpaceHeater => write!(f, "SpaceHeater"),
            ComponentCategory::Storage => write!(f, "Storage"),
            ComponentCategory::Distributor => write!(f, "Distributor"),
            ComponentCategory::ThermalZone => write!(f, "ThermalZone"),
            ComponentCategory::Aggregate(kind) => write!(f, "{}", kind),
        }
    }
}

/// Predicates for checking the component category of a `Node`.
pub(crate) trait CategoryPredicates: Node {
    fn is_unspecified(&self) -> bool {
        self.category() == ComponentCategory::Unspecified
    }

    fn is_pipe(&self) -> bool {
        self.category() == ComponentCategory::Pipe
    }

    fn is_pump(&self) -> bool {
        matches!(
            self.category(),
            ComponentCategory::Pump | ComponentCategory::Aggregate(AggregationKind::ParallelPumps)
        )
    }

    /// Returns true if the component is a branching point, i.e. has more than
    /// two ports.
    fn is_junction(&self) -> bool {
        self.port_count() > 2
    }
}

/// Implement the `CategoryPredicates` trait for all types that implement the
/// `Node` trait.
impl<T: Node + ?Sized> CategoryPredicates for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(ComponentCategory::SpaceHeater.is_consumer());
        assert!(ComponentCategory::Aggregate(AggregationKind::ConsumerCircuit).is_consumer());
        assert!(!ComponentCategory::Pump.is_consumer());
        assert!(ComponentCategory::Boiler.is_generator());
        assert!(!ComponentCategory::Distributor.is_generator());
        assert!(!ComponentCategory::Aggregate(AggregationKind::PipeStrand).is_generator());
    }

    #[test]
    fn test_display() {
        assert_eq!(ComponentCategory::Chp.to_string(), "CHP");
        assert_eq!(
            ComponentCategory::Aggregate(AggregationKind::ParallelPumps).to_string(),
            "ParallelPumps"
        );
    }
}
