// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `TopologyGraph`.

/// Configuration options for the `TopologyGraph`.
#[derive(Clone, Default, Debug)]
pub struct TopologyGraphConfig {
    /// Whether conflicting flow sides found during propagation should fail the
    /// propagation.  When this is `false`, the conflicting ports are degraded
    /// to `FlowSide::Unknown` and a warning is logged.
    pub strict_flow_sides: bool,

    /// Whether to allow components with `ComponentCategory::Unspecified` in
    /// the graph.  They never match any aggregation.
    pub allow_unspecified_components: bool,
}
