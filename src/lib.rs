// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# HVAC Topology Graph

This is a library for representing the components of a heating or cooling
network, their ports and the pipe connections between them as an undirected
graph, and for simplifying that graph by replacing recognizable structures
with aggregate components.

## The `Node` and `Edge` traits

The main struct is [`TopologyGraph`], instances of which can be created by
passing an iterator of components and the connections between them to the
[`try_new`][TopologyGraph::try_new] method.

But because `hvac_topology_graph` is an independent library, it doesn't know
about the component and connection types and instead uses traits to interact
with them.

Therefore, to be usable with this library, the component and connection types
must implement the [`Node`] and [`Edge`] traits, respectively.  Check out the
documentation for these traits for sample implementations.

## Ports and links

Every component has a fixed number of [`Port`]s.  A port is connected to at
most one port of another component, and the ports of a component are joined
by inner links.  Ports also carry a [`FlowDirection`] and a [`FlowSide`],
which can be spread over the graph with
[`propagate_flow_side`][TopologyGraph::propagate_flow_side].

## Validation

The [`try_new`][TopologyGraph::try_new] method runs several checks on the
graph, including checking that:

- All connections point to existing ports.
- No port is connected more than once.
- No component is connected to itself.
- Components of the `Unspecified` category are only accepted when the
  [`TopologyGraphConfig`] allows them.

If any of the validation steps fail, the method will return an [`Error`], and a
[`TopologyGraph`] instance otherwise.  The same checks run again after every
rewrite of the graph.

## Aggregation

An [`Aggregation`] finds structural motifs in the graph and replaces each of
them with an [`Aggregate`], whose attributes are derived from its
constituents.  The following aggregations are supported:

- [`PipeStrand`]
- [`ParallelPumps`]
- [`MergedJunction`]
- [`ParallelConsumers`]
- [`ConsumerCircuit`]
- [`AggregatedZone`]

[`simplify`][TopologyGraph::simplify] runs the default aggregations in a
sensible order.
*/

mod aggregation;
pub use aggregation::{
    AggregatePlan, AggregatedZone, Aggregation, ConsumerCircuit, Match, MatchMetadata,
    MergedJunction, ParallelConsumers, ParallelPumps, PipeStrand,
};

mod attributes;
pub use attributes::{Attribute, Formula};

mod component_category;
pub use component_category::{AggregationKind, ComponentCategory};

mod config;
pub use config::TopologyGraphConfig;

mod element;
pub use element::{Aggregate, Element};

mod graph;
pub use graph::{
    iterators, AdjacencyList, AggregateEntry, BoundaryPartition, ElementGraph, LinkEntry,
    OuterConnection, ParallelGroup, PartitionRegion, PortEntry, ReplacementMapping,
    TopologyGraph,
};

mod graph_traits;
pub use graph_traits::{Edge, Node, PortRef};

mod port;
pub use port::{FlowDirection, FlowSide, Link, Port, PortId};

mod error;
pub use error::{Error, ErrorKind};
