// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over components, ports and links in a `TopologyGraph`.

use std::collections::btree_map;

use petgraph::stable_graph::{EdgeReferences, StableUnGraph};
use petgraph::visit::EdgeRef;

use crate::{Aggregate, Element, Link, Node, PortId};

/// An iterator over the components in a `TopologyGraph`, in component id
/// order.
pub struct Components<'a, N>
where
    N: Node,
{
    pub(crate) iter: btree_map::Values<'a, u64, Element<N>>,
}

impl<'a, N> Iterator for Components<'a, N>
where
    N: Node,
{
    type Item = &'a Element<N>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

/// An iterator over the aggregates in a `TopologyGraph`.
pub struct Aggregates<'a, N>
where
    N: Node,
{
    pub(crate) iter: Components<'a, N>,
}

impl<'a, N> Iterator for Aggregates<'a, N>
where
    N: Node,
{
    type Item = &'a Aggregate<N>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.by_ref().find_map(|element| element.as_aggregate())
    }
}

/// An iterator over the links of the port graph, as `(port, port, link)`
/// triples.
pub struct Links<'a> {
    pub(crate) graph: &'a StableUnGraph<PortId, Link>,
    pub(crate) iter: EdgeReferences<'a, Link>,
}

impl Iterator for Links<'_> {
    type Item = (PortId, PortId, Link);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter
            .next()
            .map(|e| (self.graph[e.source()], self.graph[e.target()], *e.weight()))
    }
}
