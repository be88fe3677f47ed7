// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The components stored in a [`TopologyGraph`][crate::TopologyGraph]: either
//! the caller's original components, or aggregates created by the graph.

use std::collections::BTreeMap;

use crate::attributes::AttributeMemo;
use crate::{
    AggregationKind, Attribute, ComponentCategory, Error, FlowDirection, Node, PortId,
    ReplacementMapping,
};

/// A component in a `TopologyGraph`.
pub enum Element<N>
where
    N: Node,
{
    /// A component that was passed to the graph at construction.
    Original(N),
    /// A component that the graph synthesized to replace a matched subgraph.
    Aggregate(Aggregate<N>),
}

impl<N> Element<N>
where
    N: Node,
{
    /// Returns the aggregate, if the element is one.
    pub fn as_aggregate(&self) -> Option<&Aggregate<N>> {
        match self {
            Element::Original(_) => None,
            Element::Aggregate(aggregate) => Some(aggregate),
        }
    }

    /// Returns the original component, if the element is one.
    pub fn as_original(&self) -> Option<&N> {
        match self {
            Element::Original(node) => Some(node),
            Element::Aggregate(_) => None,
        }
    }
}

impl<N> Node for Element<N>
where
    N: Node,
{
    fn component_id(&self) -> u64 {
        match self {
            Element::Original(node) => node.component_id(),
            Element::Aggregate(aggregate) => aggregate.component_id,
        }
    }

    fn category(&self) -> ComponentCategory {
        match self {
            Element::Original(node) => node.category(),
            Element::Aggregate(aggregate) => ComponentCategory::Aggregate(aggregate.kind),
        }
    }

    fn port_count(&self) -> usize {
        match self {
            Element::Original(node) => node.port_count(),
            Element::Aggregate(aggregate) => aggregate.ports.len(),
        }
    }

    fn inner_connections(&self) -> Vec<(usize, usize)> {
        match self {
            Element::Original(node) => node.inner_connections(),
            Element::Aggregate(aggregate) => (1..aggregate.ports.len()).map(|p| (0, p)).collect(),
        }
    }

    fn attribute(&self, attribute: Attribute) -> Option<f64> {
        match self {
            Element::Original(node) => node.attribute(attribute),
            Element::Aggregate(aggregate) => aggregate.attribute(attribute),
        }
    }

    fn port_flow_direction(&self, position: usize) -> Option<FlowDirection> {
        match self {
            Element::Original(node) => node.port_flow_direction(position),
            Element::Aggregate(_) => None,
        }
    }

    fn is_consumer(&self) -> bool {
        match self {
            Element::Original(node) => node.is_consumer(),
            Element::Aggregate(aggregate) => {
                ComponentCategory::Aggregate(aggregate.kind).is_consumer()
            }
        }
    }

    fn is_generator(&self) -> bool {
        match self {
            Element::Original(node) => node.is_generator(),
            Element::Aggregate(aggregate) => {
                ComponentCategory::Aggregate(aggregate.kind).is_generator()
            }
        }
    }
}

/// A synthesized component standing in for a matched subgraph.
///
/// It owns its constituents and records, for each of its ports, the original
/// ports that the port replaces.
pub struct Aggregate<N>
where
    N: Node,
{
    pub(crate) component_id: u64,
    pub(crate) kind: AggregationKind,
    pub(crate) elements: Vec<Element<N>>,
    pub(crate) ports: Vec<PortId>,
    pub(crate) originals: BTreeMap<PortId, Vec<PortId>>,
    pub(crate) absorbed_ports: Vec<PortId>,
    memo: AttributeMemo,
}

impl<N> Aggregate<N>
where
    N: Node,
{
    /// Creates a new aggregate.
    ///
    /// Returns an error if any of the constituents can't be absorbed by an
    /// aggregate of the given kind.
    pub(crate) fn try_new(
        component_id: u64,
        kind: AggregationKind,
        elements: Vec<Element<N>>,
        ports: Vec<PortId>,
        originals: BTreeMap<PortId, Vec<PortId>>,
        absorbed_ports: Vec<PortId>,
    ) -> Result<Self, Error> {
        ensure_aggregatable(
            kind,
            elements.iter().map(|e| (e.component_id(), e.category())),
        )?;
        Ok(Self {
            component_id,
            kind,
            elements,
            ports,
            originals,
            absorbed_ports,
            memo: AttributeMemo::default(),
        })
    }

    pub fn component_id(&self) -> u64 {
        self.component_id
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    /// Returns the constituents, in match order.
    pub fn elements(&self) -> &[Element<N>] {
        &self.elements
    }

    /// Returns the ports of the aggregate, in position order.
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// Returns the original ports that each port of the aggregate represents.
    pub fn originals(&self) -> &BTreeMap<PortId, Vec<PortId>> {
        &self.originals
    }

    /// Returns the mapping from every port of every constituent to the
    /// aggregate port that replaced it, or to `None` if it was dropped.
    pub fn replacement_mapping(&self) -> ReplacementMapping {
        let mut mapping = self
            .absorbed_ports
            .iter()
            .map(|port| (*port, None))
            .collect::<ReplacementMapping>();
        for (new_port, originals) in &self.originals {
            for original in originals {
                mapping.insert(*original, Some(*new_port));
            }
        }
        mapping
    }

    /// Returns the value of the given attribute, computed from the
    /// constituents by the aggregate kind's reduction formulas.
    pub fn attribute(&self, attribute: Attribute) -> Option<f64> {
        self.memo.resolve(self.kind.formulas(), attribute, || {
            self.elements.iter().map(|e| e as &dyn Node).collect()
        })
    }
}

/// Checks that all given `(component_id, category)` pairs can be absorbed
/// by an aggregate of the given kind.
pub(crate) fn ensure_aggregatable(
    kind: AggregationKind,
    mut elements: impl Iterator<Item = (u64, ComponentCategory)>,
) -> Result<(), Error> {
    let allowed = kind.aggregatable_elements();
    if let Some((cid, category)) = elements.find(|(_, category)| !allowed.contains(category)) {
        return Err(Error::type_mismatch(format!(
            "{kind} can't absorb {category}:{cid}."
        )));
    }
    Ok(())
}
