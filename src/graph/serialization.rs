// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Adjacency-list export and import of the port graph of a
//! [`TopologyGraph`], with the aggregates it holds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Aggregate, AggregationKind, Element, Error, FlowDirection, FlowSide, Link, Node, Port,
    PortRef, TopologyGraph, TopologyGraphConfig,
};

/// The port graph as adjacency lists, keyed by component id, together with
/// the aggregates that replaced parts of the original graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyList {
    pub components: BTreeMap<u64, Vec<PortEntry>>,
    #[serde(default)]
    pub aggregates: Vec<AggregateEntry>,
}

/// A port that is a node of the graph, with its links.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortEntry {
    pub position: usize,
    #[serde(default)]
    pub flow_direction: FlowDirection,
    pub flow_side: FlowSide,
    pub links: Vec<LinkEntry>,
}

/// The far end of a link.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkEntry {
    pub component_id: u64,
    pub position: usize,
    pub link: Link,
}

/// An aggregate, with the ids of the components it absorbed and, for each of
/// its ports, the ports of those components that the port replaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub component_id: u64,
    pub kind: AggregationKind,
    pub members: Vec<u64>,
    pub ports: Vec<Vec<PortRef>>,
}

impl AdjacencyList {
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Exports every port that is a node of the graph, with its flow
    /// direction, flow side and links, and every aggregate, including the
    /// ones nested in other aggregates.
    pub fn to_adjacency(&self) -> Result<AdjacencyList, Error> {
        let mut adjacency = AdjacencyList::default();
        for id in self.port_nodes() {
            let port = self.topology.port(id)?;
            let mut links = self
                .topology
                .links(id)
                .into_iter()
                .map(|(other, link)| {
                    self.topology.port(other).map(|other| LinkEntry {
                        component_id: other.owner,
                        position: other.position,
                        link,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            links.sort();
            adjacency
                .components
                .entry(port.owner)
                .or_default()
                .push(PortEntry {
                    position: port.position,
                    flow_direction: port.flow_direction,
                    flow_side: port.flow_side,
                    links,
                });
        }
        for entries in adjacency.components.values_mut() {
            entries.sort_by_key(|entry| entry.position);
        }

        let mut pending = self.elements.values().collect::<Vec<_>>();
        while let Some(element) = pending.pop() {
            let Some(aggregate) = element.as_aggregate() else {
                continue;
            };
            pending.extend(aggregate.elements.iter());

            let mut ports = Vec::with_capacity(aggregate.ports.len());
            for port in &aggregate.ports {
                let mut originals = vec![];
                for original in aggregate.originals.get(port).into_iter().flatten() {
                    let original = self.topology.port(*original)?;
                    originals.push(PortRef::new(original.owner, original.position));
                }
                ports.push(originals);
            }
            adjacency.aggregates.push(AggregateEntry {
                component_id: aggregate.component_id,
                kind: aggregate.kind,
                members: aggregate
                    .elements
                    .iter()
                    .map(|e| e.component_id())
                    .collect(),
                ports,
            });
        }
        adjacency.aggregates.sort_by_key(|entry| entry.component_id);

        Ok(adjacency)
    }

    /// Rebuilds a graph from the original components and an adjacency list.
    ///
    /// The aggregates are rebuilt first, in id order, from the components
    /// they absorbed.  The links are then taken from the adjacency list only,
    /// the components' inner connections are not consulted.
    pub fn from_adjacency(
        components: impl IntoIterator<Item = N>,
        adjacency: &AdjacencyList,
        config: TopologyGraphConfig,
    ) -> Result<Self, Error> {
        let mut tg = Self::with_components(components, config)?;

        let mut aggregates = adjacency.aggregates.iter().collect::<Vec<_>>();
        aggregates.sort_by_key(|entry| entry.component_id);
        for entry in aggregates {
            tg.restore_aggregate(entry)?;
        }

        for (cid, entries) in &adjacency.components {
            for entry in entries {
                let this = PortRef::new(*cid, entry.position);
                let port = tg.resolve_port(this)?;
                tg.topology.ensure_node(port);
                tg.topology.port_mut(port)?.flow_side = entry.flow_side;
                if entry.flow_direction != FlowDirection::Unknown {
                    tg.set_flow_direction(port, entry.flow_direction)
                        .map_err(|e| Error::serialization(e.description()))?;
                }

                for link in &entry.links {
                    let other = PortRef::new(link.component_id, link.position);
                    match link.link {
                        Link::Connection => tg.connect(this, other)?,
                        Link::Inner if other.component_id == *cid => {
                            let other = tg.resolve_port(other)?;
                            tg.topology.add_link(port, other, Link::Inner);
                        }
                        Link::Inner => {
                            return Err(Error::serialization(format!(
                                "Inner link ({this}, {other}) joins different components."
                            )))
                        }
                    }
                }
            }
        }

        tg.validate()?;
        Ok(tg)
    }

    /// Moves the members of the given entry into a new aggregate, with fresh
    /// ports.
    fn restore_aggregate(&mut self, entry: &AggregateEntry) -> Result<(), Error> {
        let cid = entry.component_id;
        if cid < self.next_component_id {
            return Err(Error::serialization(format!(
                "Aggregate {cid} doesn't have a fresh id, {} or above.",
                self.next_component_id
            )));
        }

        let mut absorbed = vec![];
        for member in &entry.members {
            let ports = self.element_ports.get(member).ok_or_else(|| {
                Error::serialization(format!(
                    "Aggregate {cid} absorbs component {member}, which is not in the graph."
                ))
            })?;
            absorbed.extend(ports.iter().copied());
        }

        let mut ports = Vec::with_capacity(entry.ports.len());
        let mut originals = BTreeMap::new();
        for (position, group) in entry.ports.iter().enumerate() {
            let mut replaced = Vec::with_capacity(group.len());
            for original in group {
                let id = self.resolve_port(*original)?;
                if !absorbed.contains(&id) {
                    return Err(Error::serialization(format!(
                        "Aggregate {cid} replaces {original}, which none of its members owns."
                    )));
                }
                replaced.push(id);
            }
            let id = self.allocate_port();
            self.topology.ports.insert(id, Port::new(id, cid, position));
            originals.insert(id, replaced);
            ports.push(id);
        }

        let mut elements = Vec::with_capacity(entry.members.len());
        for member in &entry.members {
            self.element_ports.remove(member);
            elements.push(self.elements.remove(member).ok_or_else(|| {
                Error::serialization(format!(
                    "Aggregate {cid} absorbs component {member} more than once."
                ))
            })?);
        }

        let aggregate = Aggregate::try_new(
            cid,
            entry.kind,
            elements,
            ports.clone(),
            originals,
            absorbed,
        )?;
        tracing::debug!("Restored {} {cid} of {:?}.", entry.kind, entry.members);
        self.element_ports.insert(cid, ports);
        self.elements.insert(cid, Element::Aggregate(aggregate));
        self.next_component_id = cid + 1;

        Ok(())
    }
}
