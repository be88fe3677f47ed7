// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The merge primitive, through which every rewrite of a [`TopologyGraph`]
//! is committed.

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregation::AggregatePlan;
use crate::element::ensure_aggregatable;
use crate::{
    Aggregate, Element, Error, FlowDirection, FlowSide, Link, Node, Port, PortId, TopologyGraph,
};

use super::validation::validate_ports;
use super::PortGraph;

/// A mapping from old ports to the ports replacing them.  Ports mapped to
/// `None` are dropped together with their links.
pub type ReplacementMapping = BTreeMap<PortId, Option<PortId>>;

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Rewrites the port graph.
    ///
    /// Every link of a mapped port is moved to the port it maps to, or
    /// removed if it maps to `None`.  Links that end up joining the same pair
    /// of ports are coalesced, and links from a port to itself are dropped.
    /// Then `new_inner_connections` and `extra_connections` are added as
    /// inner links and connections respectively.
    ///
    /// Mapped ports stay retrievable, but are detached from the graph.
    ///
    /// The merge is atomic: if it fails, the graph is left unchanged.
    pub fn merge(
        &mut self,
        mapping: &ReplacementMapping,
        new_inner_connections: &[(PortId, PortId)],
        extra_connections: &[(PortId, PortId)],
    ) -> Result<(), Error> {
        let mut topology = self.topology.clone();
        topology.apply_merge(mapping, new_inner_connections, extra_connections)?;
        validate_ports(&topology)?;
        self.topology = topology;
        Ok(())
    }

    /// Commits the given aggregate plans with a single merge, and moves the
    /// members of each plan into a new aggregate.
    ///
    /// Returns the ids of the new aggregates, in plan order.
    pub(crate) fn commit(&mut self, plans: Vec<AggregatePlan>) -> Result<Vec<u64>, Error> {
        let mut seen = BTreeSet::new();
        for plan in &plans {
            for cid in &plan.members {
                if !seen.insert(*cid) {
                    return Err(Error::contract_violation(format!(
                        "Component {cid} is a member of more than one {} plan.",
                        plan.kind
                    )));
                }
            }
            ensure_aggregatable(
                plan.kind,
                plan.members
                    .iter()
                    .map(|cid| self.component(*cid).map(|c| (*cid, c.category())))
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter(),
            )?;
        }

        let mut topology = self.topology.clone();
        let mut next_port_id = self.next_port_id;
        let mut next_component_id = self.next_component_id;
        let mut mapping = ReplacementMapping::new();
        let mut inner = vec![];
        let mut staged = vec![];

        for plan in &plans {
            let cid = next_component_id;
            next_component_id += 1;

            let absorbed = plan
                .members
                .iter()
                .filter_map(|member| self.element_ports.get(member))
                .flatten()
                .copied()
                .collect::<Vec<_>>();
            for port in &absorbed {
                mapping.insert(*port, None);
            }

            let mut ports = Vec::with_capacity(plan.port_groups.len());
            let mut originals = BTreeMap::new();
            for (position, group) in plan.port_groups.iter().enumerate() {
                if let Some(stray) = group.iter().find(|p| !absorbed.contains(p)) {
                    return Err(Error::contract_violation(format!(
                        "{stray} is not a port of the members of the {} plan.",
                        plan.kind
                    )));
                }
                let id = PortId(next_port_id);
                next_port_id += 1;

                let mut port = Port::new(id, cid, position);
                let group_ports = group
                    .iter()
                    .map(|p| topology.port(*p))
                    .collect::<Result<Vec<_>, _>>()?;
                port.flow_direction = agreed(group_ports.iter().map(|p| p.flow_direction))
                    .unwrap_or(FlowDirection::Unknown);
                port.flow_side =
                    agreed(group_ports.iter().map(|p| p.flow_side)).unwrap_or(FlowSide::Unknown);
                topology.ports.insert(id, port);

                for original in group {
                    mapping.insert(*original, Some(id));
                }
                if let Some(first) = ports.first() {
                    inner.push((*first, id));
                }
                ports.push(id);
                originals.insert(id, group.clone());
            }
            staged.push((cid, ports, originals, absorbed));
        }

        topology.apply_merge(&mapping, &inner, &[])?;
        validate_ports(&topology)?;

        self.topology = topology;
        self.next_port_id = next_port_id;
        self.next_component_id = next_component_id;

        let mut created = Vec::with_capacity(plans.len());
        for (plan, (cid, ports, originals, absorbed)) in plans.into_iter().zip(staged) {
            let elements = plan
                .members
                .iter()
                .filter_map(|member| {
                    self.element_ports.remove(member);
                    self.elements.remove(member)
                })
                .collect::<Vec<_>>();
            let aggregate =
                Aggregate::try_new(cid, plan.kind, elements, ports.clone(), originals, absorbed)?;
            tracing::debug!(
                "Created {} aggregate {cid} from {:?}.",
                plan.kind,
                plan.members
            );
            self.element_ports.insert(cid, ports);
            self.elements.insert(cid, Element::Aggregate(aggregate));
            created.push(cid);
        }

        self.validate()?;
        Ok(created)
    }
}

/// Returns the common value of the given items, or `None` if they differ or
/// there are none.
fn agreed<T: PartialEq>(mut items: impl Iterator<Item = T>) -> Option<T> {
    let first = items.next()?;
    items.all(|item| item == first).then_some(first)
}

impl PortGraph {
    /// Applies a merge in place.  Callers apply it on a copy, so that the
    /// graph stays untouched if it fails half-way.
    pub(crate) fn apply_merge(
        &mut self,
        mapping: &ReplacementMapping,
        new_inner_connections: &[(PortId, PortId)],
        extra_connections: &[(PortId, PortId)],
    ) -> Result<(), Error> {
        for (old, new) in mapping {
            self.port(*old)?;
            if let Some(new) = new {
                self.port(*new)?;
                if mapping.contains_key(new) {
                    return Err(Error::contract_violation(format!(
                        "{old} is mapped to {new}, which is itself mapped."
                    )));
                }
            }
        }
        for (a, b) in new_inner_connections.iter().chain(extra_connections) {
            for port in [a, b] {
                self.port(*port)?;
                if mapping.contains_key(port) {
                    return Err(Error::contract_violation(format!(
                        "New link ({a}, {b}) uses the replaced {port}."
                    )));
                }
            }
        }

        let mut rewired = vec![];
        let mut affected = BTreeSet::new();
        for old in mapping.keys() {
            for (other, link) in self.links(*old) {
                rewired.push((*old, other, link));
                affected.insert(other);
            }
        }
        for old in mapping.keys() {
            self.remove_node(*old);
            self.port_mut(*old)?.connection = None;
        }

        let resolve = |port: PortId| match mapping.get(&port) {
            Some(target) => *target,
            None => Some(port),
        };
        for (a, b, link) in rewired {
            let (Some(a), Some(b)) = (resolve(a), resolve(b)) else {
                continue;
            };
            if a == b {
                continue;
            }
            self.add_link(a, b, link);
            affected.extend([a, b]);
        }
        for (a, b) in new_inner_connections {
            self.add_link(*a, *b, Link::Inner);
            affected.extend([*a, *b]);
        }
        for (a, b) in extra_connections {
            self.add_link(*a, *b, Link::Connection);
            affected.extend([*a, *b]);
        }

        for port in affected {
            if mapping.contains_key(&port) {
                continue;
            }
            let connected = self
                .links(port)
                .into_iter()
                .filter(|(_, link)| *link == Link::Connection)
                .map(|(other, _)| other)
                .collect::<Vec<_>>();
            let connection = match connected.as_slice() {
                [] => None,
                [other] => Some(*other),
                _ => {
                    return Err(Error::contract_violation(format!(
                        "Merge leaves {port} connected to {connected:?}."
                    )))
                }
            };
            self.port_mut(port)?.connection = connection;
        }

        Ok(())
    }
}
