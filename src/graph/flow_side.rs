// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Flow directions and supply/return sides of the ports of a
//! [`TopologyGraph`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::{Error, FlowDirection, FlowSide, Link, Node, PortId, TopologyGraph};

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Sets the flow direction of the given port.
    ///
    /// Fails if the owning component locked the direction, or if a different
    /// direction was already set.
    pub fn set_flow_direction(
        &mut self,
        port: PortId,
        direction: FlowDirection,
    ) -> Result<(), Error> {
        let port = self.topology.port_mut(port)?;
        if port.direction_locked && port.flow_direction != direction {
            return Err(Error::contract_violation(format!(
                "{port} has a locked flow direction {:?}.",
                port.flow_direction
            )));
        }
        match port.flow_direction {
            FlowDirection::Unknown => {
                port.flow_direction = direction;
                Ok(())
            }
            current if current == direction => Ok(()),
            current => Err(Error::contract_violation(format!(
                "{port} already has flow direction {current:?}, can't set it to {direction:?}."
            ))),
        }
    }

    /// Sets the flow side of the given port, overwriting any previous side.
    pub fn set_flow_side(&mut self, port: PortId, side: FlowSide) -> Result<(), Error> {
        let port = self.topology.port_mut(port)?;
        if port.flow_side.is_known() && port.flow_side != side {
            tracing::info!(
                "Overwriting flow side of {port}: {:?} -> {:?}.",
                port.flow_side,
                side
            );
        }
        port.flow_side = side;
        Ok(())
    }

    /// Returns the side that the ports linked across the given link have,
    /// relative to `side` on `port`.  Crossing a consumer or generator flips
    /// the side.
    fn side_across(&self, port: PortId, link: Link, side: FlowSide) -> Result<FlowSide, Error> {
        if link == Link::Inner {
            let owner = self.owner(port)?;
            if owner.is_consumer() || owner.is_generator() {
                return Ok(side.inverted());
            }
        }
        Ok(side)
    }

    /// Assigns `side` to `seed` and spreads it over the graph, inverting it
    /// across consumers and generators.
    ///
    /// A port reached with both sides is a conflict.  With
    /// `strict_flow_sides` set this is an error and no port is changed;
    /// otherwise the conflicting ports get an unknown side.
    ///
    /// Returns the sides assigned to the reached ports.
    pub fn propagate_flow_side(
        &mut self,
        seed: PortId,
        side: FlowSide,
    ) -> Result<BTreeMap<PortId, FlowSide>, Error> {
        self.topology.port(seed)?;
        if !side.is_known() {
            tracing::warn!("Not propagating an unknown flow side from {seed}.");
            return Ok(BTreeMap::new());
        }

        let mut assigned = BTreeMap::from([(seed, side)]);
        let mut conflicts = BTreeSet::new();
        let mut queue = VecDeque::from([seed]);

        while let Some(port) = queue.pop_front() {
            let side = assigned[&port];
            for (other, link) in self.topology.links(port) {
                let expected = self.side_across(port, link, side)?;
                match assigned.get(&other) {
                    Some(existing) if *existing == expected => {}
                    Some(existing) => {
                        if self.config.strict_flow_sides {
                            return Err(Error::flow_side_conflict(format!(
                                "{} is reached as {:?} and as {:?}.",
                                self.topology.port(other)?,
                                existing,
                                expected
                            )));
                        }
                        conflicts.insert(other);
                    }
                    None => {
                        assigned.insert(other, expected);
                        queue.push_back(other);
                    }
                }
            }
        }

        for port in &conflicts {
            tracing::warn!(
                "Conflicting flow sides at {}, marking it as unknown.",
                self.topology.port(*port)?
            );
            assigned.insert(*port, FlowSide::Unknown);
        }
        for (port, side) in &assigned {
            self.set_flow_side(*port, *side)?;
        }

        Ok(assigned)
    }

    /// Derives the flow side of the given port from the ports with known
    /// sides around it, without changing anything.
    ///
    /// The search stops at ports with known sides.  Returns `Unknown` if it
    /// reaches none, their common side if they agree, and `None` if they
    /// disagree.
    pub fn discover_flow_side(&self, start: PortId) -> Result<Option<FlowSide>, Error> {
        let start_port = self.topology.port(start)?;
        if start_port.flow_side.is_known() {
            return Ok(Some(start_port.flow_side));
        }

        // Sides of the reached ports, if the start port were on the supply
        // side.
        let mut relative = BTreeMap::from([(start, FlowSide::Supply)]);
        let mut queue = VecDeque::from([start]);
        let (mut supply, mut ret) = (false, false);

        while let Some(port) = queue.pop_front() {
            let side = relative[&port];
            for (other, link) in self.topology.links(port) {
                if relative.contains_key(&other) {
                    continue;
                }
                let expected = self.side_across(port, link, side)?;
                relative.insert(other, expected);

                let known = self.topology.port(other)?.flow_side;
                if known.is_known() {
                    if known == expected {
                        supply = true;
                    } else {
                        ret = true;
                    }
                    continue;
                }
                queue.push_back(other);
            }
        }

        Ok(match (supply, ret) {
            (false, false) => Some(FlowSide::Unknown),
            (true, false) => Some(FlowSide::Supply),
            (false, true) => Some(FlowSide::Return),
            (true, true) => None,
        })
    }
}
