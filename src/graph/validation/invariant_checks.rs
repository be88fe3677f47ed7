// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Helper methods for checking invariants of the ports of a
//! [`TopologyGraph`][crate::TopologyGraph].

use crate::{Error, Link, Port};

use super::PortGraphValidator;

impl PortGraphValidator<'_> {
    /// Checks that the connection of the given port, if any, points back to
    /// it from a port of another component.
    pub(super) fn ensure_mutual_connection(&self, port: &Port) -> Result<(), Error> {
        let Some(other) = port.connection else {
            return Ok(());
        };
        let other = self.topology.port(other).map_err(|_| {
            Error::invalid_graph(format!("{port} is connected to unknown {other}."))
        })?;
        if other.connection != Some(port.id) {
            return Err(Error::invalid_graph(format!(
                "{port} is connected to {other}, but not the other way around."
            )));
        }
        if other.owner == port.owner {
            return Err(Error::invalid_graph(format!(
                "{port} is connected to {other} of the same component."
            )));
        }
        Ok(())
    }

    /// Checks that the given port has at most one connection link, and that
    /// it agrees with the port's connection.
    pub(super) fn ensure_single_connection_link(&self, port: &Port) -> Result<(), Error> {
        let linked = self
            .topology
            .links(port.id)
            .into_iter()
            .filter(|(_, link)| *link == Link::Connection)
            .map(|(other, _)| other)
            .collect::<Vec<_>>();

        match (linked.as_slice(), port.connection) {
            ([], None) => Ok(()),
            ([other], Some(connection)) if *other == connection => Ok(()),
            ([_, _, ..], _) => Err(Error::invalid_graph(format!(
                "{port} has {} connection links: {:?}.",
                linked.len(),
                linked
            ))),
            _ => Err(Error::invalid_graph(format!(
                "{port} is connected to {:?}, but linked to {:?}.",
                port.connection, linked
            ))),
        }
    }
}
