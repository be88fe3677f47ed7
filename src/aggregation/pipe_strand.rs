// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Pipe strands: straight runs of pipes, fittings and valves.

use crate::attributes::{sum_of, weighted_mean_of, Formula};
use crate::component_category::CategoryPredicates;
use crate::{
    AggregationKind, Attribute, ComponentCategory, Error, Match, MatchMetadata, Node, TopologyGraph,
};

use super::Aggregation;

pub(super) const AGGREGATABLE: &[ComponentCategory] = &[
    ComponentCategory::Pipe,
    ComponentCategory::PipeFitting,
    ComponentCategory::Valve,
    ComponentCategory::Aggregate(AggregationKind::PipeStrand),
];

pub(super) const FORMULAS: &[Formula] = &[Formula {
    name: "strand_geometry",
    outputs: &[Attribute::Length, Attribute::Diameter],
    compute: strand_geometry,
}];

/// Total length, and the length-weighted mean diameter of the pipes.
/// Fittings and valves don't count.
fn strand_geometry(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    let runs = constituents
        .iter()
        .copied()
        .filter(|c| {
            !matches!(
                c.category(),
                ComponentCategory::PipeFitting | ComponentCategory::Valve
            )
        })
        .collect::<Vec<_>>();
    vec![
        sum_of(&runs, Attribute::Length),
        weighted_mean_of(&runs, Attribute::Diameter, Attribute::Length),
    ]
}

/// Replaces every chain of at least two pipes, fittings or valves with a
/// single strand.
///
/// Junctions never take part, even when only two of their ports are
/// connected, so a chain is cut at every fitting with more than two ports.
#[derive(Clone, Debug)]
pub struct PipeStrand {
    /// The categories that chains are made of.
    pub types: Vec<ComponentCategory>,
}

impl Default for PipeStrand {
    fn default() -> Self {
        Self {
            types: AGGREGATABLE.to_vec(),
        }
    }
}

impl Aggregation for PipeStrand {
    fn kind(&self) -> AggregationKind {
        AggregationKind::PipeStrand
    }

    fn find_matches<N: Node>(&self, graph: &TopologyGraph<N>) -> Result<Vec<Match>, Error> {
        let mut matches = vec![];
        for chain in graph.connected_type_chains(&self.types, false) {
            let mut run = vec![];
            for cid in chain {
                if graph.component(cid)?.is_junction() {
                    matches.push(std::mem::take(&mut run));
                } else {
                    run.push(cid);
                }
            }
            matches.push(run);
        }
        Ok(matches
            .into_iter()
            .filter(|run| run.len() >= 2)
            .map(|run| Match::new(self.kind(), run, MatchMetadata::None))
            .collect())
    }
}
