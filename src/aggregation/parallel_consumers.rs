// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Parallel consumers: groups of heat consumers connected in parallel, with
//! their branches.

use crate::attributes::{mean_of, sum_of, Formula};
use crate::{
    AggregatePlan, AggregationKind, Attribute, ComponentCategory, Error, Match, Node, TopologyGraph,
};

use super::{parallel_matches, plan_parallel, Aggregation};

pub(super) const AGGREGATABLE: &[ComponentCategory] = &[
    ComponentCategory::SpaceHeater,
    ComponentCategory::Pipe,
    ComponentCategory::PipeFitting,
    ComponentCategory::Valve,
    ComponentCategory::Aggregate(AggregationKind::PipeStrand),
    ComponentCategory::Aggregate(AggregationKind::MergedJunction),
    ComponentCategory::Aggregate(AggregationKind::ParallelConsumers),
];

pub(super) const FORMULAS: &[Formula] = &[Formula {
    name: "consumer_demand",
    outputs: &[
        Attribute::RatedPower,
        Attribute::FlowTemperature,
        Attribute::ReturnTemperature,
    ],
    compute: consumer_demand,
}];

/// The summed power of the consumers among the constituents, with their mean
/// design temperatures.
pub(super) fn consumer_demand(constituents: &[&dyn Node]) -> Vec<Option<f64>> {
    let consumers = constituents
        .iter()
        .copied()
        .filter(|c| c.is_consumer())
        .collect::<Vec<_>>();
    vec![
        sum_of(&consumers, Attribute::RatedPower),
        mean_of(&consumers, Attribute::FlowTemperature),
        mean_of(&consumers, Attribute::ReturnTemperature),
    ]
}

/// Replaces every group of consumers in parallel with a single aggregate.
#[derive(Clone, Debug)]
pub struct ParallelConsumers {
    /// The categories that may sit on the branches between the consumers.
    pub inert: Vec<ComponentCategory>,
    /// Splits the groups by equal value of this attribute.
    pub group_by: Option<Attribute>,
    /// Groups of this many consumers or fewer are left alone.
    pub min_group_size: Option<usize>,
}

impl Default for ParallelConsumers {
    fn default() -> Self {
        Self {
            inert: vec![
                ComponentCategory::Pipe,
                ComponentCategory::PipeFitting,
                ComponentCategory::Valve,
                ComponentCategory::Aggregate(AggregationKind::PipeStrand),
                ComponentCategory::Aggregate(AggregationKind::MergedJunction),
            ],
            group_by: None,
            min_group_size: None,
        }
    }
}

impl Aggregation for ParallelConsumers {
    fn kind(&self) -> AggregationKind {
        AggregationKind::ParallelConsumers
    }

    fn find_matches<N: Node>(&self, graph: &TopologyGraph<N>) -> Result<Vec<Match>, Error> {
        let groups = graph.parallel_groups(
            &[
                ComponentCategory::SpaceHeater,
                ComponentCategory::Aggregate(AggregationKind::ParallelConsumers),
            ],
            &self.inert,
            self.group_by,
            self.min_group_size,
        );
        Ok(parallel_matches(self.kind(), groups))
    }

    fn plan<N: Node>(
        &self,
        graph: &TopologyGraph<N>,
        found: &Match,
    ) -> Result<Vec<AggregatePlan>, Error> {
        plan_parallel(graph, self.kind(), found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_utils::{ComponentHandle, TestComponent, TopologyGraphBuilder};

    /// boiler -> pipe -> tee A -> heaters -> tee B -> pipe -> boiler
    fn heater_bank(
        heaters: &[(f64, f64, f64)],
    ) -> (TopologyGraphBuilder, [ComponentHandle; 4], Vec<ComponentHandle>) {
        let mut builder = TopologyGraphBuilder::new();
        let boiler = builder.boiler();
        let supply = builder.pipe(8.0, 0.025);
        let a = builder.fitting(heaters.len() + 1);
        let b = builder.fitting(heaters.len() + 1);
        let ret = builder.pipe(8.0, 0.025);
        builder
            .connect(boiler, 1, supply, 0)
            .connect(supply, 1, a, 0)
            .connect(b, 0, ret, 0)
            .connect(ret, 1, boiler, 0);
        let handles = heaters
            .iter()
            .enumerate()
            .map(|(i, (power, flow, back))| {
                let heater = builder.add(
                    TestComponent::new(0, ComponentCategory::SpaceHeater, 2)
                        .with(Attribute::RatedPower, *power)
                        .with(Attribute::FlowTemperature, *flow)
                        .with(Attribute::ReturnTemperature, *back),
                );
                builder
                    .connect(a, i + 1, heater, 0)
                    .connect(heater, 1, b, i + 1);
                heater
            })
            .collect();
        (builder, [supply, a, b, ret], handles)
    }

    #[test]
    fn test_parallel_consumers() -> Result<(), Error> {
        let (builder, [supply, a, b, ret], heaters) =
            heater_bank(&[(2.0, 70.0, 50.0), (3.0, 60.0, 40.0)]);
        let mut graph = builder.build(None)?;

        let created = graph.aggregate(&ParallelConsumers::default())?;
        assert_eq!(created.len(), 1);
        let element = graph.component(created[0])?;
        assert!(element.category().is_consumer());
        assert_eq!(element.attribute(Attribute::RatedPower), Some(5.0));
        assert_eq!(element.attribute(Attribute::FlowTemperature), Some(65.0));
        assert_eq!(element.attribute(Attribute::ReturnTemperature), Some(45.0));

        let Some(aggregate) = element.as_aggregate() else {
            return Err(Error::internal("Expected an aggregate."));
        };
        let mut absorbed = aggregate
            .elements()
            .iter()
            .map(|e| e.component_id())
            .collect::<Vec<_>>();
        absorbed.sort_unstable();
        assert_eq!(
            absorbed,
            vec![
                a.component_id(),
                b.component_id(),
                heaters[0].component_id(),
                heaters[1].component_id()
            ]
        );
        assert_eq!(aggregate.ports().len(), 2);
        assert_eq!(
            graph.element_view().neighbors(created[0]),
            vec![supply.component_id(), ret.component_id()]
        );

        // A single consumer is not a group.
        assert!(graph.aggregate(&ParallelConsumers::default())?.is_empty());

        Ok(())
    }

    #[test]
    fn test_grouped_by_flow_temperature() -> Result<(), Error> {
        let (builder, [_, a, b, _], heaters) = heater_bank(&[
            (2.0, 70.0, 50.0),
            (4.0, 55.0, 45.0),
            (3.0, 70.0, 50.0),
        ]);
        let mut graph = builder.build(None)?;

        let aggregation = ParallelConsumers {
            group_by: Some(Attribute::FlowTemperature),
            ..Default::default()
        };
        let created = graph.aggregate(&aggregation)?;

        // The tees keep a branch to the low temperature heater, so they are
        // split off as merged junctions.
        let kinds = created
            .iter()
            .map(|cid| graph.component(*cid).map(|c| c.category()))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            kinds,
            vec![
                ComponentCategory::Aggregate(AggregationKind::MergedJunction),
                ComponentCategory::Aggregate(AggregationKind::MergedJunction),
                ComponentCategory::Aggregate(AggregationKind::ParallelConsumers),
            ]
        );
        assert!(graph.component(a.component_id()).is_err());
        assert!(graph.component(b.component_id()).is_err());

        let consumers = graph.component(created[2])?;
        assert_eq!(consumers.attribute(Attribute::RatedPower), Some(5.0));
        assert_eq!(consumers.attribute(Attribute::FlowTemperature), Some(70.0));

        let view = graph.element_view();
        assert_eq!(view.neighbors(created[2]), vec![created[0], created[1]]);
        assert_eq!(
            view.neighbors(heaters[1].component_id()),
            vec![created[0], created[1]]
        );

        Ok(())
    }

    #[test]
    fn test_groups_sharing_junctions() -> Result<(), Error> {
        let (builder, [supply, a, b, ret], heaters) = heater_bank(&[
            (2.0, 70.0, 50.0),
            (4.0, 55.0, 45.0),
            (3.0, 70.0, 50.0),
            (1.0, 55.0, 45.0),
        ]);
        let mut graph = builder.build(None)?;
        let a_ports = graph.ports(a.component_id())?.to_vec();

        let aggregation = ParallelConsumers {
            group_by: Some(Attribute::FlowTemperature),
            ..Default::default()
        };
        let matches = aggregation.find_matches(&graph)?;
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].metadata(),
            &crate::MatchMetadata::ParallelGroups(vec![
                vec![2, 3, heaters[0].component_id(), heaters[2].component_id()],
                vec![2, 3, heaters[1].component_id(), heaters[3].component_id()],
            ])
        );

        let created = graph.aggregate(&aggregation)?;
        assert_eq!(created, vec![9, 10, 11, 12]);
        let kinds = created
            .iter()
            .map(|cid| graph.component(*cid).map(|c| c.category()))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            kinds,
            vec![
                ComponentCategory::Aggregate(AggregationKind::MergedJunction),
                ComponentCategory::Aggregate(AggregationKind::MergedJunction),
                ComponentCategory::Aggregate(AggregationKind::ParallelConsumers),
                ComponentCategory::Aggregate(AggregationKind::ParallelConsumers),
            ]
        );

        // One combined port per group, and the one towards the supply pipe.
        let Some(split) = graph.component(created[0])?.as_aggregate() else {
            return Err(Error::internal("Expected an aggregate."));
        };
        assert_eq!(split.ports().len(), 3);
        assert_eq!(
            split.originals()[&split.ports()[0]],
            vec![a_ports[1], a_ports[3]]
        );
        assert_eq!(
            split.originals()[&split.ports()[1]],
            vec![a_ports[2], a_ports[4]]
        );

        let warm = graph.component(created[2])?;
        assert_eq!(warm.attribute(Attribute::RatedPower), Some(5.0));
        assert_eq!(warm.attribute(Attribute::FlowTemperature), Some(70.0));
        let cool = graph.component(created[3])?;
        assert_eq!(cool.attribute(Attribute::RatedPower), Some(5.0));
        assert_eq!(cool.attribute(Attribute::FlowTemperature), Some(55.0));

        let view = graph.element_view();
        assert_eq!(view.neighbors(9), vec![supply.component_id(), 11, 12]);
        assert_eq!(view.neighbors(10), vec![ret.component_id(), 11, 12]);
        assert_eq!(view.neighbors(11), vec![9, 10]);
        assert_eq!(view.neighbors(12), vec![9, 10]);
        assert!(graph.component(b.component_id()).is_err());

        Ok(())
    }

    #[test]
    fn test_min_group_size() -> Result<(), Error> {
        let (builder, ..) = heater_bank(&[(2.0, 70.0, 50.0), (3.0, 60.0, 40.0)]);
        let mut graph = builder.build(None)?;

        let aggregation = ParallelConsumers {
            min_group_size: Some(2),
            ..Default::default()
        };
        assert!(graph.aggregate(&aggregation)?.is_empty());
        assert_eq!(graph.aggregates().count(), 0);

        Ok(())
    }
}
