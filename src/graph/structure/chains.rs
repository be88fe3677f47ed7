// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Detection of chains of components of given categories.

use crate::{ComponentCategory, Node, TopologyGraph};

impl<N> TopologyGraph<N>
where
    N: Node,
{
    /// Returns the chains formed by components of the given categories.
    ///
    /// Only components with one or two neighbors in the element view take
    /// part.  A connected group of them with exactly two ends is returned as
    /// the ordered path from the end with the smaller id to the other end.
    /// Any other group, a single component or a closed loop, is returned with
    /// its ids in ascending order if `include_singletons` is set, and
    /// discarded otherwise.
    pub fn connected_type_chains(
        &self,
        types: &[ComponentCategory],
        include_singletons: bool,
    ) -> Vec<Vec<u64>> {
        let view = self.element_view();
        let restricted = view.restricted(|cid| {
            self.has_category(cid, types) && (1..=2).contains(&view.degree(cid))
        });

        let mut chains = vec![];
        for group in restricted.connected_components() {
            let ends = group
                .iter()
                .copied()
                .filter(|cid| restricted.degree(*cid) == 1)
                .collect::<Vec<_>>();

            let [start, end] = ends.as_slice() else {
                if include_singletons {
                    chains.push(group.into_iter().collect());
                }
                continue;
            };

            let mut chain = vec![*start];
            let mut previous = None;
            let mut current = *start;
            while current != *end {
                let Some(next) = restricted
                    .neighbors(current)
                    .into_iter()
                    .find(|n| Some(*n) != previous)
                else {
                    break;
                };
                previous = Some(current);
                current = next;
                chain.push(current);
            }
            chains.push(chain);
        }

        chains
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::graph::test_utils::TopologyGraphBuilder;
    use crate::{ComponentCategory, Error};

    #[test]
    fn test_chains() -> Result<(), Error> {
        let mut builder = TopologyGraphBuilder::new();
        let boiler = builder.boiler();
        let first = builder.pipe_run(3);
        let tee = builder.fitting(3);
        let second = builder.pipe_run(2);
        let lone = builder.pipe(1.0, 0.02);
        let heater = builder.space_heater(2.0);
        builder
            .connect(boiler, 1, first[0], 0)
            .connect(first[2], 1, tee, 0)
            .connect(tee, 1, second[0], 0)
            .connect(tee, 2, lone, 0)
            .connect(lone, 1, heater, 0);
        let graph = builder.build(None)?;

        let ids = |handles: &[crate::graph::test_utils::ComponentHandle]| {
            handles.iter().map(|h| h.component_id()).collect::<Vec<_>>()
        };

        let chains = graph.connected_type_chains(&[ComponentCategory::Pipe], false);
        assert_eq!(chains, vec![ids(&first), ids(&second)]);

        let chains = graph.connected_type_chains(&[ComponentCategory::Pipe], true);
        assert_eq!(chains, vec![ids(&first), ids(&second), vec![lone.component_id()]]);

        // The tee has three neighbors, so it never takes part.
        let chains = graph.connected_type_chains(
            &[ComponentCategory::Pipe, ComponentCategory::PipeFitting],
            false,
        );
        assert_eq!(chains, vec![ids(&first), ids(&second)]);

        Ok(())
    }

    #[test]
    fn test_closed_loop() -> Result<(), Error> {
        let mut builder = TopologyGraphBuilder::new();
        let pipes = builder.pipe_run(4);
        builder.connect(pipes[3], 1, pipes[0], 0);
        let graph = builder.build(None)?;

        assert!(graph
            .connected_type_chains(&[ComponentCategory::Pipe], false)
            .is_empty());
        assert_eq!(
            graph.connected_type_chains(&[ComponentCategory::Pipe], true),
            vec![vec![0, 1, 2, 3]]
        );

        Ok(())
    }

    proptest! {
        #[test]
        fn prop_run_is_one_ordered_chain(len in 2usize..40, reversed in any::<bool>()) {
            let mut builder = TopologyGraphBuilder::new();
            let boiler = builder.boiler();
            let heater = builder.space_heater(1.0);
            let mut pipes = builder.pipe_run(len);
            builder.connect(boiler, 1, pipes[0], 0);
            builder.connect(pipes[len - 1], 1, heater, 0);
            if reversed {
                pipes.reverse();
            }
            let graph = builder.build(None).map_err(|e| TestCaseError::fail(e.to_string()))?;

            let chains = graph.connected_type_chains(&[ComponentCategory::Pipe], false);
            prop_assert_eq!(chains.len(), 1);
            let mut expected = pipes.iter().map(|p| p.component_id()).collect::<Vec<_>>();
            if expected[0] > expected[len - 1] {
                expected.reverse();
            }
            prop_assert_eq!(&chains[0], &expected);
        }
    }
}
