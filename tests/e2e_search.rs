//! Derivation search against randomly generated knowledge graphs.
//!
//! The search depth is checked against a fixpoint computation: a quantity's
//! depth is 0 when known, otherwise one more than the deepest input of its
//! cheapest fully-known formula.

use std::collections::{BTreeSet, HashMap};

use physics_derive::search::Heuristic;
use physics_derive::{
    DerivationSearch, DerivationStep, DistanceIndex, KnowledgeStore, MemoryStore, QuantityId,
    SearchConfig, SearchOutcome,
};
use proptest::prelude::*;

fn reference_depths(formulas: &[Vec<QuantityId>], known: &[QuantityId]) -> HashMap<QuantityId, u32> {
    let mut depth: HashMap<QuantityId, u32> = known.iter().map(|&k| (k, 0)).collect();
    loop {
        let mut changed = false;
        for members in formulas {
            for &output in members {
                let inputs: Option<Vec<u32>> = members
                    .iter()
                    .filter(|&&q| q != output)
                    .map(|q| depth.get(q).copied())
                    .collect();
                let Some(inputs) = inputs else { continue };
                let candidate = inputs.into_iter().max().map_or(1, |d| d + 1);
                if depth.get(&output).is_none_or(|&d| candidate < d) {
                    depth.insert(output, candidate);
                    changed = true;
                }
            }
        }
        if !changed {
            return depth;
        }
    }
}

fn build_store(quantities: usize, formulas: &[BTreeSet<usize>]) -> (MemoryStore, Vec<QuantityId>, Vec<Vec<QuantityId>>) {
    let store = MemoryStore::new();
    let ids: Vec<QuantityId> = (0..quantities)
        .map(|i| store.add_quantity(format!("q{i}"), format!("q{i}"), "1").unwrap())
        .collect();
    let mut members = Vec::new();
    for (n, set) in formulas.iter().enumerate() {
        let qs: Vec<QuantityId> = set.iter().map(|&i| ids[i]).collect();
        store.add_formula(format!("f{n}"), "q0 = q1", &qs, &[]).unwrap();
        members.push(qs);
    }
    (store, ids, members)
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<BTreeSet<usize>>, BTreeSet<usize>, usize)> {
    (3usize..9).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(prop::collection::btree_set(0..n, 2..=4), 1..10),
            prop::collection::btree_set(0..n, 1..=3),
            0..n,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn search_depth_matches_fixpoint((n, formulas, known, target) in graph_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (store, ids, members) = build_store(n, &formulas);
        let known: Vec<QuantityId> = known.into_iter().map(|i| ids[i]).collect();
        let target = ids[target];

        let outcome = runtime.block_on(async {
            let index = DistanceIndex::build(
                &store.all_quantities().await.unwrap(),
                &store.all_formulas().await.unwrap(),
            );
            DerivationSearch::default().find_path(&store, &index, &known, target).await.unwrap()
        });

        let expected = reference_depths(&members, &known).get(&target).copied();
        match (outcome, expected) {
            (SearchOutcome::Found { path, cost, .. }, Some(depth)) => {
                prop_assert_eq!(cost, depth);
                prop_assert!(path.is_well_ordered(&known));
                if depth > 0 {
                    let last = path.steps().last().cloned();
                    let reaches_target = matches!(last, Some(DerivationStep::FindFormula { output_id, .. }) if output_id == target);
                    prop_assert!(reaches_target);
                } else {
                    prop_assert!(path.is_empty());
                }
            }
            (SearchOutcome::NoPathFound { .. }, None) => {}
            (outcome, expected) => prop_assert!(false, "outcome {:?} but fixpoint depth {:?}", outcome, expected),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The estimate from any quantity never exceeds the depth at which the
    /// target can be derived with that quantity as the only known.
    #[test]
    fn heuristic_never_overestimates((n, formulas, _known, target) in graph_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (store, ids, members) = build_store(n, &formulas);
        let target = ids[target];

        let estimates: Vec<(QuantityId, f64)> = runtime.block_on(async {
            let index = DistanceIndex::build(
                &store.all_quantities().await.unwrap(),
                &store.all_formulas().await.unwrap(),
            );
            let heuristic = Heuristic::new(&store, &index, target).await.unwrap();
            ids.iter().map(|&id| (id, heuristic.estimate(id))).collect()
        });

        for (id, estimate) in estimates {
            if let Some(depth) = reference_depths(&members, &[id]).get(&target) {
                prop_assert!(
                    estimate <= f64::from(*depth),
                    "estimate {} from {} exceeds true cost {}", estimate, id, depth
                );
            }
        }
    }
}

#[tokio::test]
async fn test_budget_is_reported_not_raised() {
    let sets: Vec<BTreeSet<usize>> = (0..6).map(|i| BTreeSet::from([i, i + 1])).collect();
    let (store, ids, _) = build_store(7, &sets);
    let index = DistanceIndex::build(&store.all_quantities().await.unwrap(), &store.all_formulas().await.unwrap());
    let search = DerivationSearch::new(SearchConfig { max_expansions: 3, max_frontier: 100 });

    let outcome = search.find_path(&store, &index, &[ids[0]], ids[6]).await.unwrap();
    assert!(matches!(outcome, SearchOutcome::BudgetExceeded { expansions: 3, .. }));

    let outcome = DerivationSearch::default().find_path(&store, &index, &[ids[0]], ids[6]).await.unwrap();
    match outcome {
        SearchOutcome::Found { path, cost, .. } => {
            assert_eq!(cost, 6);
            assert_eq!(path.len(), 6);
        }
        other => panic!("expected a path, got {other:?}"),
    }
}
