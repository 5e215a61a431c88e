//! # Derivation Search
//!
//! Best-first search over the formula hypergraph. Quantities are nodes;
//! a formula is a hyperedge that yields one of its quantities once all of
//! the others are available. The cost of a quantity is the depth of its
//! derivation: `g = max(g of inputs) + 1`, knowns at `g = 0`.
//!
//! The frontier is ordered by `f = g + h` where `h` comes from the
//! [`DistanceIndex`]. A quantity is *resolved* once it has been expanded;
//! a formula becomes a candidate edge when exactly one of its quantities
//! is still unresolved. Hop distances are consistent, so the first time
//! the target leaves the frontier its `g` is minimal.
//!
//! The search is bounded by [`SearchConfig`]. Running out of budget or of
//! frontier is an outcome, not an error.

mod frontier;

use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::index::DistanceIndex;
use crate::model::{DerivationStep, FormulaId, QuantityId, SolvingPath};
use crate::storage::KnowledgeStore;
use crate::Result;

use frontier::FrontierEntry;

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// `path` derives the target from the knowns in `cost` levels.
    Found { path: SolvingPath, cost: u32, expansions: usize },
    /// The frontier ran dry; the target is not derivable.
    NoPathFound { expansions: usize },
    /// The expansion or frontier ceiling was hit first.
    BudgetExceeded { expansions: usize, frontier: usize },
}

impl SearchOutcome {
    pub fn into_path(self) -> Option<SolvingPath> {
        match self {
            SearchOutcome::Found { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn expansions(&self) -> usize {
        match self {
            SearchOutcome::Found { expansions, .. }
            | SearchOutcome::NoPathFound { expansions }
            | SearchOutcome::BudgetExceeded { expansions, .. } => *expansions,
        }
    }
}

/// The formula and inputs that produced a quantity.
#[derive(Debug, Clone)]
struct Derivation {
    formula: FormulaId,
    inputs: Vec<QuantityId>,
}

// ============================================================================
// Heuristic
// ============================================================================

/// Lower bound on the formula applications between a quantity and the
/// target.
pub struct Heuristic<'a> {
    index: &'a DistanceIndex,
    target: QuantityId,
    /// Quantities sharing a formula with the target.
    co_occurring: HashSet<QuantityId>,
}

impl<'a> Heuristic<'a> {
    /// Reads `formulas_referencing(target)` once.
    pub async fn new<S: KnowledgeStore>(store: &S, index: &'a DistanceIndex, target: QuantityId) -> Result<Self> {
        let co_occurring = store
            .formulas_referencing(target)
            .await?
            .iter()
            .flat_map(|f| f.quantities.iter().copied())
            .filter(|&q| q != target)
            .collect();
        Ok(Self { index, target, co_occurring })
    }

    /// 0 at the target itself, 1 for quantities sharing a formula with it,
    /// otherwise the hop distance (`+∞` when unreachable).
    ///
    /// The target scores 0 rather than 1: reaching it costs nothing more,
    /// and the lower value keeps the estimate consistent, so a popped target
    /// always carries its minimum depth.
    pub fn estimate(&self, id: QuantityId) -> f64 {
        if id == self.target {
            0.0
        } else if self.co_occurring.contains(&id) {
            1.0
        } else {
            self.index.distance(id, self.target).as_cost()
        }
    }
}

// ============================================================================
// DerivationSearch
// ============================================================================

/// Finds minimum-depth derivation paths.
#[derive(Debug, Clone, Default)]
pub struct DerivationSearch {
    config: SearchConfig,
}

impl DerivationSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search for a derivation of `target` from `known`.
    ///
    /// A target that is itself known yields an empty path. Storage errors
    /// propagate unchanged.
    pub async fn find_path<S: KnowledgeStore>(
        &self,
        store: &S,
        index: &DistanceIndex,
        known: &[QuantityId],
        target: QuantityId,
    ) -> Result<SearchOutcome> {
        if known.contains(&target) {
            debug!(%target, "target already known");
            return Ok(SearchOutcome::Found { path: SolvingPath::default(), cost: 0, expansions: 0 });
        }

        let heuristic = Heuristic::new(store, index, target).await?;

        let mut g_scores: HashMap<QuantityId, u32> = HashMap::new();
        let mut derivations: HashMap<QuantityId, Derivation> = HashMap::new();
        let mut resolved: HashSet<QuantityId> = HashSet::new();
        let mut frontier: BinaryHeap<FrontierEntry> = BinaryHeap::new();
        let mut seq: u64 = 0;

        for &id in known {
            if g_scores.insert(id, 0).is_none() {
                frontier.push(FrontierEntry::new(id, 0, heuristic.estimate(id), seq));
                seq += 1;
            }
        }

        let mut expansions = 0usize;

        while let Some(entry) = frontier.pop() {
            let current = entry.quantity;

            // Stale entry: already expanded, or superseded by a better g.
            if resolved.contains(&current) || g_scores.get(&current) != Some(&entry.g_score) {
                continue;
            }

            if current == target {
                let path = reconstruct(target, &derivations);
                info!(%target, cost = entry.g_score, steps = path.len(), expansions, "derivation found");
                return Ok(SearchOutcome::Found { path, cost: entry.g_score, expansions });
            }

            if expansions >= self.config.max_expansions {
                info!(%target, expansions, "search expansion budget exhausted");
                return Ok(SearchOutcome::BudgetExceeded { expansions, frontier: frontier.len() });
            }

            resolved.insert(current);
            expansions += 1;

            for formula in store.formulas_referencing(current).await? {
                let mut unresolved = formula.quantities.iter().filter(|q| !resolved.contains(*q));
                let (Some(&output), None) = (unresolved.next(), unresolved.next()) else {
                    continue;
                };

                let inputs: Vec<QuantityId> = formula
                    .quantities
                    .iter()
                    .copied()
                    .filter(|&q| q != output)
                    .collect();
                let tentative = inputs
                    .iter()
                    .filter_map(|q| g_scores.get(q))
                    .max()
                    .map_or(1, |g| g + 1);

                if tentative >= g_scores.get(&output).copied().unwrap_or(u32::MAX) {
                    continue;
                }

                debug!(formula = %formula.id, %output, g = tentative, "candidate derivation");
                g_scores.insert(output, tentative);
                derivations.insert(output, Derivation { formula: formula.id, inputs });
                frontier.push(FrontierEntry::new(output, tentative, heuristic.estimate(output), seq));
                seq += 1;

                if frontier.len() > self.config.max_frontier {
                    info!(%target, expansions, frontier = frontier.len(), "search frontier budget exhausted");
                    return Ok(SearchOutcome::BudgetExceeded { expansions, frontier: frontier.len() });
                }
            }
        }

        info!(%target, expansions, "no derivation path");
        Ok(SearchOutcome::NoPathFound { expansions })
    }
}

/// Emit the target's derivation after the derivations of every input it
/// depends on, each quantity once. For a chain this is the single line of
/// derivations back from the target.
fn reconstruct(target: QuantityId, derivations: &HashMap<QuantityId, Derivation>) -> SolvingPath {
    let mut steps = Vec::new();
    let mut emitted: HashSet<QuantityId> = HashSet::new();
    let mut stack = vec![(target, false)];

    while let Some((id, inputs_done)) = stack.pop() {
        let Some(derivation) = derivations.get(&id) else { continue };
        if emitted.contains(&id) {
            continue;
        }
        if inputs_done {
            emitted.insert(id);
            steps.push(DerivationStep::find_formula(derivation.formula, derivation.inputs.clone(), id));
            continue;
        }
        stack.push((id, true));
        for &input in derivation.inputs.iter().rev() {
            if derivations.contains_key(&input) && !emitted.contains(&input) {
                stack.push((input, false));
            }
        }
    }

    SolvingPath::from_steps(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    /// Quantities 1..=n named `q{i}`, symbols `x{i}`.
    fn store_with(n: u64) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 1..=n {
            store.add_quantity(format!("q{i}"), format!("x{i}"), "").unwrap();
        }
        store
    }

    fn formula(store: &MemoryStore, members: &[u64]) -> FormulaId {
        let ids: Vec<_> = members.iter().map(|&m| QuantityId(m)).collect();
        store.add_formula(format!("f{members:?}"), "", &ids, &[]).unwrap()
    }

    async fn index_of(store: &MemoryStore) -> DistanceIndex {
        DistanceIndex::build(
            &store.all_quantities().await.unwrap(),
            &store.all_formulas().await.unwrap(),
        )
    }

    fn outputs(path: &SolvingPath) -> Vec<u64> {
        path.iter()
            .filter_map(|s| match s {
                DerivationStep::FindFormula { output_id, .. } => Some(output_id.0),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_step() {
        // F = m a
        let store = store_with(3);
        let f = formula(&store, &[1, 2, 3]);
        let index = index_of(&store).await;

        let outcome = DerivationSearch::default()
            .find_path(&store, &index, &[QuantityId(2), QuantityId(3)], QuantityId(1))
            .await
            .unwrap();

        let SearchOutcome::Found { path, cost, .. } = outcome else { panic!("expected a path") };
        assert_eq!(cost, 1);
        assert_eq!(path.len(), 1);
        assert_eq!(
            path.steps()[0],
            DerivationStep::FindFormula {
                step: 1,
                description: format!("Use formula {f} to find quantity 1"),
                formula_id: f,
                input_ids: vec![QuantityId(2), QuantityId(3)],
                output_id: QuantityId(1),
            }
        );
    }

    #[tokio::test]
    async fn test_chain_is_ordered() {
        // 1 → 2 → 3 → 4
        let store = store_with(4);
        formula(&store, &[1, 2]);
        formula(&store, &[2, 3]);
        formula(&store, &[3, 4]);
        let index = index_of(&store).await;

        let outcome = DerivationSearch::default()
            .find_path(&store, &index, &[QuantityId(1)], QuantityId(4))
            .await
            .unwrap();
        let path = outcome.into_path().unwrap();
        assert_eq!(outputs(&path), vec![2, 3, 4]);
        assert_eq!(path.iter().map(DerivationStep::step).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(path.is_well_ordered(&[QuantityId(1)]));
    }

    #[tokio::test]
    async fn test_prefers_shorter_derivation() {
        // Long route 1→2→3→5 and short route {1,4}→5
        let store = store_with(5);
        formula(&store, &[1, 2]);
        formula(&store, &[2, 3]);
        formula(&store, &[3, 5]);
        formula(&store, &[1, 4, 5]);
        let index = index_of(&store).await;

        let outcome = DerivationSearch::default()
            .find_path(&store, &index, &[QuantityId(1), QuantityId(4)], QuantityId(5))
            .await
            .unwrap();
        let SearchOutcome::Found { path, cost, .. } = outcome else { panic!("expected a path") };
        assert_eq!(cost, 1);
        assert_eq!(outputs(&path), vec![5]);
    }

    #[tokio::test]
    async fn test_branching_inputs_are_all_derived() {
        // 1 → 2, 1 → 3, {2, 3} → 4
        let store = store_with(4);
        formula(&store, &[1, 2]);
        formula(&store, &[1, 3]);
        formula(&store, &[2, 3, 4]);
        let index = index_of(&store).await;

        let known = [QuantityId(1)];
        let path = DerivationSearch::default()
            .find_path(&store, &index, &known, QuantityId(4))
            .await
            .unwrap()
            .into_path()
            .unwrap();
        assert_eq!(outputs(&path), vec![2, 3, 4]);
        assert!(path.is_well_ordered(&known));
    }

    #[tokio::test]
    async fn test_isolated_target() {
        let store = store_with(3);
        formula(&store, &[1, 2]);
        let index = index_of(&store).await;

        let outcome = DerivationSearch::default()
            .find_path(&store, &index, &[QuantityId(1)], QuantityId(3))
            .await
            .unwrap();
        assert!(matches!(outcome, SearchOutcome::NoPathFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_second_input() {
        // F = m a with only m known
        let store = store_with(3);
        formula(&store, &[1, 2, 3]);
        let index = index_of(&store).await;

        let outcome = DerivationSearch::default()
            .find_path(&store, &index, &[QuantityId(2)], QuantityId(1))
            .await
            .unwrap();
        assert!(matches!(outcome, SearchOutcome::NoPathFound { expansions: 1 }));
    }

    #[tokio::test]
    async fn test_target_already_known() {
        let store = store_with(2);
        formula(&store, &[1, 2]);
        let index = index_of(&store).await;

        let outcome = DerivationSearch::default()
            .find_path(&store, &index, &[QuantityId(1), QuantityId(2)], QuantityId(2))
            .await
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Found { path: SolvingPath::default(), cost: 0, expansions: 0 });
    }

    #[tokio::test]
    async fn test_expansion_budget() {
        let store = store_with(6);
        for i in 1..6 {
            formula(&store, &[i, i + 1]);
        }
        let index = index_of(&store).await;

        let search = DerivationSearch::new(SearchConfig { max_expansions: 2, max_frontier: 100 });
        let outcome = search
            .find_path(&store, &index, &[QuantityId(1)], QuantityId(6))
            .await
            .unwrap();
        assert!(matches!(outcome, SearchOutcome::BudgetExceeded { expansions: 2, .. }));
    }

    #[tokio::test]
    async fn test_frontier_budget() {
        // A star around quantity 1
        let store = store_with(8);
        for i in 2..=7 {
            formula(&store, &[1, i]);
        }
        let index = index_of(&store).await;

        let search = DerivationSearch::new(SearchConfig { max_expansions: 100, max_frontier: 3 });
        let outcome = search
            .find_path(&store, &index, &[QuantityId(1)], QuantityId(8))
            .await
            .unwrap();
        assert!(matches!(outcome, SearchOutcome::BudgetExceeded { .. }));
    }

    #[tokio::test]
    async fn test_heuristic() {
        let store = store_with(4);
        formula(&store, &[1, 2]);
        formula(&store, &[2, 3]);
        let index = index_of(&store).await;

        let h = Heuristic::new(&store, &index, QuantityId(3)).await.unwrap();
        assert_eq!(h.estimate(QuantityId(3)), 0.0);
        assert_eq!(h.estimate(QuantityId(2)), 1.0);
        assert_eq!(h.estimate(QuantityId(1)), 2.0);
        assert_eq!(h.estimate(QuantityId(4)), f64::INFINITY);
    }
}
