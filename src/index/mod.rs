//! # Distance Index
//!
//! All-pairs hop counts over the co-occurrence projection of the formula
//! hypergraph: two quantities are adjacent iff some formula references
//! both. A quantity `n` hops from the target needs at least `n` formula
//! applications to reach it, so the table is an admissible heuristic for
//! the derivation search.
//!
//! The index is built once from a full snapshot (one BFS per quantity, in
//! parallel) and then published through an [`IndexHandle`]. Rebuilding
//! replaces the snapshot whole; readers holding the old `Arc` are never
//! blocked.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{Formula, PhysicalQuantity, QuantityId};

/// Hop count between two quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Distance {
    Hops(u32),
    Unreachable,
}

impl Distance {
    pub fn hops(self) -> Option<u32> {
        match self {
            Distance::Hops(n) => Some(n),
            Distance::Unreachable => None,
        }
    }

    /// Heuristic cost: hop count, `+∞` when unreachable.
    pub fn as_cost(self) -> f64 {
        match self {
            Distance::Hops(n) => f64::from(n),
            Distance::Unreachable => f64::INFINITY,
        }
    }
}

/// Immutable all-pairs hop table.
#[derive(Debug, Clone)]
pub struct DistanceIndex {
    rows: HashMap<QuantityId, HashMap<QuantityId, u32>>,
    formula_count: usize,
    built_at: DateTime<Utc>,
}

impl DistanceIndex {
    /// An index over nothing; every lookup is unreachable.
    pub fn empty() -> Self {
        Self { rows: HashMap::new(), formula_count: 0, built_at: Utc::now() }
    }

    /// Build from a full snapshot of the knowledge store.
    ///
    /// Quantities referenced by a formula but absent from `quantities` are
    /// indexed too.
    pub fn build(quantities: &[PhysicalQuantity], formulas: &[Formula]) -> Self {
        let started = Instant::now();
        let adjacency = co_occurrence(quantities, formulas);

        let sources: Vec<QuantityId> = adjacency.keys().copied().collect();
        let rows: HashMap<QuantityId, HashMap<QuantityId, u32>> = sources
            .par_iter()
            .map(|&source| (source, bfs(&adjacency, source)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        let pairs: usize = rows.values().map(HashMap::len).sum();
        info!(
            quantities = rows.len(),
            formulas = formulas.len(),
            reachable_pairs = pairs,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "distance index built"
        );

        Self { rows, formula_count: formulas.len(), built_at: Utc::now() }
    }

    /// Hops between `a` and `b`. Unknown ids are unreachable, even from
    /// themselves.
    pub fn distance(&self, a: QuantityId, b: QuantityId) -> Distance {
        self.rows
            .get(&a)
            .and_then(|row| row.get(&b))
            .map_or(Distance::Unreachable, |&d| Distance::Hops(d))
    }

    /// Every quantity reachable from `a`, with its hop count.
    pub fn row(&self, a: QuantityId) -> impl Iterator<Item = (QuantityId, u32)> + '_ {
        self.rows.get(&a).into_iter().flat_map(|row| row.iter().map(|(&id, &d)| (id, d)))
    }

    pub fn contains(&self, id: QuantityId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn quantity_count(&self) -> usize {
        self.rows.len()
    }

    pub fn formula_count(&self) -> usize {
        self.formula_count
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

impl Default for DistanceIndex {
    fn default() -> Self {
        Self::empty()
    }
}

/// Adjacency of the co-occurrence projection. Every quantity gets an
/// entry, isolated ones with no neighbours.
fn co_occurrence(
    quantities: &[PhysicalQuantity],
    formulas: &[Formula],
) -> HashMap<QuantityId, HashSet<QuantityId>> {
    let mut adjacency: HashMap<QuantityId, HashSet<QuantityId>> =
        quantities.iter().map(|q| (q.id, HashSet::new())).collect();

    for formula in formulas {
        for &a in &formula.quantities {
            let neighbours = adjacency.entry(a).or_default();
            neighbours.extend(formula.quantities.iter().copied().filter(|&b| b != a));
        }
    }
    adjacency
}

fn bfs(adjacency: &HashMap<QuantityId, HashSet<QuantityId>>, source: QuantityId) -> HashMap<QuantityId, u32> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    dist.insert(source, 0);
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        let d = dist[&current];
        let Some(neighbours) = adjacency.get(&current) else { continue };
        for &next in neighbours {
            if !dist.contains_key(&next) {
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }
    dist
}

// ============================================================================
// Published snapshot
// ============================================================================

/// Shared, swappable reference to the current [`DistanceIndex`].
///
/// `snapshot()` clones the `Arc` under a short read lock; `publish()`
/// swaps in a new index. A search keeps the snapshot it started with.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Arc<DistanceIndex>>,
}

impl IndexHandle {
    pub fn new(index: DistanceIndex) -> Self {
        Self { current: RwLock::new(Arc::new(index)) }
    }

    pub fn snapshot(&self) -> Arc<DistanceIndex> {
        Arc::clone(&self.current.read())
    }

    /// Replace the published index, returning the previous one.
    pub fn publish(&self, index: DistanceIndex) -> Arc<DistanceIndex> {
        std::mem::replace(&mut *self.current.write(), Arc::new(index))
    }
}
