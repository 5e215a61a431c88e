//! In-memory knowledge store.
//!
//! This is the reference implementation of `KnowledgeStore`.
//! It uses hash maps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No persistence**: everything lives for the lifetime of the store.
//! - **Append-only**: entities can be added but not removed. The distance
//!   index assumes the graph changes rarely; rebuild it after loading.
//!
//! Use this store for:
//! - Testing the search, solver and orchestrator
//! - Embedding the engine with a knowledge graph loaded from a snapshot

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::model::*;
use crate::{Error, Result};
use super::{KnowledgeSnapshot, KnowledgeStore};

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory knowledge graph.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    quantities: RwLock<HashMap<QuantityId, PhysicalQuantity>>,
    constants: RwLock<HashMap<ConstantId, Constant>>,
    formulas: RwLock<HashMap<FormulaId, Formula>>,
    /// quantity name → id
    name_index: RwLock<HashMap<String, QuantityId>>,
    /// quantity id → formulas referencing it (the CONTAINS adjacency)
    membership: RwLock<HashMap<QuantityId, Vec<FormulaId>>>,
    next_quantity_id: AtomicU64,
    next_constant_id: AtomicU64,
    next_formula_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                quantities: RwLock::new(HashMap::new()),
                constants: RwLock::new(HashMap::new()),
                formulas: RwLock::new(HashMap::new()),
                name_index: RwLock::new(HashMap::new()),
                membership: RwLock::new(HashMap::new()),
                next_quantity_id: AtomicU64::new(1),
                next_constant_id: AtomicU64::new(1),
                next_formula_id: AtomicU64::new(1),
            }),
        }
    }

    /// Build a store from a snapshot, keeping the snapshot's ids.
    pub fn from_snapshot(snapshot: KnowledgeSnapshot) -> Result<Self> {
        let store = Self::new();
        for q in snapshot.quantities {
            store.insert_quantity(q)?;
        }
        for c in snapshot.constants {
            store.insert_constant(c)?;
        }
        for f in snapshot.formulas {
            store.insert_formula(f)?;
        }
        Ok(store)
    }

    // ========================================================================
    // Writers
    // ========================================================================

    /// Create a quantity with a fresh id.
    pub fn add_quantity(
        &self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        unit: impl Into<String>,
    ) -> Result<QuantityId> {
        let id = QuantityId(self.inner.next_quantity_id.fetch_add(1, Ordering::Relaxed));
        self.insert_quantity(PhysicalQuantity::new(id, name, symbol, unit))?;
        Ok(id)
    }

    /// Insert a fully built quantity. Names must be unique.
    pub fn insert_quantity(&self, quantity: PhysicalQuantity) -> Result<()> {
        let id = quantity.id;
        {
            let mut names = self.inner.name_index.write();
            if names.contains_key(&quantity.name) {
                return Err(Error::InvalidInput(format!(
                    "Quantity name '{}' already exists", quantity.name
                )));
            }
            let mut quantities = self.inner.quantities.write();
            if quantities.contains_key(&id) {
                return Err(Error::InvalidInput(format!("Quantity {id} already exists")));
            }
            names.insert(quantity.name.clone(), id);
            quantities.insert(id, quantity);
        }
        self.inner.membership.write().entry(id).or_default();
        self.inner.next_quantity_id.fetch_max(id.0 + 1, Ordering::Relaxed);
        Ok(())
    }

    /// Create a constant with a fresh id.
    pub fn add_constant(
        &self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Result<ConstantId> {
        let id = ConstantId(self.inner.next_constant_id.fetch_add(1, Ordering::Relaxed));
        self.insert_constant(Constant::new(id, name, symbol, value, unit))?;
        Ok(id)
    }

    pub fn insert_constant(&self, constant: Constant) -> Result<()> {
        let id = constant.id;
        let mut constants = self.inner.constants.write();
        if constants.contains_key(&id) {
            return Err(Error::InvalidInput(format!("Constant {id} already exists")));
        }
        constants.insert(id, constant);
        drop(constants);
        self.inner.next_constant_id.fetch_max(id.0 + 1, Ordering::Relaxed);
        Ok(())
    }

    /// Create a formula with a fresh id over existing quantities/constants.
    pub fn add_formula(
        &self,
        name: impl Into<String>,
        expression: impl Into<String>,
        quantities: &[QuantityId],
        constants: &[ConstantId],
    ) -> Result<FormulaId> {
        let id = FormulaId(self.inner.next_formula_id.fetch_add(1, Ordering::Relaxed));
        let formula = Formula::new(id, name, expression)
            .with_quantities(quantities.iter().copied())
            .with_constants(constants.iter().copied());
        self.insert_formula(formula)?;
        Ok(id)
    }

    /// Insert a formula. Every referenced id must already exist and the
    /// quantity set must not be empty. Repeated ids are dropped, keeping
    /// the first occurrence.
    pub fn insert_formula(&self, mut formula: Formula) -> Result<()> {
        let id = formula.id;
        let mut seen = HashSet::new();
        formula.quantities.retain(|q| seen.insert(*q));
        let mut seen = HashSet::new();
        formula.constants.retain(|c| seen.insert(*c));

        if formula.arity() == 0 {
            return Err(Error::InvalidInput(format!(
                "Formula '{}' references no quantities", formula.name
            )));
        }
        {
            let quantities = self.inner.quantities.read();
            if let Some(missing) = formula.quantities.iter().find(|q| !quantities.contains_key(*q)) {
                return Err(Error::NotFound(format!("Quantity {missing} (referenced by formula {id})")));
            }
        }
        {
            let constants = self.inner.constants.read();
            if let Some(missing) = formula.constants.iter().find(|c| !constants.contains_key(*c)) {
                return Err(Error::NotFound(format!("Constant {missing} (referenced by formula {id})")));
            }
        }

        {
            let mut formulas = self.inner.formulas.write();
            if formulas.contains_key(&id) {
                return Err(Error::InvalidInput(format!("Formula {id} already exists")));
            }
            let mut membership = self.inner.membership.write();
            for qid in &formula.quantities {
                let ids = membership.entry(*qid).or_default();
                if let Err(at) = ids.binary_search(&id) {
                    ids.insert(at, id);
                }
            }
            formulas.insert(id, formula);
        }
        self.inner.next_formula_id.fetch_max(id.0 + 1, Ordering::Relaxed);
        Ok(())
    }

    pub fn quantity_count(&self) -> usize {
        self.inner.quantities.read().len()
    }

    pub fn formula_count(&self) -> usize {
        self.inner.formulas.read().len()
    }
}

// ============================================================================
// KnowledgeStore impl
// ============================================================================

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn quantity(&self, id: QuantityId) -> Result<Option<PhysicalQuantity>> {
        Ok(self.inner.quantities.read().get(&id).cloned())
    }

    async fn quantity_id_by_name(&self, name: &str) -> Result<Option<QuantityId>> {
        Ok(self.inner.name_index.read().get(name).copied())
    }

    async fn all_quantities(&self) -> Result<Vec<PhysicalQuantity>> {
        let mut all: Vec<_> = self.inner.quantities.read().values().cloned().collect();
        all.sort_by_key(|q| q.id);
        Ok(all)
    }

    async fn constant(&self, id: ConstantId) -> Result<Option<Constant>> {
        Ok(self.inner.constants.read().get(&id).cloned())
    }

    async fn formula(&self, id: FormulaId) -> Result<Option<Formula>> {
        Ok(self.inner.formulas.read().get(&id).cloned())
    }

    async fn formulas_referencing(&self, id: QuantityId) -> Result<Vec<Formula>> {
        let membership = self.inner.membership.read();
        let formulas = self.inner.formulas.read();

        let ids = membership.get(&id).map(Vec::as_slice).unwrap_or_default();
        Ok(ids.iter().filter_map(|fid| formulas.get(fid).cloned()).collect())
    }

    async fn all_formulas(&self) -> Result<Vec<Formula>> {
        let mut all: Vec<_> = self.inner.formulas.read().values().cloned().collect();
        all.sort_by_key(|f| f.id);
        Ok(all)
    }

    async fn snapshot(&self) -> Result<KnowledgeSnapshot> {
        let mut constants: Vec<_> = self.inner.constants.read().values().cloned().collect();
        constants.sort_by_key(|c| c.id);
        Ok(KnowledgeSnapshot {
            quantities: self.all_quantities().await?,
            constants,
            formulas: self.all_formulas().await?,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn newton() -> (MemoryStore, QuantityId, QuantityId, QuantityId, FormulaId) {
        let store = MemoryStore::new();
        let f = store.add_quantity("force", "F", "N").unwrap();
        let m = store.add_quantity("mass", "m", "kg").unwrap();
        let a = store.add_quantity("acceleration", "a", "m/s^2").unwrap();
        let law = store.add_formula("Newton's second law", "F = m*a", &[f, m, a], &[]).unwrap();
        (store, f, m, a, law)
    }

    #[tokio::test]
    async fn test_name_lookup() {
        let (store, f, _, _, _) = newton();
        assert_eq!(store.quantity_id_by_name("force").await.unwrap(), Some(f));
        assert_eq!(store.quantity_id_by_name("torque").await.unwrap(), None);
        let q = store.quantity_by_name("force").await.unwrap().unwrap();
        assert_eq!(q.symbol, "F");
    }

    #[tokio::test]
    async fn test_formulas_referencing() {
        let (store, f, m, a, law) = newton();
        let v = store.add_quantity("velocity", "v", "m/s").unwrap();
        let t = store.add_quantity("time", "t", "s").unwrap();
        let kin = store.add_formula("acceleration", "a = v/t", &[a, v, t], &[]).unwrap();

        let for_a: Vec<_> = store.formulas_referencing(a).await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(for_a, vec![law, kin]);

        let for_m = store.formulas_referencing(m).await.unwrap();
        assert_eq!(for_m.len(), 1);
        assert_eq!(for_m[0].quantities.as_slice(), &[f, m, a]);
    }

    #[tokio::test]
    async fn test_isolated_quantity_has_no_formulas() {
        let (store, ..) = newton();
        let lonely = store.add_quantity("entropy", "S", "J/K").unwrap();
        assert!(store.formulas_referencing(lonely).await.unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (store, ..) = newton();
        assert!(store.add_quantity("force", "F2", "N").is_err());
    }

    #[test]
    fn test_formula_with_unknown_quantity_rejected() {
        let (store, f, ..) = newton();
        let result = store.add_formula("broken", "F = x", &[f, QuantityId(99)], &[]);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_empty_formula_rejected() {
        let store = MemoryStore::new();
        assert!(store.add_formula("empty", "1 = 1", &[], &[]).is_err());
    }

    #[tokio::test]
    async fn test_resolve_formula() {
        let store = MemoryStore::new();
        let w = store.add_quantity("weight", "W", "N").unwrap();
        let m = store.add_quantity("mass", "m", "kg").unwrap();
        let g = store.add_constant("gravitational acceleration", "g", 9.8, "m/s^2").unwrap();
        let fid = store.add_formula("weight", "W = m*g", &[w, m], &[g]).unwrap();

        let resolved = store.resolve_formula(fid).await.unwrap();
        assert_eq!(resolved.quantities.len(), 2);
        assert_eq!(resolved.constants[0].value, 9.8);
        assert!(store.resolve_formula(FormulaId(42)).await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_keeps_ids() {
        let (store, f, _, _, law) = newton();
        let snapshot = store.snapshot().await.unwrap();
        let json = snapshot.to_json().unwrap();

        let restored = MemoryStore::from_snapshot(KnowledgeSnapshot::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.quantity_count(), 3);
        assert_eq!(restored.formula(law).await.unwrap().unwrap().expression, "F = m*a");
        assert_eq!(restored.quantity_id_by_name("force").await.unwrap(), Some(f));

        // Fresh ids continue after the restored ones.
        let next = restored.add_quantity("velocity", "v", "m/s").unwrap();
        assert_eq!(next, QuantityId(4));
    }

    #[tokio::test]
    async fn test_snapshot_formula_with_repeated_ids() {
        let json = r#"{
            "quantities": [
                {"id": 1, "name": "force", "symbol": "F", "unit": "N"},
                {"id": 2, "name": "mass", "symbol": "m", "unit": "kg"},
                {"id": 3, "name": "acceleration", "symbol": "a", "unit": "m/s^2"}
            ],
            "formulas": [
                {"id": 1, "name": "Newton's second law", "expression": "F = m*a", "quantities": [1, 2, 2, 3, 1]}
            ]
        }"#;
        let store = MemoryStore::from_snapshot(KnowledgeSnapshot::from_json(json).unwrap()).unwrap();

        let law = store.formula(FormulaId(1)).await.unwrap().unwrap();
        assert_eq!(law.quantities.as_slice(), &[QuantityId(1), QuantityId(2), QuantityId(3)]);
        assert_eq!(law.arity(), 3);
        for q in [1, 2, 3] {
            assert_eq!(store.formulas_referencing(QuantityId(q)).await.unwrap().len(), 1);
        }
    }

    #[test]
    fn test_concurrent_adds_get_distinct_ids() {
        let store = MemoryStore::new();
        let ids: Vec<QuantityId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = store.clone();
                    s.spawn(move || store.add_quantity(format!("q{i}"), format!("q{i}"), "1").unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let distinct: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(distinct.len(), 8);
        assert_eq!(store.quantity_count(), 8);
    }
}
