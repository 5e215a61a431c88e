//! # Knowledge Store Trait
//!
//! This is THE contract between the derivation engine and whatever holds
//! the knowledge graph. The engine only reads: quantities, constants,
//! formulas, and the "which formulas reference quantity X" adjacency.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory for testing/embedding |
//!
//! Graph databases plug in by implementing [`KnowledgeStore`] over their own
//! query surface; failures surface as [`Error::StorageError`] and are not
//! retried by the engine.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::{Error, Result};

pub use memory::MemoryStore;

// ============================================================================
// Snapshot
// ============================================================================

/// A complete, serializable copy of a knowledge graph.
///
/// Used to seed a [`MemoryStore`] and as the input of a distance index
/// build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    #[serde(default)]
    pub quantities: Vec<PhysicalQuantity>,
    #[serde(default)]
    pub constants: Vec<Constant>,
    #[serde(default)]
    pub formulas: Vec<Formula>,
}

impl KnowledgeSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// KnowledgeStore Trait
// ============================================================================

/// The read contract the engine needs from a knowledge graph.
#[async_trait]
pub trait KnowledgeStore: Send + Sync + 'static {
    // ========================================================================
    // Quantities
    // ========================================================================

    /// Get a quantity by id. Returns None if not found.
    async fn quantity(&self, id: QuantityId) -> Result<Option<PhysicalQuantity>>;

    /// Resolve a quantity name (e.g. `"mass"`) to its id.
    async fn quantity_id_by_name(&self, name: &str) -> Result<Option<QuantityId>>;

    /// All quantities, ordered by id.
    async fn all_quantities(&self) -> Result<Vec<PhysicalQuantity>>;

    // ========================================================================
    // Constants
    // ========================================================================

    async fn constant(&self, id: ConstantId) -> Result<Option<Constant>>;

    // ========================================================================
    // Formulas
    // ========================================================================

    async fn formula(&self, id: FormulaId) -> Result<Option<Formula>>;

    /// Every formula that references the given quantity, each with its full
    /// quantity and constant sets. Ordered by formula id.
    async fn formulas_referencing(&self, id: QuantityId) -> Result<Vec<Formula>>;

    /// All formulas, ordered by id.
    async fn all_formulas(&self) -> Result<Vec<Formula>>;

    // ========================================================================
    // Derived lookups
    // ========================================================================

    /// Look a quantity up by name.
    ///
    /// Default: name → id, then id → quantity.
    async fn quantity_by_name(&self, name: &str) -> Result<Option<PhysicalQuantity>> {
        match self.quantity_id_by_name(name).await? {
            Some(id) => self.quantity(id).await,
            None => Ok(None),
        }
    }

    /// Load a formula together with copies of its quantities and constants.
    ///
    /// Default: one point lookup per referenced entity. Stores with a
    /// native join should override.
    async fn resolve_formula(&self, id: FormulaId) -> Result<ResolvedFormula> {
        let formula = self
            .formula(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Formula {id}")))?;

        let mut quantities = Vec::with_capacity(formula.quantities.len());
        for qid in &formula.quantities {
            let quantity = self
                .quantity(*qid)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Quantity {qid} (referenced by formula {id})")))?;
            quantities.push(quantity);
        }

        let mut constants = Vec::with_capacity(formula.constants.len());
        for cid in &formula.constants {
            let constant = self
                .constant(*cid)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Constant {cid} (referenced by formula {id})")))?;
            constants.push(constant);
        }

        Ok(ResolvedFormula { formula, quantities, constants })
    }

    /// Export the whole graph.
    ///
    /// Default: quantities and formulas from the scans, constants by
    /// following formula references.
    async fn snapshot(&self) -> Result<KnowledgeSnapshot> {
        let quantities = self.all_quantities().await?;
        let formulas = self.all_formulas().await?;

        let mut constant_ids: Vec<ConstantId> = formulas
            .iter()
            .flat_map(|f| f.constants.iter().copied())
            .collect();
        constant_ids.sort();
        constant_ids.dedup();

        let mut constants = Vec::with_capacity(constant_ids.len());
        for cid in constant_ids {
            if let Some(c) = self.constant(cid).await? {
                constants.push(c);
            }
        }

        Ok(KnowledgeSnapshot { quantities, constants, formulas })
    }
}
