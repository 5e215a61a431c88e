//! Formula: a hyperedge relating several quantities at once.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Constant, ConstantId, PhysicalQuantity, QuantityId};

/// Opaque formula identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormulaId(pub u64);

impl std::fmt::Display for FormulaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity ids referenced by a formula. Most formulas relate 2–4 quantities.
pub type QuantitySet = SmallVec<[QuantityId; 4]>;

/// Constant ids referenced by a formula.
pub type ConstantSet = SmallVec<[ConstantId; 2]>;

/// A formula in `LHS = RHS` form.
///
/// Holds ids only; the quantities and constants themselves live in the
/// knowledge store. See [`ResolvedFormula`] for the populated view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub id: FormulaId,
    pub name: String,
    pub expression: String,
    pub quantities: QuantitySet,
    #[serde(default)]
    pub constants: ConstantSet,
}

impl Formula {
    pub fn new(id: FormulaId, name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            expression: expression.into(),
            quantities: QuantitySet::new(),
            constants: ConstantSet::new(),
        }
    }

    /// Add referenced quantities, preserving order and skipping duplicates.
    pub fn with_quantities(mut self, ids: impl IntoIterator<Item = QuantityId>) -> Self {
        for id in ids {
            if !self.quantities.contains(&id) {
                self.quantities.push(id);
            }
        }
        self
    }

    pub fn with_constants(mut self, ids: impl IntoIterator<Item = ConstantId>) -> Self {
        for id in ids {
            if !self.constants.contains(&id) {
                self.constants.push(id);
            }
        }
        self
    }

    pub fn arity(&self) -> usize {
        self.quantities.len()
    }
}

/// A formula together with copies of everything it references.
///
/// This is what the equation solver works on: it needs symbols for the
/// quantities and values for the constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFormula {
    pub formula: Formula,
    pub quantities: Vec<PhysicalQuantity>,
    pub constants: Vec<Constant>,
}

impl ResolvedFormula {
    pub fn id(&self) -> FormulaId {
        self.formula.id
    }

    pub fn quantity(&self, id: QuantityId) -> Option<&PhysicalQuantity> {
        self.quantities.iter().find(|q| q.id == id)
    }
}
