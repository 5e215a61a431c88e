//! # Knowledge Model
//!
//! Clean DTOs shared by the store, the search, the solver and the
//! orchestrator. Formulas refer to quantities and constants by id; the
//! store is the only owner of the entities themselves.
//!
//! Design rule: this module is pure data with no I/O and no async.

pub mod quantity;
pub mod formula;
pub mod known;
pub mod step;

pub use quantity::{Constant, ConstantId, PhysicalQuantity, QuantityId};
pub use formula::{ConstantSet, Formula, FormulaId, QuantitySet, ResolvedFormula};
pub use known::{KnownVariable, ParsedProblem, FORCE_TYPE};
pub use step::{CalculationResult, DerivationStep, SolvingPath};

/// Running value table of a calculation: quantity id → numeric value.
pub type ValueTable = hashbrown::HashMap<QuantityId, f64>;
