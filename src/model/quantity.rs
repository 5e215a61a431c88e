//! Physical quantities and constants: the vertices of the formula hypergraph.

use serde::{Deserialize, Serialize};

/// Opaque quantity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuantityId(pub u64);

impl std::fmt::Display for QuantityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque constant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstantId(pub u64);

impl std::fmt::Display for ConstantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named physical variable (mass, force, velocity, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalQuantity {
    pub id: QuantityId,
    pub name: String,
    /// Symbol as written in formula expressions (e.g. `"F"`, `"v₀"`).
    pub symbol: String,
    pub unit: String,
    #[serde(default)]
    pub is_vector: bool,
    #[serde(default)]
    pub description: String,
}

impl PhysicalQuantity {
    pub fn new(
        id: QuantityId,
        name: impl Into<String>,
        symbol: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            unit: unit.into(),
            is_vector: false,
            description: String::new(),
        }
    }
}

/// A physical constant. Always known during a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub id: ConstantId,
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub unit: String,
}

impl Constant {
    pub fn new(
        id: ConstantId,
        name: impl Into<String>,
        symbol: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            value,
            unit: unit.into(),
        }
    }
}
