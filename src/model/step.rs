//! Derivation steps and solving paths.

use serde::{Deserialize, Serialize};

use super::{FormulaId, QuantityId};

/// A computed value with its quantity name and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

/// One step of a derivation. Serialized with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DerivationStep {
    /// Structural step: `formula_id` resolves `output_id` from `input_ids`.
    FindFormula {
        step: usize,
        description: String,
        formula_id: FormulaId,
        input_ids: Vec<QuantityId>,
        output_id: QuantityId,
    },
    /// Numeric outcome of executing the preceding `FindFormula` step.
    Calculation {
        step: usize,
        description: String,
        formula_id: FormulaId,
        result: CalculationResult,
    },
}

impl DerivationStep {
    pub fn find_formula(formula_id: FormulaId, input_ids: Vec<QuantityId>, output_id: QuantityId) -> Self {
        Self::FindFormula {
            step: 0,
            description: format!("Use formula {formula_id} to find quantity {output_id}"),
            formula_id,
            input_ids,
            output_id,
        }
    }

    pub fn calculation(formula_id: FormulaId, result: CalculationResult) -> Self {
        Self::Calculation {
            step: 0,
            description: format!("Calculated {} = {} {}", result.name, format_value(result.value), result.unit),
            formula_id,
            result,
        }
    }

    pub fn step(&self) -> usize {
        match self {
            Self::FindFormula { step, .. } | Self::Calculation { step, .. } => *step,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::FindFormula { description, .. } | Self::Calculation { description, .. } => description,
        }
    }

    pub fn formula_id(&self) -> FormulaId {
        match self {
            Self::FindFormula { formula_id, .. } | Self::Calculation { formula_id, .. } => *formula_id,
        }
    }

    fn set_step(&mut self, n: usize) {
        match self {
            Self::FindFormula { step, .. } | Self::Calculation { step, .. } => *step = n,
        }
    }

    pub(crate) fn set_description(&mut self, text: String) {
        match self {
            Self::FindFormula { description, .. } | Self::Calculation { description, .. } => *description = text,
        }
    }
}

/// Four decimals with trailing zeros trimmed; scientific notation for very
/// small or very large magnitudes.
fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e6).contains(&magnitude) {
        return format!("{value:.3e}");
    }
    let fixed = format!("{value:.4}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Ordered, 1-indexed sequence of derivation steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolvingPath {
    steps: Vec<DerivationStep>,
}

impl SolvingPath {
    /// Build a path from steps in execution order and number them 1..N.
    pub fn from_steps(steps: Vec<DerivationStep>) -> Self {
        let mut path = Self { steps };
        path.renumber();
        path
    }

    pub fn renumber(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.set_step(i + 1);
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[DerivationStep] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DerivationStep> {
        self.steps.iter()
    }

    /// Number of formula applications on the path.
    pub fn formula_applications(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, DerivationStep::FindFormula { .. }))
            .count()
    }

    /// Every `FindFormula` input is a known or the output of an earlier step.
    pub fn is_well_ordered(&self, known: &[QuantityId]) -> bool {
        let mut available: Vec<QuantityId> = known.to_vec();
        for step in &self.steps {
            if let DerivationStep::FindFormula { input_ids, output_id, .. } = step {
                if !input_ids.iter().all(|id| available.contains(id)) {
                    return false;
                }
                available.push(*output_id);
            }
        }
        true
    }
}

impl<'a> IntoIterator for &'a SolvingPath {
    type Item = &'a DerivationStep;
    type IntoIter = std::slice::Iter<'a, DerivationStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renumbering() {
        let path = SolvingPath::from_steps(vec![
            DerivationStep::find_formula(FormulaId(7), vec![QuantityId(1)], QuantityId(2)),
            DerivationStep::find_formula(FormulaId(8), vec![QuantityId(2)], QuantityId(3)),
        ]);
        let numbers: Vec<_> = path.iter().map(DerivationStep::step).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(path.formula_applications(), 2);
    }

    #[test]
    fn test_discriminator() {
        let step = DerivationStep::find_formula(FormulaId(1), vec![QuantityId(1)], QuantityId(2));
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "find_formula");

        let calc = DerivationStep::calculation(
            FormulaId(1),
            CalculationResult { name: "force".into(), value: 20.0, unit: "N".into() },
        );
        let json = serde_json::to_value(&calc).unwrap();
        assert_eq!(json["type"], "calculation");
        assert_eq!(json["result"]["value"], 20.0);
    }

    #[test]
    fn test_calculation_description_keeps_small_values() {
        let describe = |value: f64, unit: &str| {
            DerivationStep::calculation(FormulaId(1), CalculationResult { name: "q".into(), value, unit: unit.into() })
                .description()
                .to_string()
        };
        assert_eq!(describe(20.0, "N"), "Calculated q = 20 N");
        assert_eq!(describe(2.5, "m/s"), "Calculated q = 2.5 m/s");
        assert_eq!(describe(1.0 / 3.0, "s"), "Calculated q = 0.3333 s");
        assert_eq!(describe(1e-4, "C"), "Calculated q = 1.000e-4 C");
        assert_eq!(describe(0.0, "J"), "Calculated q = 0 J");
    }

    #[test]
    fn test_well_ordered() {
        let path = SolvingPath::from_steps(vec![
            DerivationStep::find_formula(FormulaId(1), vec![QuantityId(1)], QuantityId(2)),
            DerivationStep::find_formula(FormulaId(2), vec![QuantityId(2), QuantityId(1)], QuantityId(3)),
        ]);
        assert!(path.is_well_ordered(&[QuantityId(1)]));
        assert!(!path.is_well_ordered(&[QuantityId(9)]));
    }
}
