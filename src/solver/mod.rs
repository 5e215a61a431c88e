//! # Equation Solver
//!
//! Isolates one quantity of a formula and evaluates it against the values
//! known so far.
//!
//! Rearrangement runs an ordered chain of [`RearrangeStrategy`]s; each
//! either solves or hands over to the next:
//!
//! | Strategy | Handles |
//! |----------|---------|
//! | [`Symbolic`] | inversion and linear collection on the parsed equation |
//! | [`RuleTableStrategy`] | stored textbook rearrangements |
//! | [`SimpleTransform`] | target alone on one side; `A = B*C`, `A = B/C` |

pub mod rules;

use tracing::{debug, warn};

use crate::config::SolverConfig;
use crate::expr::ast::{BinaryOp, Equation, Expr};
use crate::expr::eval::{evaluate, Bindings};
use crate::expr::lexer::Vocabulary;
use crate::expr::{equals_count, normalize, parse_equation_str, rearrange};
use crate::model::{PhysicalQuantity, ResolvedFormula, ValueTable};
use crate::{Error, Result};

pub use rules::RuleTable;

/// Result of one rearrangement attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// The target expressed in the other symbols.
    Solved(Expr),
    /// Not handled; the reason is logged and the next strategy runs.
    Next(String),
}

/// One link of the rearrangement chain.
pub trait RearrangeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, equation: &Equation, target: &str) -> Attempt;

    /// Attempt on normalized formula text the parser rejected. Declines
    /// unless overridden.
    fn attempt_text(&self, text: &str, _target: &str) -> Attempt {
        Attempt::Next(format!("{text} did not parse"))
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Algebraic isolation, see [`rearrange::solve_for`].
pub struct Symbolic;

impl RearrangeStrategy for Symbolic {
    fn name(&self) -> &'static str {
        "symbolic"
    }

    fn attempt(&self, equation: &Equation, target: &str) -> Attempt {
        match rearrange::solve_for(equation, target) {
            Ok(expr) => Attempt::Solved(expr),
            Err(e) => Attempt::Next(e.to_string()),
        }
    }
}

/// Lookup in a [`RuleTable`].
pub struct RuleTableStrategy {
    table: RuleTable,
}

impl RuleTableStrategy {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }
}

impl RearrangeStrategy for RuleTableStrategy {
    fn name(&self) -> &'static str {
        "rule_table"
    }

    fn attempt(&self, equation: &Equation, target: &str) -> Attempt {
        match self.table.lookup(equation, target) {
            Some(expr) => Attempt::Solved(expr),
            None => Attempt::Next(format!("no stored rule for {target} in {equation}")),
        }
    }

    fn attempt_text(&self, text: &str, target: &str) -> Attempt {
        match self.table.lookup_text(text, target) {
            Some(expr) => Attempt::Solved(expr),
            None => Attempt::Next(format!("no stored rule for {target} in {text}")),
        }
    }
}

/// Shape-based last resort over two-operand equations.
pub struct SimpleTransform;

impl SimpleTransform {
    /// `target = rhs` or `lhs = target`, the other side free of it.
    fn alone(equation: &Equation, target: &str) -> Option<Expr> {
        if is_symbol(&equation.lhs, target) && !equation.rhs.contains_symbol(target) {
            return Some(equation.rhs.clone());
        }
        if is_symbol(&equation.rhs, target) && !equation.lhs.contains_symbol(target) {
            return Some(equation.lhs.clone());
        }
        None
    }

    /// `A = B*C` or `A = B/C` where every operand is a bare symbol.
    fn product(whole: &Expr, parts: &Expr, target: &str) -> Option<Expr> {
        let Expr::Symbol(a) = whole else { return None };
        let Expr::BinaryOp { left, op, right } = parts else { return None };
        let (Expr::Symbol(b), Expr::Symbol(c)) = (left.as_ref(), right.as_ref()) else {
            return None;
        };
        let (a, b, c) = (Expr::sym(a), Expr::sym(b), Expr::sym(c));
        let is = |e: &Expr| is_symbol(e, target);
        match op {
            BinaryOp::Mul if is(&b) => Some(Expr::div(a, c)),
            BinaryOp::Mul if is(&c) => Some(Expr::div(a, b)),
            BinaryOp::Div if is(&b) => Some(Expr::mul(a, c)),
            BinaryOp::Div if is(&c) => Some(Expr::div(b, a)),
            _ => None,
        }
    }
}

impl RearrangeStrategy for SimpleTransform {
    fn name(&self) -> &'static str {
        "simple_transform"
    }

    fn attempt(&self, equation: &Equation, target: &str) -> Attempt {
        Self::alone(equation, target)
            .or_else(|| Self::product(&equation.lhs, &equation.rhs, target))
            .or_else(|| Self::product(&equation.rhs, &equation.lhs, target))
            .map_or_else(
                || Attempt::Next(format!("{equation} has no simple shape for {target}")),
                Attempt::Solved,
            )
    }
}

fn is_symbol(expr: &Expr, name: &str) -> bool {
    matches!(expr, Expr::Symbol(s) if s == name)
}

// ============================================================================
// EquationSolver
// ============================================================================

/// Rearranges and evaluates formulas for one target quantity at a time.
pub struct EquationSolver {
    strategies: Vec<Box<dyn RearrangeStrategy>>,
}

impl EquationSolver {
    /// Full chain: symbolic, rule table, simple transform.
    pub fn new() -> Self {
        Self::with_config(&SolverConfig::default())
    }

    pub fn with_config(config: &SolverConfig) -> Self {
        let mut strategies: Vec<Box<dyn RearrangeStrategy>> = vec![Box::new(Symbolic)];
        if config.enable_rule_table {
            strategies.push(Box::new(RuleTableStrategy::new(RuleTable::builtin())));
        }
        if config.enable_simple_transform {
            strategies.push(Box::new(SimpleTransform));
        }
        Self { strategies }
    }

    /// A solver running exactly `strategies`, in order.
    pub fn with_strategies(strategies: Vec<Box<dyn RearrangeStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain until a strategy solves for `target`.
    pub fn rearrange(&self, equation: &Equation, target: &str) -> Result<Expr> {
        for strategy in &self.strategies {
            match strategy.attempt(equation, target) {
                Attempt::Solved(expr) => {
                    debug!(strategy = strategy.name(), %equation, target, solution = %expr, "rearranged");
                    return Ok(expr);
                }
                Attempt::Next(reason) => {
                    debug!(strategy = strategy.name(), %equation, target, %reason, "strategy declined");
                }
            }
        }
        Err(Error::NoSymbolicSolution {
            symbol: target.to_string(),
            equation: equation.to_string(),
        })
    }

    /// Run the chain over formula text that failed to parse with `cause`.
    /// Only strategies that work on text can answer; otherwise the formula
    /// is malformed.
    pub fn rearrange_text(&self, text: &str, target: &str, cause: &Error) -> Result<Expr> {
        for strategy in &self.strategies {
            match strategy.attempt_text(text, target) {
                Attempt::Solved(expr) => {
                    debug!(strategy = strategy.name(), text, target, solution = %expr, "rearranged unparsed formula");
                    return Ok(expr);
                }
                Attempt::Next(reason) => {
                    debug!(strategy = strategy.name(), text, target, %reason, "strategy declined");
                }
            }
        }
        Err(Error::MalformedEquation(format!("{text}: {cause}")))
    }

    /// Solve `formula` for `target` using `values`, and record the result
    /// in `values` under the target id.
    pub fn solve(
        &self,
        formula: &ResolvedFormula,
        target: &PhysicalQuantity,
        values: &mut ValueTable,
    ) -> Result<f64> {
        let expression = normalize(&formula.formula.expression);
        if equals_count(&expression) != 1 {
            return Err(Error::MalformedEquation(formula.formula.expression.clone()));
        }

        let target_symbol = normalize(&target.symbol);
        let mut vocab = Vocabulary::new();
        let mut bindings = Bindings::new();

        for quantity in &formula.quantities {
            let symbol = normalize(&quantity.symbol);
            vocab.insert(symbol.clone());
            if quantity.id == target.id {
                continue;
            }
            match values.get(&quantity.id) {
                Some(value) => {
                    bindings.insert(symbol, *value);
                }
                None => {
                    warn!(formula = %formula.formula.name, quantity = %quantity.name, "input value missing");
                    return Err(Error::MissingVariable(quantity.symbol.clone()));
                }
            }
        }
        for constant in &formula.constants {
            let symbol = normalize(&constant.symbol);
            vocab.insert(symbol.clone());
            bindings.insert(symbol, constant.value);
        }
        vocab.insert(target_symbol.clone());

        let solution = match parse_equation_str(&expression, &vocab) {
            Ok(equation) => self.rearrange(&equation, &target_symbol)?,
            Err(e) => {
                warn!(formula = %formula.formula.name, error = %e, "formula did not parse");
                self.rearrange_text(&expression, &target_symbol, &e)?
            }
        };
        let value = evaluate(&solution, &bindings)?;

        debug!(formula = %formula.formula.name, target = %target.name, value, "evaluated");
        values.insert(target.id, value);
        Ok(value)
    }
}

impl Default for EquationSolver {
    fn default() -> Self {
        Self::new()
    }
}
