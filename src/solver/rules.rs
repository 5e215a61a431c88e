//! Canonical rearrangements for textbook formulas.
//!
//! Consulted when symbolic rearrangement fails. A rule matches a formula
//! whose parsed equation renders the same as the rule's, in either
//! orientation (`F = m * a` and `m * a = F`). Formula text the parser
//! rejects is matched by shape instead: whitespace and `*` removed, stray
//! trailing punctuation ignored.

use crate::expr::ast::{Equation, Expr};
use crate::expr::lexer::Vocabulary;
use crate::expr::{parse_equation_str, parse_expression_str};

/// `(equation, [(symbol, solution)])`
const RULES: &[(&str, &[(&str, &str)])] = &[
    ("F = m*a", &[("F", "m*a"), ("m", "F/a"), ("a", "F/m")]),
    ("V = I*R", &[("V", "I*R"), ("I", "V/R"), ("R", "V/I")]),
    ("P = V*I", &[("P", "V*I"), ("V", "P/I"), ("I", "P/V")]),
    ("E = 0.5*m*v^2", &[("E", "0.5*m*v^2"), ("m", "E/(0.5*v^2)"), ("v", "sqrt(E/(0.5*m))")]),
    ("A = pi*r^2", &[("A", "pi*r^2"), ("r", "sqrt(A/pi)")]),
    ("v = s/t", &[("v", "s/t"), ("s", "v*t"), ("t", "s/v")]),
    ("a = v/t", &[("a", "v/t"), ("v", "a*t"), ("t", "v/a")]),
];

struct Rule {
    forward: String,
    reversed: String,
    /// Textual shapes of both orientations.
    shapes: [String; 2],
    solutions: Vec<(String, Expr)>,
}

impl Rule {
    fn solution(&self, target: &str) -> Option<Expr> {
        self.solutions.iter().find(|(sym, _)| sym == target).map(|(_, expr)| expr.clone())
    }
}

/// Parsed rule set.
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// The built-in textbook rules.
    pub fn builtin() -> Self {
        let rules = RULES
            .iter()
            .filter_map(|(equation, solutions)| Self::parse_rule(equation, solutions))
            .collect();
        Self { rules }
    }

    fn parse_rule(equation: &str, solutions: &[(&str, &str)]) -> Option<Rule> {
        let vocab: Vocabulary = solutions.iter().map(|(s, _)| *s).collect();
        let parsed = parse_equation_str(equation, &vocab).ok()?;
        let solutions = solutions
            .iter()
            .map(|(sym, expr)| Some((sym.to_string(), parse_expression_str(expr, &vocab).ok()?)))
            .collect::<Option<Vec<_>>>()?;
        let (lhs, rhs) = equation.split_once('=')?;
        Some(Rule {
            forward: parsed.to_string(),
            reversed: flip(&parsed).to_string(),
            shapes: [shape(equation), shape(&format!("{rhs}={lhs}"))],
            solutions,
        })
    }

    /// The stored solution of `equation` for `target`, if a rule covers it.
    pub fn lookup(&self, equation: &Equation, target: &str) -> Option<Expr> {
        let rendered = equation.to_string();
        self.rules
            .iter()
            .find(|rule| rule.forward == rendered || rule.reversed == rendered)?
            .solution(target)
    }

    /// Like [`lookup`](Self::lookup), for normalized formula text that did
    /// not parse.
    pub fn lookup_text(&self, text: &str, target: &str) -> Option<Expr> {
        let wanted = shape(text);
        self.rules
            .iter()
            .find(|rule| rule.shapes.contains(&wanted))?
            .solution(target)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn shape(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace() && *c != '*').collect();
    compact.trim_matches(|c| matches!(c, ';' | ',' | '.')).to_string()
}

fn flip(equation: &Equation) -> Equation {
    Equation { lhs: equation.rhs.clone(), rhs: equation.lhs.clone() }
}
