//! Symbolic rearrangement: isolate one symbol of an equation.
//!
//! Two techniques are tried in order:
//!
//! 1. **Inversion** when the target occurs exactly once. The side holding
//!    the target is peeled one operator at a time, applying the inverse
//!    operation to the other side (`x + b = c` → `x = c - b`,
//!    `x^2 = c` → `x = sqrt(c)`, `sin(x) = c` → `x = asin(c)`).
//! 2. **Linear collection** when it occurs more than once. The zero form
//!    `lhs - rhs` is decomposed as `a·x + b`; the solution is `-b / a`.
//!
//! Anything else (the target inside `abs`, a quadratic in the target) is
//! [`Error::NoSymbolicSolution`]. Results pass through [`simplify`].

use crate::{Error, Result};
use super::ast::{BinaryOp, Equation, Expr, Function, UnaryOp};

/// Solve `equation` for `target`, returning an expression free of `target`.
pub fn solve_for(equation: &Equation, target: &str) -> Result<Expr> {
    let in_lhs = equation.lhs.count_symbol(target);
    let in_rhs = equation.rhs.count_symbol(target);

    let solved = match (in_lhs, in_rhs) {
        (0, 0) => return Err(no_solution(equation, target)),
        (1, 0) => isolate(equation.lhs.clone(), equation.rhs.clone(), target),
        (0, 1) => isolate(equation.rhs.clone(), equation.lhs.clone(), target),
        _ => solve_linear(equation, target),
    };

    solved
        .map(simplify)
        .ok_or_else(|| no_solution(equation, target))
}

fn no_solution(equation: &Equation, target: &str) -> Error {
    Error::NoSymbolicSolution {
        symbol: target.to_string(),
        equation: equation.to_string(),
    }
}

// ============================================================================
// Inversion
// ============================================================================

/// Peel `side` until only `target` remains, mirroring each step on `other`.
///
/// `side` must contain `target` exactly once.
fn isolate(mut side: Expr, mut other: Expr, target: &str) -> Option<Expr> {
    loop {
        match side {
            Expr::Symbol(ref s) if s == target => return Some(other),

            Expr::UnaryOp { op: UnaryOp::Negate, expr } => {
                other = Expr::neg(other);
                side = *expr;
            }

            Expr::BinaryOp { left, op, right } => {
                let target_left = left.contains_symbol(target);
                let (next, rest) = if target_left { (*left, *right) } else { (*right, *left) };
                other = invert_binary(op, target_left, other, rest)?;
                side = next;
            }

            Expr::Call { func, arg } => {
                other = invert_call(func, other)?;
                side = *arg;
            }

            // Numbers and other symbols cannot contain the target.
            _ => return None,
        }
    }
}

/// Undo `op` given the target sits on the `target_left` side of it and
/// `rest` is the opposite operand.
fn invert_binary(op: BinaryOp, target_left: bool, other: Expr, rest: Expr) -> Option<Expr> {
    Some(match (op, target_left) {
        // x + r = o → x = o - r
        (BinaryOp::Add, _) => Expr::sub(other, rest),
        // x - r = o → x = o + r
        (BinaryOp::Sub, true) => Expr::add(other, rest),
        // l - x = o → x = l - o
        (BinaryOp::Sub, false) => Expr::sub(rest, other),
        // x * r = o → x = o / r
        (BinaryOp::Mul, _) => Expr::div(other, rest),
        // x / r = o → x = o * r
        (BinaryOp::Div, true) => Expr::mul(other, rest),
        // l / x = o → x = l / o
        (BinaryOp::Div, false) => Expr::div(rest, other),
        // x ^ r = o → x = o ^ (1 / r)
        (BinaryOp::Pow, true) => match rest.as_number() {
            Some(n) if n == 2.0 => Expr::call(Function::Sqrt, other),
            Some(n) if n == 0.0 => return None,
            Some(n) => Expr::pow(other, Expr::num(1.0 / n)),
            None => Expr::pow(other, Expr::div(Expr::num(1.0), rest)),
        },
        // l ^ x = o → x = ln(o) / ln(l)
        (BinaryOp::Pow, false) => Expr::div(
            Expr::call(Function::Ln, other),
            Expr::call(Function::Ln, rest),
        ),
    })
}

fn invert_call(func: Function, other: Expr) -> Option<Expr> {
    Some(match func {
        Function::Sqrt => Expr::pow(other, Expr::num(2.0)),
        Function::Exp => Expr::call(Function::Ln, other),
        Function::Ln => Expr::call(Function::Exp, other),
        Function::Log10 => Expr::pow(Expr::num(10.0), other),
        Function::Sin => Expr::call(Function::Asin, other),
        Function::Cos => Expr::call(Function::Acos, other),
        Function::Tan => Expr::call(Function::Atan, other),
        Function::Asin => Expr::call(Function::Sin, other),
        Function::Acos => Expr::call(Function::Cos, other),
        Function::Atan => Expr::call(Function::Tan, other),
        // Two branches; no single inverse.
        Function::Abs => return None,
    })
}

// ============================================================================
// Linear collection
// ============================================================================

fn solve_linear(equation: &Equation, target: &str) -> Option<Expr> {
    let (a, b) = linear_parts(&equation.zero_form(), target)?;
    let a = simplify(a);
    if a.as_number() == Some(0.0) {
        return None;
    }
    Some(Expr::div(Expr::neg(b), a))
}

/// Decompose `expr` as `a * target + b`, both free of `target`.
fn linear_parts(expr: &Expr, target: &str) -> Option<(Expr, Expr)> {
    if !expr.contains_symbol(target) {
        return Some((Expr::num(0.0), expr.clone()));
    }
    match expr {
        Expr::Symbol(_) => Some((Expr::num(1.0), Expr::num(0.0))),
        Expr::UnaryOp { op: UnaryOp::Negate, expr } => {
            let (a, b) = linear_parts(expr, target)?;
            Some((Expr::neg(a), Expr::neg(b)))
        }
        Expr::BinaryOp { left, op, right } => {
            match op {
                BinaryOp::Add | BinaryOp::Sub => {
                    let (a1, b1) = linear_parts(left, target)?;
                    let (a2, b2) = linear_parts(right, target)?;
                    Some((
                        Expr::binary(a1, *op, a2),
                        Expr::binary(b1, *op, b2),
                    ))
                }
                BinaryOp::Mul if !left.contains_symbol(target) => {
                    let (a, b) = linear_parts(right, target)?;
                    Some((Expr::mul((**left).clone(), a), Expr::mul((**left).clone(), b)))
                }
                BinaryOp::Mul if !right.contains_symbol(target) => {
                    let (a, b) = linear_parts(left, target)?;
                    Some((Expr::mul(a, (**right).clone()), Expr::mul(b, (**right).clone())))
                }
                BinaryOp::Div if !right.contains_symbol(target) => {
                    let (a, b) = linear_parts(left, target)?;
                    Some((Expr::div(a, (**right).clone()), Expr::div(b, (**right).clone())))
                }
                // Products of the target, division by it, powers of it.
                _ => None,
            }
        }
        Expr::Call { .. } | Expr::Number(_) => None,
    }
}

// ============================================================================
// Simplification
// ============================================================================

/// Fold constants and drop identity operations, bottom-up.
pub fn simplify(expr: Expr) -> Expr {
    match expr {
        Expr::UnaryOp { op: UnaryOp::Negate, expr } => match simplify(*expr) {
            Expr::Number(n) => Expr::Number(-n),
            Expr::UnaryOp { op: UnaryOp::Negate, expr } => *expr,
            inner => Expr::neg(inner),
        },
        Expr::BinaryOp { left, op, right } => {
            simplify_binary(simplify(*left), op, simplify(*right))
        }
        Expr::Call { func, arg } => Expr::call(func, simplify(*arg)),
        leaf => leaf,
    }
}

fn simplify_binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    let (l, r) = (left.as_number(), right.as_number());

    if let (Some(a), Some(b)) = (l, r) {
        let folded = match op {
            BinaryOp::Add => Some(a + b),
            BinaryOp::Sub => Some(a - b),
            BinaryOp::Mul => Some(a * b),
            BinaryOp::Div if b != 0.0 => Some(a / b),
            BinaryOp::Pow => Some(a.powf(b)),
            BinaryOp::Div => None,
        };
        if let Some(v) = folded.filter(|v| v.is_finite()) {
            return Expr::Number(v);
        }
    }

    match (op, l, r) {
        (BinaryOp::Add, Some(z), _) if z == 0.0 => right,
        (BinaryOp::Add | BinaryOp::Sub, _, Some(z)) if z == 0.0 => left,
        (BinaryOp::Sub, Some(z), _) if z == 0.0 => simplify(Expr::neg(right)),
        (BinaryOp::Mul, Some(z), _) | (BinaryOp::Mul, _, Some(z)) if z == 0.0 => Expr::Number(0.0),
        (BinaryOp::Mul, Some(one), _) if one == 1.0 => right,
        (BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow, _, Some(one)) if one == 1.0 => left,
        (BinaryOp::Mul, Some(m), _) if m == -1.0 => simplify(Expr::neg(right)),
        (BinaryOp::Mul | BinaryOp::Div, _, Some(m)) if m == -1.0 => simplify(Expr::neg(left)),
        _ => Expr::binary(left, op, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::eval::{evaluate, Bindings};
    use crate::expr::parse_equation_str;
    use crate::expr::lexer::Vocabulary;

    fn equation(text: &str, symbols: &[&str]) -> Equation {
        let vocab: Vocabulary = symbols.iter().copied().collect();
        parse_equation_str(text, &vocab).unwrap()
    }

    fn bind(pairs: &[(&str, f64)]) -> Bindings {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_newton_each_symbol() {
        let eq = equation("F = m*a", &["F", "m", "a"]);
        assert_eq!(solve_for(&eq, "F").unwrap().to_string(), "m * a");
        assert_eq!(solve_for(&eq, "m").unwrap().to_string(), "F / a");
        assert_eq!(solve_for(&eq, "a").unwrap().to_string(), "F / m");
    }

    #[test]
    fn test_kinematics() {
        let eq = equation("v = v0 + a*t", &["v", "v0", "a", "t"]);
        assert_eq!(solve_for(&eq, "t").unwrap().to_string(), "(v - v0) / a");
        assert_eq!(solve_for(&eq, "v0").unwrap().to_string(), "v - a * t");
    }

    #[test]
    fn test_square_root_inverse() {
        let eq = equation("E = 0.5*m*v^2", &["E", "m", "v"]);
        let v = solve_for(&eq, "v").unwrap();
        assert_eq!(v.to_string(), "sqrt(E / (0.5 * m))");
        let value = evaluate(&v, &bind(&[("E", 100.0), ("m", 2.0)])).unwrap();
        assert!((value - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_area_radius() {
        let eq = equation("A = pi*r^2", &["A", "r"]);
        let r = solve_for(&eq, "r").unwrap();
        let value = evaluate(&r, &bind(&[("A", std::f64::consts::PI * 9.0)])).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_divisor_target() {
        let eq = equation("v = s/t", &["v", "s", "t"]);
        assert_eq!(solve_for(&eq, "t").unwrap().to_string(), "s / v");
    }

    #[test]
    fn test_exponent_target() {
        let eq = equation("N = 2^k", &["N", "k"]);
        let k = solve_for(&eq, "k").unwrap();
        let value = evaluate(&k, &bind(&[("N", 8.0)])).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_function_inverse() {
        let eq = equation("y = sin(theta)", &["y", "theta"]);
        assert_eq!(solve_for(&eq, "theta").unwrap().to_string(), "asin(y)");
    }

    #[test]
    fn test_linear_in_repeated_symbol() {
        let eq = equation("x + x = 4", &["x"]);
        assert_eq!(solve_for(&eq, "x").unwrap(), Expr::Number(2.0));

        // Energy balance with the target on both sides
        let eq = equation("m*g*h = 0.5*m*u + m*g*u", &["m", "g", "h", "u"]);
        let u = solve_for(&eq, "u").unwrap();
        let value = evaluate(&u, &bind(&[("m", 2.0), ("g", 10.0), ("h", 2.1)])).unwrap();
        assert!((value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_quadratic_has_no_solution() {
        let eq = equation("s = v0*t + 0.5*a*t^2", &["s", "v0", "t", "a"]);
        assert!(matches!(solve_for(&eq, "t"), Err(Error::NoSymbolicSolution { .. })));
    }

    #[test]
    fn test_absent_target() {
        let eq = equation("F = m*a", &["F", "m", "a"]);
        assert!(matches!(solve_for(&eq, "v"), Err(Error::NoSymbolicSolution { .. })));
    }

    #[test]
    fn test_abs_not_invertible() {
        let eq = equation("y = abs(x)", &["y", "x"]);
        assert!(solve_for(&eq, "x").is_err());
    }

    #[test]
    fn test_simplify_identities() {
        let e = Expr::add(Expr::num(0.0), Expr::mul(Expr::num(1.0), Expr::sym("x")));
        assert_eq!(simplify(e), Expr::sym("x"));
        let e = Expr::neg(Expr::neg(Expr::sym("y")));
        assert_eq!(simplify(e), Expr::sym("y"));
        let e = Expr::div(Expr::num(1.0), Expr::num(2.0));
        assert_eq!(simplify(e), Expr::Number(0.5));
    }
}
