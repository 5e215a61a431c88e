//! Numeric evaluation of expressions against symbol bindings.

use hashbrown::HashMap;

use crate::{Error, Result};
use super::ast::{BinaryOp, Expr, UnaryOp};

/// Symbol values for one evaluation.
pub type Bindings = HashMap<String, f64>;

/// Evaluate `expr`. `pi` evaluates to π unless the bindings define it.
///
/// An unbound symbol is [`Error::MissingVariable`]; division by zero and
/// non-finite results are [`Error::EvaluationError`].
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<f64> {
    let value = eval_node(expr, bindings)?;
    if !value.is_finite() {
        return Err(Error::EvaluationError(format!("'{expr}' evaluated to {value}")));
    }
    Ok(value)
}

fn eval_node(expr: &Expr, bindings: &Bindings) -> Result<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Symbol(name) => match bindings.get(name) {
            Some(v) => Ok(*v),
            None if name == "pi" => Ok(std::f64::consts::PI),
            None => Err(Error::MissingVariable(name.clone())),
        },
        Expr::UnaryOp { op: UnaryOp::Negate, expr } => Ok(-eval_node(expr, bindings)?),
        Expr::BinaryOp { left, op, right } => {
            let l = eval_node(left, bindings)?;
            let r = eval_node(right, bindings)?;
            match op {
                BinaryOp::Add => Ok(l + r),
                BinaryOp::Sub => Ok(l - r),
                BinaryOp::Mul => Ok(l * r),
                BinaryOp::Div => {
                    if r == 0.0 {
                        Err(Error::EvaluationError(format!("division by zero in '{expr}'")))
                    } else {
                        Ok(l / r)
                    }
                }
                BinaryOp::Pow => Ok(l.powf(r)),
            }
        }
        Expr::Call { func, arg } => {
            let x = eval_node(arg, bindings)?;
            let y = func.apply(x);
            if y.is_nan() {
                return Err(Error::EvaluationError(format!(
                    "{}({x}) is undefined",
                    func.name()
                )));
            }
            Ok(y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ast::Function;

    fn bind(pairs: &[(&str, f64)]) -> Bindings {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_product() {
        let e = Expr::mul(Expr::sym("m"), Expr::sym("a"));
        assert_eq!(evaluate(&e, &bind(&[("m", 2.0), ("a", 10.0)])).unwrap(), 20.0);
    }

    #[test]
    fn test_builtin_pi() {
        let e = Expr::mul(Expr::sym("pi"), Expr::pow(Expr::sym("r"), Expr::num(2.0)));
        let area = evaluate(&e, &bind(&[("r", 2.0)])).unwrap();
        assert!((area - 4.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_bound_pi_shadows_constant() {
        assert_eq!(evaluate(&Expr::sym("pi"), &bind(&[("pi", 3.0)])).unwrap(), 3.0);
    }

    #[test]
    fn test_missing_variable() {
        let e = Expr::add(Expr::sym("x"), Expr::sym("y"));
        let err = evaluate(&e, &bind(&[("x", 1.0)])).unwrap_err();
        assert!(matches!(err, Error::MissingVariable(ref name) if name == "y"));
    }

    #[test]
    fn test_division_by_zero() {
        let e = Expr::div(Expr::sym("F"), Expr::sym("m"));
        let err = evaluate(&e, &bind(&[("F", 1.0), ("m", 0.0)])).unwrap_err();
        assert!(matches!(err, Error::EvaluationError(_)));
    }

    #[test]
    fn test_domain_error() {
        let e = Expr::call(Function::Sqrt, Expr::sym("x"));
        assert!(matches!(evaluate(&e, &bind(&[("x", -4.0)])), Err(Error::EvaluationError(_))));
        assert_eq!(evaluate(&e, &bind(&[("x", 16.0)])).unwrap(), 4.0);
    }
}
