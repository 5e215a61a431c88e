//! Formula AST: expression and equation types.

use std::fmt;

/// An arithmetic expression over named symbols.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal: `9.8`, `0.5`
    Number(f64),
    /// Symbol reference: `F`, `v0`, `rho`
    Symbol(String),
    /// Unary negation: `-x`
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// Binary operation: `a + b`, `m * a`, `v ^ 2`
    BinaryOp { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
    /// Function call: `sqrt(x)`, `sin(theta)`
    Call { func: Function, arg: Box<Expr> },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Pow,
}

impl BinaryOp {
    /// Binding strength, higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

/// Built-in single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt, Sin, Cos, Tan, Asin, Acos, Atan, Ln, Log10, Exp, Abs,
}

impl Function {
    pub const ALL: [Function; 11] = [
        Function::Sqrt, Function::Sin, Function::Cos, Function::Tan,
        Function::Asin, Function::Acos, Function::Atan,
        Function::Ln, Function::Log10, Function::Exp, Function::Abs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Ln => "ln",
            Function::Log10 => "log",
            Function::Exp => "exp",
            Function::Abs => "abs",
        }
    }

    /// Resolve a function name. `log10` is accepted as an alias of `log`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "log10" {
            return Some(Function::Log10);
        }
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Function::Sqrt => x.sqrt(),
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Exp => x.exp(),
            Function::Abs => x.abs(),
        }
    }
}

/// `lhs = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    /// The zero form `lhs - (rhs)`.
    pub fn zero_form(&self) -> Expr {
        Expr::sub(self.lhs.clone(), self.rhs.clone())
    }
}

// ============================================================================
// Construction helpers
// ============================================================================

impl Expr {
    pub fn num(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Add, right)
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Sub, right)
    }

    pub fn mul(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Mul, right)
    }

    pub fn div(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Div, right)
    }

    pub fn pow(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Pow, right)
    }

    pub fn neg(expr: Expr) -> Self {
        Expr::UnaryOp { op: UnaryOp::Negate, expr: Box::new(expr) }
    }

    pub fn call(func: Function, arg: Expr) -> Self {
        Expr::Call { func, arg: Box::new(arg) }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of occurrences of `name` in the tree.
    pub fn count_symbol(&self, name: &str) -> usize {
        match self {
            Expr::Number(_) => 0,
            Expr::Symbol(s) => usize::from(s == name),
            Expr::UnaryOp { expr, .. } => expr.count_symbol(name),
            Expr::BinaryOp { left, right, .. } => left.count_symbol(name) + right.count_symbol(name),
            Expr::Call { arg, .. } => arg.count_symbol(name),
        }
    }

    pub fn contains_symbol(&self, name: &str) -> bool {
        self.count_symbol(name) > 0
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::BinaryOp { op, .. } => op.precedence(),
            Expr::UnaryOp { .. } => 3,
            Expr::Number(n) if *n < 0.0 => 3,
            _ => 5,
        }
    }
}

// ============================================================================
// Display: renders parseable ASCII with minimal parentheses
// ============================================================================

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Symbol(s) => f.write_str(s),
            Expr::UnaryOp { op: UnaryOp::Negate, expr } => {
                if expr.precedence() <= 3 {
                    write!(f, "-({expr})")
                } else {
                    write!(f, "-{expr}")
                }
            }
            Expr::BinaryOp { left, op, right } => {
                let prec = op.precedence();
                // Left operand: parenthesize looser ops; `^` is right-assoc
                // so an equal-precedence left side also needs parens.
                let left_parens = left.precedence() < prec
                    || (*op == BinaryOp::Pow && left.precedence() <= prec);
                // Right operand: `-` and `/` are not associative.
                let right_parens = right.precedence() < prec
                    || (right.precedence() == prec && matches!(op, BinaryOp::Sub | BinaryOp::Div));
                write_operand(f, left, left_parens)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, right_parens)
            }
            Expr::Call { func, arg } => write!(f, "{}({arg})", func.name()),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
