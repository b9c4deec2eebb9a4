//! Expression tree.

/// A relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl RelOp {
    pub fn input(self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Neq => "#",
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
        }
    }

    pub fn latex(self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Neq => "\\neq ",
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Le => "\\leq ",
            RelOp::Ge => "\\geq ",
        }
    }
}

/// An expression. Subtraction is `Add` with a `Neg` term.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Real(f64),
    Bool(bool),
    Str(String),
    Sym(String),
    Neg(Box<Expr>),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Rel(RelOp, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn sym(name: impl Into<String>) -> Expr {
        Expr::Sym(name.into())
    }

    /// Binding strength used when deciding on parentheses.
    pub fn precedence(&self) -> u8 {
        match self {
            Expr::Or(_) => 10,
            Expr::And(_) => 20,
            Expr::Not(_) => 25,
            Expr::Rel(..) => 30,
            Expr::Add(_) => 40,
            Expr::Mul(_) | Expr::Div(..) => 50,
            Expr::Neg(_) => 60,
            Expr::Int(n) if *n < 0 => 60,
            Expr::Real(r) if *r < 0.0 => 60,
            Expr::Pow(..) => 70,
            _ => 100,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value for comparisons.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Int(n) => Some(*n as f64),
            Expr::Real(r) => Some(*r),
            Expr::Div(num, den) => match (num.as_int(), den.as_int()) {
                (Some(n), Some(d)) if d != 0 => Some(n as f64 / d as f64),
                _ => None,
            },
            Expr::Neg(inner) => inner.as_number().map(|v| -v),
            _ => None,
        }
    }
}
