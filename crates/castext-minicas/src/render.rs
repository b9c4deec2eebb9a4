//! Rendering in input syntax and in LaTeX.

use crate::expr::Expr;
use castext_cas::RenderOptions;

const PRODUCT: u8 = 50;
const UNARY: u8 = 60;
const POWER: u8 = 70;

fn is_negative_number(expr: &Expr) -> bool {
    matches!(expr, Expr::Int(n) if *n < 0) || matches!(expr, Expr::Real(r) if *r < 0.0)
}

fn join(items: &[Expr], render: impl Fn(&Expr) -> String, sep: &str) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(sep)
}

/// Render in the syntax the parser reads back.
pub fn to_input(expr: &Expr) -> String {
    let wrapped = |inner: &Expr, paren: bool| {
        if paren {
            format!("({})", to_input(inner))
        } else {
            to_input(inner)
        }
    };

    match expr {
        Expr::Int(n) => n.to_string(),
        Expr::Real(r) => format!("{r:?}"),
        Expr::Bool(b) => b.to_string(),
        Expr::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Expr::Sym(name) => name.clone(),
        Expr::Neg(inner) => format!("-{}", wrapped(inner, inner.precedence() < PRODUCT)),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                match term {
                    Expr::Neg(inner) if i > 0 => {
                        out.push('-');
                        out.push_str(&wrapped(inner, inner.precedence() < PRODUCT));
                    }
                    Expr::Int(_) | Expr::Real(_) if i > 0 && is_negative_number(term) => {
                        out.push_str(&to_input(term));
                    }
                    _ => {
                        if i > 0 {
                            out.push('+');
                        }
                        out.push_str(&to_input(term));
                    }
                }
            }
            out
        }
        Expr::Mul(factors) => factors
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let paren = f.precedence() < PRODUCT
                    || (i > 0 && (matches!(f, Expr::Div(..)) || is_negative_number(f)));
                wrapped(f, paren)
            })
            .collect::<Vec<_>>()
            .join("*"),
        Expr::Div(num, den) => format!(
            "{}/{}",
            wrapped(num, num.precedence() < PRODUCT),
            wrapped(den, den.precedence() <= UNARY)
        ),
        Expr::Pow(base, exp) => format!(
            "{}^{}",
            wrapped(base, base.precedence() <= POWER),
            wrapped(exp, exp.precedence() < 100)
        ),
        Expr::Call(name, args) => format!("{name}({})", join(args, to_input, ",")),
        Expr::List(items) => format!("[{}]", join(items, to_input, ",")),
        Expr::Set(items) => format!("{{{}}}", join(items, to_input, ",")),
        Expr::Rel(op, lhs, rhs) => format!(
            "{}{}{}",
            wrapped(lhs, lhs.precedence() <= 30),
            op.input(),
            wrapped(rhs, rhs.precedence() <= 30)
        ),
        Expr::Not(inner) => format!("not {}", wrapped(inner, inner.precedence() < 25)),
        Expr::And(items) => items
            .iter()
            .map(|i| wrapped(i, i.precedence() <= 20))
            .collect::<Vec<_>>()
            .join(" and "),
        Expr::Or(items) => items
            .iter()
            .map(|i| wrapped(i, i.precedence() <= 10))
            .collect::<Vec<_>>()
            .join(" or "),
    }
}

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi",
    "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Phi", "Psi", "Omega",
];

const NAMED_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "sec", "csc", "cot", "sinh", "cosh", "tanh", "coth", "arcsin", "arccos",
    "arctan", "exp", "log", "ln", "lg", "det", "gcd", "max", "min",
];

fn symbol_latex(name: &str) -> String {
    if let Some((base, sub)) = name.split_once('_')
        && !base.is_empty()
        && !sub.is_empty()
    {
        return format!("{{{}}}_{{{}}}", symbol_latex(base), symbol_latex(sub));
    }
    if GREEK.contains(&name) {
        return format!("\\{name}");
    }
    match name {
        "%pi" => "\\pi".to_string(),
        "%e" => "e".to_string(),
        "%i" => "\\mathrm{i}".to_string(),
        "inf" => "\\infty".to_string(),
        _ if name.chars().count() == 1 => name.to_string(),
        _ => format!("{{\\it {name}}}"),
    }
}

/// Render as LaTeX for display.
pub fn to_latex(expr: &Expr, options: &RenderOptions) -> String {
    let latex = |inner: &Expr| to_latex(inner, options);
    let wrapped = |inner: &Expr, paren: bool| {
        if paren {
            format!("\\left({}\\right)", to_latex(inner, options))
        } else {
            to_latex(inner, options)
        }
    };

    match expr {
        Expr::Int(n) => n.to_string(),
        Expr::Real(r) => format!("{r:?}"),
        Expr::Bool(b) => format!("\\mathbf{{{b}}}"),
        Expr::Str(s) => format!("\\mbox{{{s}}}"),
        Expr::Sym(name) => symbol_latex(name),
        Expr::Neg(inner) => format!("-{}", wrapped(inner, inner.precedence() < PRODUCT)),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                match term {
                    Expr::Neg(inner) if i > 0 => {
                        out.push('-');
                        out.push_str(&wrapped(inner, inner.precedence() < PRODUCT));
                    }
                    _ if i > 0 && is_negative_number(term) => out.push_str(&latex(term)),
                    _ => {
                        if i > 0 {
                            out.push('+');
                        }
                        out.push_str(&latex(term));
                    }
                }
            }
            out
        }
        Expr::Mul(factors) => {
            let sign = options.multiplication_sign.latex();
            factors
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    wrapped(f, f.precedence() < PRODUCT || (i > 0 && is_negative_number(f)))
                })
                .collect::<Vec<_>>()
                .join(sign)
        }
        Expr::Div(num, den) => format!("\\frac{{{}}}{{{}}}", latex(num), latex(den)),
        Expr::Pow(base, exp) => {
            let exponent = latex(exp);
            let exponent = if exponent.chars().count() == 1 {
                exponent
            } else {
                format!("{{{exponent}}}")
            };
            format!("{}^{exponent}", wrapped(base, base.precedence() <= POWER))
        }
        Expr::Call(name, args) => call_latex(name, args, options),
        Expr::List(items) if items.is_empty() => "\\left[ \\right]".to_string(),
        Expr::List(items) => format!("\\left[ {} \\right]", join(items, latex, " , ")),
        Expr::Set(items) if items.is_empty() => "\\left \\{ \\right \\}".to_string(),
        Expr::Set(items) => format!("\\left \\{{ {} \\right \\}}", join(items, latex, " , ")),
        Expr::Rel(op, lhs, rhs) => format!("{}{}{}", latex(lhs), op.latex(), latex(rhs)),
        Expr::Not(inner) => format!("\\neg {}", wrapped(inner, inner.precedence() < 25)),
        Expr::And(items) => join(items, |i| wrapped(i, i.precedence() <= 20), " \\land "),
        Expr::Or(items) => join(items, |i| wrapped(i, i.precedence() <= 10), " \\lor "),
    }
}

fn call_latex(name: &str, args: &[Expr], options: &RenderOptions) -> String {
    let latex = |inner: &Expr| to_latex(inner, options);
    match name {
        "sqrt" if args.len() == 1 => format!("\\sqrt{{{}}}", latex(&args[0])),
        "abs" if args.len() == 1 => format!("\\left| {} \\right|", latex(&args[0])),
        "matrix" => {
            let columns = match args.first() {
                Some(Expr::List(cells)) => cells.len(),
                _ => 0,
            };
            let rows = args
                .iter()
                .map(|row| match row {
                    Expr::List(cells) => join(cells, latex, " & "),
                    other => latex(other),
                })
                .collect::<Vec<_>>()
                .join(" \\\\ ");
            let array = format!(
                "\\begin{{array}}{{{}}} {rows} \\end{{array}}",
                "c".repeat(columns)
            );
            match options.matrix_parens.delimiters() {
                Some((open, close)) => format!("{open}{array}{close}"),
                None => array,
            }
        }
        _ if NAMED_FUNCTIONS.contains(&name) => {
            format!("\\{name} \\left( {} \\right)", join(args, latex, " , "))
        }
        _ => format!(
            "{}\\left({}\\right)",
            symbol_latex(name),
            join(args, latex, " , ")
        ),
    }
}
