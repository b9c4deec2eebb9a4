//! Evaluation and simplification.
//!
//! Evaluation substitutes bound symbols once, then simplifies bottom-up.
//! Values taken from the environment are re-parsed and simplified without
//! further lookups, so `x: x+1` does not recurse.

use crate::expr::{Expr, RelOp};
use crate::parser;
use crate::render;
use castext_cas::{CasError, CasResult, Environment};
use std::cmp::Ordering;

/// Evaluate `expr`, resolving symbols through `env` when given.
pub fn evaluate(expr: &Expr, env: Option<&dyn Environment>) -> CasResult<Expr> {
    match expr {
        Expr::Int(_) | Expr::Real(_) | Expr::Bool(_) | Expr::Str(_) => Ok(expr.clone()),
        Expr::Sym(name) => lookup(name, env),
        Expr::Neg(inner) => negate(evaluate(inner, env)?),
        Expr::Add(terms) => add(evaluate_all(terms, env)?),
        Expr::Mul(factors) => multiply(evaluate_all(factors, env)?),
        Expr::Div(num, den) => divide(evaluate(num, env)?, evaluate(den, env)?),
        Expr::Pow(base, exp) => power(evaluate(base, env)?, evaluate(exp, env)?),
        Expr::Call(name, args) => call(name, evaluate_all(args, env)?),
        Expr::List(items) => Ok(Expr::List(evaluate_all(items, env)?)),
        Expr::Set(items) => Ok(make_set(evaluate_all(items, env)?)),
        Expr::Rel(op, lhs, rhs) => Ok(Expr::Rel(
            *op,
            Box::new(evaluate(lhs, env)?),
            Box::new(evaluate(rhs, env)?),
        )),
        Expr::Not(inner) => Ok(match evaluate(inner, env)? {
            Expr::Bool(b) => Expr::Bool(!b),
            other => Expr::Not(Box::new(other)),
        }),
        Expr::And(items) => Ok(logic(evaluate_all(items, env)?, true)),
        Expr::Or(items) => Ok(logic(evaluate_all(items, env)?, false)),
    }
}

fn evaluate_all(items: &[Expr], env: Option<&dyn Environment>) -> CasResult<Vec<Expr>> {
    items.iter().map(|item| evaluate(item, env)).collect()
}

fn lookup(name: &str, env: Option<&dyn Environment>) -> CasResult<Expr> {
    let Some(value) = env.and_then(|env| env.value_of(name)) else {
        return Ok(Expr::sym(name));
    };
    let parsed = parser::parse(&value.to_string()).map_err(|err| {
        CasError::runtime(format!("The value of `{name}` could not be read back: {err}"))
    })?;
    evaluate(&parsed, None)
}

/// Replace one element of the matrix or list bound to `name`, returning the
/// updated value. Indices count from 1: `A[i,j]` for a matrix, `L[i]` for a
/// list.
pub fn set_element(
    name: &str,
    indices: &[Expr],
    value: &Expr,
    env: Option<&dyn Environment>,
) -> CasResult<Expr> {
    let target = lookup(name, env)?;
    let positions = indices
        .iter()
        .map(|index| position(name, &evaluate(index, env)?))
        .collect::<CasResult<Vec<usize>>>()?;
    let value = evaluate(value, env)?;
    let out_of_range = || CasError::runtime(format!("Index out of range for `{name}`"));

    match (target, positions.as_slice()) {
        (Expr::Call(function, mut rows), [row, column]) if function == "matrix" => {
            let cell = rows
                .get_mut(*row)
                .and_then(|row| match row {
                    Expr::List(cells) => cells.get_mut(*column),
                    _ => None,
                })
                .ok_or_else(out_of_range)?;
            *cell = value;
            Ok(Expr::Call(function, rows))
        }
        (Expr::List(mut items), [index]) => {
            let item = items.get_mut(*index).ok_or_else(out_of_range)?;
            *item = value;
            Ok(Expr::List(items))
        }
        (Expr::Sym(_), _) => Err(CasError::runtime(format!(
            "`{name}` has no value to assign an element of"
        ))),
        (other, _) => Err(CasError::runtime(format!(
            "Cannot assign {} index(es) into `{name}` = `{}`",
            positions.len(),
            render::to_input(&other)
        ))),
    }
}

fn position(name: &str, index: &Expr) -> CasResult<usize> {
    match index.as_int() {
        Some(n) if n >= 1 => usize::try_from(n - 1).map_err(|_| overflow()),
        _ => Err(CasError::runtime(format!(
            "Indices of `{name}` must be positive integers, not `{}`",
            render::to_input(index)
        ))),
    }
}

fn overflow() -> CasError {
    CasError::runtime("Integer overflow")
}

fn negate(inner: Expr) -> CasResult<Expr> {
    Ok(match inner {
        Expr::Int(n) => Expr::Int(n.checked_neg().ok_or_else(overflow)?),
        Expr::Real(r) => Expr::Real(-r),
        Expr::Neg(inner) => *inner,
        Expr::Div(num, den) if num.as_int().is_some() => divide(negate(*num)?, *den)?,
        other => Expr::Neg(Box::new(other)),
    })
}

fn add(terms: Vec<Expr>) -> CasResult<Expr> {
    let mut flat = Vec::new();
    let mut constant: i64 = 0;
    let mut real: Option<f64> = None;
    for term in terms {
        match term {
            Expr::Add(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut rest = Vec::new();
    for term in flat {
        match term {
            Expr::Int(n) => constant = constant.checked_add(n).ok_or_else(overflow)?,
            Expr::Real(r) => real = Some(real.unwrap_or(0.0) + r),
            other => rest.push(other),
        }
    }

    if let Some(r) = real {
        let total = r + constant as f64;
        if total != 0.0 || rest.is_empty() {
            rest.push(Expr::Real(total));
        }
    } else if constant != 0 || rest.is_empty() {
        rest.push(Expr::Int(constant));
    }

    Ok(if rest.len() == 1 {
        rest.remove(0)
    } else {
        Expr::Add(rest)
    })
}

/// Split a factor into base and integer exponent when it has one.
fn base_and_exponent(factor: &Expr) -> (Expr, Option<i64>) {
    match factor {
        Expr::Pow(base, exp) => match exp.as_int() {
            Some(n) => ((**base).clone(), Some(n)),
            None => (factor.clone(), None),
        },
        other => (other.clone(), Some(1)),
    }
}

fn multiply(factors: Vec<Expr>) -> CasResult<Expr> {
    let mut flat = Vec::new();
    let mut negative = false;
    for factor in factors {
        match factor {
            Expr::Mul(inner) => flat.extend(inner),
            Expr::Neg(inner) => {
                negative = !negative;
                match *inner {
                    Expr::Mul(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            other => flat.push(other),
        }
    }

    let mut coefficient: i64 = if negative { -1 } else { 1 };
    let mut real: Option<f64> = None;
    let mut merged: Vec<(Expr, Option<i64>)> = Vec::new();
    for factor in flat {
        match factor {
            Expr::Int(n) => coefficient = coefficient.checked_mul(n).ok_or_else(overflow)?,
            Expr::Real(r) => real = Some(real.unwrap_or(1.0) * r),
            other => {
                let (base, exp) = base_and_exponent(&other);
                let Some(n) = exp else {
                    merged.push((other, None));
                    continue;
                };
                let existing = merged
                    .iter()
                    .position(|(b, e)| e.is_some() && *b == base);
                match existing {
                    Some(index) => {
                        let total = merged[index].1.unwrap_or(0);
                        merged[index].1 = Some(total.checked_add(n).ok_or_else(overflow)?);
                    }
                    None => merged.push((base, Some(n))),
                }
            }
        }
    }

    if coefficient == 0 || real == Some(0.0) {
        return Ok(Expr::Int(0));
    }

    let mut rest = Vec::new();
    for (base, exp) in merged {
        match exp {
            Some(n) => {
                let factor = power(base, Expr::Int(n))?;
                if factor != Expr::Int(1) {
                    rest.push(factor);
                }
            }
            None => rest.push(base),
        }
    }

    let mut out = Vec::new();
    if let Some(r) = real {
        out.push(Expr::Real(r * coefficient as f64));
    } else if coefficient.abs() != 1 || rest.is_empty() {
        out.push(Expr::Int(coefficient));
    }
    out.extend(rest);

    let product = if out.len() == 1 {
        out.remove(0)
    } else {
        Expr::Mul(out)
    };
    if real.is_none() && coefficient == -1 && product != Expr::Int(-1) {
        return Ok(Expr::Neg(Box::new(product)));
    }
    Ok(product)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a as i64
}

fn divide(num: Expr, den: Expr) -> CasResult<Expr> {
    match (&num, &den) {
        (_, Expr::Int(0)) => Err(CasError::runtime("Division by zero")),
        (_, Expr::Int(1)) => Ok(num),
        (Expr::Int(0), _) => Ok(Expr::Int(0)),
        (Expr::Int(n), Expr::Int(d)) => {
            let g = gcd(*n, *d);
            let (mut n, mut d) = (n / g, d / g);
            if d < 0 {
                n = n.checked_neg().ok_or_else(overflow)?;
                d = -d;
            }
            Ok(if d == 1 {
                Expr::Int(n)
            } else if n < 0 {
                Expr::Neg(Box::new(Expr::Div(Box::new(Expr::Int(-n)), Box::new(Expr::Int(d)))))
            } else {
                Expr::Div(Box::new(Expr::Int(n)), Box::new(Expr::Int(d)))
            })
        }
        (_, Expr::Real(r)) if *r == 0.0 => Err(CasError::runtime("Division by zero")),
        (Expr::Real(_) | Expr::Int(_), Expr::Real(_) | Expr::Int(_)) => {
            match (num.as_number(), den.as_number()) {
                (Some(n), Some(d)) => Ok(Expr::Real(n / d)),
                _ => Ok(Expr::Div(Box::new(num), Box::new(den))),
            }
        }
        _ if num == den => Ok(Expr::Int(1)),
        _ => Ok(Expr::Div(Box::new(num), Box::new(den))),
    }
}

fn power(base: Expr, exp: Expr) -> CasResult<Expr> {
    match (&base, &exp) {
        (_, Expr::Int(0)) => Ok(Expr::Int(1)),
        (_, Expr::Int(1)) => Ok(base),
        (Expr::Int(1), _) => Ok(Expr::Int(1)),
        (Expr::Int(b), Expr::Int(e)) if *e > 0 => {
            let e = u32::try_from(*e).map_err(|_| overflow())?;
            Ok(Expr::Int(b.checked_pow(e).ok_or_else(overflow)?))
        }
        (Expr::Int(0), Expr::Int(_)) => Err(CasError::runtime("Division by zero")),
        (Expr::Int(_), Expr::Int(e)) => {
            let positive = power(base.clone(), Expr::Int(e.checked_neg().ok_or_else(overflow)?))?;
            divide(Expr::Int(1), positive)
        }
        (Expr::Real(b), Expr::Int(e)) => {
            let e = i32::try_from(*e).map_err(|_| overflow())?;
            let result = b.powi(e);
            if result.is_finite() {
                Ok(Expr::Real(result))
            } else {
                Err(overflow())
            }
        }
        (Expr::Pow(inner, m), Expr::Int(n)) if m.as_int().is_some() => {
            let m = m.as_int().unwrap_or(1);
            power((**inner).clone(), Expr::Int(m.checked_mul(*n).ok_or_else(overflow)?))
        }
        _ => Ok(Expr::Pow(Box::new(base), Box::new(exp))),
    }
}

/// Canonical order for set elements: numbers first, then by input text.
fn compare(a: &Expr, b: &Expr) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => render::to_input(a).cmp(&render::to_input(b)),
    }
}

fn make_set(mut items: Vec<Expr>) -> Expr {
    items.sort_by(compare);
    items.dedup();
    Expr::Set(items)
}

fn logic(items: Vec<Expr>, conjunction: bool) -> Expr {
    let mut flat = Vec::new();
    for item in items {
        match (item, conjunction) {
            (Expr::And(inner), true) | (Expr::Or(inner), false) => flat.extend(inner),
            (other, _) => flat.push(other),
        }
    }
    let mut undecided = Vec::new();
    for item in flat {
        match item {
            // false in a conjunction, true in a disjunction
            Expr::Bool(b) if b != conjunction => return Expr::Bool(b),
            Expr::Bool(_) => {}
            other => undecided.push(other),
        }
    }
    match undecided.len() {
        0 => Expr::Bool(conjunction),
        1 => undecided.remove(0),
        _ if conjunction => Expr::And(undecided),
        _ => Expr::Or(undecided),
    }
}

/// Decide a predicate the way `is()` does. `None` means unknown.
pub fn decide(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Bool(b) => Some(*b),
        Expr::Rel(op, lhs, rhs) => {
            if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
                return Some(match op {
                    RelOp::Eq => a == b,
                    RelOp::Neq => a != b,
                    RelOp::Lt => a < b,
                    RelOp::Gt => a > b,
                    RelOp::Le => a <= b,
                    RelOp::Ge => a >= b,
                });
            }
            match op {
                RelOp::Eq => Some(lhs == rhs),
                RelOp::Neq => Some(lhs != rhs),
                _ => None,
            }
        }
        Expr::Not(inner) => decide(inner).map(|b| !b),
        Expr::And(items) => {
            let mut all = true;
            for item in items {
                match decide(item) {
                    Some(false) => return Some(false),
                    Some(true) => {}
                    None => all = false,
                }
            }
            all.then_some(true)
        }
        Expr::Or(items) => {
            let mut all = true;
            for item in items {
                match decide(item) {
                    Some(true) => return Some(true),
                    Some(false) => {}
                    None => all = false,
                }
            }
            all.then_some(false)
        }
        _ => None,
    }
}

fn expect_args(name: &str, args: &[Expr], count: usize) -> CasResult<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(CasError::runtime(format!(
            "`{name}` expects {count} argument(s) but was given {}",
            args.len()
        )))
    }
}

fn sequence<'a>(name: &str, arg: &'a Expr) -> CasResult<&'a [Expr]> {
    match arg {
        Expr::List(items) | Expr::Set(items) => Ok(items),
        other => Err(CasError::runtime(format!(
            "`{name}` expects a list but was given `{}`",
            render::to_input(other)
        ))),
    }
}

fn call(name: &str, mut args: Vec<Expr>) -> CasResult<Expr> {
    match name {
        "is" => {
            expect_args(name, &args, 1)?;
            Ok(match decide(&args[0]) {
                Some(b) => Expr::Bool(b),
                None => Expr::sym("unknown"),
            })
        }
        "length" => {
            expect_args(name, &args, 1)?;
            let len = sequence(name, &args[0])?.len();
            Ok(Expr::Int(i64::try_from(len).map_err(|_| overflow())?))
        }
        "first" | "last" => {
            expect_args(name, &args, 1)?;
            let items = sequence(name, &args[0])?;
            let item = if name == "first" {
                items.first()
            } else {
                items.last()
            };
            item.cloned()
                .ok_or_else(|| CasError::runtime(format!("`{name}` of an empty list")))
        }
        "rest" => {
            expect_args(name, &args, 1)?;
            let items = sequence(name, &args[0])?;
            Ok(Expr::List(items.iter().skip(1).cloned().collect()))
        }
        "reverse" => {
            expect_args(name, &args, 1)?;
            let mut items = sequence(name, &args[0])?.to_vec();
            items.reverse();
            Ok(Expr::List(items))
        }
        "abs" => {
            expect_args(name, &args, 1)?;
            Ok(match args.remove(0) {
                Expr::Int(n) => Expr::Int(n.checked_abs().ok_or_else(overflow)?),
                Expr::Real(r) => Expr::Real(r.abs()),
                Expr::Neg(inner) => Expr::Call("abs".into(), vec![*inner]),
                other => Expr::Call("abs".into(), vec![other]),
            })
        }
        "matrix" => {
            let mut width = None;
            for row in &args {
                let Expr::List(cells) = row else {
                    return Err(CasError::runtime("Matrix rows must be lists"));
                };
                match width {
                    None => width = Some(cells.len()),
                    Some(w) if w != cells.len() => {
                        return Err(CasError::runtime("Matrix rows must have the same length"));
                    }
                    Some(_) => {}
                }
            }
            Ok(Expr::Call(name.to_string(), args))
        }
        _ => Ok(Expr::Call(name.to_string(), args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn simplified(input: &str) -> String {
        let parsed = parser::parse(input).unwrap();
        render::to_input(&evaluate(&parsed, None).unwrap())
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(simplified("1+1"), "2");
        assert_eq!(simplified("2*3-4"), "2");
        assert_eq!(simplified("2^10"), "1024");
        assert_eq!(simplified("6/4"), "3/2");
        assert_eq!(simplified("-6/4"), "-3/2");
        assert_eq!(simplified("6/3"), "2");
        assert_eq!(simplified("2^-1"), "1/2");
    }

    #[test]
    fn test_constant_moves_to_the_end_of_a_sum() {
        assert_eq!(simplified("1+x"), "x+1");
        assert_eq!(simplified("x+1-1"), "x");
        assert_eq!(simplified("x-1"), "x-1");
    }

    #[test]
    fn test_powers_of_the_same_base_merge() {
        assert_eq!(simplified("x*x^2"), "x^3");
        assert_eq!(simplified("(x^2)^2"), "x^4");
        assert_eq!(simplified("x^2*x^-2"), "1");
        assert_eq!(simplified("x^1"), "x");
        assert_eq!(simplified("x^0"), "1");
    }

    #[test]
    fn test_coefficients() {
        assert_eq!(simplified("x*2"), "2*x");
        assert_eq!(simplified("0*x"), "0");
        assert_eq!(simplified("-1*x"), "-x");
        assert_eq!(simplified("-(2*x)"), "-2*x");
    }

    #[test]
    fn test_sets_are_sorted_and_deduplicated() {
        assert_eq!(simplified("{7,4,5,4,6}"), "{4,5,6,7}");
        assert_eq!(simplified("{b,a,1}"), "{1,a,b}");
    }

    #[test]
    fn test_is_decides_numeric_relations() {
        assert_eq!(simplified("is(1>2)"), "false");
        assert_eq!(simplified("is(2>=2)"), "true");
        assert_eq!(simplified("is(x=x)"), "true");
        assert_eq!(simplified("is(x>1)"), "unknown");
        assert_eq!(simplified("is(1<2 and 3<2)"), "false");
    }

    #[test]
    fn test_relations_stay_symbolic_outside_is() {
        assert_eq!(simplified("1>2"), "1>2");
    }

    #[test]
    fn test_logic_folds_booleans() {
        assert_eq!(simplified("true and false"), "false");
        assert_eq!(simplified("not false"), "true");
        assert_eq!(simplified("a or true"), "true");
        assert_eq!(simplified("a and true"), "a");
    }

    #[test]
    fn test_list_functions() {
        assert_eq!(simplified("length([1,2,3])"), "3");
        assert_eq!(simplified("first([1,2,3])"), "1");
        assert_eq!(simplified("last([1,2,3])"), "3");
        assert_eq!(simplified("rest([1,2,3])"), "[2,3]");
        assert_eq!(simplified("reverse([1,2,3])"), "[3,2,1]");
        assert_eq!(simplified("abs(-3)"), "3");
    }

    #[test]
    fn test_unknown_functions_stay_symbolic() {
        assert_eq!(simplified("sin(x)"), "sin(x)");
        assert_eq!(simplified("diff(x^2,x)"), "diff(x^2,x)");
    }

    #[test]
    fn test_runtime_errors() {
        let err = evaluate(&parser::parse("1/0").unwrap(), None).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero");
        assert!(evaluate(&parser::parse("length(x)").unwrap(), None).is_err());
        assert!(evaluate(&parser::parse("matrix([1,2],[3])").unwrap(), None).is_err());
        assert!(evaluate(&parser::parse("10^40").unwrap(), None).is_err());
    }

    #[test]
    fn test_real_power_overflow() {
        assert_eq!(simplified("0.5^2"), "0.25");
        for input in ["2.5^99999999999", "2.5^99999"] {
            let err = evaluate(&parser::parse(input).unwrap(), None).unwrap_err();
            assert_eq!(err.to_string(), "Integer overflow", "{input}");
        }
    }

    #[test]
    fn test_set_element() {
        let matrix = parser::parse("matrix([1,2],[1,1])").unwrap();
        let mut env = std::collections::HashMap::new();
        env.insert(
            "A".to_string(),
            castext_cas::CasValue::atom(render::to_input(&matrix)),
        );
        env.insert("L".to_string(), castext_cas::CasValue::atom("[1,2,3]"));

        let updated = set_element("A", &[Expr::Int(1), Expr::Int(2)], &Expr::Int(3), Some(&env)).unwrap();
        assert_eq!(render::to_input(&updated), "matrix([1,3],[1,1])");

        let updated = set_element("L", &[Expr::Int(3)], &Expr::sym("x"), Some(&env)).unwrap();
        assert_eq!(render::to_input(&updated), "[1,2,x]");

        assert!(set_element("A", &[Expr::Int(3), Expr::Int(1)], &Expr::Int(0), Some(&env)).is_err());
        assert!(set_element("A", &[Expr::Int(0), Expr::Int(1)], &Expr::Int(0), Some(&env)).is_err());
        assert!(set_element("B", &[Expr::Int(1)], &Expr::Int(0), Some(&env)).is_err());
    }
}
