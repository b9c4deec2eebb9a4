//! Pratt parser producing [`Expr`] trees.

use crate::expr::{Expr, RelOp};
use crate::lexer::{Token, tokenize};
use castext_cas::{CasError, CasResult};

const OR: u8 = 10;
const AND: u8 = 20;
const NOT: u8 = 25;
const REL: u8 = 30;
const SUM: u8 = 40;
const PRODUCT: u8 = 50;
const UNARY: u8 = 60;
const POWER: u8 = 70;

/// A top-level input: an expression, or an assignment into one element of a
/// bound matrix or list.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expr(Expr),
    /// `name[i,j]:value`
    SetElement {
        name: String,
        indices: Vec<Expr>,
        value: Expr,
    },
}

/// Parse a complete expression.
pub fn parse(input: &str) -> CasResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CasError::syntax("The expression is empty"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression(0)?;
    parser.finish()?;
    Ok(expr)
}

/// Parse an expression or an element assignment such as `A[1,2]:3`.
pub fn parse_statement(input: &str) -> CasResult<Statement> {
    let tokens = tokenize(input)?;
    let name = match tokens.as_slice() {
        [Token::Ident(name), Token::LBracket, ..] => name.clone(),
        _ => return parse(input).map(Statement::Expr),
    };
    let mut parser = Parser { tokens, pos: 2 };
    let indices = parser.sequence(Token::RBracket)?;
    if parser.peek() != Some(&Token::Colon) {
        return parse(input).map(Statement::Expr);
    }
    parser.pos += 1;
    if indices.is_empty() {
        return Err(CasError::syntax(format!(
            "Assigning to `{name}[]` needs at least one index"
        )));
    }
    let value = parser.expression(0)?;
    parser.finish()?;
    Ok(Statement::SetElement {
        name,
        indices,
        value,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn finish(&self) -> CasResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(Token::Colon) => Err(CasError::syntax(
                "Assignments are only allowed at the start of an expression",
            )),
            Some(token) => Err(CasError::syntax(format!(
                "Unexpected `{}` after the end of the expression",
                token.describe()
            ))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> CasResult<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(CasError::syntax(format!(
                "Expected `{}` but found `{}`",
                expected.describe(),
                token.describe()
            ))),
            None => Err(CasError::syntax(format!(
                "Expected `{}` but the expression ended",
                expected.describe()
            ))),
        }
    }

    fn expression(&mut self, min_bp: u8) -> CasResult<Expr> {
        let mut lhs = self.prefix()?;

        loop {
            let Some(token) = self.peek().cloned() else { break };
            let (bp, right_assoc) = match &token {
                Token::Ident(word) if word == "or" => (OR, false),
                Token::Ident(word) if word == "and" => (AND, false),
                Token::Eq | Token::Hash | Token::Lt | Token::Gt | Token::Le | Token::Ge => {
                    (REL, false)
                }
                Token::Plus | Token::Minus => (SUM, false),
                Token::Star | Token::Slash => (PRODUCT, false),
                Token::Caret => (POWER, true),
                _ => break,
            };
            if bp <= min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(if right_assoc { bp - 1 } else { bp })?;
            lhs = combine(token, lhs, rhs);
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> CasResult<Expr> {
        match self.next() {
            None => Err(CasError::syntax("The expression ended unexpectedly")),
            Some(Token::Int(n)) => Ok(Expr::Int(n)),
            Some(Token::Real(r)) => Ok(Expr::Real(r)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.expression(UNARY)?))),
            Some(Token::Plus) => self.expression(UNARY),
            Some(Token::LParen) => {
                let inner = self.expression(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => Ok(Expr::List(self.sequence(Token::RBracket)?)),
            Some(Token::LBrace) => Ok(Expr::Set(self.sequence(Token::RBrace)?)),
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "not" => Ok(Expr::Not(Box::new(self.expression(NOT)?))),
                "and" | "or" => Err(CasError::syntax(format!(
                    "`{word}` needs an operand on its left"
                ))),
                _ if self.peek() == Some(&Token::LParen) => {
                    self.pos += 1;
                    let args = self.sequence(Token::RParen)?;
                    Ok(Expr::Call(word, args))
                }
                _ => Ok(Expr::Sym(word)),
            },
            Some(token) => Err(CasError::syntax(format!(
                "Unexpected `{}`",
                token.describe()
            ))),
        }
    }

    /// Comma separated items up to and including `close`.
    fn sequence(&mut self, close: Token) -> CasResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek() == Some(&close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.expression(0)?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(token) if token == close => return Ok(items),
                Some(token) => {
                    return Err(CasError::syntax(format!(
                        "Expected `,` or `{}` but found `{}`",
                        close.describe(),
                        token.describe()
                    )));
                }
                None => {
                    return Err(CasError::syntax(format!(
                        "Expected `{}` but the expression ended",
                        close.describe()
                    )));
                }
            }
        }
    }
}

fn relation(op: &Token) -> Option<RelOp> {
    match op {
        Token::Eq => Some(RelOp::Eq),
        Token::Hash => Some(RelOp::Neq),
        Token::Lt => Some(RelOp::Lt),
        Token::Gt => Some(RelOp::Gt),
        Token::Le => Some(RelOp::Le),
        Token::Ge => Some(RelOp::Ge),
        _ => None,
    }
}

fn combine(op: Token, lhs: Expr, rhs: Expr) -> Expr {
    if let Some(rel) = relation(&op) {
        return Expr::Rel(rel, Box::new(lhs), Box::new(rhs));
    }
    match op {
        Token::Ident(word) if word == "or" => Expr::Or(vec![lhs, rhs]),
        Token::Ident(_) => Expr::And(vec![lhs, rhs]),
        Token::Plus => Expr::Add(vec![lhs, rhs]),
        Token::Minus => Expr::Add(vec![lhs, Expr::Neg(Box::new(rhs))]),
        Token::Star => Expr::Mul(vec![lhs, rhs]),
        Token::Slash => Expr::Div(Box::new(lhs), Box::new(rhs)),
        _ => Expr::Pow(Box::new(lhs), Box::new(rhs)),
    }
}
