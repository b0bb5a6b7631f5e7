//! Mathematical expression compilation and evaluation.
//!
//! Expressions are parsed into a closed syntax tree, validated against the
//! fixed function registry, and only then become evaluable. Evaluation is a
//! pure function of the tree and a [`Scope`]: there is no ambient name
//! lookup, and no way to reach a callable outside the registry.

use crate::error::Error;
use std::f64::consts;
use std::fmt;
use std::str::FromStr;

mod parse;

use parse::{Ast, BinOp};

/// The registry of callable functions. Calls may only target these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Floor,
    Ceil,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "exp" => Some(Func::Exp),
            "log" => Some(Func::Log),
            "sqrt" => Some(Func::Sqrt),
            "floor" => Some(Func::Floor),
            "ceil" => Some(Func::Ceil),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Sqrt => "sqrt",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Exp => x.exp(),
            Func::Log => x.ln(),
            Func::Sqrt => x.sqrt(),
            Func::Floor => x.floor(),
            Func::Ceil => x.ceil(),
        }
    }
}

/// The registry of named constants, usable as bare names.
fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(consts::PI),
        "e" => Some(consts::E),
        _ => None,
    }
}

/// Validated syntax tree. Call targets are resolved [`Func`]s, so an
/// unchecked call is unrepresentable.
#[derive(Debug, Clone)]
enum Node {
    Num(f64),
    Var(String),
    Neg(Box<Node>),
    Bin(BinOp, Box<Node>, Box<Node>),
    Call(Func, Box<Node>),
}

/// Name bindings for a single evaluation.
///
/// Bindings are layered, later layers shadowing earlier ones, and the
/// built-in constants sit underneath every layer. A scope holds only
/// borrows, so assembling one per data point is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    layers: &'a [&'a [(&'a str, f64)]],
}

impl<'a> Scope<'a> {
    pub fn new(layers: &'a [&'a [(&'a str, f64)]]) -> Self {
        Self { layers }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.layers
            .iter()
            .rev()
            .flat_map(|layer| layer.iter().rev())
            .find_map(|(n, v)| (*n == name).then_some(*v))
            .or_else(|| constant(name))
    }
}

/// A compiled, validated expression.
///
/// Compilation parses the source into a raw tree and then lowers every node,
/// resolving call targets against the function registry. The whole tree is
/// walked before an `Expr` exists, so an invalid expression can never be
/// evaluated, not even partially.
#[derive(Debug, Clone)]
pub struct Expr {
    root: Node,
    source: String,
}

impl Expr {
    pub fn compile(source: &str) -> Result<Self, Error> {
        let ast = parse::parse(source)?;
        let root = lower(&ast)?;
        Ok(Self {
            root,
            source: source.to_string(),
        })
    }

    /// Evaluate against `scope`, yielding a finite value or an error.
    ///
    /// Unbound variables fail with [`Error::UndefinedVariable`]; any
    /// operator or function producing a non-finite value fails with
    /// [`Error::MathDomain`] naming the offender.
    pub fn eval(&self, scope: Scope) -> Result<f64, Error> {
        eval_node(&self.root, scope)
    }

    /// The free variable names, in first-occurrence order.
    ///
    /// Names that resolve as built-in constants are not free.
    pub fn variables(&self) -> Vec<String> {
        fn walk(node: &Node, out: &mut Vec<String>) {
            match node {
                Node::Num(_) => {}
                Node::Var(name) => {
                    if constant(name).is_none() && !out.iter().any(|n| n == name) {
                        out.push(name.clone());
                    }
                }
                Node::Neg(inner) => walk(inner, out),
                Node::Bin(_, lhs, rhs) => {
                    walk(lhs, out);
                    walk(rhs, out);
                }
                Node::Call(_, arg) => walk(arg, out),
            }
        }

        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}

impl FromStr for Expr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Expr::compile(s)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn lower(ast: &Ast) -> Result<Node, Error> {
    match ast {
        Ast::Num(v) => Ok(Node::Num(*v)),
        Ast::Var(name) => Ok(Node::Var(name.clone())),
        Ast::Neg(inner) => Ok(Node::Neg(Box::new(lower(inner)?))),
        Ast::Bin(op, lhs, rhs) => Ok(Node::Bin(
            *op,
            Box::new(lower(lhs)?),
            Box::new(lower(rhs)?),
        )),
        Ast::Call { name, args } => {
            let func = Func::from_name(name).ok_or_else(|| Error::UnknownFunction {
                name: name.clone(),
            })?;
            let [arg] = args.as_slice() else {
                return Err(Error::UnsupportedSyntax {
                    found: format!("{name}() with {} arguments", args.len()),
                });
            };
            Ok(Node::Call(func, Box::new(lower(arg)?)))
        }
    }
}

fn eval_node(node: &Node, scope: Scope) -> Result<f64, Error> {
    match node {
        Node::Num(v) => Ok(*v),
        Node::Var(name) => scope.get(name).ok_or_else(|| Error::UndefinedVariable {
            name: name.clone(),
        }),
        Node::Neg(inner) => Ok(-eval_node(inner, scope)?),
        Node::Bin(op, lhs, rhs) => {
            let l = eval_node(lhs, scope)?;
            let r = eval_node(rhs, scope)?;
            let v = match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => l.powf(r),
            };
            finite(v, op.symbol())
        }
        Node::Call(func, arg) => {
            let x = eval_node(arg, scope)?;
            finite(func.apply(x), func.name())
        }
    }
}

// NaN and infinity are never returned as values; they surface as a domain
// error naming the operator or function that produced them.
fn finite(v: f64, what: &str) -> Result<f64, Error> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(Error::MathDomain {
            what: what.to_string(),
        })
    }
}
