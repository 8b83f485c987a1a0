//! The interchangeable arithmetic engines.
//!
//! Each adapter turns an expression string into a [`Value`] for a given
//! [`TargetKind`]. They agree on the contract and differ in grammar,
//! precision and failure modes; see the individual modules.

pub mod compat;
pub mod native;
pub mod parser;

use std::fmt;

use serde::Serialize;

use crate::context::Backend;
use crate::defaulting::NO_DEFAULT_UNIT;
use crate::dimen::Glue;
use crate::errors::{CalcError, Result};
use crate::expression::{Grammar, Node};
use crate::registers::Registers;

pub use compat::Compat;
pub use native::Native;
pub use parser::ExpressionParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Length,
    Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Length(Glue),
    Counter(i64),
}

impl Value {
    pub fn as_length(self) -> Option<Glue> {
        match self {
            Value::Length(g) => Some(g),
            Value::Counter(_) => None,
        }
    }

    pub fn as_counter(self) -> Option<i64> {
        match self {
            Value::Counter(n) => Some(n),
            Value::Length(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Length(g) => write!(f, "{g}"),
            Value::Counter(n) => write!(f, "{n}"),
        }
    }
}

/// Everything an evaluator may consult besides the expression itself.
pub struct Scope<'a> {
    pub registers: &'a dyn Registers,
    pub default_unit: &'a str,
}

impl<'a> Scope<'a> {
    pub fn new(registers: &'a dyn Registers, default_unit: &'a str) -> Self {
        Self {
            registers,
            default_unit,
        }
    }

    /// The configured default unit, or `None` when defaulting is switched off.
    pub fn default_unit(&self) -> Option<&'a str> {
        if self.default_unit == NO_DEFAULT_UNIT {
            None
        } else {
            Some(self.default_unit)
        }
    }
}

/// Common interface of the arithmetic backends.
pub trait Evaluator: Send + Sync {
    fn backend(&self) -> Backend;

    /// Whether the engine behind this adapter exists in the host.
    fn is_available(&self) -> bool {
        true
    }

    /// Whether bare numerals should get the default unit appended before
    /// this evaluator sees them.
    fn uses_unit_defaulting(&self) -> bool {
        true
    }

    fn evaluate(&self, expr: &str, kind: TargetKind, scope: &Scope<'_>) -> Result<Value>;
}

impl<E: Evaluator + ?Sized> Evaluator for std::sync::Arc<E> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn uses_unit_defaulting(&self) -> bool {
        (**self).uses_unit_defaulting()
    }

    fn evaluate(&self, expr: &str, kind: TargetKind, scope: &Scope<'_>) -> Result<Value> {
        (**self).evaluate(expr, kind, scope)
    }
}

pub(crate) fn lookup_length<R: Registers + ?Sized>(regs: &R, name: &str) -> Result<Glue> {
    regs.length(name)
        .ok_or_else(|| CalcError::UndefinedReference(format!("length \\{name}")))
}

pub(crate) fn lookup_counter<R: Registers + ?Sized>(regs: &R, name: &str) -> Result<i64> {
    regs.counter(name)
        .ok_or_else(|| CalcError::UndefinedReference(format!("counter {name}")))
}

/// Message for a construct a backend's evaluator cannot handle.
pub(crate) fn unsupported(node: &Node, grammar: Grammar) -> CalcError {
    let what = match node {
        Node::Real(_) => "`\\real`".to_string(),
        Node::Ratio(..) => "`\\ratio`".to_string(),
        Node::Call { name, .. } => format!("function `{name}`"),
        Node::Conditional(..) => "`?:`".to_string(),
        Node::Glue { .. } => "stretch and shrink".to_string(),
        Node::Binary(op, ..) => format!("operator {op:?}"),
        other => format!("{other:?}"),
    };
    CalcError::Parse(format!("{what} is not supported by the {} backend", grammar.name))
}

pub(crate) fn missing_unit(node: &Node) -> CalcError {
    match node {
        Node::Number(n) => CalcError::Parse(format!("missing unit of measure after `{n}`")),
        Node::Counter(name) => {
            CalcError::Parse(format!("missing unit of measure after `\\value{{{name}}}`"))
        }
        other => CalcError::Parse(format!("expected a length, found {other:?}")),
    }
}
