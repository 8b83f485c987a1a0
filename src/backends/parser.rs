//! General-purpose floating point expression parser.
//!
//! The richest grammar: functions, constants, powers, comparisons and
//! conditionals. Lengths are measured in points. If any unit or length
//! register appears anywhere in the expression the result is taken to be in
//! points; otherwise it is a plain number and gets scaled by the default unit
//! as the last step. Bare numerals are therefore never rewritten beforehand.

use tracing::trace;

use super::{lookup_counter, lookup_length, unsupported, Evaluator, Scope, TargetKind, Value};
use crate::context::Backend;
use crate::dimen::{check_count, Dimen, Glue};
use crate::errors::{CalcError, Result};
use crate::expression::{parse_expr, BinOp, Grammar, Node};
use crate::functions::Registry;
use crate::registers::Registers;
use crate::units::{FontMetrics, Unit, UnitSpec};

/// A float, and whether a unit was involved in computing it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Quantity {
    value: f64,
    units: bool,
}

impl Quantity {
    fn plain(value: f64) -> Self {
        Self { value, units: false }
    }

    fn points(value: f64) -> Self {
        Self { value, units: true }
    }
}

pub struct ExpressionParser {
    available: bool,
    functions: Registry,
}

impl ExpressionParser {
    pub fn new(available: bool) -> Self {
        Self::with_functions(available, Registry::with_builtins())
    }

    pub fn with_functions(available: bool, functions: Registry) -> Self {
        Self { available, functions }
    }

    fn eval(&self, node: &Node, regs: &dyn Registers) -> Result<Quantity> {
        let font = regs.font();
        Ok(match node {
            Node::Number(n) => Quantity::plain(n.to_f64()),
            Node::Dimen(n, UnitSpec::Finite(unit)) => {
                Quantity::points(n.to_f64() * unit.points(&font))
            }
            Node::Dimen(n, UnitSpec::Infinite(order)) => {
                return Err(CalcError::Parse(format!(
                    "infinite unit `{n}{}` has no size",
                    order.keyword()
                )))
            }
            Node::Length(name) => Quantity::points(lookup_length(regs, name)?.natural.to_points()),
            Node::Coefficient(n, name) => {
                Quantity::points(n.to_f64() * lookup_length(regs, name)?.natural.to_points())
            }
            Node::Counter(name) => Quantity::plain(lookup_counter(regs, name)? as f64),
            Node::Neg(inner) => {
                let q = self.eval(inner, regs)?;
                Quantity { value: -q.value, ..q }
            }
            Node::Binary(op, a, b) => {
                let a = self.eval(a, regs)?;
                let b = self.eval(b, regs)?;
                let value = match op {
                    BinOp::Add => a.value + b.value,
                    BinOp::Sub => a.value - b.value,
                    BinOp::Mul => a.value * b.value,
                    BinOp::Div if b.value == 0.0 => return Err(CalcError::division_by_zero()),
                    BinOp::Div => a.value / b.value,
                    BinOp::Pow => a.value.powf(b.value),
                    BinOp::Lt => truth(a.value < b.value),
                    BinOp::Gt => truth(a.value > b.value),
                    BinOp::Le => truth(a.value <= b.value),
                    BinOp::Ge => truth(a.value >= b.value),
                    BinOp::Eq => truth(a.value == b.value),
                    BinOp::Ne => truth(a.value != b.value),
                };
                Quantity {
                    value,
                    units: a.units || b.units,
                }
            }
            Node::Call { name, args } => {
                let f = self
                    .functions
                    .get(name)
                    .ok_or_else(|| CalcError::UndefinedReference(format!("function `{name}`")))?;
                if !f.arity().contains(&args.len()) {
                    return Err(CalcError::Parse(format!(
                        "`{name}` takes {} argument(s), got {}",
                        describe_arity(f.arity()),
                        args.len()
                    )));
                }
                let mut units = false;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let q = self.eval(arg, regs)?;
                    units |= q.units;
                    values.push(q.value);
                }
                Quantity {
                    value: f.call(&values)?,
                    units,
                }
            }
            Node::Conditional(cond, then, otherwise) => {
                let c = self.eval(cond, regs)?;
                let branch = if c.value != 0.0 { then } else { otherwise };
                let q = self.eval(branch, regs)?;
                Quantity {
                    units: c.units || q.units,
                    ..q
                }
            }
            other => return Err(unsupported(other, Grammar::PARSER)),
        })
    }
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn describe_arity(range: std::ops::RangeInclusive<usize>) -> String {
    if range.start() == range.end() {
        range.start().to_string()
    } else if *range.end() == usize::MAX {
        format!("at least {}", range.start())
    } else {
        format!("{} to {}", range.start(), range.end())
    }
}

/// Size in points of the configured default unit; any unit keyword is accepted.
fn default_unit_points(unit: &str, font: &FontMetrics) -> Result<f64> {
    Unit::lookup(unit.trim())
        .map(|u| u.points(font))
        .ok_or_else(|| CalcError::Parse(format!("illegal unit of measure `{unit}`")))
}

impl Evaluator for ExpressionParser {
    fn backend(&self) -> Backend {
        Backend::Parser
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn uses_unit_defaulting(&self) -> bool {
        false
    }

    fn evaluate(&self, expr: &str, kind: TargetKind, scope: &Scope<'_>) -> Result<Value> {
        if !self.available {
            return Err(CalcError::EngineUnavailable(Backend::Parser));
        }
        let node = parse_expr(expr, Grammar::PARSER)?;
        let q = self.eval(&node, scope.registers)?;
        trace!(value = q.value, units = q.units, "parser result");
        if !q.value.is_finite() {
            return Err(CalcError::Arithmetic(format!("`{expr}` is not a finite number")));
        }
        match kind {
            TargetKind::Length => {
                let points = match (q.units, scope.default_unit()) {
                    (false, Some(unit)) => {
                        q.value * default_unit_points(unit, &scope.registers.font())?
                    }
                    _ => q.value,
                };
                Ok(Value::Length(Glue::rigid(Dimen::from_points(points)?)))
            }
            TargetKind::Counter => Ok(Value::Counter(check_count(q.value.trunc() as i128)?)),
        }
    }
}
