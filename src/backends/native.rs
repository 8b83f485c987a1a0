//! Extended glue and integer arithmetic.
//!
//! Works in scaled points throughout. Lengths may carry stretch and shrink,
//! multiplication and division take an integer on the right, and division
//! rounds half away from zero. In integer context a length stands for its
//! size in scaled points.
//!
//! The free functions [`glue`] and [`count`] are also what the host's literal
//! assignment uses, so they never check engine availability.

use tracing::debug;

use super::{
    lookup_counter, lookup_length, missing_unit, unsupported, Evaluator, Scope, TargetKind, Value,
};
use crate::context::Backend;
use crate::dimen::{check_count, round_div, Dimen, Flex, Glue};
use crate::errors::{CalcError, Result};
use crate::expression::{parse_expr, BinOp, Grammar, Node};
use crate::registers::Registers;
use crate::units::{Order, Unit, UnitSpec};

pub struct Native {
    available: bool,
}

impl Native {
    pub fn new(available: bool) -> Self {
        Self { available }
    }
}

impl Evaluator for Native {
    fn backend(&self) -> Backend {
        Backend::Native
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn evaluate(&self, expr: &str, kind: TargetKind, scope: &Scope<'_>) -> Result<Value> {
        if !self.available {
            return Err(CalcError::EngineUnavailable(Backend::Native));
        }
        let node = parse_expr(expr, Grammar::NATIVE)?;
        debug!(?node, "native parse");
        Ok(match kind {
            TargetKind::Length => Value::Length(glue(&node, scope.registers)?),
            TargetKind::Counter => Value::Counter(count(&node, scope.registers)?),
        })
    }
}

/// Evaluates `node` as glue.
pub fn glue<R: Registers + ?Sized>(node: &Node, regs: &R) -> Result<Glue> {
    match node {
        Node::Dimen(n, UnitSpec::Finite(unit)) => {
            Ok(Dimen::from_numeral(n, *unit, &regs.font())?.into())
        }
        Node::Dimen(n, UnitSpec::Infinite(order)) => Err(CalcError::Parse(format!(
            "`{n}{}` is only allowed in a stretch or shrink component",
            order.keyword()
        ))),
        Node::Number(_) | Node::Counter(_) => Err(missing_unit(node)),
        Node::Glue {
            natural,
            stretch,
            shrink,
        } => Ok(Glue {
            natural: glue(natural, regs)?.natural,
            stretch: flex(stretch.as_deref(), regs)?,
            shrink: flex(shrink.as_deref(), regs)?,
        }),
        Node::Length(name) => lookup_length(regs, name),
        Node::Coefficient(n, name) => Ok(lookup_length(regs, name)?.natural.mul_numeral(n)?.into()),
        Node::Neg(inner) => Ok(-glue(inner, regs)?),
        Node::Binary(BinOp::Add, a, b) => glue(a, regs)?.checked_add(glue(b, regs)?),
        Node::Binary(BinOp::Sub, a, b) => glue(a, regs)?.checked_add(-glue(b, regs)?),
        Node::Binary(op @ (BinOp::Mul | BinOp::Div), a, b) => {
            if matches!(**a, Node::Number(_) | Node::Counter(_)) {
                return Err(CalcError::Parse(
                    "the length must come before the factor, as in `2pt*3`".into(),
                ));
            }
            let left = glue(a, regs)?;
            let factor = count(b, regs)?;
            if *op == BinOp::Mul {
                left.mul_int(factor)
            } else {
                left.div_round(factor)
            }
        }
        other => Err(unsupported(other, Grammar::NATIVE)),
    }
}

fn flex<R: Registers + ?Sized>(component: Option<&Node>, regs: &R) -> Result<Flex> {
    let Some(node) = component else {
        return Ok(Flex::default());
    };
    match node {
        Node::Dimen(n, UnitSpec::Infinite(order)) => {
            Ok(Flex::new(Dimen::from_numeral(n, Unit::Pt, &regs.font())?, *order))
        }
        Node::Neg(inner) => {
            let f = flex(Some(inner.as_ref()), regs)?;
            Ok(Flex::new(-f.amount, f.order))
        }
        other => Ok(Flex::new(glue(other, regs)?.natural, Order::Normal)),
    }
}

/// Evaluates `node` as an integer.
pub fn count<R: Registers + ?Sized>(node: &Node, regs: &R) -> Result<i64> {
    match node {
        Node::Number(n) => n.integer(),
        Node::Counter(name) => lookup_counter(regs, name),
        Node::Length(name) => Ok(lookup_length(regs, name)?.natural.sp()),
        Node::Coefficient(n, name) => Ok(lookup_length(regs, name)?.natural.mul_numeral(n)?.sp()),
        Node::Dimen(n, spec) => {
            let unit = match spec {
                UnitSpec::Finite(u) => u.keyword(),
                UnitSpec::Infinite(o) => o.keyword(),
            };
            Err(CalcError::Parse(format!(
                "unexpected unit in integer expression: `{n}{unit}`"
            )))
        }
        Node::Neg(inner) => check_count(-(count(inner, regs)? as i128)),
        Node::Binary(op @ (BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div), a, b) => {
            let a = count(a, regs)? as i128;
            let b = count(b, regs)? as i128;
            match op {
                BinOp::Add => check_count(a + b),
                BinOp::Sub => check_count(a - b),
                BinOp::Mul => check_count(a * b),
                _ if b == 0 => Err(CalcError::division_by_zero()),
                _ => check_count(round_div(a, b)),
            }
        }
        other => Err(unsupported(other, Grammar::NATIVE)),
    }
}
