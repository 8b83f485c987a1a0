//! Arithmetic in the style of the `calc` macro package.
//!
//! Always available. Results are rigid lengths: there is no stretch or
//! shrink syntax and references contribute their natural width only. The
//! factor of a product must follow the length and is an integer, a counter,
//! `\real{decimal}` or `\ratio{length}{length}`. Integer division truncates.

use super::{
    lookup_counter, lookup_length, missing_unit, unsupported, Evaluator, Scope, TargetKind, Value,
};
use crate::context::Backend;
use crate::dimen::{check_count, Dimen, Glue, UNITY};
use crate::errors::{CalcError, Result};
use crate::expression::{parse_expr, BinOp, Grammar, Node};
use crate::registers::Registers;
use crate::units::UnitSpec;

#[derive(Debug, Default)]
pub struct Compat;

impl Evaluator for Compat {
    fn backend(&self) -> Backend {
        Backend::Compat
    }

    fn evaluate(&self, expr: &str, kind: TargetKind, scope: &Scope<'_>) -> Result<Value> {
        let node = parse_expr(expr, Grammar::COMPAT)?;
        Ok(match kind {
            TargetKind::Length => Value::Length(Glue::rigid(length(&node, scope.registers)?)),
            TargetKind::Counter => Value::Counter(count(&node, scope.registers)?),
        })
    }
}

fn is_factor(node: &Node) -> bool {
    matches!(node, Node::Number(_) | Node::Counter(_) | Node::Real(_) | Node::Ratio(..))
}

fn length<R: Registers + ?Sized>(node: &Node, regs: &R) -> Result<Dimen> {
    match node {
        Node::Dimen(n, UnitSpec::Finite(unit)) => Dimen::from_numeral(n, *unit, &regs.font()),
        Node::Dimen(n, UnitSpec::Infinite(order)) => Err(CalcError::Parse(format!(
            "infinite unit `{n}{}` is not supported by the compat backend",
            order.keyword()
        ))),
        Node::Number(_) | Node::Counter(_) => Err(missing_unit(node)),
        Node::Length(name) => Ok(lookup_length(regs, name)?.natural),
        Node::Coefficient(n, name) => lookup_length(regs, name)?.natural.mul_numeral(n),
        Node::Neg(inner) => Ok(-length(inner, regs)?),
        Node::Binary(BinOp::Add, a, b) => length(a, regs)?.checked_add(length(b, regs)?),
        Node::Binary(BinOp::Sub, a, b) => length(a, regs)?.checked_add(-length(b, regs)?),
        Node::Binary(op @ (BinOp::Mul | BinOp::Div), a, b) => {
            if is_factor(a) {
                return Err(CalcError::Parse(
                    "the length must come before the factor, as in `\\textwidth*\\real{0.5}`".into(),
                ));
            }
            let left = length(a, regs)?;
            match (op, &**b) {
                (BinOp::Mul, Node::Real(n)) => left.mul_numeral(n),
                (BinOp::Div, Node::Real(n)) => left.scale(UNITY as i128, n.scaled()?),
                (BinOp::Mul, Node::Ratio(num, den)) => {
                    left.scale(length(num, regs)?.sp() as i128, length(den, regs)?.sp() as i128)
                }
                (BinOp::Div, Node::Ratio(num, den)) => {
                    left.scale(length(den, regs)?.sp() as i128, length(num, regs)?.sp() as i128)
                }
                (BinOp::Mul, factor) => left.mul_int(count(factor, regs)?),
                (_, factor) => left.div_trunc(count(factor, regs)?),
            }
        }
        Node::Real(_) | Node::Ratio(..) => Err(CalcError::Parse(
            "`\\real` and `\\ratio` may only follow `*` or `/`".into(),
        )),
        other => Err(unsupported(other, Grammar::COMPAT)),
    }
}

fn count<R: Registers + ?Sized>(node: &Node, regs: &R) -> Result<i64> {
    match node {
        Node::Number(n) => n.integer(),
        Node::Counter(name) => lookup_counter(regs, name),
        Node::Length(name) => Ok(lookup_length(regs, name)?.natural.sp()),
        Node::Coefficient(n, name) => Ok(lookup_length(regs, name)?.natural.mul_numeral(n)?.sp()),
        Node::Dimen(n, _) => Err(CalcError::Parse(format!(
            "unexpected unit after `{n}` in integer expression"
        ))),
        Node::Neg(inner) => check_count(-(count(inner, regs)? as i128)),
        Node::Binary(BinOp::Add, a, b) => {
            check_count(count(a, regs)? as i128 + count(b, regs)? as i128)
        }
        Node::Binary(BinOp::Sub, a, b) => {
            check_count(count(a, regs)? as i128 - count(b, regs)? as i128)
        }
        Node::Binary(op @ (BinOp::Mul | BinOp::Div), a, b) => {
            let left = count(a, regs)? as i128;
            match (op, &**b) {
                (BinOp::Mul, Node::Real(n)) => check_count(left * n.scaled()? / UNITY as i128),
                (BinOp::Div, Node::Real(n)) => {
                    let scaled = n.scaled()?;
                    if scaled == 0 {
                        return Err(CalcError::division_by_zero());
                    }
                    check_count(left * UNITY as i128 / scaled)
                }
                (BinOp::Mul, factor) => check_count(left * count(factor, regs)? as i128),
                (_, factor) => {
                    let divisor = count(factor, regs)? as i128;
                    if divisor == 0 {
                        return Err(CalcError::division_by_zero());
                    }
                    check_count(left / divisor)
                }
            }
        }
        other => Err(unsupported(other, Grammar::COMPAT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::RegisterBank;
    use pretty_assertions::assert_eq;

    fn eval(expr: &str, kind: TargetKind) -> Result<Value> {
        let bank = RegisterBank::with_latex_defaults();
        Compat.evaluate(expr, kind, &Scope::new(&bank, "bp"))
    }

    #[test]
    fn calc_style_factors() {
        let len = |e: &str| eval(e, TargetKind::Length).unwrap().to_string();
        assert_eq!(len("\\textwidth*\\real{0.5}"), "172.5pt");
        assert_eq!(len("\\textwidth/\\real{2}"), "172.5pt");
        assert_eq!(len("1in*\\ratio{\\textwidth}{\\textwidth}"), "72.27pt");
        assert_eq!(len("(\\textwidth - 45pt)/4"), "75.0pt");
        assert_eq!(len("10pt*\\value{page}"), "10.0pt");
    }

    #[test]
    fn references_lose_stretch() {
        let out = eval("\\parskip + 1pt", TargetKind::Length).unwrap();
        assert!(out.as_length().is_some_and(|g| g.is_rigid()));
        assert_eq!(out, Value::Length(Glue::rigid(Dimen::from_sp(UNITY))));
    }

    #[test]
    fn division_truncates() {
        assert_eq!(eval("7/2", TargetKind::Counter).unwrap(), Value::Counter(3));
        assert_eq!(eval("-7/2", TargetKind::Counter).unwrap(), Value::Counter(-3));
        assert_eq!(eval("10*\\real{1.55}", TargetKind::Counter).unwrap(), Value::Counter(15));
    }

    #[test]
    fn oversized_real_factor() {
        let out = eval("2000000000*\\real{999999999999999999999999999999}", TargetKind::Counter);
        assert!(matches!(out, Err(CalcError::Arithmetic(_))));
        let out = eval("1pt/\\real{99999999999}", TargetKind::Length);
        assert!(matches!(out, Err(CalcError::Arithmetic(_))));
    }

    #[test]
    fn restricted_grammar() {
        assert!(matches!(eval("1pt plus 1fil", TargetKind::Length), Err(CalcError::Parse(_))));
        assert!(matches!(eval("2*\\textwidth", TargetKind::Length), Err(CalcError::Parse(_))));
        assert!(matches!(eval("\\real{2}", TargetKind::Length), Err(CalcError::Parse(_))));
        assert!(matches!(eval("12", TargetKind::Length), Err(CalcError::Parse(_))));
    }
}
