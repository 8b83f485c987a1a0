//! Default unit for bare numerals.
//!
//! A length expression that is nothing but a number, such as `12` or `-0.5`,
//! is rewritten to carry the configured default unit before the backend sees
//! it. Anything else (operators, units, references) passes through
//! byte-for-byte. Counters never get a unit.

use std::borrow::Cow;

use tracing::trace;

use crate::backends::{Evaluator, Scope, TargetKind, Value};
use crate::context::Backend;
use crate::dimen::Numeral;
use crate::errors::Result;

/// Setting the default unit to this switches defaulting off.
pub const NO_DEFAULT_UNIT: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Optionally signed decimal, no unit, no operator
    BareNumeral,
    Compound,
}

pub fn classify(expr: &str) -> Classification {
    let trimmed = expr.trim();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    if Numeral::parse(unsigned).is_some() {
        Classification::BareNumeral
    } else {
        Classification::Compound
    }
}

/// `12` with `bp` becomes `12bp`; compound expressions are returned as given.
pub fn apply_default_unit<'e>(expr: &'e str, unit: &str) -> Cow<'e, str> {
    if unit == NO_DEFAULT_UNIT {
        return Cow::Borrowed(expr);
    }
    match classify(expr) {
        Classification::BareNumeral => Cow::Owned(format!("{}{}", expr.trim(), unit)),
        Classification::Compound => Cow::Borrowed(expr),
    }
}

/// Wraps an evaluator so bare length numerals get the scope's default unit.
/// Evaluators that scale by the default unit themselves are left alone.
pub struct Defaulted<E> {
    inner: E,
}

impl<E: Evaluator> Defaulted<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E: Evaluator> Evaluator for Defaulted<E> {
    fn backend(&self) -> Backend {
        self.inner.backend()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn uses_unit_defaulting(&self) -> bool {
        self.inner.uses_unit_defaulting()
    }

    fn evaluate(&self, expr: &str, kind: TargetKind, scope: &Scope<'_>) -> Result<Value> {
        if kind != TargetKind::Length || !self.inner.uses_unit_defaulting() {
            return self.inner.evaluate(expr, kind, scope);
        }
        let expr = apply_default_unit(expr, scope.default_unit);
        if let Cow::Owned(rewritten) = &expr {
            trace!(%rewritten, "default unit applied");
        }
        self.inner.evaluate(&expr, kind, scope)
    }
}
