//! Host-side storage: named length and counter registers, and the host's own
//! literal-only assignment primitives.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backends::native;
use crate::dimen::{check_count, Dimen, Glue};
use crate::errors::{CalcError, Result};
use crate::expression::parse_literal;
use crate::units::FontMetrics;

fn register_name(name: impl Into<String>) -> String {
    let name = name.into();
    match name.strip_prefix('\\') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// Target reference to a length register. A leading backslash is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LengthRef(String);

impl LengthRef {
    pub fn new(name: impl Into<String>) -> Self {
        LengthRef(register_name(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LengthRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\{}", self.0)
    }
}

/// Target reference to a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterRef(String);

impl CounterRef {
    pub fn new(name: impl Into<String>) -> Self {
        CounterRef(register_name(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read/write access to the host's registers.
pub trait Registers {
    fn length(&self, name: &str) -> Option<Glue>;
    fn counter(&self, name: &str) -> Option<i64>;
    /// Fails with `UndefinedReference` when the target was never declared.
    fn store_length(&mut self, target: &LengthRef, value: Glue) -> Result<()>;
    fn store_counter(&mut self, target: &CounterRef, value: i64) -> Result<()>;

    fn font(&self) -> FontMetrics {
        FontMetrics::default()
    }
}

/// The four assignment entry points calling code uses.
pub trait Assign {
    fn set_length(&mut self, target: &LengthRef, expr: &str) -> Result<()>;
    fn add_to_length(&mut self, target: &LengthRef, expr: &str) -> Result<()>;
    fn set_counter(&mut self, target: &CounterRef, expr: &str) -> Result<()>;
    fn add_to_counter(&mut self, target: &CounterRef, expr: &str) -> Result<()>;
}

pub(crate) fn current_length<R: Registers + ?Sized>(regs: &R, target: &LengthRef) -> Result<Glue> {
    regs.length(target.name())
        .ok_or_else(|| CalcError::UndefinedReference(format!("length {target}")))
}

pub(crate) fn current_counter<R: Registers + ?Sized>(regs: &R, target: &CounterRef) -> Result<i64> {
    regs.counter(target.name())
        .ok_or_else(|| CalcError::UndefinedReference(format!("counter {target}")))
}

/// In-memory register file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterBank {
    lengths: BTreeMap<String, Glue>,
    counters: BTreeMap<String, i64>,
    #[serde(default)]
    font: FontMetrics,
}

impl RegisterBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registers a standard 10pt article declares, with its values.
    pub fn with_latex_defaults() -> Self {
        let pt = |p: i64| Glue::rigid(Dimen::from_sp(p * crate::dimen::UNITY));
        let mut bank = Self::new();
        for (name, value) in [
            ("textwidth", pt(345)),
            ("linewidth", pt(345)),
            ("columnwidth", pt(345)),
            ("textheight", pt(550)),
            ("parindent", pt(15)),
            ("baselineskip", pt(12)),
            ("columnsep", pt(10)),
            ("tabcolsep", pt(6)),
            ("fboxsep", pt(3)),
            ("fboxrule", Glue::rigid(Dimen::from_sp(26_214))),
            ("unitlength", pt(1)),
        ] {
            bank.lengths.insert(name.to_string(), value);
        }
        bank.lengths.insert(
            "parskip".to_string(),
            Glue {
                stretch: crate::dimen::Flex::new(
                    Dimen::from_sp(crate::dimen::UNITY),
                    Default::default(),
                ),
                ..Glue::default()
            },
        );
        for name in ["section", "subsection", "equation", "figure", "table", "footnote", "enumi"] {
            bank.counters.insert(name.to_string(), 0);
        }
        bank.counters.insert("page".to_string(), 1);
        bank
    }

    /// Declares a length register initialised to zero; redeclaring keeps the value.
    pub fn new_length(&mut self, name: impl Into<String>) -> LengthRef {
        let target = LengthRef::new(name);
        self.lengths.entry(target.name().to_string()).or_default();
        target
    }

    pub fn new_counter(&mut self, name: impl Into<String>) -> CounterRef {
        let target = CounterRef::new(name);
        self.counters.entry(target.name().to_string()).or_insert(0);
        target
    }

    pub fn set_font(&mut self, font: FontMetrics) {
        self.font = font;
    }
}

impl Registers for RegisterBank {
    fn length(&self, name: &str) -> Option<Glue> {
        self.lengths.get(name).copied()
    }

    fn counter(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }

    fn store_length(&mut self, target: &LengthRef, value: Glue) -> Result<()> {
        match self.lengths.get_mut(target.name()) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CalcError::UndefinedReference(format!("length {target}"))),
        }
    }

    fn store_counter(&mut self, target: &CounterRef, value: i64) -> Result<()> {
        match self.counters.get_mut(target.name()) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CalcError::UndefinedReference(format!("counter {target}"))),
        }
    }

    fn font(&self) -> FontMetrics {
        self.font
    }
}

/// Literal-only: one operand per assignment, as the host itself scans it.
impl Assign for RegisterBank {
    fn set_length(&mut self, target: &LengthRef, expr: &str) -> Result<()> {
        current_length(self, target)?;
        let value = native::glue(&parse_literal(expr)?, self)?;
        self.store_length(target, value)
    }

    fn add_to_length(&mut self, target: &LengthRef, expr: &str) -> Result<()> {
        let current = current_length(self, target)?;
        let value = native::glue(&parse_literal(expr)?, self)?;
        self.store_length(target, current.checked_add(value)?)
    }

    fn set_counter(&mut self, target: &CounterRef, expr: &str) -> Result<()> {
        current_counter(self, target)?;
        let value = native::count(&parse_literal(expr)?, self)?;
        self.store_counter(target, value)
    }

    fn add_to_counter(&mut self, target: &CounterRef, expr: &str) -> Result<()> {
        let current = current_counter(self, target)?;
        let value = native::count(&parse_literal(expr)?, self)?;
        self.store_counter(target, check_count(current as i128 + value as i128)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_assignment() {
        let mut bank = RegisterBank::with_latex_defaults();
        let gap = bank.new_length("\\gap");
        bank.set_length(&gap, "1.5pt plus 1fil").unwrap();
        assert_eq!(bank.length("gap").unwrap().to_string(), "1.5pt plus 1.0fil");
        bank.add_to_length(&gap, "-\\parindent").unwrap();
        assert_eq!(bank.length("gap").unwrap().to_string(), "-13.5pt plus 1.0fil");
    }

    #[test]
    fn literal_assignment_rejects_arithmetic() {
        let mut bank = RegisterBank::new();
        let gap = bank.new_length("gap");
        assert!(matches!(bank.set_length(&gap, "1pt+2pt"), Err(CalcError::Parse(_))));
        assert_eq!(bank.length("gap"), Some(Glue::default()));
    }

    #[test]
    fn counters_by_literal() {
        let mut bank = RegisterBank::with_latex_defaults();
        let c = bank.new_counter("c");
        bank.set_counter(&c, "\\value{page}").unwrap();
        bank.add_to_counter(&c, "-3").unwrap();
        assert_eq!(bank.counter("c"), Some(-2));
    }

    #[test]
    fn font_relative_units() {
        let mut bank = RegisterBank::new();
        let indent = bank.new_length("indent");
        bank.set_length(&indent, "2em").unwrap();
        assert_eq!(bank.length("indent").unwrap().to_string(), "20.0pt");
        bank.set_font(FontMetrics {
            em: Dimen::from_sp(12 * crate::dimen::UNITY),
            ex: Dimen::from_sp(5 * crate::dimen::UNITY),
        });
        bank.set_length(&indent, "2em").unwrap();
        assert_eq!(bank.length("indent").unwrap().to_string(), "24.0pt");
        bank.add_to_length(&indent, "1ex").unwrap();
        assert_eq!(bank.length("indent").unwrap().to_string(), "29.0pt");
    }

    #[test]
    fn undeclared_target() {
        let mut bank = RegisterBank::new();
        let err = bank.set_length(&LengthRef::new("nope"), "1pt").unwrap_err();
        assert_eq!(err, CalcError::UndefinedReference("length \\nope".into()));
    }
}
