//! The assignment override.
//!
//! [`Overwriting`] wraps a host and stands in for it wherever the host's four
//! assignment primitives are called. While the calculator's `overwrite` flag
//! is on, every call goes through the calculator (default unit, active
//! backend); while it is off, the host's literal-only behaviour is used. The
//! flag is read on every call, so toggling it through any handle sharing the
//! configuration takes effect immediately.

use tracing::trace;

use crate::dimen::Glue;
use crate::engine::Calculator;
use crate::errors::Result;
use crate::registers::{Assign, CounterRef, LengthRef, Registers};
use crate::units::FontMetrics;

pub struct Overwriting<R> {
    calculator: Calculator,
    host: R,
}

impl<R> Overwriting<R> {
    pub fn new(calculator: Calculator, host: R) -> Self {
        Self { calculator, host }
    }

    pub fn host(&self) -> &R {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut R {
        &mut self.host
    }

    pub fn into_inner(self) -> R {
        self.host
    }

    pub fn is_active(&self) -> bool {
        self.calculator.settings().overwrite
    }
}

impl<R: Registers + Assign> Assign for Overwriting<R> {
    fn set_length(&mut self, target: &LengthRef, expr: &str) -> Result<()> {
        if self.is_active() {
            trace!(%target, expr, "set_length overridden");
            self.calculator.assign_length(&mut self.host, target, expr)
        } else {
            self.host.set_length(target, expr)
        }
    }

    fn add_to_length(&mut self, target: &LengthRef, expr: &str) -> Result<()> {
        if self.is_active() {
            trace!(%target, expr, "add_to_length overridden");
            self.calculator.add_length(&mut self.host, target, expr)
        } else {
            self.host.add_to_length(target, expr)
        }
    }

    fn set_counter(&mut self, target: &CounterRef, expr: &str) -> Result<()> {
        if self.is_active() {
            trace!(%target, expr, "set_counter overridden");
            self.calculator.assign_counter(&mut self.host, target, expr)
        } else {
            self.host.set_counter(target, expr)
        }
    }

    fn add_to_counter(&mut self, target: &CounterRef, expr: &str) -> Result<()> {
        if self.is_active() {
            trace!(%target, expr, "add_to_counter overridden");
            self.calculator.add_counter(&mut self.host, target, expr)
        } else {
            self.host.add_to_counter(target, expr)
        }
    }
}

impl<R: Registers> Registers for Overwriting<R> {
    fn length(&self, name: &str) -> Option<Glue> {
        self.host.length(name)
    }

    fn counter(&self, name: &str) -> Option<i64> {
        self.host.counter(name)
    }

    fn store_length(&mut self, target: &LengthRef, value: Glue) -> Result<()> {
        self.host.store_length(target, value)
    }

    fn store_counter(&mut self, target: &CounterRef, value: i64) -> Result<()> {
        self.host.store_counter(target, value)
    }

    fn font(&self) -> FontMetrics {
        self.host.font()
    }
}
