use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backends::{Compat, Evaluator, ExpressionParser, Native, Scope, TargetKind, Value};
use crate::context::{parse_options, Backend, Context, Engines, Setting, Settings};
use crate::defaulting::Defaulted;
use crate::dimen::{check_count, Dimen, Glue};
use crate::errors::{CalcError, Result};
use crate::functions::Registry;
use crate::overwrite::Overwriting;
use crate::registers::{current_counter, current_length, CounterRef, LengthRef, Registers};
use crate::units::Unit;

/// Point-to-big-point correction applied by [`Calculator::scale_to_unit`].
pub const BP_CORRECTION: f64 = 0.99626;

/// Evaluator dispatch: the shared configuration plus one adapter per backend.
///
/// Clones share configuration, so a backend switch through one handle is seen
/// by all of them.
#[derive(Clone)]
pub struct Calculator {
    context: Context,
    evaluators: Arc<HashMap<Backend, Arc<dyn Evaluator>>>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(Engines::default())
    }
}

impl Calculator {
    pub fn new(engines: Engines) -> Self {
        Self::with_settings(Settings::with_engines(engines))
    }

    /// Starts from a stored configuration, e.g. one read from JSON.
    pub fn with_settings(settings: Settings) -> Self {
        let engines = settings.engines;
        Self::build(settings, ExpressionParser::new(engines.parser))
    }

    /// Like [`Calculator::new`] with a custom function table for the parser backend.
    pub fn with_parser_functions(engines: Engines, functions: Registry) -> Self {
        Self::build(
            Settings::with_engines(engines),
            ExpressionParser::with_functions(engines.parser, functions),
        )
    }

    fn build(settings: Settings, parser: ExpressionParser) -> Self {
        let native = Native::new(settings.engines.native);
        let evaluators: [Arc<dyn Evaluator>; 3] = [
            Arc::new(Defaulted::new(native)),
            Arc::new(Defaulted::new(Compat)),
            Arc::new(parser),
        ];
        let evaluators: HashMap<_, _> = evaluators.into_iter().map(|e| (e.backend(), e)).collect();
        Self {
            context: Context::new(settings),
            evaluators: Arc::new(evaluators),
        }
    }

    pub fn select_backend(&self, backend: Backend) -> Result<()> {
        self.context.update(&[Setting::Backend(backend)])?;
        info!(%backend, "backend selected");
        Ok(())
    }

    /// Any token is accepted; a bad unit fails when an expression uses it.
    pub fn set_default_unit(&self, unit: impl Into<String>) {
        let unit = unit.into();
        info!(%unit, "default unit set");
        self.context.set_default_unit(unit);
    }

    /// Routes the host's literal assignments through this calculator, for
    /// every [`Overwriting`] handle sharing this configuration.
    pub fn enable_override(&self) {
        self.context.set_overwrite(true);
        warn!("assignment override enabled, host assignments now evaluate expressions");
    }

    pub fn disable_override(&self) {
        self.context.set_overwrite(false);
        info!("assignment override disabled");
    }

    /// Applies `backend=..., defaultunit=..., overwrite` all at once or not at all.
    pub fn configure(&self, options: &str) -> Result<Settings> {
        let changes = parse_options(options)?;
        let settings = self.context.update(&changes)?;
        info!(?settings, "configured");
        if changes.contains(&Setting::Overwrite(true)) {
            warn!("assignment override enabled, host assignments now evaluate expressions");
        }
        Ok(settings)
    }

    pub fn settings(&self) -> Settings {
        self.context.snapshot()
    }

    pub fn evaluator(&self, backend: Backend) -> Result<Arc<dyn Evaluator>> {
        self.evaluators
            .get(&backend)
            .cloned()
            .ok_or(CalcError::EngineUnavailable(backend))
    }

    /// Evaluates against one configuration snapshot, establishing the default
    /// backend on first use.
    pub fn evaluate(&self, regs: &dyn Registers, expr: &str, kind: TargetKind) -> Result<Value> {
        self.evaluate_with(&self.context.resolve(), regs, expr, kind)
    }

    pub fn evaluate_with(
        &self,
        settings: &Settings,
        regs: &dyn Registers,
        expr: &str,
        kind: TargetKind,
    ) -> Result<Value> {
        let backend = settings.active_backend();
        debug!(%backend, expr, ?kind, unit = %settings.default_unit, "evaluating");
        let evaluator = self.evaluator(backend)?;
        if !evaluator.is_available() {
            return Err(CalcError::EngineUnavailable(backend));
        }
        evaluator.evaluate(expr, kind, &Scope::new(regs, &settings.default_unit))
    }

    pub fn evaluate_length(&self, regs: &dyn Registers, expr: &str) -> Result<Glue> {
        as_length(self.evaluate(regs, expr, TargetKind::Length)?)
    }

    pub fn evaluate_counter(&self, regs: &dyn Registers, expr: &str) -> Result<i64> {
        as_counter(self.evaluate(regs, expr, TargetKind::Counter)?)
    }

    pub fn assign_length<R: Registers>(
        &self,
        regs: &mut R,
        target: &LengthRef,
        expr: &str,
    ) -> Result<()> {
        current_length(&*regs, target)?;
        let value = self.evaluate_length(&*regs, expr)?;
        regs.store_length(target, value)
    }

    pub fn add_length<R: Registers>(
        &self,
        regs: &mut R,
        target: &LengthRef,
        expr: &str,
    ) -> Result<()> {
        let current = current_length(&*regs, target)?;
        let value = self.evaluate_length(&*regs, expr)?;
        regs.store_length(target, current.checked_add(value)?)
    }

    pub fn assign_counter<R: Registers>(
        &self,
        regs: &mut R,
        target: &CounterRef,
        expr: &str,
    ) -> Result<()> {
        current_counter(&*regs, target)?;
        let value = self.evaluate_counter(&*regs, expr)?;
        regs.store_counter(target, value)
    }

    pub fn add_counter<R: Registers>(
        &self,
        regs: &mut R,
        target: &CounterRef,
        expr: &str,
    ) -> Result<()> {
        let current = current_counter(&*regs, target)?;
        let value = self.evaluate_counter(&*regs, expr)?;
        regs.store_counter(target, check_count(current as i128 + value as i128)?)
    }

    /// Writes `expr`, measured in `unit` and corrected by [`BP_CORRECTION`],
    /// into `target` as a bare number. Bare numerals in `expr` are read in `unit`.
    pub fn scale_to_unit(
        &self,
        regs: &dyn Registers,
        target: &mut String,
        expr: &str,
        unit: &str,
    ) -> Result<()> {
        let measure = Unit::lookup(unit.trim())
            .ok_or_else(|| CalcError::Parse(format!("illegal unit of measure `{unit}`")))?;
        let mut settings = self.context.resolve();
        settings.default_unit = unit.trim().to_string();
        let length = as_length(self.evaluate_with(&settings, regs, expr, TargetKind::Length)?)?;
        let in_unit = length.natural.in_unit(measure, &regs.font());
        let corrected = (in_unit as f64 * BP_CORRECTION).round();
        *target = Dimen::checked(corrected as i128)?.strip_pt();
        debug!(expr, unit, result = %target, "scaled to unit");
        Ok(())
    }

    /// Wraps the host's assignment primitives; see [`Overwriting`].
    pub fn install<R>(&self, host: R) -> Overwriting<R> {
        Overwriting::new(self.clone(), host)
    }
}

fn as_length(value: Value) -> Result<Glue> {
    value
        .as_length()
        .ok_or_else(|| CalcError::Parse(format!("expected a length, got `{value}`")))
}

fn as_counter(value: Value) -> Result<i64> {
    value
        .as_counter()
        .ok_or_else(|| CalcError::Parse(format!("expected an integer, got `{value}`")))
}
