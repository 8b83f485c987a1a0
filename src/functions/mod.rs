//! Functions available to the expression-parser backend.
//!
//! Angles are in degrees, as in graphics coordinate math.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{CalcError, Result};

/// Trait for pluggable functions used by the expression parser.
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> std::ops::RangeInclusive<usize>;
    fn call(&self, args: &[f64]) -> Result<f64>;
}

/// Thread-safe function registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Function>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn with_builtins() -> Self {
        use builtins::*;
        let mut registry = Self::new();
        registry.register(Constant { name: "pi", value: std::f64::consts::PI });
        registry.register(Constant { name: "e", value: std::f64::consts::E });
        let unary: &[(&'static str, fn(f64) -> f64)] = &[
            ("abs", f64::abs),
            ("sqrt", f64::sqrt),
            ("exp", f64::exp),
            ("ln", f64::ln),
            ("log10", f64::log10),
            ("log2", f64::log2),
            ("floor", f64::floor),
            ("ceil", f64::ceil),
            ("round", f64::round),
            ("int", f64::trunc),
            ("frac", f64::fract),
            ("neg", |x: f64| -x),
            ("sign", |x: f64| if x == 0.0 { 0.0 } else { x.signum() }),
            ("deg", f64::to_degrees),
            ("rad", f64::to_radians),
            ("sin", |x: f64| x.to_radians().sin()),
            ("cos", |x: f64| x.to_radians().cos()),
            ("tan", |x: f64| x.to_radians().tan()),
            ("asin", |x: f64| x.asin().to_degrees()),
            ("acos", |x: f64| x.acos().to_degrees()),
            ("atan", |x: f64| x.atan().to_degrees()),
        ];
        for &(name, f) in unary {
            registry.register(Unary { name, f });
        }
        registry.register(Pow);
        registry.register(Atan2);
        registry.register(Mod);
        registry.register(ModPositive);
        registry.register(Veclen);
        registry.register(Min);
        registry.register(Max);
        registry
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let mut_map = Arc::make_mut(&mut self.inner);
        mut_map.insert(f.name(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.inner.keys().copied()
    }
}

pub mod builtins {
    use super::*;

    fn arg(args: &[f64], i: usize) -> f64 {
        args.get(i).copied().unwrap_or(0.0)
    }

    pub struct Constant {
        pub name: &'static str,
        pub value: f64,
    }
    impl Function for Constant {
        fn name(&self) -> &'static str { self.name }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 0..=0 }
        fn call(&self, _args: &[f64]) -> Result<f64> { Ok(self.value) }
    }

    pub struct Unary {
        pub name: &'static str,
        pub f: fn(f64) -> f64,
    }
    impl Function for Unary {
        fn name(&self) -> &'static str { self.name }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[f64]) -> Result<f64> {
            Ok((self.f)(arg(args, 0)))
        }
    }

    pub struct Pow;
    impl Function for Pow {
        fn name(&self) -> &'static str { "pow" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[f64]) -> Result<f64> { Ok(arg(args, 0).powf(arg(args, 1))) }
    }

    /// `atan2(y, x)`, in degrees.
    pub struct Atan2;
    impl Function for Atan2 {
        fn name(&self) -> &'static str { "atan2" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[f64]) -> Result<f64> {
            Ok(arg(args, 0).atan2(arg(args, 1)).to_degrees())
        }
    }

    /// Truncated remainder; takes the sign of the dividend.
    pub struct Mod;
    impl Function for Mod {
        fn name(&self) -> &'static str { "mod" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[f64]) -> Result<f64> {
            let (x, y) = (arg(args, 0), arg(args, 1));
            if y == 0.0 {
                return Err(CalcError::division_by_zero());
            }
            Ok(x % y)
        }
    }

    /// Remainder that is never negative.
    pub struct ModPositive;
    impl Function for ModPositive {
        fn name(&self) -> &'static str { "Mod" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[f64]) -> Result<f64> {
            let (x, y) = (arg(args, 0), arg(args, 1));
            if y == 0.0 {
                return Err(CalcError::division_by_zero());
            }
            Ok(x.rem_euclid(y))
        }
    }

    pub struct Veclen;
    impl Function for Veclen {
        fn name(&self) -> &'static str { "veclen" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[f64]) -> Result<f64> { Ok(arg(args, 0).hypot(arg(args, 1))) }
    }

    pub struct Min;
    impl Function for Min {
        fn name(&self) -> &'static str { "min" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=usize::MAX }
        fn call(&self, args: &[f64]) -> Result<f64> {
            Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
        }
    }

    pub struct Max;
    impl Function for Max {
        fn name(&self) -> &'static str { "max" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=usize::MAX }
        fn call(&self, args: &[f64]) -> Result<f64> {
            Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        }
    }
}
