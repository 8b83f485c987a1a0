pub mod backends;
pub mod context;
pub mod defaulting;
pub mod dimen;
pub mod engine;
pub mod errors;
pub mod expression;
pub mod functions; // parser-backend function table
pub mod overwrite;
pub mod registers;
pub mod units;
mod parser;

use std::sync::OnceLock;

pub use backends::{Evaluator, TargetKind, Value};
pub use context::{Backend, Engines, Settings};
pub use dimen::{Dimen, Glue};
pub use engine::{Calculator, BP_CORRECTION};
pub use errors::{CalcError, Result};
pub use overwrite::Overwriting;
pub use registers::{Assign, CounterRef, LengthRef, RegisterBank, Registers};

/// Process-wide calculator with every engine available. Prefer passing a
/// [`Calculator`] explicitly; this is for the outermost layer of a program.
pub fn global() -> &'static Calculator {
    static GLOBAL: OnceLock<Calculator> = OnceLock::new();
    GLOBAL.get_or_init(Calculator::default)
}
