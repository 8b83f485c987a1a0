//! Configuration: which backend is active, the default unit, and whether the
//! host's assignment primitives are overridden.
//!
//! [`Context`] is the shared registry. Readers take a whole [`Settings`]
//! snapshot under one lock, so a backend switch and a default-unit change made
//! together are never observed half-applied.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use itertools::Itertools;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Extended glue/integer arithmetic built into the host
    Native,
    /// Macro-package arithmetic, available everywhere
    Compat,
    /// Floating point expression parser
    Parser,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Native, Backend::Compat, Backend::Parser];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Native => "native",
            Backend::Compat => "compat",
            Backend::Parser => "parser",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name() == s.trim())
            .ok_or_else(|| {
                CalcError::Config(format!(
                    "unknown backend `{}`, expected one of {}",
                    s.trim(),
                    Backend::ALL.iter().join(", ")
                ))
            })
    }
}

/// Arithmetic engines the host provides. The compatibility engine is always there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engines {
    pub native: bool,
    pub parser: bool,
}

impl Default for Engines {
    fn default() -> Self {
        Self {
            native: true,
            parser: true,
        }
    }
}

impl Engines {
    pub fn provides(self, backend: Backend) -> bool {
        match backend {
            Backend::Native => self.native,
            Backend::Compat => true,
            Backend::Parser => self.parser,
        }
    }

    /// Backend used when none was chosen explicitly.
    pub fn preferred(self) -> Backend {
        if self.native {
            Backend::Native
        } else {
            Backend::Compat
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `None` until chosen explicitly or established on first use
    pub backend: Option<Backend>,
    pub default_unit: String,
    pub overwrite: bool,
    pub engines: Engines,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: None,
            default_unit: "bp".to_string(),
            overwrite: false,
            engines: Engines::default(),
        }
    }
}

impl Settings {
    pub fn with_engines(engines: Engines) -> Self {
        Self {
            engines,
            ..Self::default()
        }
    }

    pub fn active_backend(&self) -> Backend {
        self.backend.unwrap_or_else(|| self.engines.preferred())
    }

    pub fn apply(&mut self, setting: &Setting) -> Result<()> {
        match setting {
            Setting::Backend(backend) => {
                if !self.engines.provides(*backend) {
                    return Err(CalcError::UnsupportedBackend(*backend));
                }
                self.backend = Some(*backend);
            }
            Setting::DefaultUnit(unit) => self.default_unit = unit.clone(),
            Setting::Overwrite(on) => self.overwrite = *on,
        }
        Ok(())
    }
}

/// One `key=value` entry of an option string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    Backend(Backend),
    DefaultUnit(String),
    Overwrite(bool),
}

/// Parses `backend=compat, defaultunit=cm, overwrite`. A bare `overwrite`
/// means `overwrite=true`.
pub fn parse_options(options: &str) -> Result<Vec<Setting>> {
    options
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = match entry.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (entry, None),
            };
            match (key, value) {
                ("backend", Some(v)) => Ok(Setting::Backend(v.parse()?)),
                ("defaultunit", Some(v)) if !v.is_empty() => {
                    Ok(Setting::DefaultUnit(v.to_string()))
                }
                ("overwrite", None) | ("overwrite", Some("true")) => Ok(Setting::Overwrite(true)),
                ("overwrite", Some("false")) => Ok(Setting::Overwrite(false)),
                ("backend" | "defaultunit" | "overwrite", _) => {
                    Err(CalcError::Config(format!("bad value in `{entry}`")))
                }
                _ => Err(CalcError::Config(format!(
                    "unknown option `{key}`, expected one of backend, defaultunit, overwrite"
                ))),
            }
        })
        .collect()
}

/// Shared, lock-protected configuration registry. Clones share state.
#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<RwLock<Settings>>,
}

impl Context {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.inner.read().clone()
    }

    /// Snapshot with the backend established. The first call without an
    /// explicit choice fixes the preferred backend for good.
    pub fn resolve(&self) -> Settings {
        {
            let settings = self.inner.read();
            if settings.backend.is_some() {
                return settings.clone();
            }
        }
        let mut settings = self.inner.write();
        if settings.backend.is_none() {
            let backend = settings.engines.preferred();
            debug!(%backend, "no backend selected, using the preferred one");
            settings.backend = Some(backend);
        }
        settings.clone()
    }

    pub fn set_default_unit(&self, unit: String) {
        self.inner.write().default_unit = unit;
    }

    pub fn set_overwrite(&self, on: bool) {
        self.inner.write().overwrite = on;
    }

    /// Applies every setting or none of them, under a single write lock.
    pub fn update(&self, changes: &[Setting]) -> Result<Settings> {
        let mut guard = self.inner.write();
        let mut next = guard.clone();
        for change in changes {
            next.apply(change)?;
        }
        *guard = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn setters_share_state() {
        let context = Context::new(Settings::default());
        let other = context.clone();
        context.set_default_unit("mm".into());
        context.set_overwrite(true);
        let seen = other.snapshot();
        assert_eq!(seen.default_unit, "mm");
        assert!(seen.overwrite);
        assert_eq!(seen.backend, None);
        other.set_overwrite(false);
        assert!(!context.snapshot().overwrite);
    }

    #[test]
    fn options_parse() {
        assert_eq!(
            parse_options("backend=compat, defaultunit = cm ,overwrite").unwrap(),
            vec![
                Setting::Backend(Backend::Compat),
                Setting::DefaultUnit("cm".into()),
                Setting::Overwrite(true),
            ]
        );
        assert!(matches!(parse_options("backend=tex"), Err(CalcError::Config(_))));
        assert!(matches!(parse_options("units=cm"), Err(CalcError::Config(_))));
        assert!(matches!(parse_options("overwrite=maybe"), Err(CalcError::Config(_))));
        assert_eq!(parse_options(" , ").unwrap(), vec![]);
    }

    #[test]
    fn default_backend_depends_on_engines() {
        assert_eq!(Settings::default().active_backend(), Backend::Native);
        let bare = Settings::with_engines(Engines {
            native: false,
            parser: false,
        });
        assert_eq!(bare.active_backend(), Backend::Compat);
    }

    #[test]
    fn failed_update_changes_nothing() {
        let ctx = Context::new(Settings::with_engines(Engines {
            native: false,
            parser: true,
        }));
        let before = ctx.snapshot();
        let err = ctx
            .update(&[
                Setting::DefaultUnit("cm".into()),
                Setting::Backend(Backend::Native),
            ])
            .unwrap_err();
        assert_eq!(err, CalcError::UnsupportedBackend(Backend::Native));
        assert_eq!(ctx.snapshot(), before);
    }

    #[test]
    fn resolve_fixes_the_default_once() {
        let ctx = Context::default();
        assert_eq!(ctx.snapshot().backend, None);
        assert_eq!(ctx.resolve().backend, Some(Backend::Native));
        assert_eq!(ctx.snapshot().backend, Some(Backend::Native));
    }

    #[test]
    fn settings_from_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"backend":"parser","default_unit":"mm"}"#).unwrap();
        assert_eq!(settings.backend, Some(Backend::Parser));
        assert_eq!(settings.default_unit, "mm");
        assert_eq!(settings.engines, Engines::default());
    }
}
