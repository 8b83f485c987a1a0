//! Units of measure understood by every backend.
//!
//! Finite units are expressed as an exact ratio to the printer's point, the
//! same ratios the host uses. `em` and `ex` depend on the current font and
//! are read from [`FontMetrics`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dimen::Dimen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Pt,
    Pc,
    In,
    Bp,
    Cm,
    Mm,
    Dd,
    Cc,
    Nd,
    Nc,
    Sp,
    Em,
    Ex,
}

impl Unit {
    pub const ALL: [Unit; 13] = [
        Unit::Pt,
        Unit::Pc,
        Unit::In,
        Unit::Bp,
        Unit::Cm,
        Unit::Mm,
        Unit::Dd,
        Unit::Cc,
        Unit::Nd,
        Unit::Nc,
        Unit::Sp,
        Unit::Em,
        Unit::Ex,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::In => "in",
            Unit::Bp => "bp",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::Dd => "dd",
            Unit::Cc => "cc",
            Unit::Nd => "nd",
            Unit::Nc => "nc",
            Unit::Sp => "sp",
            Unit::Em => "em",
            Unit::Ex => "ex",
        }
    }

    /// Case-insensitive keyword lookup.
    pub fn lookup(word: &str) -> Option<Unit> {
        Unit::ALL
            .iter()
            .copied()
            .find(|u| u.keyword().eq_ignore_ascii_case(word))
    }

    /// `1 unit = num/den pt`. `None` for `sp` and the font-relative units.
    pub(crate) fn ratio(self) -> Option<(i64, i64)> {
        match self {
            Unit::Pt => Some((1, 1)),
            Unit::Pc => Some((12, 1)),
            Unit::In => Some((7227, 100)),
            Unit::Bp => Some((7227, 7200)),
            Unit::Cm => Some((7227, 254)),
            Unit::Mm => Some((7227, 2540)),
            Unit::Dd => Some((1238, 1157)),
            Unit::Cc => Some((14856, 1157)),
            Unit::Nd => Some((685, 642)),
            Unit::Nc => Some((1370, 107)),
            Unit::Sp | Unit::Em | Unit::Ex => None,
        }
    }

    /// Size of one unit in points, as a float.
    pub fn points(self, font: &FontMetrics) -> f64 {
        match self {
            Unit::Sp => 1.0 / 65536.0,
            Unit::Em => font.em.to_points(),
            Unit::Ex => font.ex.to_points(),
            other => match other.ratio() {
                Some((num, den)) => num as f64 / den as f64,
                None => 1.0,
            },
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Order of infinity of a glue component. `Normal` is a finite dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Normal,
    Fil,
    Fill,
    Filll,
}

impl Order {
    pub fn keyword(self) -> &'static str {
        match self {
            Order::Normal => "pt",
            Order::Fil => "fil",
            Order::Fill => "fill",
            Order::Filll => "filll",
        }
    }

    pub fn lookup(word: &str) -> Option<Order> {
        [Order::Fil, Order::Fill, Order::Filll]
            .into_iter()
            .find(|o| o.keyword().eq_ignore_ascii_case(word))
    }
}

/// What may follow a numeral: a real unit, or an infinite glue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSpec {
    Finite(Unit),
    Infinite(Order),
}

impl UnitSpec {
    pub fn lookup(word: &str) -> Option<UnitSpec> {
        Unit::lookup(word)
            .map(UnitSpec::Finite)
            .or_else(|| Order::lookup(word).map(UnitSpec::Infinite))
    }
}

/// Quad and x-height of the current font (cmr10 by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontMetrics {
    pub em: Dimen,
    pub ex: Dimen,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            em: Dimen::from_sp(655_360),
            ex: Dimen::from_sp(282_168),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Unit::lookup("PT"), Some(Unit::Pt));
        assert_eq!(Unit::lookup("Bp"), Some(Unit::Bp));
        assert_eq!(Unit::lookup("px"), None);
    }

    #[test]
    fn infinite_orders_are_not_units() {
        assert_eq!(UnitSpec::lookup("fill"), Some(UnitSpec::Infinite(Order::Fill)));
        assert_eq!(UnitSpec::lookup("filll"), Some(UnitSpec::Infinite(Order::Filll)));
        assert_eq!(UnitSpec::lookup("fillll"), None);
        assert_eq!(Unit::lookup("fil"), None);
    }

    #[test]
    fn inch_is_72_27_points() {
        let font = FontMetrics::default();
        assert!((Unit::In.points(&font) - 72.27).abs() < 1e-12);
        assert!((Unit::Em.points(&font) - 10.0).abs() < 1e-12);
    }
}
