//! Fixed-point lengths.
//!
//! A [`Dimen`] counts scaled points (65536 per point). Every backend ends up
//! writing one of these (or a [`Glue`]) into a register, so this is where the
//! host's precision and range limits live.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, Result};
use crate::units::{FontMetrics, Order, Unit};

/// Scaled points per point.
pub const UNITY: i64 = 65536;
/// Largest magnitude a dimension may hold, 16383.99998pt.
pub const MAX_DIMEN: i64 = 0x3FFF_FFFF;
/// Largest magnitude a counter may hold.
pub const MAX_COUNT: i64 = i32::MAX as i64;

/// Divide rounding half away from zero.
pub(crate) fn round_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d.abs() {
        if (n < 0) != (d < 0) {
            q - 1
        } else {
            q + 1
        }
    } else {
        q
    }
}

pub(crate) fn check_count(n: i128) -> Result<i64> {
    if n.abs() > MAX_COUNT as i128 {
        return Err(CalcError::Arithmetic("number too big".into()));
    }
    Ok(n as i64)
}

/// An unsigned decimal literal as written in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numeral {
    integer: String,
    fraction: String,
    point: bool,
}

impl Numeral {
    /// Accepts `12`, `0.5`, `.5` and `4.`; no sign, no exponent.
    pub fn parse(text: &str) -> Option<Numeral> {
        let (integer, fraction, point) = match text.split_once('.') {
            Some((i, f)) => (i, f, true),
            None => (text, "", false),
        };
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if !digits(integer) || !digits(fraction) {
            return None;
        }
        Some(Numeral {
            integer: integer.to_string(),
            fraction: fraction.to_string(),
            point,
        })
    }

    /// The digits before the point, at most [`MAX_COUNT`].
    fn integer_part(&self) -> Result<i128> {
        let trimmed = self.integer.trim_start_matches('0');
        if trimmed.is_empty() {
            return Ok(0);
        }
        let value = match trimmed.parse::<i128>() {
            Ok(v) if trimmed.len() <= 10 => v,
            _ => return Err(CalcError::Arithmetic(format!("number too big: `{self}`"))),
        };
        check_count(value)?;
        Ok(value)
    }

    /// Value as a counter. A decimal point makes this a parse error.
    pub fn integer(&self) -> Result<i64> {
        if self.point {
            return Err(CalcError::Parse(format!("expected an integer, found `{self}`")));
        }
        check_count(self.integer_part()?)
    }

    /// Value in 65536ths, the fraction rounded the way the host rounds
    /// decimal fractions (at most 17 digits are significant).
    pub fn scaled(&self) -> Result<i128> {
        let mut a: i128 = 0;
        for d in self.fraction.bytes().take(17).rev() {
            a = (a + i128::from(d - b'0') * 131_072) / 10;
        }
        Ok(self.integer_part()? * UNITY as i128 + (a + 1) / 2)
    }

    pub fn to_f64(&self) -> f64 {
        let text = format!(
            "{}.{}",
            if self.integer.is_empty() { "0" } else { &self.integer },
            if self.fraction.is_empty() { "0" } else { &self.fraction }
        );
        text.parse().unwrap_or(0.0)
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.integer)?;
        if self.point {
            write!(f, ".{}", self.fraction)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimen(i64);

impl Dimen {
    pub const ZERO: Dimen = Dimen(0);

    pub const fn from_sp(sp: i64) -> Self {
        Dimen(sp)
    }

    pub fn sp(self) -> i64 {
        self.0
    }

    /// Range-checked construction from an intermediate result.
    pub fn checked(sp: i128) -> Result<Dimen> {
        if sp.abs() > MAX_DIMEN as i128 {
            return Err(CalcError::too_large());
        }
        Ok(Dimen(sp as i64))
    }

    pub fn from_points(pt: f64) -> Result<Dimen> {
        if !pt.is_finite() {
            return Err(CalcError::Arithmetic(format!("`{pt}` is not a finite length")));
        }
        let sp = (pt * UNITY as f64).round();
        if sp.abs() > MAX_DIMEN as f64 {
            return Err(CalcError::too_large());
        }
        Ok(Dimen(sp as i64))
    }

    pub fn to_points(self) -> f64 {
        self.0 as f64 / UNITY as f64
    }

    pub fn from_numeral(n: &Numeral, unit: Unit, font: &FontMetrics) -> Result<Dimen> {
        match unit {
            Unit::Sp => Dimen::checked(n.integer_part()?),
            Unit::Em => Dimen::checked(round_div(n.scaled()? * font.em.0 as i128, UNITY as i128)),
            Unit::Ex => Dimen::checked(round_div(n.scaled()? * font.ex.0 as i128, UNITY as i128)),
            other => {
                let (num, den) = other.ratio().unwrap_or((1, 1));
                Dimen::checked(round_div(n.scaled()? * num as i128, den as i128))
            }
        }
    }

    /// This length measured in `unit`, in 65536ths of that unit.
    pub fn in_unit(self, unit: Unit, font: &FontMetrics) -> i64 {
        let sp = self.0 as i128;
        let scaled = match unit {
            Unit::Sp => sp * UNITY as i128,
            Unit::Em if font.em.0 != 0 => round_div(sp * UNITY as i128, font.em.0 as i128),
            Unit::Ex if font.ex.0 != 0 => round_div(sp * UNITY as i128, font.ex.0 as i128),
            Unit::Em | Unit::Ex => 0,
            other => {
                let (num, den) = other.ratio().unwrap_or((1, 1));
                round_div(sp * den as i128, num as i128)
            }
        };
        scaled as i64
    }

    pub fn checked_add(self, other: Dimen) -> Result<Dimen> {
        Dimen::checked(self.0 as i128 + other.0 as i128)
    }

    pub fn mul_int(self, n: i64) -> Result<Dimen> {
        Dimen::checked(self.0 as i128 * n as i128)
    }

    /// Division rounding half away from zero.
    pub fn div_round(self, n: i64) -> Result<Dimen> {
        if n == 0 {
            return Err(CalcError::division_by_zero());
        }
        Dimen::checked(round_div(self.0 as i128, n as i128))
    }

    /// Division truncating toward zero.
    pub fn div_trunc(self, n: i64) -> Result<Dimen> {
        if n == 0 {
            return Err(CalcError::division_by_zero());
        }
        Dimen::checked(self.0 as i128 / n as i128)
    }

    /// `self * num / den`, rounded, with a wide intermediate.
    pub fn scale(self, num: i128, den: i128) -> Result<Dimen> {
        if den == 0 {
            return Err(CalcError::division_by_zero());
        }
        let product = (self.0 as i128).checked_mul(num).ok_or_else(CalcError::too_large)?;
        Dimen::checked(round_div(product, den))
    }

    /// A decimal coefficient applied to this length, as in `0.5\textwidth`.
    pub fn mul_numeral(self, n: &Numeral) -> Result<Dimen> {
        self.scale(n.scaled()?, UNITY as i128)
    }

    /// The number without its unit, `10.0pt` giving `10` and `9.9626pt` `9.9626`.
    pub fn strip_pt(self) -> String {
        let printed = print_scaled(self.0);
        match printed.strip_suffix(".0") {
            Some(whole) => whole.to_string(),
            None => printed,
        }
    }
}

impl std::ops::Neg for Dimen {
    type Output = Dimen;

    fn neg(self) -> Dimen {
        Dimen(-self.0)
    }
}

/// Shortest decimal that reads back as the same number of scaled points.
pub fn print_scaled(sp: i64) -> String {
    let mut out = String::new();
    let mut s = sp;
    if s < 0 {
        out.push('-');
        s = -s;
    }
    out.push_str(&(s / UNITY).to_string());
    out.push('.');
    let mut s = 10 * (s % UNITY) + 5;
    let mut delta = 10;
    loop {
        if delta > UNITY {
            s += 0x8000 - 50000;
        }
        out.push(char::from(b'0' + (s / UNITY) as u8));
        s = 10 * (s % UNITY);
        delta *= 10;
        if s <= delta {
            break;
        }
    }
    out
}

impl fmt::Display for Dimen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", print_scaled(self.0))
    }
}

/// Stretch or shrink component of a glue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flex {
    pub amount: Dimen,
    pub order: Order,
}

impl Flex {
    pub fn new(amount: Dimen, order: Order) -> Self {
        if amount == Dimen::ZERO {
            return Flex::default();
        }
        Flex { amount, order }
    }

    /// Components of equal order add up; otherwise the higher order wins.
    pub fn add(self, other: Flex) -> Result<Flex> {
        if other.amount == Dimen::ZERO {
            return Ok(self);
        }
        if self.amount == Dimen::ZERO {
            return Ok(other);
        }
        Ok(match self.order.cmp(&other.order) {
            std::cmp::Ordering::Equal => {
                Flex::new(self.amount.checked_add(other.amount)?, self.order)
            }
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Greater => self,
        })
    }

    fn map(self, f: impl FnOnce(Dimen) -> Result<Dimen>) -> Result<Flex> {
        Ok(Flex::new(f(self.amount)?, self.order))
    }
}

impl fmt::Display for Flex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            Order::Normal => write!(f, "{}", self.amount),
            order => write!(f, "{}{}", print_scaled(self.amount.0), order.keyword()),
        }
    }
}

/// A length with optional stretchability and shrinkability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Glue {
    pub natural: Dimen,
    #[serde(default)]
    pub stretch: Flex,
    #[serde(default)]
    pub shrink: Flex,
}

impl Glue {
    pub fn rigid(natural: Dimen) -> Self {
        Glue {
            natural,
            ..Glue::default()
        }
    }

    pub fn is_rigid(&self) -> bool {
        self.stretch.amount == Dimen::ZERO && self.shrink.amount == Dimen::ZERO
    }

    pub fn checked_add(self, other: Glue) -> Result<Glue> {
        Ok(Glue {
            natural: self.natural.checked_add(other.natural)?,
            stretch: self.stretch.add(other.stretch)?,
            shrink: self.shrink.add(other.shrink)?,
        })
    }

    pub fn mul_int(self, n: i64) -> Result<Glue> {
        self.map(|d| d.mul_int(n))
    }

    pub fn div_round(self, n: i64) -> Result<Glue> {
        if n == 0 {
            return Err(CalcError::division_by_zero());
        }
        self.map(|d| d.div_round(n))
    }

    fn map(self, f: impl Fn(Dimen) -> Result<Dimen>) -> Result<Glue> {
        Ok(Glue {
            natural: f(self.natural)?,
            stretch: self.stretch.map(&f)?,
            shrink: self.shrink.map(&f)?,
        })
    }
}

impl std::ops::Neg for Glue {
    type Output = Glue;

    fn neg(self) -> Glue {
        Glue {
            natural: -self.natural,
            stretch: Flex::new(-self.stretch.amount, self.stretch.order),
            shrink: Flex::new(-self.shrink.amount, self.shrink.order),
        }
    }
}

impl From<Dimen> for Glue {
    fn from(d: Dimen) -> Self {
        Glue::rigid(d)
    }
}

impl fmt::Display for Glue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.natural)?;
        if self.stretch.amount != Dimen::ZERO {
            write!(f, " plus {}", self.stretch)?;
        }
        if self.shrink.amount != Dimen::ZERO {
            write!(f, " minus {}", self.shrink)?;
        }
        Ok(())
    }
}
