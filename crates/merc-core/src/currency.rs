//! Exact currency arithmetic for item pricing.
//!
//! Prices are counts of the smallest fungible unit (scrap), so every
//! operation is integer arithmetic. Floating point is never used for
//! price math; drift in comparisons would accept or reject trades
//! incorrectly.
//!
//! Fixed conversion ladder:
//! - 1 reclaimed = 3 scrap
//! - 1 refined = 9 scrap
//! - 1 key = 50 refined = 450 scrap

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use crate::error::CoreError;

/// A currency denomination in the fixed conversion ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyUnit {
    Scrap,
    Reclaimed,
    Refined,
    Key,
}

impl CurrencyUnit {
    /// All denominations, largest first. Auto-pay iterates in this order.
    pub const DESCENDING: [CurrencyUnit; 4] = [
        CurrencyUnit::Key,
        CurrencyUnit::Refined,
        CurrencyUnit::Reclaimed,
        CurrencyUnit::Scrap,
    ];

    /// Value of one unit of this denomination.
    #[must_use]
    pub fn value(self) -> Currency {
        match self {
            CurrencyUnit::Scrap => Currency::SCRAP,
            CurrencyUnit::Reclaimed => Currency::RECLAIMED,
            CurrencyUnit::Refined => Currency::REFINED,
            CurrencyUnit::Key => Currency::KEY,
        }
    }

    /// Parse a unit name ("key", "ref", "refined", "rec", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "scrap" => Some(CurrencyUnit::Scrap),
            "rec" | "reclaimed" => Some(CurrencyUnit::Reclaimed),
            "ref" | "refined" => Some(CurrencyUnit::Refined),
            "key" | "keys" => Some(CurrencyUnit::Key),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyUnit::Scrap => write!(f, "scrap"),
            CurrencyUnit::Reclaimed => write!(f, "reclaimed"),
            CurrencyUnit::Refined => write!(f, "refined"),
            CurrencyUnit::Key => write!(f, "key"),
        }
    }
}

/// An exact currency amount, stored as a scrap count.
///
/// Immutable value type. Addition and scalar multiplication are total;
/// subtraction is checked because a negative amount is meaningless in
/// this domain (`checked_sub` on value-affecting paths, `saturating_sub`
/// only for display deltas).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Currency(u64);

impl Currency {
    pub const ZERO: Self = Self(0);
    /// One scrap: the smallest unit.
    pub const SCRAP: Self = Self(1);
    /// One reclaimed = 3 scrap.
    pub const RECLAIMED: Self = Self(3);
    /// One refined = 9 scrap.
    pub const REFINED: Self = Self(9);
    /// One key = 50 refined = 450 scrap (fixed rate).
    pub const KEY: Self = Self(450);

    #[inline]
    #[must_use]
    pub fn from_scrap(scrap: u64) -> Self {
        Self(scrap)
    }

    /// Build an amount from a count of a named denomination.
    #[inline]
    #[must_use]
    pub fn from_unit(unit: CurrencyUnit, count: u64) -> Self {
        unit.value() * count
    }

    /// Total scrap count.
    #[inline]
    #[must_use]
    pub fn scrap(&self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtract, failing on underflow.
    #[inline]
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Subtract, clamping at zero. Display math only.
    #[inline]
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Parse a refined-denominated decimal string ("2.33", "0.11", "5").
    ///
    /// The fractional part is rounded to the nearest scrap ninth, so the
    /// conventional two-digit forms (.11, .22, ... .88) parse exactly.
    pub fn parse_ref(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        let whole: u64 = int_part
            .parse()
            .map_err(|_| CoreError::InvalidPrice(s.to_string()))?;

        let hundredths: u64 = if frac_part.is_empty() {
            0
        } else {
            let digits: String = frac_part.chars().take(2).collect();
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(CoreError::InvalidPrice(s.to_string()));
            }
            let n: u64 = digits
                .parse()
                .map_err(|_| CoreError::InvalidPrice(s.to_string()))?;
            if digits.len() == 1 {
                n * 10
            } else {
                n
            }
        };
        if hundredths >= 100 {
            return Err(CoreError::InvalidPrice(s.to_string()));
        }

        let rem_scrap = (hundredths * 9 + 50) / 100;
        Ok(Self(whole * 9 + rem_scrap))
    }

    /// Render as the conventional refined string, e.g. `2.33 ref`.
    ///
    /// Each leftover scrap shows as a repeated-digit hundredth (1 scrap =
    /// .11, 2 = .22, ...), matching how traders quote metal.
    #[must_use]
    pub fn to_ref_string(&self) -> String {
        let refined = self.0 / 9;
        let rem = self.0 % 9;
        format!("{}.{:02} ref", refined, rem * 11)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ref_string())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_ref(s)
    }
}

impl Add for Currency {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Currency {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<u64> for Currency {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Currency {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
