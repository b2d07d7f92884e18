//! Units of measure and quantity conversion.
//!
//! Units are identified by their UN/CEFACT Recommendation 20 code and carry a
//! factor relative to the reference unit of their category (piece, kilogram,
//! metre, square metre, litre). Conversion is only defined within a category.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Physical dimension a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UomCategory {
    Unit,
    Weight,
    Length,
    Surface,
    Volume,
}

/// A unit of measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uom {
    /// UN/CEFACT Rec 20 code (e.g. "C62", "KGM", "MTR").
    pub code: String,
    pub category: UomCategory,
    /// How many reference units one of this unit holds.
    pub factor: Decimal,
    /// Decimal places quantities are rounded to.
    pub digits: u32,
}

impl Default for Uom {
    fn default() -> Self {
        Self::unit()
    }
}

impl Uom {
    fn new(code: &str, category: UomCategory, factor: Decimal, digits: u32) -> Self {
        Self {
            code: code.into(),
            category,
            factor,
            digits,
        }
    }

    /// C62: one piece.
    pub fn unit() -> Self {
        Self::new("C62", UomCategory::Unit, dec!(1), 0)
    }

    /// DZN: dozen.
    pub fn dozen() -> Self {
        Self::new("DZN", UomCategory::Unit, dec!(12), 0)
    }

    /// KGM: kilogram.
    pub fn kilogram() -> Self {
        Self::new("KGM", UomCategory::Weight, dec!(1), 3)
    }

    /// GRM: gram.
    pub fn gram() -> Self {
        Self::new("GRM", UomCategory::Weight, dec!(0.001), 2)
    }

    /// TNE: metric tonne.
    pub fn tonne() -> Self {
        Self::new("TNE", UomCategory::Weight, dec!(1000), 3)
    }

    /// MTR: metre.
    pub fn meter() -> Self {
        Self::new("MTR", UomCategory::Length, dec!(1), 2)
    }

    /// CMT: centimetre.
    pub fn centimeter() -> Self {
        Self::new("CMT", UomCategory::Length, dec!(0.01), 2)
    }

    /// MMT: millimetre.
    pub fn millimeter() -> Self {
        Self::new("MMT", UomCategory::Length, dec!(0.001), 0)
    }

    /// MTK: square metre.
    pub fn square_meter() -> Self {
        Self::new("MTK", UomCategory::Surface, dec!(1), 2)
    }

    /// LTR: litre.
    pub fn liter() -> Self {
        Self::new("LTR", UomCategory::Volume, dec!(1), 2)
    }

    /// Convert `quantity` expressed in `self` into `to`.
    ///
    /// Returns `None` when the units belong to different categories. With
    /// `round`, the result is rounded to the target unit's digits.
    pub fn compute_qty(&self, quantity: Decimal, to: &Uom, round: bool) -> Option<Decimal> {
        if self.category != to.category {
            return None;
        }
        let result = if self.factor == to.factor {
            quantity
        } else {
            quantity * self.factor / to.factor
        };
        Some(if round {
            result.round_dp(to.digits)
        } else {
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_unit_is_identity() {
        let unit = Uom::unit();
        assert_eq!(unit.compute_qty(dec!(20), &unit, true), Some(dec!(20)));
    }

    #[test]
    fn grams_to_kilograms() {
        let qty = Uom::gram().compute_qty(dec!(1500), &Uom::kilogram(), false);
        assert_eq!(qty, Some(dec!(1.5)));
    }

    #[test]
    fn dozen_to_units() {
        let qty = Uom::dozen().compute_qty(dec!(2), &Uom::unit(), true);
        assert_eq!(qty, Some(dec!(24)));
    }

    #[test]
    fn centimetres_to_metres_rounded() {
        let qty = Uom::centimeter().compute_qty(dec!(123.456), &Uom::meter(), true);
        assert_eq!(qty, Some(dec!(1.23)));
    }

    #[test]
    fn cross_category_is_none() {
        assert_eq!(Uom::unit().compute_qty(dec!(1), &Uom::kilogram(), false), None);
        assert_eq!(Uom::meter().compute_qty(dec!(1), &Uom::square_meter(), false), None);
    }
}
