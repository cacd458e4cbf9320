#![deny(warnings)]

//! Market valuation: reference carcass prices for the Spanish beef market.
//!
//! Prices are €/kg of carcass, stored as [`Decimal`], keyed by a commercial
//! category and the SEUROP conformation letter.

use herd_core::Sex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Price applied when neither the category nor the class match a table row.
pub const FALLBACK_PRICE: Decimal = Decimal::from_parts(450, 0, 0, false, 2);

/// Commercial category used by the reference price table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCategory {
    /// Male or castrate of 12 months or more.
    #[serde(rename = "Añojo", alias = "Anojo")]
    Anojo,
    /// Calf or young heifer.
    Ternera,
    /// Adult female.
    Vaca,
}

impl MarketCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Anojo => "Añojo",
            Self::Ternera => "Ternera",
            Self::Vaca => "Vaca",
        }
    }

    /// Map a free-text category by substring; anything unrecognised is a
    /// ternera.
    ///
    /// Example:
    /// assert_eq!(MarketCategory::normalize("Vaca Vieja"), MarketCategory::Vaca);
    pub fn normalize(input: &str) -> Self {
        let lowered = input.to_lowercase();
        if lowered.contains("añojo") || lowered.contains("anojo") {
            Self::Anojo
        } else if lowered.contains("vaca") {
            Self::Vaca
        } else {
            Self::Ternera
        }
    }

    /// Category of an animal at slaughter.
    ///
    /// The table has no adult-male row, so males and castrates past 24 months
    /// stay on the añojo tariff rather than the calf one.
    pub fn for_animal(sex: Sex, age_months: f64) -> Self {
        match sex {
            Sex::Female if age_months >= 24.0 => Self::Vaca,
            Sex::Male | Sex::Castrated if age_months >= 12.0 => Self::Anojo,
            _ => Self::Ternera,
        }
    }

    /// Table price for a conformation letter, if the letter is a SEUROP class.
    pub fn price(self, class: char) -> Option<Decimal> {
        let cents = match (self, class.to_ascii_uppercase()) {
            (Self::Anojo, 'S') => 590,
            (Self::Anojo, 'E') => 570,
            (Self::Anojo, 'U') => 545,
            (Self::Anojo, 'R') => 520,
            (Self::Anojo, 'O') => 480,
            (Self::Anojo, 'P') => 430,
            (Self::Ternera, 'S') => 610,
            (Self::Ternera, 'E') => 590,
            (Self::Ternera, 'U') => 565,
            (Self::Ternera, 'R') => 540,
            (Self::Ternera, 'O') => 500,
            (Self::Ternera, 'P') => 450,
            (Self::Vaca, 'S') => 460,
            (Self::Vaca, 'E') => 440,
            (Self::Vaca, 'U') => 410,
            (Self::Vaca, 'R') => 385,
            (Self::Vaca, 'O') => 350,
            (Self::Vaca, 'P') => 300,
            _ => return None,
        };
        Some(Decimal::new(cents, 2))
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reference price in €/kg of carcass.
///
/// Only the first character of `seurop` is significant ("U+" prices as U).
///
/// Example:
/// assert_eq!(get_price("Vaca Vieja", "O"), Decimal::new(350, 2));
pub fn get_price(category: &str, seurop: &str) -> Decimal {
    let cat = MarketCategory::normalize(category);
    let price = seurop
        .trim()
        .chars()
        .next()
        .and_then(|c| cat.price(c))
        .unwrap_or(FALLBACK_PRICE);
    debug!(category = cat.label(), seurop, %price, "carcass price");
    price
}

/// Carcass value in € (weight × price), rounded to cents.
///
/// Non-finite or negative weights are worth nothing.
pub fn calculate_value(carcass_weight_kg: f64, category: &str, seurop: &str) -> Decimal {
    let price = get_price(category, seurop);
    match Decimal::from_f64(carcass_weight_kg) {
        Some(w) if w > Decimal::ZERO => (w * price).round_dp(2),
        _ => Decimal::ZERO,
    }
}

/// Weighted average price across carcasses: sum(p_i * w_i) / sum(w_i).
/// Returns None when the slices differ in length or total weight is zero.
///
/// Example:
/// let prices = [Decimal::new(400,2), Decimal::new(500,2)];
/// assert_eq!(average_price(&prices, &[100.0, 100.0]).unwrap(), Decimal::new(450,2));
pub fn average_price(prices: &[Decimal], weights_kg: &[f64]) -> Option<Decimal> {
    if prices.len() != weights_kg.len() || prices.is_empty() {
        return None;
    }
    let mut num = Decimal::ZERO;
    let mut den = Decimal::ZERO;
    for (p, &w) in prices.iter().zip(weights_kg) {
        let w = Decimal::from_f64(w)?;
        if *p < Decimal::ZERO || w < Decimal::ZERO {
            return None;
        }
        num += *p * w;
        den += w;
    }
    if den.is_zero() {
        return None;
    }
    Some((num / den).round_dp(4))
}
