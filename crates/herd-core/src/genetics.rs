//! Carcass-relevant genetic merit and the crossbreeding rule.
//!
//! A cross takes the arithmetic mean of sire and dam, then applies the
//! maternal effects of the dam and a fixed heterosis bonus on yield.

use crate::{BreedRecord, DEFAULT_CROSS_YIELD_POTENTIAL};
use serde::{Deserialize, Serialize};

/// Yield bonus granted to any first cross.
pub const HETEROSIS_YIELD_BONUS: f64 = 0.02;
/// Marbling added when the dam's marbling potential is at least this.
const MATERNAL_MARBLING_TRIGGER: f64 = 4.0;
const MATERNAL_MARBLING_BONUS: f64 = 0.5;
/// Conformation added when the dam is a heavy milker.
const MATERNAL_MILK_HIGH: f64 = 4.0;
const MATERNAL_MILK_HIGH_BONUS: f64 = 0.3;
/// Conformation removed when the dam barely milks.
const MATERNAL_MILK_LOW: f64 = 1.0;
const MATERNAL_MILK_LOW_PENALTY: f64 = 0.2;

/// The three genetic potentials the carcass model consumes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticMerit {
    /// Conformation potential (1=P … 6=S).
    pub conformation: f64,
    /// Marbling potential (1–5).
    pub marbling: f64,
    /// Dressing-yield potential; `None` when the breed has no figure.
    pub yield_potential: Option<f64>,
}

impl GeneticMerit {
    /// Merit of a pure-bred animal, with the usual defaults for missing fields.
    pub fn of(breed: &BreedRecord) -> Self {
        Self {
            conformation: breed.conformation_or_default(),
            marbling: breed.marbling_or_default(),
            yield_potential: breed.yield_potential,
        }
    }

    /// Merit of a sire × dam first cross.
    pub fn cross(sire: &BreedRecord, dam: &BreedRecord) -> Self {
        let mut conformation = mean(sire.conformation_or_default(), dam.conformation_or_default());
        let mut marbling = mean(sire.marbling_or_default(), dam.marbling_or_default());
        let yield_potential = mean(
            sire.yield_potential.unwrap_or(DEFAULT_CROSS_YIELD_POTENTIAL),
            dam.yield_potential.unwrap_or(DEFAULT_CROSS_YIELD_POTENTIAL),
        );

        if dam.marbling_or_default() >= MATERNAL_MARBLING_TRIGGER {
            marbling += MATERNAL_MARBLING_BONUS;
        }
        if let Some(milk) = dam.milk_potential {
            if milk >= MATERNAL_MILK_HIGH {
                conformation += MATERNAL_MILK_HIGH_BONUS;
            } else if milk <= MATERNAL_MILK_LOW {
                conformation -= MATERNAL_MILK_LOW_PENALTY;
            }
        }

        Self {
            conformation,
            marbling,
            yield_potential: Some(yield_potential + HETEROSIS_YIELD_BONUS),
        }
    }
}

pub(crate) fn mean(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}
