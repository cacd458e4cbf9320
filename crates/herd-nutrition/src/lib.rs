#![deny(warnings)]

//! NRC-style energy/protein balance for growing cattle.
//!
//! Two pure operations:
//! - [`calculate_diet`] sizes intake and the energy density a ration must reach
//!   for the breed's reference feedlot gain;
//! - [`calculate_performance`] inverts the growth equation to predict the gain a
//!   given ration supports and reports which nutrient limits it.
//!
//! Lifecycle staging lives in [`lifecycle`].

pub mod lifecycle;

use herd_core::{BreedRecord, DietStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Maintenance coefficient: NEm = 0.077 · W^0.75 (Mcal/day).
pub const NEM_COEFF: f64 = 0.077;
/// Growth coefficient: NEg = 0.0635 · W^0.75 · ADG^1.097 (Mcal/day).
pub const NEG_COEFF: f64 = 0.0635;
/// Exponent on ADG in the growth equation.
pub const NEG_ADG_EXPONENT: f64 = 1.097;
/// Metabolic-weight exponent.
pub const METABOLIC_EXPONENT: f64 = 0.75;

/// Target gain assumed when the breed has no feedlot reference.
pub const DEFAULT_TARGET_ADG: f64 = 1.4;
/// Reference gain for the genetic ceiling when the breed has none.
pub const DEFAULT_CEILING_ADG: f64 = 1.5;
/// The genetic ceiling is the reference gain times this factor.
pub const GENETIC_CEILING_FACTOR: f64 = 1.2;

/// Intake as fraction of live weight, by weight bracket.
const DMI_LIGHT: f64 = 0.030;
const DMI_MEDIUM: f64 = 0.027;
const DMI_HEAVY: f64 = 0.023;
const LIGHT_BELOW_KG: f64 = 150.0;
const HEAVY_ABOVE_KG: f64 = 400.0;

/// Dry-matter intake as a fraction of live weight (step function).
pub fn dmi_fraction(weight_kg: f64) -> f64 {
    if weight_kg < LIGHT_BELOW_KG {
        DMI_LIGHT
    } else if weight_kg > HEAVY_ABOVE_KG {
        DMI_HEAVY
    } else {
        DMI_MEDIUM
    }
}

fn metabolic_weight(weight_kg: f64) -> f64 {
    weight_kg.powf(METABOLIC_EXPONENT)
}

/// Net energy for maintenance, Mcal/day.
pub fn maintenance_energy(weight_kg: f64) -> f64 {
    NEM_COEFF * metabolic_weight(weight_kg)
}

/// Net energy for growth at the given daily gain, Mcal/day.
pub fn growth_energy(weight_kg: f64, adg: f64) -> f64 {
    NEG_COEFF * metabolic_weight(weight_kg) * adg.powf(NEG_ADG_EXPONENT)
}

/// Intake and ration targets for a growing animal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DietTargets {
    /// Maximum dry-matter intake, kg/day.
    pub dmi_kg: f64,
    /// Intake as percent of live weight.
    pub dmi_percent: f64,
    /// Gain the ration is sized for, kg/day.
    pub target_adg: f64,
    /// Energy density the ration must reach, Mcal/kg DM.
    pub required_energy_density: f64,
    /// NEm, Mcal/day.
    pub maintenance_energy: f64,
}

impl DietTargets {
    /// Total daily energy the target implies (NEm + NEg).
    pub fn required_energy_mcal(&self) -> f64 {
        self.required_energy_density * self.dmi_kg
    }
}

/// Size intake and energy density for the breed's reference gain.
///
/// Returns `None` for a non-positive or non-finite weight. `age_months` is
/// accepted for interface parity; the requirement equations depend on weight.
pub fn calculate_diet(breed: &BreedRecord, live_weight_kg: f64, age_months: f64) -> Option<DietTargets> {
    if !live_weight_kg.is_finite() || live_weight_kg <= 0.0 {
        return None;
    }
    let fraction = dmi_fraction(live_weight_kg);
    let dmi_kg = live_weight_kg * fraction;
    let target_adg = breed.adg_feedlot.unwrap_or(DEFAULT_TARGET_ADG);
    let nem = maintenance_energy(live_weight_kg);
    let neg = growth_energy(live_weight_kg, target_adg);
    let targets = DietTargets {
        dmi_kg,
        dmi_percent: fraction * 100.0,
        target_adg,
        required_energy_density: (nem + neg) / dmi_kg,
        maintenance_energy: nem,
    };
    debug!(breed = %breed.id, live_weight_kg, age_months, ?targets, "diet targets");
    Some(targets)
}

/// Which term bounds the predicted gain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitingFactor {
    /// Ration does not cover maintenance; the animal is losing condition.
    EnergyDeficit,
    Energy,
    /// Energy-bound and well below genetic potential (pasture/forage rations).
    ExtensiveDietEnergy,
    Protein,
    /// The breed's genetic ceiling caps the gain.
    Genetic,
}

impl LimitingFactor {
    pub fn label(self) -> &'static str {
        match self {
            LimitingFactor::EnergyDeficit => "Energy deficit",
            LimitingFactor::Energy => "Energy",
            LimitingFactor::ExtensiveDietEnergy => "Energy (extensive diet)",
            LimitingFactor::Protein => "Protein",
            LimitingFactor::Genetic => "Genetic ceiling",
        }
    }
}

impl fmt::Display for LimitingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Gain a ration supports and what limits it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    /// Predicted ADG, kg/day. Negative under an energy deficit.
    pub predicted_adg: f64,
    pub limiting_factor: LimitingFactor,
    /// NEm, Mcal/day.
    pub maintenance_req: f64,
    /// Energy left for growth after maintenance, Mcal/day.
    pub growth_energy_available: f64,
    pub energy_adg: f64,
    pub protein_adg: f64,
    pub genetic_ceiling: f64,
    pub crude_protein_pct: f64,
}

impl PerformanceResult {
    /// Days to reach `target_kg` at the predicted gain; `None` unless gaining.
    pub fn days_to_weight(&self, current_kg: f64, target_kg: f64) -> Option<f64> {
        if target_kg <= current_kg {
            return Some(0.0);
        }
        (self.predicted_adg > 0.0).then(|| (target_kg - current_kg) / self.predicted_adg)
    }

    /// Feed conversion (kg DM per kg gain); `None` unless gaining.
    pub fn feed_conversion(&self, dmi_kg: f64) -> Option<f64> {
        (self.predicted_adg > 0.0).then(|| dmi_kg / self.predicted_adg)
    }
}

/// Gain allowed by crude-protein supply relative to the energy-allowed gain.
fn protein_limited_adg(energy_adg: f64, crude_protein_pct: f64) -> f64 {
    if crude_protein_pct >= 10.0 {
        energy_adg
    } else if crude_protein_pct >= 6.0 {
        energy_adg * 0.7
    } else {
        energy_adg.min(0.1)
    }
}

/// Predict the gain a ration supports at the given weight.
///
/// The caller guarantees `weight_kg > 0`.
pub fn calculate_performance(breed: &BreedRecord, diet: &DietStats, weight_kg: f64) -> PerformanceResult {
    let nem = maintenance_energy(weight_kg);
    let neg_available = diet.total_energy_mcal - nem;

    let energy_adg = if neg_available > 0.0 {
        (neg_available / (NEG_COEFF * metabolic_weight(weight_kg))).powf(1.0 / NEG_ADG_EXPONENT)
    } else {
        (neg_available / nem) * 0.5
    };

    let crude_protein_pct = diet.crude_protein_pct();
    let protein_adg = protein_limited_adg(energy_adg, crude_protein_pct);
    let genetic_ceiling = breed.adg_feedlot.unwrap_or(DEFAULT_CEILING_ADG) * GENETIC_CEILING_FACTOR;

    let predicted_adg = energy_adg.min(protein_adg).min(genetic_ceiling);

    let limiting_factor = if neg_available < 0.0 {
        LimitingFactor::EnergyDeficit
    } else if protein_adg < energy_adg && protein_adg <= genetic_ceiling {
        LimitingFactor::Protein
    } else if genetic_ceiling < energy_adg {
        LimitingFactor::Genetic
    } else if energy_adg < 0.8 * genetic_ceiling {
        LimitingFactor::ExtensiveDietEnergy
    } else {
        LimitingFactor::Energy
    };

    debug!(
        breed = %breed.id,
        weight_kg,
        predicted_adg,
        limiting = %limiting_factor,
        "performance prediction"
    );

    PerformanceResult {
        predicted_adg,
        limiting_factor,
        maintenance_req: nem,
        growth_energy_available: neg_available,
        energy_adg,
        protein_adg,
        genetic_ceiling,
        crude_protein_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn angus() -> BreedRecord {
        let mut b = BreedRecord::new("ANG", "Angus");
        b.adg_feedlot = Some(1.45);
        b
    }

    fn ration(dmi_kg: f64, energy: f64, cp_pct: f64) -> DietStats {
        DietStats {
            dmi_kg,
            total_energy_mcal: energy,
            protein_g: dmi_kg * 1000.0 * cp_pct / 100.0,
        }
    }

    #[test]
    fn dmi_brackets_and_boundaries() {
        let b = angus();
        for (w, pct) in [
            (100.0, 0.030),
            (149.99, 0.030),
            (150.0, 0.027),
            (300.0, 0.027),
            (400.0, 0.027),
            (400.01, 0.023),
            (550.0, 0.023),
        ] {
            let t = calculate_diet(&b, w, 12.0).unwrap();
            assert_relative_eq!(t.dmi_kg, w * pct, epsilon = 1e-9);
            assert_relative_eq!(t.dmi_percent, pct * 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn non_positive_weight_has_no_targets() {
        assert!(calculate_diet(&angus(), 0.0, 10.0).is_none());
        assert!(calculate_diet(&angus(), -5.0, 10.0).is_none());
        assert!(calculate_diet(&angus(), f64::NAN, 10.0).is_none());
    }

    #[test]
    fn target_adg_defaults_without_reference() {
        let b = BreedRecord::new("UNK", "Unknown");
        let t = calculate_diet(&b, 300.0, 12.0).unwrap();
        assert_relative_eq!(t.target_adg, DEFAULT_TARGET_ADG);
    }

    #[test]
    fn forward_energy_equation() {
        let t = calculate_diet(&angus(), 300.0, 12.0).unwrap();
        let mw = 300f64.powf(0.75);
        let nem = 0.077 * mw;
        let neg = 0.0635 * mw * 1.45f64.powf(1.097);
        assert_relative_eq!(t.maintenance_energy, nem, epsilon = 1e-12);
        assert_relative_eq!(t.required_energy_density, (nem + neg) / (300.0 * 0.027), epsilon = 1e-12);
        assert_relative_eq!(t.required_energy_mcal(), nem + neg, epsilon = 1e-9);
    }

    #[test]
    fn inverse_recovers_target_gain() {
        let b = angus();
        for w in [120.0, 250.0, 380.0, 520.0] {
            let t = calculate_diet(&b, w, 12.0).unwrap();
            let diet = ration(t.dmi_kg, t.required_energy_density * t.dmi_kg, 13.0);
            let p = calculate_performance(&b, &diet, w);
            assert_relative_eq!(p.predicted_adg, t.target_adg, epsilon = 1e-9);
            assert_eq!(p.limiting_factor, LimitingFactor::Energy);
        }
    }

    #[test]
    fn deficit_is_negative_and_labelled() {
        let b = angus();
        let nem = maintenance_energy(400.0);
        let p = calculate_performance(&b, &ration(8.0, nem * 0.5, 12.0), 400.0);
        assert_relative_eq!(p.energy_adg, -0.25, epsilon = 1e-12);
        assert!(p.predicted_adg < 0.0);
        assert_eq!(p.limiting_factor, LimitingFactor::EnergyDeficit);
        assert_eq!(p.days_to_weight(400.0, 500.0), None);
    }

    #[test]
    fn protein_bands() {
        let b = angus();
        let w = 350.0;
        let energy = maintenance_energy(w) + growth_energy(w, 1.0);
        let full = calculate_performance(&b, &ration(9.0, energy, 12.0), w);
        let mid = calculate_performance(&b, &ration(9.0, energy, 8.0), w);
        let low = calculate_performance(&b, &ration(9.0, energy, 4.0), w);
        assert_relative_eq!(full.predicted_adg, 1.0, epsilon = 1e-9);
        assert_relative_eq!(mid.predicted_adg, 0.7, epsilon = 1e-9);
        assert_eq!(mid.limiting_factor, LimitingFactor::Protein);
        assert_relative_eq!(low.predicted_adg, 0.1, epsilon = 1e-12);
        assert_eq!(low.limiting_factor, LimitingFactor::Protein);
        // 10 % is the lower edge of the adequate band.
        let edge = calculate_performance(&b, &ration(9.0, energy, 10.0), w);
        assert_relative_eq!(edge.predicted_adg, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn genetic_ceiling_caps_rich_rations() {
        let b = angus();
        let w = 450.0;
        let p = calculate_performance(&b, &ration(10.0, 40.0, 14.0), w);
        assert_relative_eq!(p.predicted_adg, 1.45 * 1.2, epsilon = 1e-12);
        assert_eq!(p.limiting_factor, LimitingFactor::Genetic);
    }

    #[test]
    fn forage_ration_is_extensive_energy() {
        let b = angus();
        let w = 350.0;
        let energy = maintenance_energy(w) + growth_energy(w, 0.6);
        let p = calculate_performance(&b, &ration(9.0, energy, 11.0), w);
        assert_eq!(p.limiting_factor, LimitingFactor::ExtensiveDietEnergy);
        assert_relative_eq!(p.predicted_adg, 0.6, epsilon = 1e-9);
        assert_relative_eq!(p.days_to_weight(350.0, 410.0).unwrap(), 100.0, epsilon = 1e-6);
        assert_relative_eq!(p.feed_conversion(9.0).unwrap(), 15.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_ration_is_a_deficit() {
        let p = calculate_performance(&angus(), &ration(0.0, 0.0, 0.0), 300.0);
        assert_eq!(p.limiting_factor, LimitingFactor::EnergyDeficit);
        assert_relative_eq!(p.predicted_adg, -0.5, epsilon = 1e-12);
        assert_eq!(p.crude_protein_pct, 0.0);
    }

    proptest! {
        #[test]
        fn dmi_is_always_positive(w in 1.0f64..1_500.0) {
            let t = calculate_diet(&angus(), w, 12.0).unwrap();
            prop_assert!(t.dmi_kg > 0.0);
            prop_assert!(t.required_energy_density > 0.0);
        }

        #[test]
        fn round_trip_for_any_reference_gain(adg in 0.3f64..2.0, w in 80.0f64..800.0) {
            let mut b = angus();
            b.adg_feedlot = Some(adg);
            let t = calculate_diet(&b, w, 12.0).unwrap();
            let diet = ration(t.dmi_kg, t.required_energy_mcal(), 12.0);
            let p = calculate_performance(&b, &diet, w);
            prop_assert!((p.predicted_adg - adg).abs() < 1e-6);
        }

        #[test]
        fn prediction_never_exceeds_ceiling(energy in 0.0f64..60.0, cp in 0.0f64..25.0) {
            let p = calculate_performance(&angus(), &ration(9.0, energy, cp), 400.0);
            prop_assert!(p.predicted_adg <= p.genetic_ceiling + 1e-12);
        }
    }
}
