#![deny(warnings)]

//! Carcass quality and yield estimation.
//!
//! Combines breed genetics (optionally a sire × dam cross), ration energy
//! density, maturity, sex and summer heat stress into:
//! - dressing yield (fraction of live weight),
//! - marbling (continuous 1–5 score and the 1–12 BMS scale),
//! - SEUROP conformation,
//! - a premium-quality flag.
//!
//! The model is pure and total: out-of-range inputs are clamped, never
//! rejected. Callers validate `weight > 0` beforehand.

use herd_core::{BreedRecord, GeneticMerit, Sex};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Biological dressing-yield range.
pub const MIN_YIELD: f64 = 0.48;
pub const MAX_YIELD: f64 = 0.72;

/// Calendar months (0 = January) treated as summer.
pub const SUMMER_MONTHS: std::ops::RangeInclusive<u32> = 5..=8;

/// Conformation score at or above which a carcass can be premium (U).
const PREMIUM_MIN_CONFORMATION: u8 = 4;
/// BMS at or above which a carcass can be premium.
const PREMIUM_MIN_BMS: u8 = 5;

/// Extra marbling and yield from a finishing regime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SynergyBonuses {
    /// Added to the marbling score (1–5 scale).
    #[serde(default)]
    pub marbling: f64,
    /// Added to dressing yield, in percentage points.
    #[serde(default)]
    pub yield_percent: f64,
}

impl SynergyBonuses {
    /// Preset bonuses for the finishing flags: acorn (bellota) finishing adds
    /// +0.8 marbling and +1 point of yield; lecithin adds +0.3 marbling.
    pub fn for_finishing(is_bellota: bool, has_lecithin: bool) -> Self {
        let mut b = Self::default();
        if is_bellota {
            b.marbling += 0.8;
            b.yield_percent += 1.0;
        }
        if has_lecithin {
            b.marbling += 0.3;
        }
        b
    }
}

/// Optional modifiers for [`calculate_carcass`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CarcassOptions {
    #[serde(default)]
    pub is_bellota: bool,
    #[serde(default)]
    pub has_lecithin: bool,
    /// Treat as a castrate regardless of `sex`.
    #[serde(default)]
    pub is_ox: bool,
    #[serde(default)]
    pub sex: Option<Sex>,
    /// Explicit bonuses; when absent they derive from the finishing flags.
    #[serde(default)]
    pub synergy: Option<SynergyBonuses>,
    /// Calendar month, 0 = January.
    #[serde(default)]
    pub current_month: Option<u32>,
    #[serde(default)]
    pub father_breed: Option<BreedRecord>,
    #[serde(default)]
    pub mother_breed: Option<BreedRecord>,
}

impl CarcassOptions {
    fn is_castrate(&self) -> bool {
        self.is_ox || self.sex == Some(Sex::Castrated)
    }

    fn is_summer(&self) -> bool {
        self.current_month.is_some_and(|m| SUMMER_MONTHS.contains(&m))
    }

    fn synergy_bonuses(&self) -> SynergyBonuses {
        self.synergy
            .unwrap_or_else(|| SynergyBonuses::for_finishing(self.is_bellota, self.has_lecithin))
    }
}

/// EU carcass conformation class, worst (P) to best (S).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Seurop {
    P,
    O,
    R,
    U,
    E,
    S,
}

impl Seurop {
    const ORDER: [Seurop; 6] = [Seurop::P, Seurop::O, Seurop::R, Seurop::U, Seurop::E, Seurop::S];

    /// Class for a 1–6 score; out-of-range scores clamp to P or S.
    pub fn from_score(score: u8) -> Self {
        Self::ORDER[usize::from(score.clamp(1, 6)) - 1]
    }

    /// 1 for P up to 6 for S.
    pub fn score(self) -> u8 {
        self as u8 + 1
    }

    pub fn letter(self) -> char {
        match self {
            Seurop::P => 'P',
            Seurop::O => 'O',
            Seurop::R => 'R',
            Seurop::U => 'U',
            Seurop::E => 'E',
            Seurop::S => 'S',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ORDER
            .into_iter()
            .find(|s| s.letter() == c.to_ascii_uppercase())
    }
}

impl fmt::Display for Seurop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Estimated carcass outcome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarcassResult {
    /// Dressing yield fraction, 4 decimals.
    pub yield_fraction: f64,
    /// Dressing yield percent, 2 decimals.
    pub yield_percent: f64,
    /// Carcass weight in kg, 1 decimal.
    pub carcass_weight_kg: f64,
    /// Marbling score on the 1–5 scale, 1 decimal.
    pub marbling_score: f64,
    /// Beef Marbling Standard, 1–12.
    pub bms: u8,
    pub conformation: Seurop,
    pub premium: bool,
    /// Bonuses that were applied.
    pub synergy_bonus: SynergyBonuses,
}

/// Position of `x` within `[lo, hi]`, clamped to [0, 1].
fn normalize(x: f64, lo: f64, hi: f64) -> f64 {
    ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

/// Yield assumed by breed code when the record has no yield potential.
fn fallback_yield(code: &str) -> f64 {
    match code {
        "AZB" => 0.65,
        "LIM" | "BDA" => 0.61,
        "CHA" => 0.60,
        "ANG" | "HER" => 0.57,
        _ => 0.55,
    }
}

/// Merit from both parents when they differ, else the breed itself.
fn effective_merit(breed: &BreedRecord, options: &CarcassOptions) -> GeneticMerit {
    match (&options.father_breed, &options.mother_breed) {
        (Some(sire), Some(dam)) if sire.code() != dam.code() => GeneticMerit::cross(sire, dam),
        _ => GeneticMerit::of(breed),
    }
}

fn dressing_yield(
    breed: &BreedRecord,
    merit: &GeneticMerit,
    age_months: f64,
    diet_energy_mcal: f64,
    synergy: &SynergyBonuses,
    options: &CarcassOptions,
) -> f64 {
    let base = merit
        .yield_potential
        .unwrap_or_else(|| fallback_yield(&breed.code()));
    let sex_adj = if options.is_castrate() {
        -0.005
    } else {
        match options.sex {
            Some(Sex::Male) => 0.02,
            Some(Sex::Female) => -0.015,
            _ => 0.0,
        }
    };
    let finish = normalize(diet_energy_mcal, 2.0, 3.0) * 0.02;
    let maturity = normalize(age_months, 12.0, 36.0) * 0.015;
    (base + sex_adj + finish + maturity + synergy.yield_percent / 100.0).clamp(MIN_YIELD, MAX_YIELD)
}

/// Internal marbling score, floored at 1 but not capped.
fn marbling_score(
    breed: &BreedRecord,
    merit: &GeneticMerit,
    weight_kg: f64,
    age_months: f64,
    diet_energy_mcal: f64,
    synergy: &SynergyBonuses,
    options: &CarcassOptions,
) -> f64 {
    let mut score = merit.marbling + normalize(diet_energy_mcal, 2.0, 3.2) * 2.5;
    // Light, young animals cannot express their potential.
    score *= 0.5 + 0.5 * normalize(weight_kg, 300.0, 600.0);
    score += synergy.marbling;
    if options.is_summer() && breed.heat_tolerance_or_default() < 5.0 {
        score -= 0.5;
    }
    if options.is_castrate() {
        score += 0.5;
        if age_months > 36.0 {
            score += 0.3;
        }
    }
    score.max(1.0)
}

fn bms_from_score(score: f64) -> u8 {
    (1.0 + (score - 1.0) * 2.2).round().clamp(1.0, 12.0) as u8
}

fn conformation_score(
    breed: &BreedRecord,
    merit: &GeneticMerit,
    weight_kg: f64,
    diet_energy_mcal: f64,
    options: &CarcassOptions,
) -> u8 {
    let mut score = merit.conformation + normalize(diet_energy_mcal, 2.2, 3.0) * 1.5;
    if options.is_summer() {
        let tolerance = breed.heat_tolerance_or_default();
        if tolerance >= 8.0 {
            score += 0.3;
        } else if tolerance <= 3.0 {
            score -= 0.5;
        }
    }
    if !options.is_castrate() {
        match options.sex {
            Some(Sex::Male) => score += 0.5,
            // Double-muscled Belgian Blue heifers keep their frame.
            Some(Sex::Female) if breed.code() != "AZB" => score -= 0.5,
            _ => {}
        }
    }
    if weight_kg < 450.0 {
        score -= 0.8;
    }
    score.round().clamp(1.0, 6.0) as u8
}

/// Estimate yield, marbling, conformation and premium status of a carcass.
///
/// `adg` is carried for tracing; the quality model depends on energy
/// density, maturity and genetics rather than on the gain itself.
pub fn calculate_carcass(
    weight_kg: f64,
    age_months: f64,
    breed: &BreedRecord,
    diet_energy_mcal: f64,
    adg: f64,
    options: &CarcassOptions,
) -> CarcassResult {
    let merit = effective_merit(breed, options);
    let synergy = options.synergy_bonuses();

    let yield_fraction = dressing_yield(breed, &merit, age_months, diet_energy_mcal, &synergy, options);
    let internal_marbling =
        marbling_score(breed, &merit, weight_kg, age_months, diet_energy_mcal, &synergy, options);
    let bms = bms_from_score(internal_marbling);
    let conformation = Seurop::from_score(conformation_score(
        breed,
        &merit,
        weight_kg,
        diet_energy_mcal,
        options,
    ));
    let premium = conformation.score() >= PREMIUM_MIN_CONFORMATION && bms >= PREMIUM_MIN_BMS;

    debug!(
        breed = %breed.id,
        weight_kg,
        age_months,
        diet_energy_mcal,
        adg,
        yield_fraction,
        internal_marbling,
        bms,
        conformation = %conformation,
        premium,
        "carcass estimate"
    );

    CarcassResult {
        yield_fraction: round_to(yield_fraction, 4),
        yield_percent: round_to(yield_fraction * 100.0, 2),
        carcass_weight_kg: round_to(weight_kg * yield_fraction, 1),
        marbling_score: round_to(internal_marbling.clamp(1.0, 5.0), 1),
        bms,
        conformation,
        premium,
        synergy_bonus: synergy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn angus() -> BreedRecord {
        let mut b = BreedRecord::new("ANG", "Angus");
        b.marbling_potential = Some(4.0);
        b.conformation_potential = Some(4.0);
        b.yield_potential = Some(0.60);
        b.heat_tolerance = Some(4.0);
        b.milk_potential = Some(3.0);
        b
    }

    fn with_sex(sex: Sex) -> CarcassOptions {
        CarcassOptions {
            sex: Some(sex),
            ..CarcassOptions::default()
        }
    }

    #[test]
    fn castrated_angus_in_july() {
        let opts = CarcassOptions {
            sex: Some(Sex::Castrated),
            current_month: Some(6),
            ..CarcassOptions::default()
        };
        let r = calculate_carcass(500.0, 20.0, &angus(), 2.8, 1.3, &opts);

        // 0.60 − 0.005 castrate + 0.016 finish + 0.005 maturity
        assert_relative_eq!(r.yield_fraction, 0.616, epsilon = 1e-9);
        assert_relative_eq!(r.yield_percent, 61.6, epsilon = 1e-9);
        assert_relative_eq!(r.carcass_weight_kg, 308.0, epsilon = 1e-9);
        // (4 + 1.667) × 0.833 − 0.5 heat + 0.5 castrate = 4.72
        assert_relative_eq!(r.marbling_score, 4.7, epsilon = 1e-9);
        assert_eq!(r.bms, 9);
        assert_eq!(r.conformation, Seurop::E);
        assert!(r.premium);
    }

    #[test]
    fn heat_penalty_only_in_summer() {
        let summer = CarcassOptions {
            current_month: Some(6),
            ..with_sex(Sex::Male)
        };
        let winter = CarcassOptions {
            current_month: Some(0),
            ..with_sex(Sex::Male)
        };
        let hot = calculate_carcass(600.0, 24.0, &angus(), 3.2, 1.4, &summer);
        let cold = calculate_carcass(600.0, 24.0, &angus(), 3.2, 1.4, &winter);
        // (4 + 2.5) × 1.0 = 6.5 vs 6.0
        assert_eq!(cold.bms, 12);
        assert_eq!(hot.bms, 12);
        assert_eq!(hot.marbling_score, 5.0);

        let mut tolerant = angus();
        tolerant.heat_tolerance = Some(6.0);
        let r = calculate_carcass(400.0, 18.0, &tolerant, 2.6, 1.2, &summer);
        let r_cold = calculate_carcass(400.0, 18.0, &tolerant, 2.6, 1.2, &winter);
        assert_eq!(r.bms, r_cold.bms);
    }

    #[test]
    fn yield_is_clamped_for_adversarial_inputs() {
        let mut opts = with_sex(Sex::Male);
        opts.synergy = Some(SynergyBonuses {
            marbling: 10.0,
            yield_percent: 50.0,
        });
        let r = calculate_carcass(500.0, 1000.0, &angus(), 100.0, 5.0, &opts);
        assert_relative_eq!(r.yield_fraction, MAX_YIELD);
        assert_eq!(r.bms, 12);
        assert_eq!(r.marbling_score, 5.0);

        let mut poor = angus();
        poor.yield_potential = Some(0.30);
        poor.marbling_potential = Some(1.0);
        poor.conformation_potential = Some(2.0);
        let r = calculate_carcass(200.0, 1.0, &poor, -100.0, 0.0, &with_sex(Sex::Female));
        assert_relative_eq!(r.yield_fraction, MIN_YIELD);
        assert_eq!(r.bms, 1);
        assert_eq!(r.marbling_score, 1.0);
        // 2 − 0.5 heifer − 0.8 light frame
        assert_eq!(r.conformation, Seurop::P);
    }

    #[test]
    fn yield_fallback_by_breed_code() {
        for (code, base) in [("AZB", 0.65), ("LIM", 0.61), ("BDA", 0.61), ("CHA", 0.60), ("HER", 0.57), ("XYZ", 0.55)] {
            let b = BreedRecord::new(code, code);
            // Low energy and young age add nothing; no sex given.
            let r = calculate_carcass(500.0, 10.0, &b, 1.5, 1.0, &CarcassOptions::default());
            assert_relative_eq!(r.yield_fraction, base, epsilon = 1e-9);
        }
    }

    #[test]
    fn sex_adjusts_yield() {
        let b = angus();
        let m = calculate_carcass(500.0, 10.0, &b, 1.5, 1.0, &with_sex(Sex::Male));
        let f = calculate_carcass(500.0, 10.0, &b, 1.5, 1.0, &with_sex(Sex::Female));
        let ox = CarcassOptions {
            is_ox: true,
            ..with_sex(Sex::Male)
        };
        let o = calculate_carcass(500.0, 10.0, &b, 1.5, 1.0, &ox);
        assert_relative_eq!(m.yield_fraction, 0.62, epsilon = 1e-9);
        assert_relative_eq!(f.yield_fraction, 0.585, epsilon = 1e-9);
        assert_relative_eq!(o.yield_fraction, 0.595, epsilon = 1e-9);
    }

    #[test]
    fn old_ox_gets_extra_marbling() {
        let ox = with_sex(Sex::Castrated);
        let young = calculate_carcass(600.0, 30.0, &BreedRecord::new("X", "X"), 1.5, 1.0, &ox);
        let old = calculate_carcass(600.0, 40.0, &BreedRecord::new("X", "X"), 1.5, 1.0, &ox);
        // 1.0 + 0.5 → BMS 2; 1.0 + 0.8 → BMS 3
        assert_eq!(young.bms, 2);
        assert_eq!(old.bms, 3);
    }

    #[test]
    fn belgian_blue_heifer_keeps_conformation() {
        let mut azb = BreedRecord::new("AZB", "Azul Belga");
        azb.conformation_potential = Some(3.9);
        let mut lim = azb.clone();
        lim.id = "LIM".into();
        let opts = with_sex(Sex::Female);
        let a = calculate_carcass(500.0, 20.0, &azb, 2.0, 1.0, &opts);
        let l = calculate_carcass(500.0, 20.0, &lim, 2.0, 1.0, &opts);
        assert_eq!(a.conformation, Seurop::U);
        // 3.9 − 0.5
        assert_eq!(l.conformation, Seurop::R);
        // 4.5 rounds away from zero
        lim.conformation_potential = Some(5.0);
        let l = calculate_carcass(500.0, 20.0, &lim, 2.0, 1.0, &opts);
        assert_eq!(l.conformation, Seurop::E);
    }

    #[test]
    fn summer_climate_adaptation_on_conformation() {
        let summer = CarcassOptions {
            current_month: Some(7),
            ..with_sex(Sex::Castrated)
        };
        let mut zebu = BreedRecord::new("BRA", "Brahman");
        zebu.conformation_potential = Some(3.3);
        zebu.heat_tolerance = Some(9.0);
        let mut neutral = zebu.clone();
        neutral.heat_tolerance = Some(5.0);
        let mut cold_breed = zebu.clone();
        cold_breed.heat_tolerance = Some(2.0);
        let hot = calculate_carcass(500.0, 20.0, &zebu, 2.0, 1.0, &summer);
        let mid = calculate_carcass(500.0, 20.0, &neutral, 2.0, 1.0, &summer);
        let cold = calculate_carcass(500.0, 20.0, &cold_breed, 2.0, 1.0, &summer);
        assert_eq!(hot.conformation, Seurop::U);
        assert_eq!(mid.conformation, Seurop::R);
        assert_eq!(cold.conformation, Seurop::R);
        assert!(cold.bms <= mid.bms);
    }

    #[test]
    fn light_frame_is_penalised() {
        let b = angus();
        let heavy = calculate_carcass(450.0, 20.0, &b, 2.2, 1.0, &with_sex(Sex::Castrated));
        let light = calculate_carcass(449.0, 20.0, &b, 2.2, 1.0, &with_sex(Sex::Castrated));
        assert_eq!(heavy.conformation, Seurop::U);
        assert_eq!(light.conformation, Seurop::R);
    }

    #[test]
    fn cross_uses_parent_genetics() {
        let mut wagyu = BreedRecord::new("WAG", "Wagyu");
        wagyu.marbling_potential = Some(5.0);
        wagyu.conformation_potential = Some(3.0);
        wagyu.yield_potential = Some(0.58);
        wagyu.milk_potential = Some(3.0);
        let opts = CarcassOptions {
            father_breed: Some(angus()),
            mother_breed: Some(wagyu.clone()),
            ..CarcassOptions::default()
        };
        // Low energy, young: yield = mean(0.60, 0.58) + 0.02 heterosis.
        let r = calculate_carcass(600.0, 10.0, &angus(), 1.5, 1.0, &opts);
        assert_relative_eq!(r.yield_fraction, 0.61, epsilon = 1e-9);
        // mean(4, 5) + 0.5 maternal = 5.0 → BMS round(9.8) = 10
        assert_eq!(r.bms, 10);

        let same = CarcassOptions {
            father_breed: Some(angus()),
            mother_breed: Some(angus()),
            ..CarcassOptions::default()
        };
        let r = calculate_carcass(600.0, 10.0, &angus(), 1.5, 1.0, &same);
        assert_relative_eq!(r.yield_fraction, 0.60, epsilon = 1e-9);
    }

    #[test]
    fn finishing_presets_feed_the_bonus() {
        let opts = CarcassOptions {
            is_bellota: true,
            has_lecithin: true,
            ..CarcassOptions::default()
        };
        let r = calculate_carcass(500.0, 10.0, &angus(), 1.5, 1.0, &opts);
        assert_relative_eq!(r.synergy_bonus.marbling, 1.1, epsilon = 1e-12);
        assert_relative_eq!(r.synergy_bonus.yield_percent, 1.0);
        assert_relative_eq!(r.yield_fraction, 0.61, epsilon = 1e-9);

        let explicit = CarcassOptions {
            synergy: Some(SynergyBonuses::default()),
            ..opts
        };
        let r = calculate_carcass(500.0, 10.0, &angus(), 1.5, 1.0, &explicit);
        assert_eq!(r.synergy_bonus, SynergyBonuses::default());
    }

    #[test]
    fn premium_requires_both_conformation_and_marbling() {
        // Good conformation, poor marbling.
        let mut lean = BreedRecord::new("LIM", "Limousin");
        lean.conformation_potential = Some(5.0);
        lean.marbling_potential = Some(1.0);
        let r = calculate_carcass(550.0, 20.0, &lean, 2.0, 1.0, &with_sex(Sex::Male));
        assert!(r.conformation.score() >= 4);
        assert!(r.bms < 5);
        assert!(!r.premium);

        // Good marbling, poor conformation.
        let mut dairy = BreedRecord::new("WAG", "Wagyu");
        dairy.conformation_potential = Some(2.0);
        dairy.marbling_potential = Some(5.0);
        let r = calculate_carcass(600.0, 20.0, &dairy, 2.2, 1.0, &with_sex(Sex::Castrated));
        assert!(r.bms >= 5);
        assert!(r.conformation.score() < 4);
        assert!(!r.premium);
    }

    #[test]
    fn seurop_scale_round_trips() {
        for s in 1..=6u8 {
            assert_eq!(Seurop::from_score(s).score(), s);
        }
        assert_eq!(Seurop::from_score(0), Seurop::P);
        assert_eq!(Seurop::from_score(9), Seurop::S);
        assert_eq!(Seurop::from_letter('u'), Some(Seurop::U));
        assert_eq!(Seurop::from_letter('Z'), None);
        assert_eq!(Seurop::R.to_string(), "R");
    }

    proptest! {
        #[test]
        fn outputs_stay_in_range(
            weight in 1.0f64..1_500.0,
            age in 0.0f64..400.0,
            energy in -10.0f64..100.0,
            month in 0u32..12,
            sex_idx in 0usize..3,
            marbling in 0.0f64..6.0,
            conformation in 0.0f64..7.0,
            y in 0.3f64..0.9,
        ) {
            let sex = [Sex::Male, Sex::Female, Sex::Castrated][sex_idx];
            let mut b = angus();
            b.marbling_potential = Some(marbling);
            b.conformation_potential = Some(conformation);
            b.yield_potential = Some(y);
            let opts = CarcassOptions { sex: Some(sex), current_month: Some(month), ..CarcassOptions::default() };
            let r = calculate_carcass(weight, age, &b, energy, 1.0, &opts);
            prop_assert!((MIN_YIELD..=MAX_YIELD).contains(&r.yield_fraction));
            prop_assert!((1..=12).contains(&r.bms));
            prop_assert!((1.0..=5.0).contains(&r.marbling_score));
            prop_assert!("PORUES".contains(r.conformation.letter()));
            prop_assert_eq!(r.premium, r.conformation.score() >= 4 && r.bms >= 5);
        }
    }
}
