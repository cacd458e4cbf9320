#![deny(warnings)]

//! Core domain models and invariants for the herd simulator.
//!
//! This crate defines the serializable value types shared by the breed
//! catalog, the nutrition/carcass engines and the orchestration layer, with
//! validation helpers guarding the basic invariants at the boundary.

pub mod climate;
pub mod genetics;

pub use climate::{HeatStress, WeatherSample};
pub use genetics::GeneticMerit;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Marbling potential assumed when a breed record carries none (scale 1–5).
pub const DEFAULT_MARBLING_POTENTIAL: f64 = 1.0;
/// Conformation potential assumed when missing (scale 1=P … 6=S).
pub const DEFAULT_CONFORMATION_POTENTIAL: f64 = 3.0;
/// Yield potential assumed for a parent breed in a cross when missing.
pub const DEFAULT_CROSS_YIELD_POTENTIAL: f64 = 0.58;
/// Heat tolerance assumed when missing (canonical 1–10 scale).
pub const DEFAULT_HEAT_TOLERANCE: f64 = 5.0;
/// Days post-partum for an animal that has never calved.
pub const NEVER_CALVED_DAYS: u32 = 999;

/// Average days per month used for age arithmetic.
const DAYS_PER_MONTH: f64 = 30.4375;

/// Sex / reproductive category of an animal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Entire male.
    #[serde(rename = "Macho", alias = "macho", alias = "Male", alias = "male")]
    Male,
    /// Female.
    #[serde(rename = "Hembra", alias = "hembra", alias = "Female", alias = "female")]
    Female,
    /// Castrated male (steer / ox).
    #[serde(
        rename = "Castrado",
        alias = "castrado",
        alias = "Buey",
        alias = "buey",
        alias = "Castrated",
        alias = "castrated"
    )]
    Castrated,
}

impl Sex {
    /// Label used in the source records.
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Macho",
            Sex::Female => "Hembra",
            Sex::Castrated => "Castrado",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "macho" | "male" | "m" | "toro" => Ok(Sex::Male),
            "hembra" | "female" | "f" | "h" | "vaca" => Ok(Sex::Female),
            "castrado" | "buey" | "castrated" | "ox" | "steer" => Ok(Sex::Castrated),
            other => Err(ValidationError::UnknownSex(other.to_string())),
        }
    }
}

/// Genetic reference parameters for one breed.
///
/// Every numeric field is optional; the engines document the defaults they
/// assume for a missing value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreedRecord {
    /// Breed code, e.g. "ANG".
    pub id: String,
    /// Display name, e.g. "Angus".
    pub name: String,
    /// Parent subspecies, e.g. "Bos taurus".
    #[serde(default)]
    pub subspecies: Option<String>,
    /// Adult male body weight in kg.
    #[serde(default)]
    pub weight_male_adult: Option<f64>,
    /// Adult female body weight in kg.
    #[serde(default)]
    pub weight_female_adult: Option<f64>,
    /// Reference average daily gain in feedlot, kg/day.
    #[serde(default)]
    pub adg_feedlot: Option<f64>,
    /// Reference average daily gain on pasture, kg/day.
    #[serde(default)]
    pub adg_grazing: Option<f64>,
    /// Feed conversion ratio (kg DM per kg gain).
    #[serde(default)]
    pub fcr: Option<f64>,
    /// Heat tolerance on the canonical 1–10 scale.
    #[serde(default)]
    pub heat_tolerance: Option<f64>,
    /// Marbling potential (1–5).
    #[serde(default)]
    pub marbling_potential: Option<f64>,
    /// Calving ease (1–5).
    #[serde(default)]
    pub calving_ease: Option<f64>,
    /// Milk potential (1–5).
    #[serde(default)]
    pub milk_potential: Option<f64>,
    /// Conformation potential (1=P … 6=S).
    #[serde(default)]
    pub conformation_potential: Option<f64>,
    /// Dressing yield potential as a fraction, e.g. 0.60.
    #[serde(default)]
    pub yield_potential: Option<f64>,
}

impl BreedRecord {
    /// A record with identity only; all genetic parameters unknown.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subspecies: None,
            weight_male_adult: None,
            weight_female_adult: None,
            adg_feedlot: None,
            adg_grazing: None,
            fcr: None,
            heat_tolerance: None,
            marbling_potential: None,
            calving_ease: None,
            milk_potential: None,
            conformation_potential: None,
            yield_potential: None,
        }
    }

    /// Heat tolerance on the 1–10 scale, defaulting to the neutral midpoint.
    pub fn heat_tolerance_or_default(&self) -> f64 {
        self.heat_tolerance.unwrap_or(DEFAULT_HEAT_TOLERANCE)
    }

    pub fn marbling_or_default(&self) -> f64 {
        self.marbling_potential.unwrap_or(DEFAULT_MARBLING_POTENTIAL)
    }

    pub fn conformation_or_default(&self) -> f64 {
        self.conformation_potential
            .unwrap_or(DEFAULT_CONFORMATION_POTENTIAL)
    }

    /// Upper-cased breed code, used by code-keyed tables.
    pub fn code(&self) -> String {
        self.id.trim().to_uppercase()
    }
}

/// Scale a heat-tolerance column was recorded on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatToleranceScale {
    /// 0–1 fractions.
    Fraction,
    /// The canonical 1–10 scale.
    Canonical,
}

impl HeatToleranceScale {
    /// A column is fractional when it has values and none exceeds 1.0.
    ///
    /// The decision is per column, so a fully tolerant breed recorded as
    /// `1.0` in a fraction table still maps to 10.
    pub fn detect<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut any = false;
        for v in values {
            if v > 1.0 {
                return Self::Canonical;
            }
            any = true;
        }
        if any {
            Self::Fraction
        } else {
            Self::Canonical
        }
    }
}

/// Bring a heat-tolerance value onto the canonical 1–10 scale, clamped to
/// [0, 10].
pub fn normalize_heat_tolerance(raw: f64, scale: HeatToleranceScale) -> f64 {
    let scaled = match scale {
        HeatToleranceScale::Fraction => raw * 10.0,
        HeatToleranceScale::Canonical => raw,
    };
    scaled.clamp(0.0, 10.0)
}

/// Bring a yield-potential value onto the fractional scale (percent → fraction).
pub fn normalize_yield_potential(raw: f64) -> f64 {
    if raw > 1.0 {
        raw / 100.0
    } else {
        raw
    }
}

/// Reproductive status of a female at snapshot time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PregnancyState {
    #[serde(default)]
    pub is_pregnant: bool,
    #[serde(default)]
    pub months_pregnant: f64,
    #[serde(default = "never_calved")]
    pub days_post_partum: u32,
}

fn never_calved() -> u32 {
    NEVER_CALVED_DAYS
}

impl Default for PregnancyState {
    fn default() -> Self {
        Self {
            is_pregnant: false,
            months_pregnant: 0.0,
            days_post_partum: NEVER_CALVED_DAYS,
        }
    }
}

/// Point-in-time facts about one animal, as supplied by the record store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimalSnapshot {
    /// Current live weight in kg (> 0).
    pub live_weight_kg: f64,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    /// Breed name, id, or a cross expression such as "Angus x Limousin".
    pub breed: String,
    #[serde(default)]
    pub father_breed: Option<String>,
    #[serde(default)]
    pub mother_breed: Option<String>,
    #[serde(default)]
    pub pregnancy: Option<PregnancyState>,
}

impl AnimalSnapshot {
    /// Age in (fractional) months on the given date; zero if born later.
    pub fn age_months(&self, on: NaiveDate) -> f64 {
        let days = (on - self.birth_date).num_days();
        (days.max(0) as f64) / DAYS_PER_MONTH
    }

    pub fn pregnancy_or_default(&self) -> PregnancyState {
        self.pregnancy.unwrap_or_default()
    }
}

/// Nutrient profile of one feedstuff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub name: String,
    /// Dry-matter fraction of the as-fed weight (0–1).
    #[serde(default = "full_dry_matter")]
    pub dry_matter_fraction: f64,
    /// Energy density, Mcal per kg DM.
    #[serde(default)]
    pub energy_mcal_per_kg_dm: f64,
    /// Crude protein, percent of DM.
    #[serde(default)]
    pub crude_protein_pct: f64,
}

fn full_dry_matter() -> f64 {
    1.0
}

/// One ingredient of a ration with its daily amount and cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DietLine {
    pub feed: FeedItem,
    /// Amount offered per day, kg as fed.
    pub amount_kg: f64,
    /// Daily cost of this line.
    #[serde(default)]
    pub cost: Decimal,
}

impl DietLine {
    pub fn dry_matter_kg(&self) -> f64 {
        self.amount_kg * self.feed.dry_matter_fraction
    }
}

/// Aggregate nutrient supply consumed by the performance model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DietStats {
    /// Dry-matter intake, kg/day.
    pub dmi_kg: f64,
    /// Total energy supplied, Mcal/day.
    pub total_energy_mcal: f64,
    /// Total crude protein supplied, g/day.
    pub protein_g: f64,
}

impl DietStats {
    /// Energy density in Mcal/kg DM; zero for an empty ration.
    pub fn energy_density(&self) -> f64 {
        if self.dmi_kg > 0.0 {
            self.total_energy_mcal / self.dmi_kg
        } else {
            0.0
        }
    }

    /// Crude protein as percent of dry matter; zero for an empty ration.
    pub fn crude_protein_pct(&self) -> f64 {
        if self.dmi_kg > 0.0 {
            self.protein_g / (self.dmi_kg * 1000.0) * 100.0
        } else {
            0.0
        }
    }
}

/// A daily ration: its composition plus the aggregate nutrient totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DietInput {
    #[serde(default)]
    pub lines: Vec<DietLine>,
    pub dmi_kg: f64,
    pub total_energy_mcal: f64,
    pub protein_g: f64,
}

impl DietInput {
    /// Build a ration whose totals are computed from the feed profiles.
    pub fn from_lines(lines: Vec<DietLine>) -> Self {
        let mut dmi_kg = 0.0;
        let mut total_energy_mcal = 0.0;
        let mut protein_g = 0.0;
        for line in &lines {
            let dm = line.dry_matter_kg();
            dmi_kg += dm;
            total_energy_mcal += dm * line.feed.energy_mcal_per_kg_dm;
            protein_g += dm * 1000.0 * line.feed.crude_protein_pct / 100.0;
        }
        Self {
            lines,
            dmi_kg,
            total_energy_mcal,
            protein_g,
        }
    }

    pub fn stats(&self) -> DietStats {
        DietStats {
            dmi_kg: self.dmi_kg,
            total_energy_mcal: self.total_energy_mcal,
            protein_g: self.protein_g,
        }
    }

    /// Sum of the line costs for one day.
    pub fn daily_cost(&self) -> Decimal {
        self.lines.iter().map(|l| l.cost).sum()
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Weight must be strictly positive and finite.
    #[error("live weight must be > 0 (got {0})")]
    NonPositiveWeight(f64),
    /// Numeric field must be finite.
    #[error("non-finite numeric value in {0}")]
    NonFinite(&'static str),
    /// Amount or total must be non-negative.
    #[error("negative value in {0}")]
    Negative(&'static str),
    /// Birth date after the reference date.
    #[error("birth date {birth} is after reference date {on}")]
    BornInFuture { birth: NaiveDate, on: NaiveDate },
    /// Sex label not recognised.
    #[error("unknown sex: {0}")]
    UnknownSex(String),
    /// Breed reference is blank.
    #[error("breed reference is empty")]
    EmptyBreed,
    /// Relative humidity outside [0, 100].
    #[error("relative humidity must be within [0,100] (got {0})")]
    InvalidHumidity(f64),
    /// Fraction outside [0, 1].
    #[error("{0} must be within [0,1]")]
    InvalidFraction(&'static str),
}

/// Validate an animal snapshot against a reference date.
pub fn validate_snapshot(a: &AnimalSnapshot, on: NaiveDate) -> Result<(), ValidationError> {
    if !a.live_weight_kg.is_finite() {
        return Err(ValidationError::NonFinite("live_weight_kg"));
    }
    if a.live_weight_kg <= 0.0 {
        return Err(ValidationError::NonPositiveWeight(a.live_weight_kg));
    }
    if a.birth_date > on {
        return Err(ValidationError::BornInFuture {
            birth: a.birth_date,
            on,
        });
    }
    if let Some(p) = &a.pregnancy {
        if !p.months_pregnant.is_finite() {
            return Err(ValidationError::NonFinite("months_pregnant"));
        }
        if p.months_pregnant < 0.0 {
            return Err(ValidationError::Negative("months_pregnant"));
        }
    }
    if a.breed.trim().is_empty() {
        return Err(ValidationError::EmptyBreed);
    }
    Ok(())
}

/// Validate ration totals and lines.
pub fn validate_diet(d: &DietInput) -> Result<(), ValidationError> {
    let totals = [
        ("dmi_kg", d.dmi_kg),
        ("total_energy_mcal", d.total_energy_mcal),
        ("protein_g", d.protein_g),
    ];
    for (field, v) in totals {
        if !v.is_finite() {
            return Err(ValidationError::NonFinite(field));
        }
        if v < 0.0 {
            return Err(ValidationError::Negative(field));
        }
    }
    for line in &d.lines {
        if !line.amount_kg.is_finite() {
            return Err(ValidationError::NonFinite("amount_kg"));
        }
        if line.amount_kg < 0.0 {
            return Err(ValidationError::Negative("amount_kg"));
        }
        if !(0.0..=1.0).contains(&line.feed.dry_matter_fraction) {
            return Err(ValidationError::InvalidFraction("dry_matter_fraction"));
        }
        if line.cost < Decimal::ZERO {
            return Err(ValidationError::Negative("cost"));
        }
    }
    Ok(())
}
