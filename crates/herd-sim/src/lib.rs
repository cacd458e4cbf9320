#![deny(warnings)]

//! Orchestration: runs one animal (or a batch) through breed resolution,
//! lifecycle staging, nutrition, carcass and market valuation.

use chrono::{Datelike, NaiveDate};
use herd_breeds::{BreedCatalog, ResolvedBreed};
use herd_carcass::{calculate_carcass, CarcassOptions, CarcassResult, SynergyBonuses, SUMMER_MONTHS};
use herd_core::{
    validate_diet, validate_snapshot, AnimalSnapshot, BreedRecord, DietInput, HeatStress, ValidationError,
    WeatherSample,
};
use herd_market::{average_price, calculate_value, get_price, MarketCategory};
use herd_nutrition::lifecycle::{classify_snapshot, LifecycleStage};
use herd_nutrition::{calculate_diet, calculate_performance, DietTargets, PerformanceResult};
use rayon::prelude::*;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Month (0 = January) assumed for the carcass model when the weather alone
/// indicates heat stress outside the summer calendar.
const HEAT_STRESS_MONTH: u32 = 6;

/// Simulation-wide settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Breed used when an animal's own breed cannot be resolved.
    #[serde(default)]
    pub default_breed: Option<String>,
    /// Slaughter weight for the days-to-target estimate.
    #[serde(default)]
    pub target_weight_kg: Option<f64>,
}

/// External conditions on the reference date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    /// Reference date for age and season.
    pub date: NaiveDate,
    #[serde(default)]
    pub weather: Option<WeatherSample>,
    #[serde(default)]
    pub is_bellota: bool,
    #[serde(default)]
    pub has_lecithin: bool,
    /// Overrides the finishing presets when present.
    #[serde(default)]
    pub synergy: Option<SynergyBonuses>,
}

impl Conditions {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            weather: None,
            is_bellota: false,
            has_lecithin: false,
            synergy: None,
        }
    }
}

/// One independent unit of work for [`Simulator::simulate_batch`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimalCase {
    pub animal: AnimalSnapshot,
    pub diet: DietInput,
    pub conditions: Conditions,
}

/// Errors from a single simulation.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("unknown breed: {0}")]
    UnknownBreed(String),
    #[error("invalid live weight: {0}")]
    InvalidWeight(f64),
    #[error("birth date {birth} is after reference date {on}")]
    InvalidAge { birth: NaiveDate, on: NaiveDate },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Everything computed for one animal.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub breed_id: String,
    pub breed_name: String,
    pub hybrid: bool,
    pub age_months: f64,
    pub stage: &'static LifecycleStage,
    pub diet_targets: DietTargets,
    pub performance: PerformanceResult,
    /// Feed conversion, kg DM per kg gain; `None` unless gaining.
    pub feed_conversion: Option<f64>,
    /// Days to [`SimConfig::target_weight_kg`], when configured and gaining.
    pub days_to_target: Option<f64>,
    pub thi: Option<f64>,
    pub heat_stress: Option<HeatStress>,
    pub carcass: CarcassResult,
    pub market_category: MarketCategory,
    pub price_per_kg: Decimal,
    pub carcass_value: Decimal,
    pub daily_diet_cost: Decimal,
    /// Daily ration cost divided by predicted gain; `None` unless gaining.
    pub cost_per_kg_gain: Option<Decimal>,
}

/// Totals over a batch of results.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub simulated: usize,
    pub failed: usize,
    pub total_carcass_kg: f64,
    pub total_value: Decimal,
    /// Carcass-weighted mean €/kg.
    pub average_price: Option<Decimal>,
}

impl BatchSummary {
    pub fn from_results(results: &[Result<SimulationReport, SimError>]) -> Self {
        let reports: Vec<&SimulationReport> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let prices: Vec<Decimal> = reports.iter().map(|r| r.price_per_kg).collect();
        let weights: Vec<f64> = reports.iter().map(|r| r.carcass.carcass_weight_kg).collect();
        Self {
            simulated: reports.len(),
            failed: results.len() - reports.len(),
            total_carcass_kg: weights.iter().sum(),
            total_value: reports.iter().map(|r| r.carcass_value).sum(),
            average_price: average_price(&prices, &weights),
        }
    }
}

/// Runs the production pipeline against a shared breed catalog.
#[derive(Clone, Debug)]
pub struct Simulator<'a> {
    catalog: &'a BreedCatalog,
    config: SimConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(catalog: &'a BreedCatalog, config: SimConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn resolve_breed(&self, reference: &str) -> Result<ResolvedBreed, SimError> {
        if let Some(found) = self.catalog.resolve(reference) {
            return Ok(found);
        }
        let fallback = self.config.default_breed.as_deref().and_then(|d| self.catalog.resolve(d));
        match fallback {
            Some(found) => {
                warn!(breed = reference, fallback = %found.record().id, "unknown breed, using default");
                Ok(found)
            }
            None => Err(SimError::UnknownBreed(reference.to_string())),
        }
    }

    fn resolve_parent(&self, reference: Option<&str>) -> Option<BreedRecord> {
        let reference = reference?.trim();
        if reference.is_empty() {
            return None;
        }
        let found = self.catalog.resolve(reference).map(ResolvedBreed::into_record);
        if found.is_none() {
            warn!(parent = reference, "unresolvable parent breed ignored");
        }
        found
    }

    /// Simulate one animal on `conditions.date`.
    pub fn simulate(
        &self,
        animal: &AnimalSnapshot,
        diet: &DietInput,
        conditions: &Conditions,
    ) -> Result<SimulationReport, SimError> {
        let resolved = self.resolve_breed(&animal.breed)?;
        check_snapshot(animal, conditions.date)?;
        validate_diet(diet)?;
        if let Some(w) = &conditions.weather {
            w.validate()?;
        }

        let breed = resolved.record();
        let weight = animal.live_weight_kg;
        let age_months = animal.age_months(conditions.date);
        let stage = classify_snapshot(animal, age_months);

        let diet_targets = calculate_diet(breed, weight, age_months).ok_or(SimError::InvalidWeight(weight))?;
        let stats = diet.stats();
        let performance = calculate_performance(breed, &stats, weight);

        let thi = conditions.weather.map(|w| w.thi());
        let heat_stress = conditions.weather.map(|w| w.heat_stress());
        let mut month = conditions.date.month0();
        if heat_stress.is_some_and(|h| h >= HeatStress::Moderate) && !SUMMER_MONTHS.contains(&month) {
            month = HEAT_STRESS_MONTH;
        }

        let explicit_sire = self.resolve_parent(animal.father_breed.as_deref());
        let explicit_dam = self.resolve_parent(animal.mother_breed.as_deref());
        let (father_breed, mother_breed) = match resolved.parents() {
            Some((sire, dam)) => (
                explicit_sire.or_else(|| Some(sire.clone())),
                explicit_dam.or_else(|| Some(dam.clone())),
            ),
            None => (explicit_sire, explicit_dam),
        };
        let options = CarcassOptions {
            is_bellota: conditions.is_bellota,
            has_lecithin: conditions.has_lecithin,
            is_ox: false,
            sex: Some(animal.sex),
            synergy: conditions.synergy,
            current_month: Some(month),
            father_breed,
            mother_breed,
        };
        let carcass = calculate_carcass(
            weight,
            age_months,
            breed,
            stats.energy_density(),
            performance.predicted_adg,
            &options,
        );

        let market_category = MarketCategory::for_animal(animal.sex, age_months);
        let class = carcass.conformation.to_string();
        let price_per_kg = get_price(market_category.label(), &class);
        let carcass_value = calculate_value(carcass.carcass_weight_kg, market_category.label(), &class);

        let daily_diet_cost = diet.daily_cost();
        let cost_per_kg_gain = if performance.predicted_adg > 0.0 {
            Decimal::from_f64(performance.predicted_adg)
                .filter(|adg| !adg.is_zero())
                .map(|adg| (daily_diet_cost / adg).round_dp(2))
        } else {
            None
        };
        let days_to_target = self
            .config
            .target_weight_kg
            .and_then(|target| performance.days_to_weight(weight, target));

        debug!(
            breed = %breed.id,
            age_months,
            stage = stage.id,
            adg = performance.predicted_adg,
            limiting = %performance.limiting_factor,
            conformation = %carcass.conformation,
            bms = carcass.bms,
            %carcass_value,
            "animal simulated"
        );

        Ok(SimulationReport {
            breed_id: breed.id.clone(),
            breed_name: breed.name.clone(),
            hybrid: resolved.is_hybrid(),
            age_months,
            stage,
            diet_targets,
            performance,
            feed_conversion: performance.feed_conversion(stats.dmi_kg),
            days_to_target,
            thi,
            heat_stress,
            carcass,
            market_category,
            price_per_kg,
            carcass_value,
            daily_diet_cost,
            cost_per_kg_gain,
        })
    }

    /// Simulate independent cases in parallel; results keep input order.
    pub fn simulate_batch(&self, cases: &[AnimalCase]) -> Vec<Result<SimulationReport, SimError>> {
        let results: Vec<_> = cases
            .par_iter()
            .map(|c| self.simulate(&c.animal, &c.diet, &c.conditions))
            .collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(cases = cases.len(), failed, "batch simulated");
        results
    }
}

fn check_snapshot(animal: &AnimalSnapshot, on: NaiveDate) -> Result<(), SimError> {
    match validate_snapshot(animal, on) {
        // the breed was already resolved, possibly through the default
        Ok(()) | Err(ValidationError::EmptyBreed) => Ok(()),
        Err(ValidationError::NonPositiveWeight(w)) => Err(SimError::InvalidWeight(w)),
        Err(ValidationError::NonFinite("live_weight_kg")) => Err(SimError::InvalidWeight(animal.live_weight_kg)),
        Err(ValidationError::BornInFuture { birth, on }) => Err(SimError::InvalidAge { birth, on }),
        Err(e) => Err(SimError::Invalid(e)),
    }
}
