//! Lifecycle staging from age, sex and reproductive status.
//!
//! Classification is a pure function of a point-in-time snapshot. Adult
//! females follow an ordered set of reproductive rules; every other animal is
//! placed in an age-banded table for its sex.

use herd_core::{AnimalSnapshot, Sex};
use serde::Serialize;

/// Females older than this follow the reproductive rules.
pub const ADULT_FEMALE_AGE_MONTHS: f64 = 15.0;

/// Textual nutrient requirement bands for one stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NutrientBands {
    /// Crude protein, percent of DM.
    pub protein_pct: &'static str,
    /// Energy density, Mcal ME/kg DM.
    pub energy_density: &'static str,
    /// Fibre, percent NDF of DM.
    pub fiber_pct: &'static str,
    /// Target average daily gain, kg/day.
    pub target_adg: &'static str,
}

/// Static descriptor of a lifecycle stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LifecycleStage {
    pub id: &'static str,
    pub name: &'static str,
    /// Upper age bound in months; `None` for an open-ended stage.
    pub max_age_months: Option<f64>,
    pub requirements: NutrientBands,
    pub diet_guidance: &'static str,
    pub risk_notes: &'static str,
}

const SUCKLING_BANDS: NutrientBands = NutrientBands {
    protein_pct: "18-20",
    energy_density: "3.0-3.2",
    fiber_pct: "<15 (starter)",
    target_adg: "0.7-0.9",
};

const WEANING_BANDS: NutrientBands = NutrientBands {
    protein_pct: "16-17",
    energy_density: "2.7-2.9",
    fiber_pct: "25-30",
    target_adg: "0.8-1.0",
};

const SUCKLING_GUIDANCE: &str =
    "Colostrum within 6 h of birth; milk or replacer plus starter feed ad libitum.";
const SUCKLING_RISKS: &str = "Diarrhoea and pneumonia; check navel and hydration daily.";
const WEANING_GUIDANCE: &str =
    "Move gradually onto forage plus concentrate over two to three weeks; clean water always.";
const WEANING_RISKS: &str = "Weaning stress and respiratory disease.";

static FEMALE_JUVENILE_STAGES: [LifecycleStage; 3] = [
    LifecycleStage {
        id: "heifer_calf_suckling",
        name: "Suckling Heifer Calf",
        max_age_months: Some(3.0),
        requirements: SUCKLING_BANDS,
        diet_guidance: SUCKLING_GUIDANCE,
        risk_notes: SUCKLING_RISKS,
    },
    LifecycleStage {
        id: "heifer_weaned",
        name: "Weaned Heifer",
        max_age_months: Some(8.0),
        requirements: WEANING_BANDS,
        diet_guidance: WEANING_GUIDANCE,
        risk_notes: WEANING_RISKS,
    },
    LifecycleStage {
        id: "heifer_rearing",
        name: "Rearing Heifer",
        max_age_months: None,
        requirements: NutrientBands {
            protein_pct: "13-14",
            energy_density: "2.4-2.6",
            fiber_pct: "35-40",
            target_adg: "0.6-0.8",
        },
        diet_guidance: "Forage-based ration with moderate concentrate; reach 60% of adult weight at first service.",
        risk_notes: "Over-conditioning impairs udder development; dystocia if bred undersized.",
    },
];

static MALE_STAGES: [LifecycleStage; 4] = [
    LifecycleStage {
        id: "bull_calf_suckling",
        name: "Suckling Bull Calf",
        max_age_months: Some(3.0),
        requirements: SUCKLING_BANDS,
        diet_guidance: SUCKLING_GUIDANCE,
        risk_notes: SUCKLING_RISKS,
    },
    LifecycleStage {
        id: "bull_weaned",
        name: "Weaned Bull Calf",
        max_age_months: Some(8.0),
        requirements: WEANING_BANDS,
        diet_guidance: WEANING_GUIDANCE,
        risk_notes: WEANING_RISKS,
    },
    LifecycleStage {
        id: "young_bull_finishing",
        name: "Finishing Young Bull",
        max_age_months: Some(24.0),
        requirements: NutrientBands {
            protein_pct: "13-15",
            energy_density: "2.8-3.1",
            fiber_pct: "20-25",
            target_adg: "1.3-1.6",
        },
        diet_guidance: "High-energy concentrate with 10-15% straw; step concentrate up over three weeks.",
        risk_notes: "Ruminal acidosis and bloat; keep effective fibre and a buffer in the ration.",
    },
    LifecycleStage {
        id: "bull_adult",
        name: "Adult Bull",
        max_age_months: None,
        requirements: NutrientBands {
            protein_pct: "10-11",
            energy_density: "2.2-2.4",
            fiber_pct: "45-50",
            target_adg: "0-0.3",
        },
        diet_guidance: "Maintenance forage; body condition 3 (1-5) before the breeding season.",
        risk_notes: "Lameness and excess condition reduce fertility.",
    },
];

static OX_STAGES: [LifecycleStage; 5] = [
    LifecycleStage {
        id: "steer_calf_suckling",
        name: "Suckling Steer Calf",
        max_age_months: Some(3.0),
        requirements: SUCKLING_BANDS,
        diet_guidance: SUCKLING_GUIDANCE,
        risk_notes: SUCKLING_RISKS,
    },
    LifecycleStage {
        id: "steer_growing",
        name: "Growing Steer",
        max_age_months: Some(12.0),
        requirements: WEANING_BANDS,
        diet_guidance: WEANING_GUIDANCE,
        risk_notes: "Urinary calculi on high-grain rations; keep Ca:P near 2:1.",
    },
    LifecycleStage {
        id: "steer_backgrounding",
        name: "Backgrounding Steer",
        max_age_months: Some(24.0),
        requirements: NutrientBands {
            protein_pct: "12-13",
            energy_density: "2.4-2.7",
            fiber_pct: "35-40",
            target_adg: "0.7-0.9",
        },
        diet_guidance: "Pasture or forage with moderate supplement; build frame before finishing.",
        risk_notes: "Parasite load on pasture; plan deworming.",
    },
    LifecycleStage {
        id: "ox_finishing",
        name: "Ox Finishing",
        max_age_months: Some(48.0),
        requirements: NutrientBands {
            protein_pct: "11-12",
            energy_density: "2.7-3.0",
            fiber_pct: "25-30",
            target_adg: "0.9-1.2",
        },
        diet_guidance: "Long finish on forage plus cereal; intramuscular fat develops slowly.",
        risk_notes: "Laminitis on high-starch rations.",
    },
    LifecycleStage {
        id: "ox_mature",
        name: "Mature Ox",
        max_age_months: None,
        requirements: NutrientBands {
            protein_pct: "9-10",
            energy_density: "2.2-2.5",
            fiber_pct: "45-50",
            target_adg: "0.3-0.6",
        },
        diet_guidance: "Forage-based maintenance with an energy top-up in the final months.",
        risk_notes: "Excess external fat lowers carcass grade.",
    },
];

static COW_LACTATION_EARLY_GESTATION: LifecycleStage = LifecycleStage {
    id: "cow_lactation_early_gestation",
    name: "Lactation + Early Gestation",
    max_age_months: None,
    requirements: NutrientBands {
        protein_pct: "14-16",
        energy_density: "2.6-2.8",
        fiber_pct: "30-35",
        target_adg: "0-0.2",
    },
    diet_guidance: "Peak milk and a new pregnancy overlap: highest-quality forage plus concentrate and minerals.",
    risk_notes: "Negative energy balance, embryo loss and ketosis; monitor body condition weekly.",
};

static COW_LATE_GESTATION: LifecycleStage = LifecycleStage {
    id: "cow_late_gestation",
    name: "Late Gestation (Dry Cow)",
    max_age_months: None,
    requirements: NutrientBands {
        protein_pct: "11-12",
        energy_density: "2.2-2.4",
        fiber_pct: "40-45",
        target_adg: "0.3-0.5",
    },
    diet_guidance: "Foetal growth peaks: moderate energy, anionic minerals in the last three weeks.",
    risk_notes: "Milk fever and dystocia; avoid over-conditioning.",
};

static COW_LACTATION: LifecycleStage = LifecycleStage {
    id: "cow_lactation",
    name: "Adult Lactation",
    max_age_months: None,
    requirements: NutrientBands {
        protein_pct: "13-15",
        energy_density: "2.5-2.7",
        fiber_pct: "30-35",
        target_adg: "0-0.2",
    },
    diet_guidance: "Good-quality forage with concentrate to match milk yield.",
    risk_notes: "Body-condition loss delays rebreeding.",
};

static COW_MID_GESTATION: LifecycleStage = LifecycleStage {
    id: "cow_mid_gestation",
    name: "Mid Gestation",
    max_age_months: None,
    requirements: NutrientBands {
        protein_pct: "9-10",
        energy_density: "2.0-2.2",
        fiber_pct: "45-50",
        target_adg: "0.2-0.4",
    },
    diet_guidance: "Forage-based maintenance; recover condition before late gestation.",
    risk_notes: "Mineral deficiencies on poor pasture.",
};

static COW_EMPTY: LifecycleStage = LifecycleStage {
    id: "cow_empty",
    name: "Empty Cow (Maintenance)",
    max_age_months: None,
    requirements: NutrientBands {
        protein_pct: "8-9",
        energy_density: "1.9-2.1",
        fiber_pct: "50-55",
        target_adg: "0-0.2",
    },
    diet_guidance: "Maintenance ration; flush with extra energy three weeks before service.",
    risk_notes: "Prolonged open days; check fertility.",
};

fn staged_table(sex: Sex) -> &'static [LifecycleStage] {
    match sex {
        Sex::Female => &FEMALE_JUVENILE_STAGES,
        Sex::Male => &MALE_STAGES,
        Sex::Castrated => &OX_STAGES,
    }
}

fn adult_female_stage(is_pregnant: bool, months_pregnant: f64, days_post_partum: u32) -> &'static LifecycleStage {
    if days_post_partum < 90 && is_pregnant && months_pregnant < 3.0 {
        &COW_LACTATION_EARLY_GESTATION
    } else if is_pregnant && months_pregnant >= 7.0 {
        &COW_LATE_GESTATION
    } else if days_post_partum < 305 {
        &COW_LACTATION
    } else if is_pregnant {
        &COW_MID_GESTATION
    } else {
        &COW_EMPTY
    }
}

/// Classify one animal into its lifecycle stage.
///
/// `days_post_partum` is [`herd_core::NEVER_CALVED_DAYS`] for an animal that
/// has never calved.
pub fn classify(
    age_months: f64,
    sex: Sex,
    is_pregnant: bool,
    months_pregnant: f64,
    days_post_partum: u32,
) -> &'static LifecycleStage {
    if sex == Sex::Female && age_months > ADULT_FEMALE_AGE_MONTHS {
        return adult_female_stage(is_pregnant, months_pregnant, days_post_partum);
    }
    let table = staged_table(sex);
    table
        .iter()
        .find(|s| s.max_age_months.map_or(true, |max| max >= age_months))
        .unwrap_or(&table[table.len() - 1])
}

/// Classify a snapshot at the given age.
pub fn classify_snapshot(animal: &AnimalSnapshot, age_months: f64) -> &'static LifecycleStage {
    let p = animal.pregnancy_or_default();
    classify(
        age_months,
        animal.sex,
        p.is_pregnant,
        p.months_pregnant,
        p.days_post_partum,
    )
}
