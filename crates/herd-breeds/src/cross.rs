//! Cross expressions ("Angus x Limousin") and the blended hybrid record.

use herd_core::{BreedRecord, GeneticMerit};
use serde::Serialize;

/// Separators in priority order, matched case-insensitively.
const SEPARATORS: [&str; 4] = [" cruzado con ", " cruce ", " x ", "/"];

/// Split a cross expression into its sire and dam parts.
///
/// Returns `None` when no separator is present, when either side is blank, or
/// when the expression names more than two breeds.
pub fn split_cross(input: &str) -> Option<(&str, &str)> {
    let lowered = input.to_ascii_lowercase();
    let sep = SEPARATORS.iter().find(|s| lowered.contains(*s))?;
    let at = lowered.find(sep)?;
    let (sire, rest) = (&input[..at], &input[at + sep.len()..]);
    let rest_lowered = &lowered[at + sep.len()..];
    let sire_lowered = &lowered[..at];
    if SEPARATORS
        .iter()
        .any(|s| rest_lowered.contains(s) || sire_lowered.contains(s))
    {
        return None;
    }
    let (sire, dam) = (sire.trim(), rest.trim());
    if sire.is_empty() || dam.is_empty() {
        return None;
    }
    Some((sire, dam))
}

/// A first-cross breed derived on demand from its two parents.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HybridBreedRecord {
    /// Blended parameters, named after the cross expression.
    pub record: BreedRecord,
    pub sire: BreedRecord,
    pub dam: BreedRecord,
}

impl HybridBreedRecord {
    /// Blend two parents: every numeric field is the mean of the parents (or
    /// whichever parent has a value), then the maternal effects and heterosis
    /// of [`GeneticMerit::cross`] replace marbling, conformation and yield.
    pub fn cross(label: &str, sire: &BreedRecord, dam: &BreedRecord) -> Self {
        let mut record = BreedRecord::new(format!("{}x{}", sire.code(), dam.code()), label.trim());
        record.subspecies = match (&sire.subspecies, &dam.subspecies) {
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            _ => None,
        };
        record.weight_male_adult = mean_opt(sire.weight_male_adult, dam.weight_male_adult);
        record.weight_female_adult = mean_opt(sire.weight_female_adult, dam.weight_female_adult);
        record.adg_feedlot = mean_opt(sire.adg_feedlot, dam.adg_feedlot);
        record.adg_grazing = mean_opt(sire.adg_grazing, dam.adg_grazing);
        record.fcr = mean_opt(sire.fcr, dam.fcr);
        record.heat_tolerance = mean_opt(sire.heat_tolerance, dam.heat_tolerance);
        record.calving_ease = mean_opt(sire.calving_ease, dam.calving_ease);
        record.milk_potential = mean_opt(sire.milk_potential, dam.milk_potential);

        let merit = GeneticMerit::cross(sire, dam);
        record.marbling_potential = Some(merit.marbling);
        record.conformation_potential = Some(merit.conformation);
        record.yield_potential = merit.yield_potential;

        Self {
            record,
            sire: sire.clone(),
            dam: dam.clone(),
        }
    }
}

fn mean_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}
