#![deny(warnings)]

//! Headless CLI: runs a herd scenario through the production pipeline.

use anyhow::{bail, Context, Result};
use herd_breeds::BreedCatalog;
use herd_core::{AnimalSnapshot, DietInput, DietLine};
use herd_sim::{AnimalCase, BatchSummary, Conditions, SimConfig, SimError, SimulationReport, Simulator};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<String>,
    breeds: Option<String>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next(),
            "--breeds" => args.breeds = it.next(),
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

/// Scenario file: shared settings plus the animals to simulate.
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    config: SimConfig,
    conditions: Conditions,
    animals: Vec<ScenarioAnimal>,
}

#[derive(Debug, Deserialize)]
struct ScenarioAnimal {
    id: String,
    animal: AnimalSnapshot,
    diet: Ration,
    /// Replaces the scenario-wide conditions for this animal.
    #[serde(default)]
    conditions: Option<Conditions>,
}

/// A ration given either by its totals or by its feed lines.
#[derive(Debug, Deserialize)]
struct Ration {
    #[serde(default)]
    lines: Vec<DietLine>,
    dmi_kg: Option<f64>,
    total_energy_mcal: Option<f64>,
    protein_g: Option<f64>,
}

impl Ration {
    fn into_diet(self) -> Result<DietInput> {
        match (self.dmi_kg, self.total_energy_mcal, self.protein_g) {
            (Some(dmi_kg), Some(total_energy_mcal), Some(protein_g)) => Ok(DietInput {
                lines: self.lines,
                dmi_kg,
                total_energy_mcal,
                protein_g,
            }),
            (None, None, None) if !self.lines.is_empty() => Ok(DietInput::from_lines(self.lines)),
            _ => bail!("diet needs dmi_kg, total_energy_mcal and protein_g, or feed lines"),
        }
    }
}

fn load_catalog(path: Option<&str>) -> Result<BreedCatalog> {
    match path {
        Some(p) => {
            let mut catalog = BreedCatalog::new();
            catalog
                .load_path(p)
                .with_context(|| format!("loading breed table {p}"))?;
            Ok(catalog)
        }
        None => Ok(BreedCatalog::builtin()?),
    }
}

fn load_scenario(path: &str) -> Result<(SimConfig, Vec<(String, AnimalCase)>)> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading scenario {path}"))?;
    let scenario: Scenario = serde_yaml::from_str(&text).with_context(|| format!("parsing scenario {path}"))?;
    let mut cases = Vec::with_capacity(scenario.animals.len());
    for a in scenario.animals {
        let diet = a.diet.into_diet().with_context(|| format!("animal {}", a.id))?;
        let conditions = a.conditions.unwrap_or_else(|| scenario.conditions.clone());
        cases.push((
            a.id,
            AnimalCase {
                animal: a.animal,
                diet,
                conditions,
            },
        ));
    }
    Ok((scenario.config, cases))
}

fn print_line(id: &str, result: &Result<SimulationReport, SimError>) {
    match result {
        Ok(r) => println!(
            "{id} | {} | {} | ADG {:.2} kg/d ({}) | carcass {:.1} kg {} BMS {}{} | {} {} €/kg = {} €",
            r.breed_name,
            r.stage.name,
            r.performance.predicted_adg,
            r.performance.limiting_factor,
            r.carcass.carcass_weight_kg,
            r.carcass.conformation,
            r.carcass.bms,
            if r.carcass.premium { " premium" } else { "" },
            r.market_category,
            r.price_per_kg,
            r.carcass_value,
        ),
        Err(e) => println!("{id} | error: {e}"),
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    info!(?args, git = env!("GIT_SHA"), "starting CLI");

    let catalog = load_catalog(args.breeds.as_deref())?;

    let Some(scenario_path) = args.scenario.as_deref() else {
        println!("Catalog OK | breeds: {}", catalog.len());
        for b in catalog.iter() {
            println!(
                "{} | {} | ADG feedlot {} | heat tolerance {:.1}",
                b.id,
                b.name,
                b.adg_feedlot.map_or_else(|| "-".to_string(), |v| format!("{v:.2}")),
                b.heat_tolerance_or_default(),
            );
        }
        return Ok(());
    };

    let (config, cases) = load_scenario(scenario_path)?;
    let (ids, cases): (Vec<String>, Vec<AnimalCase>) = cases.into_iter().unzip();
    let sim = Simulator::new(&catalog, config);
    let results = sim.simulate_batch(&cases);
    let summary = BatchSummary::from_results(&results);

    if args.json {
        let animals: Vec<_> = ids
            .iter()
            .zip(&results)
            .map(|(id, r)| match r {
                Ok(report) => json!({ "id": id, "report": report }),
                Err(e) => json!({ "id": id, "error": e.to_string() }),
            })
            .collect();
        let out = json!({ "animals": animals, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (id, r) in ids.iter().zip(&results) {
            print_line(id, r);
        }
        println!(
            "Summary | simulated: {} | failed: {} | carcass: {:.1} kg | value: {} € | avg price: {} €/kg",
            summary.simulated,
            summary.failed,
            summary.total_carcass_kg,
            summary.total_value,
            summary
                .average_price
                .map_or_else(|| "-".to_string(), |p| p.round_dp(2).to_string()),
        );
    }

    Ok(())
}
