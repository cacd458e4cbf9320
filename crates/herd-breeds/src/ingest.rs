//! Delimited-text ingestion of breed tables.
//!
//! Header names are mapped onto [`BreedRecord`] fields once, here; nothing
//! downstream ever sees raw column names.

use crate::{slug, CatalogError};
use herd_core::{normalize_heat_tolerance, normalize_yield_potential, BreedRecord, HeatToleranceScale};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Id,
    Name,
    Subspecies,
    WeightMaleAdult,
    WeightFemaleAdult,
    AdgFeedlot,
    AdgGrazing,
    Fcr,
    HeatTolerance,
    MarblingPotential,
    CalvingEase,
    MilkPotential,
    ConformationPotential,
    YieldPotential,
}

impl Field {
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        let field = match key.as_str() {
            "id" | "code" | "codigo" | "breedid" | "breedcode" => Field::Id,
            "name" | "nombre" | "raza" | "breed" | "breedname" => Field::Name,
            "subspecies" | "subespecie" | "species" => Field::Subspecies,
            "weightmaleadult" | "adultweightmale" | "weightmale" | "pesomacho"
            | "pesomachoadulto" => Field::WeightMaleAdult,
            "weightfemaleadult" | "adultweightfemale" | "weightfemale" | "pesohembra"
            | "pesohembraadulta" => Field::WeightFemaleAdult,
            "adgfeedlot" | "gmdcebo" | "gmdfeedlot" => Field::AdgFeedlot,
            "adggrazing" | "adgpasture" | "gmdpasto" => Field::AdgGrazing,
            "fcr" | "feedconversion" | "feedconversionratio" | "indiceconversion" => Field::Fcr,
            "heattolerance" | "toleranciacalor" => Field::HeatTolerance,
            "marblingpotential" | "marbling" | "marmoleo" | "potencialmarmoleo" => {
                Field::MarblingPotential
            }
            "calvingease" | "facilidadparto" => Field::CalvingEase,
            "milkpotential" | "milk" | "potenciallechero" | "leche" => Field::MilkPotential,
            "conformationpotential" | "conformation" | "conformacion" => {
                Field::ConformationPotential
            }
            "yieldpotential" | "yield" | "dressingyield" | "rendimiento" | "rendimientocanal" => {
                Field::YieldPotential
            }
            _ => return None,
        };
        Some(field)
    }
}

/// Pick `;` when the header line has at least as many semicolons as commas.
pub(crate) fn detect_delimiter(source: &str) -> u8 {
    let header = source.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let semis = header.matches(';').count();
    let commas = header.matches(',').count();
    if semis > 0 && semis >= commas {
        b';'
    } else {
        b','
    }
}

fn parse_number(raw: &str, decimal_comma: bool) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let v = if decimal_comma {
        s.replace(',', ".").parse::<f64>().ok()?
    } else {
        s.parse::<f64>().ok()?
    };
    v.is_finite().then_some(v)
}

/// Parse a breed table into records, in row order.
///
/// Rows with fewer than two fields, or without any identity, are skipped.
pub(crate) fn parse_breed_table(source: &str) -> Result<Vec<BreedRecord>, CatalogError> {
    let delimiter = detect_delimiter(source);
    let decimal_comma = delimiter == b';';
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source.as_bytes());

    let columns: Vec<Option<Field>> = reader
        .headers()?
        .iter()
        .map(Field::from_header)
        .collect();
    if !columns
        .iter()
        .any(|c| matches!(c, Some(Field::Id) | Some(Field::Name)))
    {
        return Err(CatalogError::MissingIdentityColumn);
    }

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let row_number = row_idx + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                debug!(row_number, error = %e, "skipping unreadable breed row");
                continue;
            }
        };
        if row.len() < 2 {
            debug!(row_number, "skipping short breed row");
            continue;
        }

        let mut id: Option<String> = None;
        let mut name: Option<String> = None;
        let mut record = BreedRecord::new("", "");
        for (value, column) in row.iter().zip(&columns) {
            let Some(column) = column else { continue };
            let text = Some(value.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let number = parse_number(value, decimal_comma);
            match column {
                Field::Id => id = text,
                Field::Name => name = text,
                Field::Subspecies => record.subspecies = text,
                Field::WeightMaleAdult => record.weight_male_adult = number,
                Field::WeightFemaleAdult => record.weight_female_adult = number,
                Field::AdgFeedlot => record.adg_feedlot = number,
                Field::AdgGrazing => record.adg_grazing = number,
                Field::Fcr => record.fcr = number,
                // rescaled below, once the whole column is known
                Field::HeatTolerance => record.heat_tolerance = number,
                Field::MarblingPotential => record.marbling_potential = number,
                Field::CalvingEase => record.calving_ease = number,
                Field::MilkPotential => record.milk_potential = number,
                Field::ConformationPotential => record.conformation_potential = number,
                Field::YieldPotential => {
                    record.yield_potential = number.map(normalize_yield_potential)
                }
            }
        }

        let (id, name) = match (id, name) {
            (Some(id), Some(name)) => (id, name),
            (Some(id), None) => (id.clone(), id),
            (None, Some(name)) => (slug(&name).to_uppercase(), name),
            (None, None) => {
                debug!(row_number, "skipping breed row without id or name");
                continue;
            }
        };
        record.id = id.to_uppercase();
        record.name = name;
        records.push(record);
    }

    let scale = HeatToleranceScale::detect(records.iter().filter_map(|r| r.heat_tolerance));
    debug!(?scale, "heat tolerance scale");
    for r in &mut records {
        r.heat_tolerance = r.heat_tolerance.map(|t| normalize_heat_tolerance(t, scale));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn detects_delimiter_from_header() {
        assert_eq!(detect_delimiter("id;name;fcr\nA;B;1,5"), b';');
        assert_eq!(detect_delimiter("id,name,fcr\nA,B,1.5"), b',');
        assert_eq!(detect_delimiter("\n\nid,name\n"), b',');
    }

    #[test]
    fn maps_camel_and_snake_headers() {
        let src = "breedCode,Name,adgFeedlot,heat_tolerance,Yield Potential\n\
                   ang,Angus,1.45,0.4,60\n";
        let rows = parse_breed_table(src).unwrap();
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.id, "ANG");
        assert_eq!(r.adg_feedlot, Some(1.45));
        assert_relative_eq!(r.heat_tolerance.unwrap(), 4.0);
        assert_relative_eq!(r.yield_potential.unwrap(), 0.60);
    }

    #[test]
    fn fraction_column_rescales_full_tolerance() {
        let src = "id,name,heat_tolerance\nBRA,Brahman,1.0\nANG,Angus,0.4\nRET,Retinta,0.8\n";
        let rows = parse_breed_table(src).unwrap();
        let t: Vec<f64> = rows.iter().map(|r| r.heat_tolerance.unwrap()).collect();
        assert_relative_eq!(t[0], 10.0);
        assert_relative_eq!(t[1], 4.0);
        assert_relative_eq!(t[2], 8.0);
    }

    #[test]
    fn canonical_column_is_kept() {
        let src = "id,name,heat_tolerance\nBRA,Brahman,9\nHOL,Holstein,1.0\nX,Xbreed,\n";
        let rows = parse_breed_table(src).unwrap();
        assert_relative_eq!(rows[0].heat_tolerance.unwrap(), 9.0);
        assert_relative_eq!(rows[1].heat_tolerance.unwrap(), 1.0);
        assert_eq!(rows[2].heat_tolerance, None);
    }

    #[test]
    fn decimal_comma_with_semicolons() {
        let src = "codigo;raza;rendimiento;marmoleo\nRET;Retinta;0,57;3\n";
        let rows = parse_breed_table(src).unwrap();
        assert_relative_eq!(rows[0].yield_potential.unwrap(), 0.57);
        assert_eq!(rows[0].marbling_potential, Some(3.0));
    }

    #[test]
    fn short_rows_are_skipped() {
        let src = "id;name;fcr\nANG;Angus;6.2\nlonely\nHER;Hereford;6.5\n";
        let rows = parse_breed_table(src).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ANG", "HER"]);
    }

    #[test]
    fn missing_id_derives_key_from_name() {
        let src = "name,fcr\nRubia Gallega,6.3\n";
        let rows = parse_breed_table(src).unwrap();
        assert_eq!(rows[0].id, "RUBIA_GALLEGA");
        assert_eq!(rows[0].name, "Rubia Gallega");
    }

    #[test]
    fn unparseable_numbers_become_none() {
        let src = "id,name,fcr,milk\nX,Xbreed,n/a,\n";
        let rows = parse_breed_table(src).unwrap();
        assert_eq!(rows[0].fcr, None);
        assert_eq!(rows[0].milk_potential, None);
    }

    #[test]
    fn header_without_identity_is_an_error() {
        let err = parse_breed_table("fcr,milk\n6.2,3\n").unwrap_err();
        assert!(matches!(err, CatalogError::MissingIdentityColumn));
    }
}
