#![deny(warnings)]

//! Breed catalog: loads genetic reference records from delimited text and
//! resolves names, codes and cross expressions to breed data.
//!
//! The catalog is an explicit value built once by the caller and shared by
//! reference; it holds no global state.

mod cross;
mod ingest;

pub use cross::{split_cross, HybridBreedRecord};

use herd_core::BreedRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Breed table bundled with the crate.
const BUILTIN_BREEDS: &str = include_str!("../../../assets/breeds.csv");

/// Errors raised while loading a breed table.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// The header row has neither an id nor a name column.
    #[error("breed table has no id or name column")]
    MissingIdentityColumn,
}

/// Outcome of [`BreedCatalog::resolve`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ResolvedBreed {
    Pure(BreedRecord),
    Hybrid(HybridBreedRecord),
}

impl ResolvedBreed {
    /// The parameters the engines should use.
    pub fn record(&self) -> &BreedRecord {
        match self {
            ResolvedBreed::Pure(r) => r,
            ResolvedBreed::Hybrid(h) => &h.record,
        }
    }

    pub fn into_record(self) -> BreedRecord {
        match self {
            ResolvedBreed::Pure(r) => r,
            ResolvedBreed::Hybrid(h) => h.record,
        }
    }

    /// Sire and dam of a hybrid.
    pub fn parents(&self) -> Option<(&BreedRecord, &BreedRecord)> {
        match self {
            ResolvedBreed::Pure(_) => None,
            ResolvedBreed::Hybrid(h) => Some((&h.sire, &h.dam)),
        }
    }

    pub fn is_hybrid(&self) -> bool {
        matches!(self, ResolvedBreed::Hybrid(_))
    }
}

/// Keyed, insertion-ordered collection of breed records.
#[derive(Clone, Debug, Default)]
pub struct BreedCatalog {
    records: Vec<BreedRecord>,
    by_id: HashMap<String, usize>,
}

impl BreedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog loaded from the bundled breed table.
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.load(BUILTIN_BREEDS)?;
        Ok(catalog)
    }

    /// Parse a `;`- or `,`-delimited breed table.
    ///
    /// Loading is one-shot: when the catalog already holds data this is a
    /// no-op returning `Ok(0)`. Otherwise returns the number of records added.
    pub fn load(&mut self, source: &str) -> Result<usize, CatalogError> {
        if !self.is_empty() {
            debug!(records = self.len(), "breed catalog already loaded");
            return Ok(0);
        }
        let mut added = 0;
        for record in ingest::parse_breed_table(source)? {
            if self.insert(record) {
                added += 1;
            }
        }
        info!(added, "breed catalog loaded");
        Ok(added)
    }

    /// Read a breed table from disk, then [`load`](Self::load) it.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, CatalogError> {
        if !self.is_empty() {
            return Ok(0);
        }
        let text = fs::read_to_string(path.as_ref())?;
        self.load(&text)
    }

    /// Insert a record keyed by its upper-cased id; an existing key wins.
    pub fn insert(&mut self, mut record: BreedRecord) -> bool {
        record.id = record.code();
        if self.by_id.contains_key(&record.id) {
            debug!(id = %record.id, "duplicate breed id ignored");
            return false;
        }
        self.by_id.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreedRecord> {
        self.records.iter()
    }

    /// Look up by breed code, case-insensitively.
    pub fn get(&self, id: &str) -> Option<&BreedRecord> {
        self.by_id
            .get(&id.trim().to_uppercase())
            .map(|&i| &self.records[i])
    }

    /// First exact (case-insensitive) name match, else the first record whose
    /// name contains the query.
    pub fn find_by_exact_or_partial_name(&self, name: &str) -> Option<&BreedRecord> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.name.to_lowercase() == query)
            .or_else(|| {
                self.records
                    .iter()
                    .find(|r| r.name.to_lowercase().contains(&query))
            })
    }

    /// Match the slug of `input` against record ids and name slugs.
    pub fn find_by_slug(&self, input: &str) -> Option<&BreedRecord> {
        let wanted = slug(input);
        if wanted.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| slug(&r.id) == wanted || slug(&r.name) == wanted)
    }

    /// Resolve one breed reference: id, then name, then slug.
    pub fn resolve_single(&self, input: &str) -> Option<&BreedRecord> {
        self.get(input)
            .or_else(|| self.find_by_exact_or_partial_name(input))
            .or_else(|| self.find_by_slug(input))
    }

    /// Resolve a breed id, a name, or a two-breed cross expression.
    ///
    /// The first part of a cross is the sire, the second the dam. A cross of a
    /// breed with itself ("ANG/Angus") is not a hybrid: it returns
    /// [`ResolvedBreed::Pure`] with that breed's own record.
    pub fn resolve(&self, input: &str) -> Option<ResolvedBreed> {
        if let Some(r) = self.resolve_single(input) {
            return Some(ResolvedBreed::Pure(r.clone()));
        }
        let (sire_ref, dam_ref) = split_cross(input)?;
        let sire = self.resolve_single(sire_ref)?;
        let dam = self.resolve_single(dam_ref)?;
        if sire.id == dam.id {
            return Some(ResolvedBreed::Pure(sire.clone()));
        }
        debug!(sire = %sire.id, dam = %dam.id, "resolved cross expression");
        Some(ResolvedBreed::Hybrid(HybridBreedRecord::cross(
            input, sire, dam,
        )))
    }
}

/// Lower-case ASCII slug with `_` separators; common Spanish/French accents
/// are folded.
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.trim().chars() {
        let c = fold_accent(c.to_lowercase().next().unwrap_or(c));
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}
