//! Populated places from a GeoNames dump.
//!
//! The dump is tab separated without a header. Only three columns matter
//! here: the ASCII name, the feature class and the population.

use std::{fs::File, io::Read, path::Path};

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use flate2::read::{GzDecoder, MultiGzDecoder};
use log::debug;
use strum_macros::{Display, EnumString};
use tar::Archive;

const NAME_COLUMN: usize = 2;
const FEATURE_CLASS_COLUMN: usize = 6;
const POPULATION_COLUMN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum FeatureClass {
    #[strum(serialize = "A")]
    Administrative,
    #[strum(serialize = "H")]
    Hydrographic,
    #[strum(serialize = "L")]
    Area,
    #[strum(serialize = "P")]
    PopulatedPlace,
    #[strum(serialize = "R")]
    Road,
    #[strum(serialize = "S")]
    Spot,
    #[strum(serialize = "T")]
    Hypsographic,
    #[strum(serialize = "U")]
    Undersea,
    #[strum(serialize = "V")]
    Vegetation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    /// `None` for a blank or unknown class cell.
    pub feature_class: Option<FeatureClass>,
    pub population: u64,
}

pub fn read_places<R: Read>(reader: R) -> Result<Vec<Place>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut places = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let line = idx + 1;
        let record = record.with_context(|| format!("Failed to read line {}", line))?;

        if record.len() <= POPULATION_COLUMN {
            return Err(anyhow!(
                "Line {} has {} columns, expected at least {}",
                line,
                record.len(),
                POPULATION_COLUMN + 1
            ));
        }

        let name = record.get(NAME_COLUMN).unwrap_or("").trim().to_string();
        let raw_class = record.get(FEATURE_CLASS_COLUMN).unwrap_or("").trim();
        let feature_class = match raw_class.parse::<FeatureClass>() {
            Ok(class) => Some(class),
            Err(_) => {
                debug!("no feature class '{}' on line {}", raw_class, line);
                None
            }
        };

        let raw_population = record.get(POPULATION_COLUMN).unwrap_or("").trim();
        let population = if raw_population.is_empty() {
            0
        } else {
            raw_population.parse().map_err(|_| {
                anyhow!("Invalid population '{}' on line {}", raw_population, line)
            })?
        };

        places.push(Place {
            name,
            feature_class,
            population,
        });
    }
    debug!("read {} places", places.len());
    Ok(places)
}

/// Reads a plain, `.gz` or `.tar.gz` dump. For archives the first regular
/// file is used.
pub fn load_places(path: &Path) -> Result<Vec<Place>> {
    let file_name = path.to_string_lossy();
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    if file_name.ends_with(".tar.gz") {
        let mut archive = Archive::new(GzDecoder::new(file));
        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.header().entry_type().is_file() {
                return read_places(&mut entry);
            }
        }
        Err(anyhow!("No readable file found in tar archive {}", path.display()))
    } else if file_name.ends_with(".gz") {
        read_places(MultiGzDecoder::new(file))
    } else {
        read_places(file)
    }
}

/// Places of `class` with a positive population of at least `min_population`,
/// ascending by population. Equal populations keep their input order.
pub fn select_populated(
    places: &[Place],
    class: FeatureClass,
    min_population: u64,
) -> Vec<Place> {
    let mut selected: Vec<Place> = places
        .iter()
        .filter(|p| p.feature_class == Some(class) && p.population > 0)
        .filter(|p| p.population >= min_population)
        .cloned()
        .collect();
    selected.sort_by_key(|p| p.population);
    selected
}
