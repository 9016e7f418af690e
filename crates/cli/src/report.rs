//! Ranked place tables and their text/TSV output.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use flate2::{write::GzEncoder, Compression};
use ndarray::Array1;
use wprank::{weighted_percentile_rank_array, OrdinalSummary};

use crate::places::Place;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlace {
    pub place: Place,
    pub rank: usize,
    pub percentile_rank: f64,
    pub inverse_rank: usize,
    pub weighted_percentile_rank: f64,
    pub cumulative_probability: f64,
}

/// Attaches every ranking measure to `places`, weighting by population.
pub fn rank_places(places: Vec<Place>) -> Result<Vec<RankedPlace>> {
    let population: Array1<f64> = places.iter().map(|p| p.population as f64).collect();

    let weighted = weighted_percentile_rank_array(&population)?;
    let ordinal = OrdinalSummary::from_values(&population.to_vec())?;

    Ok(places
        .into_iter()
        .enumerate()
        .map(|(i, place)| RankedPlace {
            place,
            rank: ordinal.rank[i],
            percentile_rank: ordinal.percentile_rank[i],
            inverse_rank: ordinal.inverse_rank[i],
            weighted_percentile_rank: weighted[i],
            cumulative_probability: ordinal.cumulative_probability[i],
        })
        .collect())
}

/// The single place called `name`. Missing and ambiguous names are errors.
pub fn find_place<'a>(ranked: &'a [RankedPlace], name: &str) -> Result<&'a RankedPlace> {
    let mut matches = ranked.iter().filter(|r| r.place.name == name);
    let first = matches
        .next()
        .ok_or_else(|| anyhow!("No place named '{}'", name))?;
    let extra = matches.count();
    if extra > 0 {
        return Err(anyhow!("'{}' matches {} places", name, extra + 1));
    }
    Ok(first)
}

pub fn format_place(ranked: &RankedPlace) -> String {
    format!(
        "{:<12}: population = {:>8}, n-th largest = {:>6}, percentile rank = {:>8.3}, weighted percentile rank = {:>8.3}",
        ranked.place.name,
        ranked.place.population,
        ranked.inverse_rank,
        ranked.percentile_rank,
        ranked.weighted_percentile_rank,
    )
}

pub fn write_table<W: Write>(ranked: &[RankedPlace], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(writer);

    wtr.write_record([
        "asciiname",
        "feature_class",
        "pop",
        "rank",
        "percentile_rank",
        "inverse_rank",
        "weighted_percentile_rank",
        "distrib",
    ])?;

    for r in ranked {
        wtr.write_record([
            r.place.name.clone(),
            r.place
                .feature_class
                .map(|class| class.to_string())
                .unwrap_or_default(),
            r.place.population.to_string(),
            r.rank.to_string(),
            r.percentile_rank.to_string(),
            r.inverse_rank.to_string(),
            r.weighted_percentile_rank.to_string(),
            r.cumulative_probability.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the table to `path`, gzip-compressed when it ends in `.gz`.
pub fn write_table_to_path(ranked: &[RankedPlace], path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    if path.to_string_lossy().ends_with(".gz") {
        let mut enc = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_table(ranked, &mut enc)?;
        enc.finish()?.flush()?;
    } else {
        let mut out = BufWriter::new(file);
        write_table(ranked, &mut out)?;
        out.flush()?;
    }
    Ok(())
}

pub fn write_table_to_stdout(ranked: &[RankedPlace]) -> Result<()> {
    let stdout = io::stdout();
    write_table(ranked, stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::FeatureClass;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn place(name: &str, population: u64) -> Place {
        Place {
            name: name.to_string(),
            feature_class: Some(FeatureClass::PopulatedPlace),
            population,
        }
    }

    fn sample() -> Vec<RankedPlace> {
        rank_places(vec![
            place("Asselfingen", 10),
            place("Elend", 10),
            place("Buxtehude", 20),
            place("Berlin", 60),
        ])
        .unwrap()
    }

    #[test]
    fn ranks_by_population_share() {
        let ranked = sample();
        let weighted: Vec<f64> = ranked.iter().map(|r| r.weighted_percentile_rank).collect();
        assert_eq!(weighted, vec![20.0, 20.0, 40.0, 100.0]);

        let berlin = find_place(&ranked, "Berlin").unwrap();
        assert_eq!(berlin.rank, 4);
        assert_eq!(berlin.inverse_rank, 1);
        assert_eq!(berlin.percentile_rank, 100.0);
        assert_eq!(berlin.cumulative_probability, 75.0);
    }

    #[test]
    fn lookup_rejects_missing_and_duplicate_names() {
        let mut ranked = sample();
        assert!(find_place(&ranked, "Hamburg").is_err());

        ranked[1].place.name = "Asselfingen".to_string();
        let err = find_place(&ranked, "Asselfingen").unwrap_err();
        assert!(err.to_string().contains("matches 2 places"), "{err}");
    }

    #[test]
    fn formats_like_the_summary_lines() {
        let ranked = sample();
        let line = format_place(find_place(&ranked, "Buxtehude").unwrap());
        assert_eq!(
            line,
            "Buxtehude   : population =       20, n-th largest =      2, percentile rank =   75.000, weighted percentile rank =   40.000"
        );
    }

    #[test]
    fn table_has_header_and_one_row_per_place() {
        let mut buf = Vec::new();
        write_table(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("asciiname\tfeature_class\tpop"));
        assert_eq!(lines[4], "Berlin\tP\t60\t4\t100\t1\t100\t75");
    }

    #[test]
    fn gz_output_is_compressed() {
        let path = std::env::temp_dir().join(format!("wprank-{}-ranks.tsv.gz", std::process::id()));
        write_table_to_path(&sample(), &path).unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text.lines().count(), 5);
        std::fs::remove_file(path).ok();
    }
}
