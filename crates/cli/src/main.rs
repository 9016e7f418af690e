// Rank the populated places of a GeoNames dump by population: ordinal rank,
// percentile rank and weighted percentile rank.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;

mod places;
mod report;

use places::{load_places, select_populated, FeatureClass, Place};
use report::{
    find_place, format_place, rank_places, write_table_to_path, write_table_to_stdout,
    RankedPlace,
};

#[derive(Parser, Debug)]
#[command(name = "wprank", version, about)]
struct Args {
    /// GeoNames dump, plain text, .gz or .tar.gz
    input: PathBuf,

    /// Feature class to keep
    #[arg(long, default_value = "P")]
    feature_class: FeatureClass,

    /// Also rank a view restricted to places with at least this population.
    /// May be given several times.
    #[arg(long = "min-population")]
    min_population: Vec<u64>,

    /// Print the measures of this place in every view
    #[arg(long = "place")]
    places: Vec<String>,

    /// Write the full ranked table here ("-" for stdout, ".gz" to compress)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of threads (default: all available)
    #[arg(long, env = "WPRANK_THREADS")]
    threads: Option<usize>,

    /// Print timings
    #[arg(long)]
    time: bool,
}

struct View {
    label: String,
    min_population: u64,
}

fn views(min_population: &[u64]) -> Vec<View> {
    std::iter::once(View {
        label: "All".to_string(),
        min_population: 0,
    })
    .chain(min_population.iter().map(|&min| View {
        label: format!("Population >= {}", min),
        min_population: min,
    }))
    .collect()
}

fn rank_views(
    places: &[Place],
    class: FeatureClass,
    views: &[View],
) -> Result<Vec<Vec<RankedPlace>>> {
    views
        .par_iter()
        .map(|view| rank_places(select_populated(places, class, view.min_population)))
        .collect()
}

/// Header of `view` followed by one line per name found in it. Missing and
/// ambiguous names are logged and skipped.
fn view_lines(view: &View, ranked: &[RankedPlace], names: &[String]) -> Vec<String> {
    let mut lines = vec![format!("{} ({} places):", view.label, ranked.len())];
    for name in names {
        match find_place(ranked, name) {
            Ok(place) => lines.push(format_place(place)),
            Err(err) => warn!("{}: {:#}", view.label, err),
        }
    }
    lines
}

fn write_summary<W: Write>(
    out: &mut W,
    views: &[View],
    ranked_views: &[Vec<RankedPlace>],
    names: &[String],
) -> io::Result<()> {
    for (view, ranked) in views.iter().zip(ranked_views) {
        writeln!(out)?;
        for line in view_lines(view, ranked, names) {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

fn write_timings<W: Write>(
    out: &mut W,
    load: Duration,
    rank: Duration,
    output: Duration,
) -> io::Result<()> {
    let total = load + rank + output;
    writeln!(out, "Data loading:   {:8.3} seconds", load.as_secs_f64())?;
    writeln!(out, "Ranking:        {:8.3} seconds", rank.as_secs_f64())?;
    writeln!(out, "Output writing: {:8.3} seconds", output.as_secs_f64())?;
    writeln!(out, "Total time:     {:8.3} seconds", total.as_secs_f64())
}

/// `-` sends the table to stdout; the summary then moves to stderr.
fn table_on_stdout(output: Option<&Path>) -> bool {
    output.is_some_and(|path| path.as_os_str() == "-")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to set thread pool")?;
        info!("using {} threads", threads);
    }

    let load_start = Instant::now();
    let places = load_places(&args.input)?;
    let load_duration = load_start.elapsed();
    info!("loaded {} places from {}", places.len(), args.input.display());

    let rank_start = Instant::now();
    let views = views(&args.min_population);
    let ranked_views = rank_views(&places, args.feature_class, &views)?;
    let rank_duration = rank_start.elapsed();

    let piped = table_on_stdout(args.output.as_deref());
    let mut summary: Box<dyn Write> = if piped {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    write_summary(&mut summary, &views, &ranked_views, &args.places)?;
    summary.flush()?;

    let output_start = Instant::now();
    match &args.output {
        Some(_) if piped => write_table_to_stdout(&ranked_views[0])?,
        Some(path) => write_table_to_path(&ranked_views[0], path)?,
        None => {}
    }
    let output_duration = output_start.elapsed();

    if args.time {
        write_timings(&mut summary, load_duration, rank_duration, output_duration)?;
        summary.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclipped_view_comes_first() {
        let views = views(&[1000, 50]);
        let labels: Vec<&str> = views.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["All", "Population >= 1000", "Population >= 50"]);
        assert_eq!(views[0].min_population, 0);
    }

    #[test]
    fn parses_repeated_flags() {
        let args = Args::try_parse_from([
            "wprank",
            "DE.txt",
            "--min-population",
            "1000",
            "--place",
            "Berlin",
            "--place",
            "Elend",
            "--feature-class",
            "p",
        ])
        .unwrap();
        assert_eq!(args.min_population, vec![1000]);
        assert_eq!(args.places, vec!["Berlin", "Elend"]);
        assert_eq!(args.feature_class, FeatureClass::PopulatedPlace);
        assert!(!args.time);
    }

    fn place(name: &str, population: u64) -> Place {
        Place {
            name: name.to_string(),
            feature_class: Some(FeatureClass::PopulatedPlace),
            population,
        }
    }

    fn sample_places() -> Vec<Place> {
        vec![
            place("Berlin", 3_000),
            place("Sorge", 100),
            place("Neustadt", 1_000),
            place("Neustadt", 500),
            Place {
                name: "Rhein".to_string(),
                feature_class: None,
                population: 9_000,
            },
        ]
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn clipped_view_is_ranked_on_its_own() {
        let views = views(&[1000]);
        let ranked = rank_views(&sample_places(), FeatureClass::PopulatedPlace, &views).unwrap();
        assert_eq!(ranked[0].len(), 4);
        assert_eq!(ranked[1].len(), 2);

        let all = view_lines(&views[0], &ranked[0], &names(&["Berlin", "Sorge"]));
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], "All (4 places):");
        assert!(all[1].starts_with("Berlin      : population =     3000, n-th largest =      1"));
        assert!(all[1].ends_with("weighted percentile rank =  100.000"));
        assert!(all[2].ends_with("weighted percentile rank =    2.174"), "{}", all[2]);

        // Neustadt (1000) is the smaller of two places above the threshold.
        let clipped = view_lines(&views[1], &ranked[1], &names(&["Neustadt", "Berlin"]));
        assert_eq!(clipped.len(), 3);
        assert!(clipped[1].contains("n-th largest =      2"));
        assert!(clipped[1].ends_with("weighted percentile rank =   25.000"));
    }

    #[test]
    fn missing_and_ambiguous_names_are_skipped() {
        let views = views(&[]);
        let ranked = rank_views(&sample_places(), FeatureClass::PopulatedPlace, &views).unwrap();
        let wanted = names(&["Nowhere", "Neustadt", "Rhein", "Sorge"]);
        let lines = view_lines(&views[0], &ranked[0], &wanted);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Sorge"));
    }

    #[test]
    fn piped_table_stays_pure_tsv() {
        assert!(table_on_stdout(Some(Path::new("-"))));
        assert!(!table_on_stdout(Some(Path::new("ranks.tsv"))));
        assert!(!table_on_stdout(None));

        let views = views(&[1000]);
        let ranked = rank_views(&sample_places(), FeatureClass::PopulatedPlace, &views).unwrap();
        let mut summary = Vec::new();
        write_summary(&mut summary, &views, &ranked, &names(&["Berlin"])).unwrap();
        write_timings(&mut summary, Duration::ZERO, Duration::ZERO, Duration::ZERO).unwrap();
        let mut table = Vec::new();
        report::write_table(&ranked[0], &mut table).unwrap();

        let summary = String::from_utf8(summary).unwrap();
        assert!(summary.contains("All (4 places):"));
        assert!(summary.contains("Total time:"));

        let table = String::from_utf8(table).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("asciiname\t"));
        assert!(lines.iter().all(|l| l.split('\t').count() == 8), "{table}");
    }

    #[test]
    fn rejects_unknown_feature_class() {
        assert!(Args::try_parse_from(["wprank", "DE.txt", "--feature-class", "Q"]).is_err());
    }
}
