//! Cadastral unit report CLI
//!
//! Loads unit records, resolves a selection and writes the PDF report.

use anyhow::{Context, Result};
use cadastre_core::{
    aggregate, ActiveView, Aggregate, SelectionState, SortKey, UnitStore, ViewFilter,
};
use cadastre_report::{
    format_area, format_percent, GeneratedReport, MapCapture, PngFile, ReportBuilder,
    ReportConfig,
};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "cadastre-cli")]
#[command(version, about = "Select cadastral units and generate a PDF report")]
struct Args {
    /// JSON file with unit records (bare array or {success, data} envelope)
    #[arg(short, long)]
    records: PathBuf,

    /// Original indices to select, e.g. "0-3, 7"
    #[arg(short, long, conflicts_with = "all")]
    select: Option<String>,

    /// Select every unit
    #[arg(long)]
    all: bool,

    /// Leave common elements out of the selection
    #[arg(long)]
    private_only: bool,

    /// PNG snapshot of the location map
    #[arg(long)]
    map: Option<PathBuf>,

    /// Report configuration (TOML); defaults to $CADASTRE_REPORT_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the report is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the selection statistics as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Only print statistics, do not write a report
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the statistics, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let json = std::fs::read_to_string(&args.records)
        .with_context(|| format!("Failed to read records: {}", args.records.display()))?;
    let store = UnitStore::from_json(&json)
        .with_context(|| format!("Invalid records file: {}", args.records.display()))?;
    tracing::info!(units = store.len(), "Loaded unit records");

    let selection = resolve_selection(&store, &args)?;
    let stats = aggregate(store.records(), selection.indices());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats);
    }

    if args.dry_run {
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::from_env()?,
    };

    let capture = args.map.clone().map(PngFile);
    let report = build_report(
        &store,
        &selection,
        config,
        capture.as_ref().map(|c| c as &dyn MapCapture),
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let path = args.out_dir.join(&report.filename);
    std::fs::write(&path, &report.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(pages = report.page_count, "Wrote {}", path.display());
    println!("{}", path.display());
    Ok(())
}

/// The map is captured by the builder only after the selection resolves to
/// at least one record.
fn build_report<'a>(
    store: &'a UnitStore,
    selection: &'a SelectionState,
    config: ReportConfig,
    map: Option<&'a dyn MapCapture>,
) -> Result<GeneratedReport> {
    let mut builder = ReportBuilder::new(store, selection).config(config);
    if let Some(capture) = map {
        builder = builder.map_capture(capture);
    }
    Ok(builder.build()?)
}

fn resolve_selection(store: &UnitStore, args: &Args) -> Result<SelectionState> {
    let mut selection = if args.all {
        SelectionState::all(store)
    } else if let Some(ranges) = &args.select {
        parse_selection(ranges, store.len())?.into_iter().collect()
    } else {
        anyhow::bail!("Nothing to select: pass --select or --all");
    };

    if args.private_only {
        let view = ActiveView::filtered(store, &SortKey::canonical(), ViewFilter::PrivateOnly);
        selection = selection
            .indices()
            .iter()
            .copied()
            .filter(|&i| view.position(i).is_some())
            .collect();
    }

    tracing::debug!(selected = selection.len(), "Resolved selection");
    Ok(selection)
}

/// Parse index ranges like "0-3, 7" into sorted unique indices below `len`.
/// Out-of-range parts are dropped with a warning; ranges are clipped.
fn parse_selection(input: &str, len: usize) -> Result<BTreeSet<usize>> {
    let mut indices = BTreeSet::new();
    let mut ignored = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .with_context(|| format!("Invalid range start: {}", start))?;
            let end: usize = end
                .trim()
                .parse()
                .with_context(|| format!("Invalid range end: {}", end))?;
            if start > end {
                anyhow::bail!("Range start {} is after end {}", start, end);
            }
            if start >= len {
                ignored.push(part.to_string());
                continue;
            }
            if end >= len {
                ignored.push(format!("{}-{}", len, end));
            }
            indices.extend(start..=end.min(len - 1));
        } else {
            let index: usize = part
                .parse()
                .with_context(|| format!("Invalid index: {}", part))?;
            if index < len {
                indices.insert(index);
            } else {
                ignored.push(part.to_string());
            }
        }
    }

    if !ignored.is_empty() {
        tracing::warn!(?ignored, "Ignoring indices beyond the {} loaded units", len);
    }
    Ok(indices)
}

fn print_summary(stats: &Aggregate) {
    println!("{:<20} {:>8} {:>16} {:>8}", "Tipo", "Cantidad", "Superficie", "%");
    for (kind, totals) in &stats.by_kind {
        println!(
            "{:<20} {:>8} {:>16} {:>8}",
            kind.label(),
            totals.count,
            format_area(totals.area),
            format_percent(stats.percent_of_total(totals.area))
        );
    }
    println!(
        "{:<20} {:>8} {:>16} {:>8}",
        "TOTAL",
        stats.count,
        format_area(stats.total_area),
        format_percent(stats.percent_of_total(stats.total_area))
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadastre_core::RawUnit;
    use cadastre_report::{MapSnapshot, ReportError};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn args(select: Option<&str>, all: bool, private_only: bool) -> Args {
        Args {
            records: PathBuf::from("units.json"),
            select: select.map(str::to_string),
            all,
            private_only,
            map: None,
            config: None,
            out_dir: PathBuf::from("."),
            json: false,
            dry_run: true,
        }
    }

    fn store() -> UnitStore {
        let usage = ["V", "EC", "V", "G"];
        UnitStore::from_raw(
            usage
                .iter()
                .map(|u| RawUnit {
                    clave_grupo_bice_o_uso: Some(u.to_string()),
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn test_parse_selection_mixed() {
        let result = parse_selection("0-3, 7, 2", 8).unwrap();
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 7]);
    }

    #[test]
    fn test_parse_selection_skips_empty_parts() {
        let result = parse_selection(" 4 ,, ", 8).unwrap();
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_parse_selection_rejects_bad_input() {
        assert!(parse_selection("3-1", 8).is_err());
        assert!(parse_selection("a", 8).is_err());
        assert!(parse_selection("1-x", 8).is_err());
    }

    #[test]
    fn test_parse_selection_clips_huge_ranges_to_store() {
        let result = parse_selection("0-18446744073709551615", 4).unwrap();
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        let result = parse_selection("1000000-18446744073709551615, 9", 4).unwrap();
        assert!(result.is_empty());
        assert!(parse_selection("0-18446744073709551615", 0).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_all() {
        let selection = resolve_selection(&store(), &args(None, true, false)).unwrap();
        assert_eq!(selection.len(), 4);
    }

    #[test]
    fn test_resolve_drops_unknown_indices() {
        let selection = resolve_selection(&store(), &args(Some("2-9"), false, false)).unwrap();
        assert_eq!(
            selection.indices().iter().copied().collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_private_only_removes_common_elements() {
        let selection = resolve_selection(&store(), &args(None, true, true)).unwrap();
        assert_eq!(
            selection.indices().iter().copied().collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
    }

    #[test]
    fn test_requires_a_selection_mode() {
        assert!(resolve_selection(&store(), &args(None, false, false)).is_err());
    }

    struct CountingCapture {
        calls: Cell<usize>,
    }

    impl MapCapture for CountingCapture {
        fn capture(&self) -> Result<MapSnapshot, ReportError> {
            self.calls.set(self.calls.get() + 1);
            MapSnapshot::from_rgb(2, 1, vec![0; 6])
        }
    }

    #[test]
    fn test_empty_selection_skips_map_capture() {
        let store = store();
        let selection = resolve_selection(&store, &args(Some("9"), false, false)).unwrap();
        let capture = CountingCapture {
            calls: Cell::new(0),
        };

        let result = build_report(&store, &selection, ReportConfig::default(), Some(&capture));
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::NothingSelected)
        ));
        assert_eq!(capture.calls.get(), 0);
    }
}
