#![allow(non_snake_case)]

pub mod error;
pub mod params;

pub mod align;
pub mod coverage;
pub mod io;
pub mod junction;
pub mod pair;
pub mod stats;
pub mod track;

use log::info;

use crate::align::AlignmentSource;
use crate::coverage::{count_windows, CountDnaConfig, WindowPolicy};
use crate::error::Error;
use crate::io::{BamSource, OutputWriter};
use crate::junction::{count_junctions, load_bed, load_gtf, CountJctConfig, FeatureFilter};
use crate::params::{Command, CountDnaArgs, CountJctArgs, Parameters, TracksArgs};
use crate::stats::RunStats;
use crate::track::{build_tracks, TrackConfig};

/// Top-level dispatcher. Called from `main()` after CLI parsing.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    params.validate()?;

    info!("ruAlfred v{}", env!("CARGO_PKG_VERSION"));
    info!("command: {}", params.command);

    match &params.command {
        Command::CountDna(args) => count_dna(args),
        Command::Tracks(args) => tracks(args),
        Command::CountJct(args) => count_jct(args),
    }
}

fn open_bam(path: &std::path::Path) -> anyhow::Result<(BamSource, String)> {
    info!("BAM file: {}", path.display());
    let source = BamSource::open(path)?;
    let sample = source.sample_name()?;
    info!(
        "Sample: {} ({} reference sequences)",
        sample,
        source.references().len()
    );
    Ok((source, sample))
}

fn count_dna(args: &CountDnaArgs) -> anyhow::Result<()> {
    let (mut source, sample) = open_bam(&args.bam)?;

    let windows = WindowPolicy::from_settings(
        args.interval_file.as_deref(),
        args.window_size,
        args.window_offset,
        args.window_num,
    )?;
    let config = CountDnaConfig {
        min_quality: args.map_qual,
        windows,
        sample,
    };

    let mut out = OutputWriter::create(&args.outfile)?;
    let mut stats = RunStats::new();
    count_windows(&mut source, &config, &mut out, &mut |s| stats.observe(s))?;
    out.finish().map_err(|e| Error::io(e, &args.outfile))?;

    stats.print_summary();
    info!("Window counts written to {}", args.outfile.display());
    Ok(())
}

fn tracks(args: &TracksArgs) -> anyhow::Result<()> {
    let (mut source, sample) = open_bam(&args.bam)?;

    let config = TrackConfig {
        min_quality: args.map_qual,
        resolution: args.resolution,
        normalize: args.normalize,
        format: args.format,
        sample,
    };

    let mut out = OutputWriter::create(&args.outfile)?;
    let mut stats = RunStats::new();
    build_tracks(&mut source, &config, &mut out, &mut |s| stats.observe(s))?;
    out.finish().map_err(|e| Error::io(e, &args.outfile))?;

    stats.print_summary();
    info!("{} track written to {}", config.format, args.outfile.display());
    Ok(())
}

fn count_jct(args: &CountJctArgs) -> anyhow::Result<()> {
    let (mut source, sample) = open_bam(&args.bam)?;

    let annotation = match (&args.gtf, &args.bed) {
        (Some(gtf), _) => {
            let filter = FeatureFilter {
                feature: args.feature.clone(),
                id_attribute: args.id.clone(),
            };
            load_gtf(gtf, source.references(), &filter)?
        }
        (None, Some(bed)) => load_bed(bed, source.references())?,
        (None, None) => anyhow::bail!("one of --gtf or --bed is required"),
    };

    let config = CountJctConfig {
        min_quality: args.map_qual,
        sample,
    };

    let mut intra = OutputWriter::create(&args.outintra)?;
    let mut inter = OutputWriter::create(&args.outinter)?;
    let mut stats = RunStats::new();
    count_junctions(
        &mut source,
        &annotation,
        &config,
        &mut intra,
        &mut inter,
        &mut |s| stats.observe(s),
    )?;
    intra.finish().map_err(|e| Error::io(e, &args.outintra))?;
    inter.finish().map_err(|e| Error::io(e, &args.outinter))?;

    stats.print_summary();
    info!("Junction counts written to {}", args.outintra.display());
    Ok(())
}
