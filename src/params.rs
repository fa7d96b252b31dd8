use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::error::Error;
use crate::track::TrackFormat;

// ---------------------------------------------------------------------------
// Parameters struct
// ---------------------------------------------------------------------------

/// ruAlfred command-line parameters: one subcommand per statistic.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ruAlfred",
    about = "BAM alignment statistics: window coverage, coverage tracks, exon junction counts",
    version
)]
pub struct Parameters {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Count fragment midpoints in genomic windows
    #[command(name = "count_dna")]
    CountDna(CountDnaArgs),

    /// Normalized, compressed coverage track
    #[command(name = "tracks")]
    Tracks(TracksArgs),

    /// Count exon-exon junction reads
    #[command(name = "count_jct")]
    CountJct(CountJctArgs),
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountDna(_) => write!(f, "count_dna"),
            Self::Tracks(_) => write!(f, "tracks"),
            Self::CountJct(_) => write!(f, "count_jct"),
        }
    }
}

impl Parameters {
    /// Validate parameter combinations that clap alone cannot enforce.
    pub fn validate(&self) -> Result<(), Error> {
        match &self.command {
            Command::CountDna(args) => args.validate(),
            Command::Tracks(args) => args.validate(),
            Command::CountJct(args) => args.validate(),
        }
    }
}

/// An input file must exist and hold data
fn check_input(path: &Path, what: &str) -> Result<(), Error> {
    let ok = path.is_file() && path.metadata().map(|m| m.len() > 0).unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(Error::Parameter(format!(
            "{what} is missing: {}",
            path.display()
        )))
    }
}

// ── count_dna ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct CountDnaArgs {
    /// Min. mapping quality
    #[arg(short = 'm', long = "map-qual", default_value_t = 10)]
    pub map_qual: u8,

    /// Output file (gzip compressed if it ends in .gz)
    #[arg(short = 'o', long = "outfile", default_value = "cov.gz")]
    pub outfile: PathBuf,

    /// Window size
    #[arg(short = 's', long = "window-size", default_value_t = 10000)]
    pub window_size: usize,

    /// Window offset
    #[arg(short = 't', long = "window-offset", default_value_t = 10000)]
    pub window_offset: usize,

    /// Number of windows per chromosome (overrides size and offset)
    #[arg(short = 'n', long = "window-num", default_value_t = 0)]
    pub window_num: usize,

    /// Interval file: chr, start, end, id (overrides all window options)
    #[arg(short = 'i', long = "interval-file")]
    pub interval_file: Option<PathBuf>,

    /// Coordinate-sorted, indexed BAM file
    pub bam: PathBuf,
}

impl CountDnaArgs {
    pub fn validate(&self) -> Result<(), Error> {
        check_input(&self.bam, "Alignment file")?;
        if let Some(path) = &self.interval_file {
            check_input(path, "Interval file")?;
            return Ok(());
        }
        if self.window_num == 0 && (self.window_size == 0 || self.window_offset == 0) {
            return Err(Error::Parameter(
                "--window-size and --window-offset must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

// ── tracks ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct TracksArgs {
    /// Min. mapping quality
    #[arg(short = 'm', long = "map-qual", default_value_t = 10)]
    pub map_qual: u8,

    /// Fractional resolution ]0,1]
    #[arg(short = 'r', long = "resolution", default_value_t = 0.2)]
    pub resolution: f64,

    /// Normalize to this many pairs; 0 disables
    #[arg(short = 'n', long = "normalize", default_value_t = 30_000_000)]
    pub normalize: u64,

    /// Output file (gzip compressed if it ends in .gz)
    #[arg(short = 'o', long = "outfile", default_value = "track.gz")]
    pub outfile: PathBuf,

    /// Output format: bedgraph or bed
    #[arg(short = 'f', long = "format", default_value = "bedgraph")]
    pub format: TrackFormat,

    /// Coordinate-sorted, indexed BAM file
    pub bam: PathBuf,
}

impl TracksArgs {
    pub fn validate(&self) -> Result<(), Error> {
        check_input(&self.bam, "Alignment file")?;
        if !(self.resolution > 0.0 && self.resolution <= 1.0) {
            return Err(Error::Parameter(format!(
                "--resolution must be in ]0,1], got {}",
                self.resolution
            )));
        }
        Ok(())
    }
}

// ── count_jct ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct CountJctArgs {
    /// Min. mapping quality
    #[arg(short = 'm', long = "map-qual", default_value_t = 10)]
    pub map_qual: u8,

    /// Intra-gene exon-exon junction reads
    #[arg(short = 'o', long = "outintra", default_value = "intra.tsv")]
    pub outintra: PathBuf,

    /// Inter-gene exon-exon junction reads
    #[arg(short = 'p', long = "outinter", default_value = "inter.tsv")]
    pub outinter: PathBuf,

    /// GTF/GFF3 file
    #[arg(short = 'g', long = "gtf")]
    pub gtf: Option<PathBuf>,

    /// GTF/GFF3 attribute grouping exons
    #[arg(short = 'i', long = "id", default_value = "gene_id")]
    pub id: String,

    /// GTF/GFF3 feature
    #[arg(short = 'f', long = "feature", default_value = "exon")]
    pub feature: String,

    /// BED file: chr, start, end, name
    #[arg(short = 'b', long = "bed")]
    pub bed: Option<PathBuf>,

    /// Coordinate-sorted, indexed BAM file
    pub bam: PathBuf,
}

impl CountJctArgs {
    pub fn validate(&self) -> Result<(), Error> {
        check_input(&self.bam, "Alignment file")?;
        match (&self.gtf, &self.bed) {
            (Some(gtf), _) => check_input(gtf, "GTF/GFF3 file"),
            (None, Some(bed)) => check_input(bed, "BED file"),
            (None, None) => Err(Error::Parameter(
                "one of --gtf or --bed is required".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: parse a command line (without program name).
    fn parse(args: &[&str]) -> Parameters {
        let mut full = vec!["ruAlfred"];
        full.extend_from_slice(args);
        Parameters::parse_from(full)
    }

    fn non_empty_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data").unwrap();
        file
    }

    #[test]
    fn count_dna_defaults() {
        let p = parse(&["count_dna", "sample.bam"]);
        let Command::CountDna(args) = &p.command else {
            panic!("expected count_dna");
        };
        assert_eq!(args.map_qual, 10);
        assert_eq!(args.outfile, PathBuf::from("cov.gz"));
        assert_eq!(args.window_size, 10000);
        assert_eq!(args.window_offset, 10000);
        assert_eq!(args.window_num, 0);
        assert_eq!(args.interval_file, None);
        assert_eq!(args.bam, PathBuf::from("sample.bam"));
        assert_eq!(p.command.to_string(), "count_dna");
    }

    #[test]
    fn tracks_defaults() {
        let p = parse(&["tracks", "sample.bam"]);
        let Command::Tracks(args) = &p.command else {
            panic!("expected tracks");
        };
        assert_eq!(args.map_qual, 10);
        assert!((args.resolution - 0.2).abs() < f64::EPSILON);
        assert_eq!(args.normalize, 30_000_000);
        assert_eq!(args.outfile, PathBuf::from("track.gz"));
        assert_eq!(args.format, TrackFormat::BedGraph);
    }

    #[test]
    fn count_jct_short_options() {
        let p = parse(&[
            "count_jct", "-m", "20", "-g", "genes.gtf.gz", "-i", "gene_name", "-f", "CDS", "-o",
            "a.tsv", "-p", "b.tsv", "sample.bam",
        ]);
        let Command::CountJct(args) = &p.command else {
            panic!("expected count_jct");
        };
        assert_eq!(args.map_qual, 20);
        assert_eq!(args.gtf, Some(PathBuf::from("genes.gtf.gz")));
        assert_eq!(args.id, "gene_name");
        assert_eq!(args.feature, "CDS");
        assert_eq!(args.outintra, PathBuf::from("a.tsv"));
        assert_eq!(args.outinter, PathBuf::from("b.tsv"));
        assert_eq!(args.bed, None);
    }

    #[test]
    fn bad_track_format_rejected() {
        let result = Parameters::try_parse_from(["ruAlfred", "tracks", "-f", "wig", "s.bam"]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_missing_bam() {
        let p = parse(&["count_dna", "/nonexistent/sample.bam"]);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("Alignment file is missing"));
    }

    #[test]
    fn validate_resolution_range() {
        let bam = non_empty_file();
        let bam = bam.path().to_str().unwrap();
        assert!(parse(&["tracks", "-r", "1.0", bam]).validate().is_ok());
        assert!(parse(&["tracks", "-r", "0", bam]).validate().is_err());
        assert!(parse(&["tracks", "-r", "1.5", bam]).validate().is_err());
    }

    #[test]
    fn validate_windows() {
        let bam = non_empty_file();
        let bam = bam.path().to_str().unwrap();
        assert!(parse(&["count_dna", "-s", "0", bam]).validate().is_err());
        assert!(parse(&["count_dna", "-s", "0", "-n", "5", bam]).validate().is_ok());
    }

    #[test]
    fn validate_count_jct_needs_annotation() {
        let bam = non_empty_file();
        let bam_path = bam.path().to_str().unwrap();
        let err = parse(&["count_jct", bam_path]).validate().unwrap_err();
        assert!(err.to_string().contains("--gtf or --bed"));

        let bed = non_empty_file();
        let bed_path = bed.path().to_str().unwrap();
        assert!(parse(&["count_jct", "-b", bed_path, bam_path]).validate().is_ok());
    }
}
