/// Normalized, compressed coverage tracks (`tracks`)
pub mod compress;
pub mod normalize;

pub use compress::{compress, group_runs, TrackSegment};
pub use normalize::normalization_factor;

use crate::align::AlignmentSource;
use crate::coverage::CoverageArray;
use crate::error::Error;
use crate::pair::{FragmentKey, PairResolver, Resolution};
use crate::stats::ChromosomeSummary;
use std::collections::HashSet;
use std::io::Write;

/// Track output flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    BedGraph,
    Bed,
}

impl std::str::FromStr for TrackFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bedgraph" => Ok(Self::BedGraph),
            "bed" => Ok(Self::Bed),
            _ => Err(format!(
                "unknown track format '{s}'; expected 'bedgraph' or 'bed'"
            )),
        }
    }
}

impl std::fmt::Display for TrackFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BedGraph => write!(f, "bedgraph"),
            Self::Bed => write!(f, "bed"),
        }
    }
}

impl TrackFormat {
    pub fn write_header<W: Write>(&self, out: &mut W, sample: &str) -> Result<(), Error> {
        match self {
            Self::BedGraph => writeln!(
                out,
                "track type=bedGraph name=\"{sample}\" description=\"{sample}\" visibility=full color=44,162,95"
            )?,
            Self::Bed => writeln!(out, "chr\tstart\tend\tid\t{sample}")?,
        }
        Ok(())
    }

    pub fn write_segment<W: Write>(
        &self,
        out: &mut W,
        chrom: &str,
        seg: &TrackSegment,
    ) -> Result<(), Error> {
        match self {
            Self::BedGraph => writeln!(out, "{}\t{}\t{}\t{}", chrom, seg.start, seg.end, seg.score)?,
            Self::Bed => writeln!(
                out,
                "{chrom}\t{}\t{}\t{chrom}:{}-{}\t{}",
                seg.start, seg.end, seg.start, seg.end, seg.score
            )?,
        }
        Ok(())
    }
}

/// Settings for track building
#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub min_quality: u8,
    /// Target fraction of segments kept, in `(0, 1]`
    pub resolution: f64,
    /// Target library size in read pairs; 0 disables normalization
    pub normalize: u64,
    pub format: TrackFormat,
    pub sample: String,
}

/// First pass over a chromosome: keys of every fragment passing pair resolution
pub fn valid_pairs<S: AlignmentSource>(
    source: &mut S,
    reference_id: usize,
    min_quality: u8,
) -> Result<(HashSet<FragmentKey>, PairResolver), Error> {
    let mut valid = HashSet::new();
    let mut resolver = PairResolver::new(min_quality);
    source.visit(reference_id, |record| {
        if let Resolution::Fragment(obs) = resolver.resolve(record) {
            valid.insert(obs.key);
        }
        Ok(())
    })?;
    Ok((valid, resolver))
}

/// Second pass: per-base coverage from both mates of every valid fragment
pub fn base_coverage<S: AlignmentSource>(
    source: &mut S,
    reference_id: usize,
    length: usize,
    min_quality: u8,
    valid: &HashSet<FragmentKey>,
) -> Result<CoverageArray, Error> {
    let mut coverage = CoverageArray::new(length);
    let mut resolver = PairResolver::new(min_quality);
    source.visit(reference_id, |record| {
        if let Some(role) = resolver.classify(record) {
            if valid.contains(&FragmentKey::for_role(record, role)) {
                coverage.add_aligned_bases(record);
            }
        }
        Ok(())
    })?;
    Ok(coverage)
}

/// Build one compressed, normalized coverage track per chromosome.
///
/// The normalization pass covers the whole genome before any rows are
/// written. Chromosomes without valid fragments produce no rows.
pub fn build_tracks<S, W>(
    source: &mut S,
    config: &TrackConfig,
    out: &mut W,
    observer: &mut dyn FnMut(&ChromosomeSummary),
) -> Result<(), Error>
where
    S: AlignmentSource,
    W: Write,
{
    let factor = normalization_factor(source, config.min_quality, config.normalize)?;

    config.format.write_header(out, &config.sample)?;

    let references = source.references().to_vec();
    for (reference_id, reference) in references.iter().enumerate() {
        let mut summary = ChromosomeSummary::new(reference_id, &reference.name);
        summary.processed = true;

        let (valid, resolver) = valid_pairs(source, reference_id, config.min_quality)?;
        summary.pairs = resolver.stats().clone();
        if valid.is_empty() {
            observer(&summary);
            continue;
        }

        let coverage = base_coverage(
            source,
            reference_id,
            reference.length,
            config.min_quality,
            &valid,
        )?;

        let mut segments = group_runs(coverage.as_slice(), factor);
        compress(&mut segments, config.resolution);
        for seg in &segments {
            config.format.write_segment(out, &reference.name, seg)?;
        }

        summary.rows = segments.len() as u64;
        observer(&summary);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{AlignmentRecord, MemorySource, Reference};

    #[test]
    fn test_track_format_parse() {
        assert_eq!("bedgraph".parse::<TrackFormat>(), Ok(TrackFormat::BedGraph));
        assert_eq!("bed".parse::<TrackFormat>(), Ok(TrackFormat::Bed));
        assert!("wig".parse::<TrackFormat>().is_err());
        assert_eq!(TrackFormat::Bed.to_string(), "bed");
    }

    #[test]
    fn test_headers() {
        let mut out = Vec::new();
        TrackFormat::BedGraph.write_header(&mut out, "S1").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "track type=bedGraph name=\"S1\" description=\"S1\" visibility=full color=44,162,95\n"
        );

        let mut out = Vec::new();
        TrackFormat::Bed.write_header(&mut out, "S1").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr\tstart\tend\tid\tS1\n");
    }

    #[test]
    fn test_bed_row() {
        let mut out = Vec::new();
        TrackFormat::Bed
            .write_segment(&mut out, "chr2", &TrackSegment::new(10, 20, 1.5))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr2\t10\t20\tchr2:10-20\t1.5\n");
    }

    fn source() -> MemorySource {
        let mut source =
            MemorySource::new(vec![Reference::new("chr1", 100), Reference::new("chr2", 50)]);
        source
            .extend([
                AlignmentRecord::paired("a", 0, 10, 30, 60, "10M").unwrap(),
                AlignmentRecord::paired("a", 0, 30, 10, 60, "5M5N5M").unwrap(),
                // first mate too weak; second mate is an orphan
                AlignmentRecord::paired("b", 0, 40, 60, 2, "10M").unwrap(),
                AlignmentRecord::paired("b", 0, 60, 40, 60, "10M").unwrap(),
            ])
            .unwrap();
        source
    }

    #[test]
    fn test_base_coverage_uses_both_mates() {
        let mut source = source();
        let (valid, resolver) = valid_pairs(&mut source, 0, 10).unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(resolver.stats().orphan_mates, 1);

        let cov = base_coverage(&mut source, 0, 100, 10, &valid).unwrap();
        assert_eq!(cov.sum(10, 20), 10);
        assert_eq!(cov.sum(30, 35), 5);
        assert_eq!(cov.sum(35, 40), 0);
        assert_eq!(cov.sum(40, 45), 5);
        assert_eq!(cov.sum(60, 70), 0);
        assert_eq!(cov.sum(0, 100), 20);
    }

    #[test]
    fn test_build_tracks_without_compression() {
        let mut source = source();
        let config = TrackConfig {
            min_quality: 10,
            resolution: 1.0,
            normalize: 0,
            format: TrackFormat::BedGraph,
            sample: "S1".to_string(),
        };
        let mut out = Vec::new();
        let mut summaries = Vec::new();
        build_tracks(&mut source, &config, &mut out, &mut |s| summaries.push(s.clone())).unwrap();

        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(
            rows,
            vec![
                "chr1\t0\t10\t0",
                "chr1\t10\t20\t1",
                "chr1\t20\t30\t0",
                "chr1\t30\t35\t1",
                "chr1\t35\t40\t0",
                "chr1\t40\t45\t1",
                "chr1\t45\t100\t0",
            ]
        );
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].rows, 7);
        assert_eq!(summaries[1].rows, 0);
    }

    #[test]
    fn test_build_tracks_normalized() {
        let mut source = source();
        let config = TrackConfig {
            min_quality: 10,
            resolution: 1.0,
            normalize: 10,
            format: TrackFormat::Bed,
            sample: "S1".to_string(),
        };
        let mut out = Vec::new();
        build_tracks(&mut source, &config, &mut out, &mut |_| {}).unwrap();

        // 10 second-mate bases, factor 10 / 10 * 200
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| l == "chr1\t10\t20\tchr1:10-20\t200"));
    }
}
