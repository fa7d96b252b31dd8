/// Per-base coverage counting and window sums (`count_dna`)
pub mod window;

pub use window::{Interval, IntervalSet, WindowPolicy};

use crate::align::{AlignmentRecord, AlignmentSource};
use crate::error::Error;
use crate::pair::{PairResolver, Resolution};
use crate::stats::ChromosomeSummary;
use log::debug;
use std::io::Write;

/// Saturating per-base counters for one chromosome.
///
/// A counter stops one below the configured maximum; further increments
/// are no-ops.
#[derive(Debug, Clone)]
pub struct CoverageArray {
    counts: Vec<u16>,
    max: u16,
}

impl CoverageArray {
    /// Counters saturating just below `u16::MAX`
    pub fn new(length: usize) -> Self {
        Self::with_max(length, u16::MAX)
    }

    pub fn with_max(length: usize, max: u16) -> Self {
        Self {
            counts: vec![0; length],
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max(&self) -> u16 {
        self.max
    }

    /// Add one at `pos`; out-of-bounds positions and saturated counters are ignored
    pub fn increment(&mut self, pos: usize) {
        if let Some(count) = self.counts.get_mut(pos) {
            if u32::from(*count) + 1 < u32::from(self.max) {
                *count += 1;
            }
        }
    }

    /// Add one for every reference base covered by an M, =, or X operation
    pub fn add_aligned_bases(&mut self, record: &AlignmentRecord) {
        let mut rp = record.start;
        for op in &record.cigar {
            if op.is_aligned() {
                for _ in 0..op.len() {
                    self.increment(rp);
                    rp += 1;
                }
            } else if op.consumes_reference() {
                rp += op.len() as usize;
            }
        }
    }

    pub fn get(&self, pos: usize) -> Option<u16> {
        self.counts.get(pos).copied()
    }

    /// Sum of the counters over `[start, end)`, clipped to the chromosome
    pub fn sum(&self, start: usize, end: usize) -> u64 {
        let end = end.min(self.counts.len());
        if start >= end {
            return 0;
        }
        self.counts[start..end].iter().map(|&c| u64::from(c)).sum()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.counts
    }
}

/// Settings for window counting
#[derive(Debug, Clone)]
pub struct CountDnaConfig {
    pub min_quality: u8,
    pub windows: WindowPolicy,
    pub sample: String,
}

/// Count fragment midpoints for one chromosome
pub fn midpoint_coverage<S: AlignmentSource>(
    source: &mut S,
    reference_id: usize,
    length: usize,
    min_quality: u8,
) -> Result<(CoverageArray, PairResolver), Error> {
    let mut coverage = CoverageArray::new(length);
    let mut resolver = PairResolver::new(min_quality);

    source.visit(reference_id, |record| {
        if let Resolution::Fragment(obs) = resolver.resolve(record) {
            coverage.increment(obs.midpoint());
        }
        Ok(())
    })?;

    Ok((coverage, resolver))
}

/// Write the window table header
pub fn write_window_header<W: Write>(out: &mut W, sample: &str) -> Result<(), Error> {
    writeln!(out, "chr\tstart\tend\tid\t{sample}")?;
    Ok(())
}

/// Count fragment midpoints per window for every chromosome and write
/// `chr start end id count` rows in chromosome order.
pub fn count_windows<S, W>(
    source: &mut S,
    config: &CountDnaConfig,
    out: &mut W,
    observer: &mut dyn FnMut(&ChromosomeSummary),
) -> Result<(), Error>
where
    S: AlignmentSource,
    W: Write,
{
    if let WindowPolicy::Intervals(set) = &config.windows {
        for chrom in set.chromosomes() {
            if source.reference_id(chrom).is_none() {
                return Err(Error::Interval(format!(
                    "interval file chromosome {chrom} is not present in the BAM header"
                )));
            }
        }
    }

    write_window_header(out, &config.sample)?;

    let references = source.references().to_vec();
    for (reference_id, reference) in references.iter().enumerate() {
        let mut summary = ChromosomeSummary::new(reference_id, &reference.name);

        if !config.windows.covers(&reference.name) {
            observer(&summary);
            continue;
        }
        if source.mapped_count(reference_id) == Some(0) {
            debug!("{}: no mapped reads", reference.name);
            observer(&summary);
            continue;
        }

        let (coverage, resolver) =
            midpoint_coverage(source, reference_id, reference.length, config.min_quality)?;

        let intervals = config.windows.intervals(&reference.name, reference.length);
        for itv in &intervals {
            let count = coverage.sum(itv.start, itv.end);
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                reference.name, itv.start, itv.end, itv.id, count
            )?;
        }

        summary.processed = true;
        summary.pairs = resolver.stats().clone();
        summary.rows = intervals.len() as u64;
        observer(&summary);
    }

    Ok(())
}
