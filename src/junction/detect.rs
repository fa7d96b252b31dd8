/// Exon-exon junction detection from reference skips
use super::annotation::ExonInterval;
use crate::align::{cigar_string, AlignmentRecord, CigarOp};
use crate::error::Error;
use std::collections::BTreeMap;

/// Support counts keyed by `(lower exon id, higher exon id)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JunctionCounts {
    counts: BTreeMap<(usize, usize), u32>,
}

impl JunctionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, donor: usize, acceptor: usize) {
        *self.counts.entry((donor, acceptor)).or_insert(0) += 1;
    }

    /// Count for an exon pair in either order
    pub fn get(&self, a: usize, b: usize) -> u32 {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(usize, usize), &u32)> {
        self.counts.iter()
    }
}

/// Sorted exons of one chromosome with a boundary lookup
#[derive(Debug, Clone)]
pub struct ChromosomeExons {
    exons: Vec<ExonInterval>,
    /// One flag per position `0..=length`, set at every exon start and end
    boundaries: Vec<bool>,
    max_exon_len: usize,
}

impl ChromosomeExons {
    pub fn new(mut exons: Vec<ExonInterval>, length: usize) -> Self {
        exons.sort_by_key(|e| (e.start, e.end, e.id));

        let mut boundaries = vec![false; length + 1];
        for exon in &exons {
            for pos in [exon.start, exon.end] {
                if let Some(flag) = boundaries.get_mut(pos) {
                    *flag = true;
                }
            }
        }
        let max_exon_len = exons.iter().map(ExonInterval::len).max().unwrap_or(0);

        Self {
            exons,
            boundaries,
            max_exon_len,
        }
    }

    pub fn exons(&self) -> &[ExonInterval] {
        &self.exons
    }

    pub fn is_boundary(&self, pos: usize) -> bool {
        self.boundaries.get(pos).copied().unwrap_or(false)
    }

    pub fn max_exon_len(&self) -> usize {
        self.max_exon_len
    }

    /// Count every donor/acceptor pair joined by the gap `[gap_start, gap_end)`.
    ///
    /// Donors end at `gap_start`, acceptors start at `gap_end`. Only pairs
    /// whose donor id is below the acceptor id are counted. Returns the
    /// number of increments.
    pub fn record_gap(&self, gap_start: usize, gap_end: usize, counts: &mut JunctionCounts) -> u32 {
        if !(self.is_boundary(gap_start) && self.is_boundary(gap_end)) {
            return 0;
        }

        let lower = gap_start.saturating_sub(self.max_exon_len);
        let first = self.exons.partition_point(|e| e.start < lower);

        let mut hits = 0;
        for (i, donor) in self.exons.iter().enumerate().skip(first) {
            if donor.start > gap_start {
                break;
            }
            if donor.end != gap_start {
                continue;
            }
            for acceptor in &self.exons[i + 1..] {
                if acceptor.start > gap_end {
                    break;
                }
                if acceptor.start == gap_end && donor.id < acceptor.id {
                    counts.increment(donor.id, acceptor.id);
                    hits += 1;
                }
            }
        }
        hits
    }
}

/// Walk a record's CIGAR and count the junctions its reference skips confirm.
///
/// Returns the number of skips that matched at least one exon pair.
pub fn observe_record(
    exons: &ChromosomeExons,
    record: &AlignmentRecord,
    counts: &mut JunctionCounts,
) -> Result<u32, Error> {
    let mut gp = record.start;
    let mut confirmed = 0;

    for op in &record.cigar {
        match *op {
            CigarOp::SoftClip(_) | CigarOp::Ins(_) | CigarOp::HardClip(_) => {}
            CigarOp::Del(n) | CigarOp::Match(n) | CigarOp::Equal(n) | CigarOp::Diff(n) => {
                gp += n as usize;
            }
            CigarOp::RefSkip(n) => {
                let gap_start = gp;
                gp += n as usize;
                if exons.record_gap(gap_start, gp, counts) > 0 {
                    confirmed += 1;
                }
            }
            CigarOp::Pad(_) => {
                return Err(Error::Alignment(format!(
                    "unsupported CIGAR operation {op} in read {} ({})",
                    record.name,
                    cigar_string(&record.cigar)
                )));
            }
        }
    }

    Ok(confirmed)
}
