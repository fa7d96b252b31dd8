/// Alignment record fields consumed by the counting engines
use super::cigar::{parse_cigar, CigarOp};
use crate::error::Error;
use bstr::BString;
use noodles::sam::alignment::record::Flags;

/// Flags that exclude a record from fragment-level accounting
const FRAGMENT_EXCLUDE: Flags = Flags::SECONDARY
    .union(Flags::QC_FAIL)
    .union(Flags::DUPLICATE)
    .union(Flags::SUPPLEMENTARY)
    .union(Flags::UNMAPPED)
    .union(Flags::MATE_UNMAPPED);

/// Flags that exclude a record from junction counting
const JUNCTION_EXCLUDE: Flags = Flags::QC_FAIL
    .union(Flags::DUPLICATE)
    .union(Flags::UNMAPPED);

/// A reference sequence (chromosome) of the alignment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub length: usize,
}

impl Reference {
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// One aligned read, copied out of the alignment source
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Query (read) name, shared by both mates of a pair
    pub name: BString,
    pub flags: Flags,
    pub reference_id: Option<usize>,
    /// Alignment start (0-based)
    pub start: usize,
    pub mapping_quality: u8,
    pub cigar: Vec<CigarOp>,
    pub mate_reference_id: Option<usize>,
    /// Mate alignment start (0-based)
    pub mate_start: usize,
}

impl AlignmentRecord {
    /// Build a mapped, paired record whose mate lies on the same reference.
    pub fn paired(
        name: &str,
        reference_id: usize,
        start: usize,
        mate_start: usize,
        mapping_quality: u8,
        cigar: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: BString::from(name),
            flags: Flags::SEGMENTED,
            reference_id: Some(reference_id),
            start,
            mapping_quality,
            cigar: parse_cigar(cigar)?,
            mate_reference_id: Some(reference_id),
            mate_start,
        })
    }

    /// Add flags to the record
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags.insert(flags);
        self
    }

    /// True if any flag rules the record out of pair resolution
    pub fn is_fragment_excluded(&self) -> bool {
        self.flags.intersects(FRAGMENT_EXCLUDE)
            || !self.flags.is_segmented()
            || self.reference_id != self.mate_reference_id
    }

    /// True if any flag rules the record out of junction counting
    pub fn is_junction_excluded(&self) -> bool {
        self.flags.intersects(JUNCTION_EXCLUDE)
    }

    /// Reference bases spanned by the alignment (M, =, X, D, N)
    pub fn reference_length(&self) -> usize {
        self.cigar
            .iter()
            .filter(|op| op.consumes_reference())
            .map(|op| op.len() as usize)
            .sum()
    }

    /// Reference bases carrying an aligned read base (M, =, X)
    pub fn aligned_length(&self) -> u64 {
        self.cigar
            .iter()
            .filter(|op| op.is_aligned())
            .map(|op| u64::from(op.len()))
            .sum()
    }

    /// Exclusive alignment end on the reference
    pub fn end(&self) -> usize {
        self.start + self.reference_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_record() {
        let rec = AlignmentRecord::paired("r1", 0, 100, 300, 60, "50M").unwrap();
        assert_eq!(rec.name, BString::from("r1"));
        assert!(rec.flags.is_segmented());
        assert_eq!(rec.reference_id, rec.mate_reference_id);
        assert!(!rec.is_fragment_excluded());
        assert_eq!(rec.end(), 150);
    }

    #[test]
    fn test_fragment_exclusion_flags() {
        for flag in [
            Flags::SECONDARY,
            Flags::QC_FAIL,
            Flags::DUPLICATE,
            Flags::SUPPLEMENTARY,
            Flags::UNMAPPED,
            Flags::MATE_UNMAPPED,
        ] {
            let rec = AlignmentRecord::paired("r1", 0, 100, 300, 60, "50M")
                .unwrap()
                .with_flags(flag);
            assert!(rec.is_fragment_excluded(), "{flag:?} should exclude");
        }
    }

    #[test]
    fn test_fragment_exclusion_mate_elsewhere() {
        let mut rec = AlignmentRecord::paired("r1", 0, 100, 300, 60, "50M").unwrap();
        rec.mate_reference_id = Some(1);
        assert!(rec.is_fragment_excluded());
    }

    #[test]
    fn test_fragment_exclusion_unpaired() {
        let mut rec = AlignmentRecord::paired("r1", 0, 100, 300, 60, "50M").unwrap();
        rec.flags = Flags::empty();
        assert!(rec.is_fragment_excluded());
    }

    #[test]
    fn test_junction_exclusion_keeps_secondary() {
        let rec = AlignmentRecord::paired("r1", 0, 100, 300, 60, "50M")
            .unwrap()
            .with_flags(Flags::SECONDARY);
        assert!(!rec.is_junction_excluded());
        let rec = rec.with_flags(Flags::DUPLICATE);
        assert!(rec.is_junction_excluded());
    }

    #[test]
    fn test_lengths() {
        let rec = AlignmentRecord::paired("r1", 0, 0, 0, 60, "3S10M2I5M4D6=200N7X2H").unwrap();
        assert_eq!(rec.aligned_length(), 10 + 5 + 6 + 7);
        assert_eq!(rec.reference_length(), 10 + 5 + 4 + 6 + 200 + 7);
    }
}
