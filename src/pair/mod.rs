/// Mate pairing: one quality-checked observation per sequenced fragment
///
/// Records of one chromosome are fed in position order. The mate seen first
/// (lower start, or the first of two mates tied at the same start) parks its
/// mapping quality in a pending table; the second mate looks that entry up
/// through its mate coordinates and, if the pair passes the quality floor,
/// produces a [`FragmentObservation`].
use crate::align::AlignmentRecord;
use crate::stats::PairStats;
use bstr::{BStr, BString, ByteSlice};
use std::collections::{HashMap, HashSet};

/// Identity shared by both mates of a fragment.
///
/// Built from the first mate's own start and its mate's start; the second
/// mate builds the same value from its mate coordinates. The query name
/// keeps two pairs with identical coordinates apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    pub first_start: usize,
    pub second_start: usize,
    pub name: BString,
}

impl FragmentKey {
    /// Key computed by the first mate from its own coordinates
    pub fn from_first_mate(record: &AlignmentRecord) -> Self {
        Self {
            first_start: record.start,
            second_start: record.mate_start,
            name: record.name.clone(),
        }
    }

    /// Key computed by the second mate from its mate coordinates
    pub fn from_second_mate(record: &AlignmentRecord) -> Self {
        Self {
            first_start: record.mate_start,
            second_start: record.start,
            name: record.name.clone(),
        }
    }

    pub fn for_role(record: &AlignmentRecord, role: MateRole) -> Self {
        match role {
            MateRole::First => Self::from_first_mate(record),
            MateRole::Second => Self::from_second_mate(record),
        }
    }
}

/// Which mate of the pair a record plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MateRole {
    First,
    Second,
}

/// A validly paired, quality-passing fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentObservation {
    pub key: FragmentKey,
    /// Start of the second mate's alignment
    pub start: usize,
    /// Exclusive end of the second mate's alignment
    pub end: usize,
    /// min(first mate MAPQ, second mate MAPQ)
    pub quality: u8,
}

impl FragmentObservation {
    /// Integer midpoint of the footprint
    pub fn midpoint(&self) -> usize {
        self.start + (self.end - self.start) / 2
    }
}

/// Outcome of feeding one record to the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Rejected by flags, mate chromosome or mapping quality
    Filtered,
    /// Stored as the first mate of a pending pair
    FirstMate,
    /// Second mate whose first mate was filtered upstream
    Orphan,
    /// Pair quality below the minimum
    LowQuality,
    /// Pair complete
    Fragment(FragmentObservation),
}

/// Query names that already took the first-mate role at the current start.
#[derive(Debug, Default)]
pub struct DedupGuard {
    position: usize,
    names: HashSet<BString>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all names once the alignment start moves forward
    pub fn advance(&mut self, position: usize) {
        if position > self.position {
            self.names.clear();
            self.position = position;
        }
    }

    pub fn contains(&self, name: &BStr) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: &BStr) {
        self.names.insert(name.to_owned());
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// First-mate qualities waiting for their second mate.
///
/// Consumed entries are zeroed rather than removed: a later record that
/// resolves to the same key sees quality 0 and falls below any positive
/// quality floor.
#[derive(Debug, Default)]
pub struct PendingMateTable {
    qualities: HashMap<FragmentKey, u8>,
}

impl PendingMateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, key: FragmentKey, quality: u8) {
        self.qualities.insert(key, quality);
    }

    /// Take the stored quality, leaving a zeroed entry behind
    pub fn consume(&mut self, key: &FragmentKey) -> Option<u8> {
        self.qualities.get_mut(key).map(std::mem::take)
    }

    pub fn get(&self, key: &FragmentKey) -> Option<u8> {
        self.qualities.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.qualities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qualities.is_empty()
    }

    pub fn clear(&mut self) {
        self.qualities.clear();
    }
}

/// Pair resolver for one chromosome.
///
/// Create a fresh resolver per chromosome; the pending table and the
/// dedup guard never carry state across chromosomes.
#[derive(Debug)]
pub struct PairResolver {
    min_quality: u8,
    guard: DedupGuard,
    pending: PendingMateTable,
    stats: PairStats,
}

impl PairResolver {
    pub fn new(min_quality: u8) -> Self {
        Self {
            min_quality,
            guard: DedupGuard::new(),
            pending: PendingMateTable::new(),
            stats: PairStats::new(),
        }
    }

    /// Apply the record filters and assign a mate role.
    ///
    /// Returns `None` (and touches no state) for rejected records. A record
    /// given the first-mate role is entered into the dedup guard.
    pub fn classify(&mut self, record: &AlignmentRecord) -> Option<MateRole> {
        if record.is_fragment_excluded() || record.mapping_quality < self.min_quality {
            return None;
        }

        self.guard.advance(record.start);

        let name = record.name.as_bstr();
        let first = record.start < record.mate_start
            || (record.start == record.mate_start && !self.guard.contains(name));

        if first {
            self.guard.insert(name);
            Some(MateRole::First)
        } else {
            Some(MateRole::Second)
        }
    }

    /// Feed one record and report what became of it
    pub fn resolve(&mut self, record: &AlignmentRecord) -> Resolution {
        self.stats.records += 1;

        let resolution = match self.classify(record) {
            None => Resolution::Filtered,
            Some(MateRole::First) => {
                self.pending
                    .store(FragmentKey::from_first_mate(record), record.mapping_quality);
                Resolution::FirstMate
            }
            Some(MateRole::Second) => {
                let key = FragmentKey::from_second_mate(record);
                match self.pending.consume(&key) {
                    None => Resolution::Orphan,
                    Some(stored) => {
                        let quality = stored.min(record.mapping_quality);
                        if quality < self.min_quality {
                            Resolution::LowQuality
                        } else {
                            Resolution::Fragment(FragmentObservation {
                                key,
                                start: record.start,
                                end: record.end(),
                                quality,
                            })
                        }
                    }
                }
            }
        };

        match &resolution {
            Resolution::Filtered => self.stats.filtered += 1,
            Resolution::FirstMate => self.stats.first_mates += 1,
            Resolution::Orphan => self.stats.orphan_mates += 1,
            Resolution::LowQuality => self.stats.low_quality_pairs += 1,
            Resolution::Fragment(_) => self.stats.fragments += 1,
        }

        resolution
    }

    pub fn stats(&self) -> &PairStats {
        &self.stats
    }

    pub fn pending(&self) -> &PendingMateTable {
        &self.pending
    }

    pub fn guard(&self) -> &DedupGuard {
        &self.guard
    }
}
