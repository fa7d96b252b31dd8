/// Per-chromosome and per-run counting statistics
use log::info;

/// Tracks pair resolution outcomes
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PairStats {
    /// Total number of records examined
    pub records: u64,
    /// Records rejected by flag, mate-chromosome or mapping quality filters
    pub filtered: u64,
    /// Records assigned the first-mate role
    pub first_mates: u64,
    /// Second mates whose first mate was never stored
    pub orphan_mates: u64,
    /// Pairs whose combined quality fell below the minimum
    pub low_quality_pairs: u64,
    /// Pairs emitted as fragment observations
    pub fragments: u64,
}

impl PairStats {
    /// Create new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold another tracker into this one
    pub fn merge(&mut self, other: &PairStats) {
        self.records += other.records;
        self.filtered += other.filtered;
        self.first_mates += other.first_mates;
        self.orphan_mates += other.orphan_mates;
        self.low_quality_pairs += other.low_quality_pairs;
        self.fragments += other.fragments;
    }

    /// Get percentage of records that ended up in a counted fragment
    pub fn fragment_percent(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            100.0 * (2 * self.fragments) as f64 / self.records as f64
        }
    }

    /// Print summary statistics to log
    pub fn print_summary(&self) {
        if self.records == 0 {
            info!("No records processed");
            return;
        }

        info!("=== Pair Summary ===");
        info!("Number of records: {}", self.records);
        info!(
            "Filtered records: {} ({:.2}%)",
            self.filtered,
            100.0 * self.filtered as f64 / self.records as f64
        );
        info!("Orphan second mates: {}", self.orphan_mates);
        info!("Low quality pairs: {}", self.low_quality_pairs);
        info!(
            "Counted fragments: {} ({:.2}% of records)",
            self.fragments,
            self.fragment_percent()
        );
    }
}

/// What one chromosome contributed to a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeSummary {
    pub reference_id: usize,
    pub name: String,
    /// False when the chromosome was skipped without reading records
    pub processed: bool,
    pub pairs: PairStats,
    /// Reference skips confirmed against exon boundaries
    pub junction_reads: u64,
    /// Rows written for this chromosome
    pub rows: u64,
}

impl ChromosomeSummary {
    pub fn new(reference_id: usize, name: &str) -> Self {
        Self {
            reference_id,
            name: name.to_string(),
            processed: false,
            pairs: PairStats::default(),
            junction_reads: 0,
            rows: 0,
        }
    }

    /// Default observer: one log line per chromosome
    pub fn log(&self) {
        if !self.processed {
            log::debug!("{}: skipped", self.name);
            return;
        }
        info!(
            "{}: {} records, {} fragments, {} junction reads, {} rows",
            self.name, self.pairs.records, self.pairs.fragments, self.junction_reads, self.rows
        );
    }
}

/// Accumulates chromosome summaries into run totals
#[derive(Default, Debug)]
pub struct RunStats {
    pub chromosomes: u64,
    pub skipped: u64,
    pub pairs: PairStats,
    pub junction_reads: u64,
    pub rows: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one chromosome and log it
    pub fn observe(&mut self, summary: &ChromosomeSummary) {
        summary.log();
        if !summary.processed {
            self.skipped += 1;
            return;
        }
        self.chromosomes += 1;
        self.pairs.merge(&summary.pairs);
        self.junction_reads += summary.junction_reads;
        self.rows += summary.rows;
    }

    /// Print run totals to log
    pub fn print_summary(&self) {
        info!(
            "Processed {} chromosomes ({} skipped), wrote {} rows",
            self.chromosomes, self.skipped, self.rows
        );
        if self.pairs.records > 0 {
            self.pairs.print_summary();
        }
        if self.junction_reads > 0 {
            info!("Junction-supporting reads: {}", self.junction_reads);
        }
    }
}
