/// Window definitions: user interval files, fixed and proportional windows
use crate::error::Error;
use crate::io::open_text;
use log::debug;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Half-open interval `[start, end)` with a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
    pub id: String,
}

impl Interval {
    pub fn new(start: usize, end: usize, id: impl Into<String>) -> Self {
        Self {
            start,
            end,
            id: id.into(),
        }
    }

    /// Interval labelled `chr:start-end`
    pub fn labelled(chrom: &str, start: usize, end: usize) -> Self {
        Self::new(start, end, format!("{chrom}:{start}-{end}"))
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | ',' | ';')
}

fn parse_bound(field: &str, line_no: usize) -> Result<usize, Error> {
    let value: i64 = field.parse().map_err(|_| {
        Error::Interval(format!("line {line_no}: invalid coordinate '{field}'"))
    })?;
    usize::try_from(value)
        .map_err(|_| Error::Interval(format!("line {line_no}: negative coordinate {value}")))
}

/// Intervals read from a user file, grouped by chromosome
#[derive(Debug, Clone, Default)]
pub struct IntervalSet {
    by_chrom: HashMap<String, Vec<Interval>>,
    order: Vec<String>,
}

impl IntervalSet {
    /// Parse `chr start end [id]` lines separated by blanks, tabs, `,` or `;`
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut set = Self::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split(is_separator).filter(|f| !f.is_empty()).collect();
            if fields.len() < 3 {
                return Err(Error::Interval(format!(
                    "line {line_no}: expected chr, start and end, got '{trimmed}'"
                )));
            }

            let chrom = fields[0];
            let start = parse_bound(fields[1], line_no)?;
            let end = parse_bound(fields[2], line_no)?;
            if start >= end {
                return Err(Error::Interval(format!(
                    "line {line_no}: start {start} is not before end {end}"
                )));
            }

            let interval = match fields.get(3) {
                Some(id) => Interval::new(start, end, *id),
                None => Interval::labelled(chrom, start, end),
            };
            set.push(chrom, interval);
        }

        for intervals in set.by_chrom.values_mut() {
            intervals.sort_by_key(|itv| itv.start);
        }
        debug!(
            "Read {} intervals on {} chromosomes",
            set.len(),
            set.order.len()
        );
        Ok(set)
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let reader = open_text(path)?;
        Self::parse(reader)
    }

    fn push(&mut self, chrom: &str, interval: Interval) {
        match self.by_chrom.get_mut(chrom) {
            Some(list) => list.push(interval),
            None => {
                self.order.push(chrom.to_string());
                self.by_chrom.insert(chrom.to_string(), vec![interval]);
            }
        }
    }

    /// Chromosomes in first-seen order
    pub fn chromosomes(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, chrom: &str) -> bool {
        self.by_chrom.contains_key(chrom)
    }

    /// Intervals of one chromosome, sorted by start
    pub fn get(&self, chrom: &str) -> &[Interval] {
        self.by_chrom.get(chrom).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_chrom.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// How windows are laid over a chromosome
#[derive(Debug, Clone)]
pub enum WindowPolicy {
    /// Intervals from a user file; chromosomes it does not name are skipped
    Intervals(IntervalSet),
    /// Windows of `size` bases every `offset` bases, last window clipped
    Fixed { size: usize, offset: usize },
    /// `count` equal windows per chromosome
    Proportional { count: usize },
}

impl WindowPolicy {
    /// Pick a policy from the command-line settings; the interval file wins
    pub fn from_settings(
        interval_file: Option<&Path>,
        size: usize,
        offset: usize,
        count: usize,
    ) -> Result<Self, Error> {
        if let Some(path) = interval_file {
            return Ok(Self::Intervals(IntervalSet::from_path(path)?));
        }
        if count > 0 {
            return Ok(Self::Proportional { count });
        }
        if size == 0 || offset == 0 {
            return Err(Error::Parameter(
                "window size and offset must be positive".to_string(),
            ));
        }
        Ok(Self::Fixed { size, offset })
    }

    /// True if the chromosome takes part in the run
    pub fn covers(&self, chrom: &str) -> bool {
        match self {
            Self::Intervals(set) => set.contains(chrom),
            _ => true,
        }
    }

    /// Intervals for one chromosome, sorted by start and clipped to its length
    pub fn intervals(&self, chrom: &str, length: usize) -> Vec<Interval> {
        match *self {
            Self::Intervals(ref set) => set
                .get(chrom)
                .iter()
                .map(|itv| Interval::new(itv.start.min(length), itv.end.min(length), itv.id.clone()))
                .collect(),
            Self::Fixed { size, offset } => fixed_windows(chrom, length, size, offset),
            Self::Proportional { count } => {
                let size = length.div_ceil(count.max(1));
                fixed_windows(chrom, length, size, size)
            }
        }
    }
}

fn fixed_windows(chrom: &str, length: usize, size: usize, offset: usize) -> Vec<Interval> {
    let mut windows = Vec::new();
    if size == 0 || offset == 0 {
        return windows;
    }
    let mut start = 0;
    while start < length {
        let end = (start + size).min(length);
        windows.push(Interval::labelled(chrom, start, end));
        start += offset;
    }
    windows
}
