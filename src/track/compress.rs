/// Piecewise-constant track segments and lossy segment merging
use log::debug;

/// Constant-score segment `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSegment {
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl TrackSegment {
    pub fn new(start: usize, end: usize, score: f64) -> Self {
        Self { start, end, score }
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }

    /// Length-weighted mean score of `self` joined with `next`
    fn pooled_score(&self, next: &TrackSegment) -> f64 {
        let w1 = self.width() as f64;
        let w2 = next.width() as f64;
        (w1 * self.score + w2 * next.score) / (w1 + w2)
    }

    /// Squared error introduced by replacing both segments with their pooled mean
    pub fn merge_cost(&self, next: &TrackSegment) -> f64 {
        let w1 = self.width() as f64;
        let w2 = next.width() as f64;
        let m = self.pooled_score(next);
        w1 * (self.score - m).powi(2) + w2 * (next.score - m).powi(2)
    }

    /// Join with the adjacent segment that follows
    pub fn merge(&self, next: &TrackSegment) -> TrackSegment {
        TrackSegment::new(self.start, next.end, self.pooled_score(next))
    }
}

/// Group a per-base signal into maximal runs of equal value, scaled by `factor`
pub fn group_runs<T>(values: &[T], factor: f64) -> Vec<TrackSegment>
where
    T: Copy + PartialEq + Into<f64>,
{
    let mut segments = Vec::new();
    let Some(&first) = values.first() else {
        return segments;
    };

    let mut run_start = 0;
    let mut run_value = first;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value != run_value {
            segments.push(TrackSegment::new(run_start, i, factor * run_value.into()));
            run_start = i;
            run_value = value;
        }
    }
    segments.push(TrackSegment::new(
        run_start,
        values.len(),
        factor * run_value.into(),
    ));
    segments
}

/// Merge adjacent segments until at most `resolution` of the original count remains.
///
/// Resolutions outside `(0, 1)` leave the segments untouched. Each round
/// sorts the adjacent merge costs, takes the cost at the rank matching the
/// remaining excess as threshold, and merges left to right; a merged
/// segment stays the left operand for the next comparison.
pub fn compress(segments: &mut Vec<TrackSegment>, resolution: f64) {
    if !(resolution > 0.0 && resolution < 1.0) {
        return;
    }

    let original = segments.len();
    let mut ratio = 1.0;
    let mut rounds = 0;

    while segments.len() > 1 && ratio > resolution {
        let mut costs: Vec<f64> = segments
            .windows(2)
            .map(|pair| pair[0].merge_cost(&pair[1]))
            .collect();
        costs.sort_by(f64::total_cmp);

        let rank = ((ratio - resolution) * segments.len() as f64).floor() as usize;
        let rank = rank.saturating_sub(1).min(costs.len() - 1);
        let threshold = costs[rank];

        let mut merged = Vec::with_capacity(segments.len());
        let mut current = segments[0];
        for next in &segments[1..] {
            if current.merge_cost(next) <= threshold {
                current = current.merge(next);
            } else {
                merged.push(current);
                current = *next;
            }
        }
        merged.push(current);

        let changed = merged.len() < segments.len();
        *segments = merged;
        rounds += 1;
        if !changed {
            break;
        }
        ratio = segments.len() as f64 / original as f64;
    }

    debug!(
        "Compressed {} segments to {} in {} rounds",
        original,
        segments.len(),
        rounds
    );
}
