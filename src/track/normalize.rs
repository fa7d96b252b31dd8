/// Genome-wide library-size normalization for coverage tracks
use crate::align::AlignmentSource;
use crate::error::Error;
use crate::pair::{PairResolver, Resolution};
use log::{info, warn};

/// Aligned bases (M, =, X) of the second mate of every valid fragment, genome-wide
pub fn count_fragment_bases<S: AlignmentSource>(
    source: &mut S,
    min_quality: u8,
) -> Result<u64, Error> {
    let mut total = 0u64;
    for reference_id in 0..source.references().len() {
        let mut resolver = PairResolver::new(min_quality);
        source.visit(reference_id, |record| {
            if let Resolution::Fragment(_) = resolver.resolve(record) {
                total += record.aligned_length();
            }
            Ok(())
        })?;
    }
    Ok(total)
}

/// Scale factor that brings the library to `target` 100 bp read pairs.
///
/// A target of 0 disables normalization, as does an empty library.
pub fn factor_for(target: u64, total_bases: u64) -> f64 {
    if target == 0 {
        return 1.0;
    }
    if total_bases == 0 {
        warn!("No valid fragments found, coverage is not normalized");
        return 1.0;
    }
    (target as f64 / total_bases as f64) * 100.0 * 2.0
}

/// Run the normalization pass over the whole source
pub fn normalization_factor<S: AlignmentSource>(
    source: &mut S,
    min_quality: u8,
    target: u64,
) -> Result<f64, Error> {
    if target == 0 {
        return Ok(1.0);
    }
    let total = count_fragment_bases(source, min_quality)?;
    let factor = factor_for(target, total);
    info!("Normalization: {total} fragment bases, factor {factor:.6}");
    Ok(factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{AlignmentRecord, MemorySource, Reference};

    #[test]
    fn test_factor_for() {
        assert_eq!(factor_for(0, 1000), 1.0);
        assert_eq!(factor_for(1000, 0), 1.0);
        assert!((factor_for(1000, 400) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_second_mate_bases_on_all_chromosomes() {
        let mut source =
            MemorySource::new(vec![Reference::new("chr1", 1000), Reference::new("chr2", 1000)]);
        source
            .extend([
                AlignmentRecord::paired("a", 0, 10, 100, 60, "50M").unwrap(),
                AlignmentRecord::paired("a", 0, 100, 10, 60, "20M5D10=2S").unwrap(),
                AlignmentRecord::paired("b", 1, 10, 100, 60, "50M").unwrap(),
                AlignmentRecord::paired("b", 1, 100, 10, 60, "40M").unwrap(),
                // low quality pair contributes nothing
                AlignmentRecord::paired("c", 1, 200, 300, 3, "50M").unwrap(),
                AlignmentRecord::paired("c", 1, 300, 200, 60, "50M").unwrap(),
            ])
            .unwrap();

        assert_eq!(count_fragment_bases(&mut source, 10).unwrap(), 30 + 40);
        let factor = normalization_factor(&mut source, 10, 700).unwrap();
        assert!((factor - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_skips_pass() {
        let mut source = MemorySource::new(vec![Reference::new("chr1", 1000)]);
        assert_eq!(normalization_factor(&mut source, 10, 0).unwrap(), 1.0);
    }
}
