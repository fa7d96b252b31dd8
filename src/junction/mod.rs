/// Exon-exon junction counting (`count_jct`)
///
/// This module handles:
/// - GTF/GFF3/BED parsing into per-chromosome exon lists
/// - Matching reference skips against exon boundaries
/// - Writing the intra-gene junction table
mod annotation;
mod bed;
mod detect;
mod gtf;
mod report;

pub use annotation::{Annotation, AnnotationBuilder, AnnotationFormat, ExonInterval};
pub use bed::{load_bed, read_bed};
pub use detect::{observe_record, ChromosomeExons, JunctionCounts};
pub use gtf::{detect_format, load_gtf, read_features, FeatureFilter};
pub use report::{write_inter_header, write_intra_header, write_intra_rows};

use crate::align::AlignmentSource;
use crate::error::Error;
use crate::stats::ChromosomeSummary;
use std::io::Write;

/// Settings for junction counting
#[derive(Debug, Clone)]
pub struct CountJctConfig {
    pub min_quality: u8,
    pub sample: String,
}

/// Count junction support for one chromosome
pub fn count_chromosome<S: AlignmentSource>(
    source: &mut S,
    reference_id: usize,
    exons: &ChromosomeExons,
    min_quality: u8,
    summary: &mut ChromosomeSummary,
) -> Result<JunctionCounts, Error> {
    let mut counts = JunctionCounts::new();
    source.visit(reference_id, |record| {
        summary.pairs.records += 1;
        if record.is_junction_excluded() || record.mapping_quality < min_quality {
            summary.pairs.filtered += 1;
            return Ok(());
        }
        summary.junction_reads += u64::from(observe_record(exons, record, &mut counts)?);
        Ok(())
    })?;
    Ok(counts)
}

/// Count exon-exon junction reads on every annotated chromosome and write
/// the intra-gene table; the inter-gene table receives its header only.
pub fn count_junctions<S, W, V>(
    source: &mut S,
    annotation: &Annotation,
    config: &CountJctConfig,
    intra: &mut W,
    inter: &mut V,
    observer: &mut dyn FnMut(&ChromosomeSummary),
) -> Result<(), Error>
where
    S: AlignmentSource,
    W: Write,
    V: Write,
{
    write_intra_header(intra, &config.sample)?;
    write_inter_header(inter, &config.sample)?;

    let references = source.references().to_vec();
    for (reference_id, reference) in references.iter().enumerate() {
        let mut summary = ChromosomeSummary::new(reference_id, &reference.name);
        let annotated = annotation.exons(reference_id);
        if annotated.is_empty() {
            observer(&summary);
            continue;
        }

        let exons = ChromosomeExons::new(annotated.to_vec(), reference.length);
        let counts = count_chromosome(
            source,
            reference_id,
            &exons,
            config.min_quality,
            &mut summary,
        )?;

        summary.rows = write_intra_rows(intra, &reference.name, &exons, annotation, &counts)?;
        summary.processed = true;
        observer(&summary);
    }

    Ok(())
}
