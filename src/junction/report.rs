/// Junction count tables
///
/// Intra-gene table (4 tab-separated columns):
/// 1. gene label
/// 2. upstream exon as `chr:start-end`
/// 3. downstream exon as `chr:start-end`
/// 4. supporting reads
///
/// Every non-overlapping exon pair of the same gene is listed, with 0 for
/// pairs no read connected.
use super::annotation::Annotation;
use super::detect::{ChromosomeExons, JunctionCounts};
use crate::error::Error;
use std::io::Write;

/// Write the intra-gene header line
pub fn write_intra_header<W: Write>(out: &mut W, sample: &str) -> Result<(), Error> {
    writeln!(out, "gene\texonA\texonB\t{sample}")?;
    Ok(())
}

/// Write the rows of one chromosome; returns the number of rows
pub fn write_intra_rows<W: Write>(
    out: &mut W,
    chrom: &str,
    exons: &ChromosomeExons,
    annotation: &Annotation,
    counts: &JunctionCounts,
) -> Result<u64, Error> {
    let exons = exons.exons();
    let mut rows = 0;
    for (i, a) in exons.iter().enumerate() {
        for b in &exons[i + 1..] {
            if a.gene != b.gene || a.end >= b.start {
                continue;
            }
            writeln!(
                out,
                "{}\t{chrom}:{}-{}\t{chrom}:{}-{}\t{}",
                annotation.gene(a.gene),
                a.start,
                a.end,
                b.start,
                b.end,
                counts.get(a.id, b.id)
            )?;
            rows += 1;
        }
    }
    Ok(rows)
}

/// Inter-gene table: header only, no rows are produced
pub fn write_inter_header<W: Write>(out: &mut W, sample: &str) -> Result<(), Error> {
    writeln!(out, "geneA\texonA\tgeneB\texonB\t{sample}")?;
    Ok(())
}
