/// Exon annotation shared by the GTF, GFF3 and BED readers
use crate::align::Reference;
use crate::error::Error;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Half-open exon `[start, end)` in 0-based coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExonInterval {
    pub start: usize,
    pub end: usize,
    /// Index into [`Annotation::genes`]
    pub gene: usize,
    /// Unique exon id, assigned in file order
    pub id: usize,
}

impl ExonInterval {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Input annotation formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationFormat {
    Gtf,
    Gff3,
    Bed,
}

impl std::fmt::Display for AnnotationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gtf => write!(f, "GTF"),
            Self::Gff3 => write!(f, "GFF3"),
            Self::Bed => write!(f, "BED"),
        }
    }
}

/// Exons per reference sequence plus the gene labels they point to
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    pub genes: Vec<String>,
    /// Indexed by reference id
    pub exons: Vec<Vec<ExonInterval>>,
}

impl Annotation {
    pub fn exons(&self, reference_id: usize) -> &[ExonInterval] {
        self.exons.get(reference_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn gene(&self, index: usize) -> &str {
        self.genes.get(index).map(String::as_str).unwrap_or("NA")
    }

    pub fn exon_count(&self) -> usize {
        self.exons.iter().map(Vec::len).sum()
    }
}

/// Collects exons on the alignment file's references.
///
/// Exons on unknown chromosomes are skipped; exact duplicates
/// (same chromosome, bounds and gene) are collapsed.
#[derive(Debug)]
pub struct AnnotationBuilder {
    reference_ids: HashMap<String, usize>,
    gene_ids: HashMap<String, usize>,
    seen: HashSet<(usize, usize, usize, usize)>,
    annotation: Annotation,
    next_exon: usize,
    skipped_chromosomes: HashSet<String>,
}

impl AnnotationBuilder {
    pub fn new(references: &[Reference]) -> Self {
        let reference_ids = references
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        Self {
            reference_ids,
            gene_ids: HashMap::new(),
            seen: HashSet::new(),
            annotation: Annotation {
                genes: Vec::new(),
                exons: vec![Vec::new(); references.len()],
            },
            next_exon: 0,
            skipped_chromosomes: HashSet::new(),
        }
    }

    /// Add one exon; returns false if it was skipped or collapsed
    pub fn add(&mut self, chrom: &str, start: usize, end: usize, gene: &str) -> bool {
        let Some(&reference_id) = self.reference_ids.get(chrom) else {
            if self.skipped_chromosomes.insert(chrom.to_string()) {
                debug!("Annotation chromosome {chrom} not in BAM header, skipping");
            }
            return false;
        };

        let gene_index = match self.gene_ids.get(gene) {
            Some(&idx) => idx,
            None => {
                let idx = self.annotation.genes.len();
                self.annotation.genes.push(gene.to_string());
                self.gene_ids.insert(gene.to_string(), idx);
                idx
            }
        };

        if !self.seen.insert((reference_id, start, end, gene_index)) {
            return false;
        }

        self.annotation.exons[reference_id].push(ExonInterval {
            start,
            end,
            gene: gene_index,
            id: self.next_exon,
        });
        self.next_exon += 1;
        true
    }

    pub fn finish(self, format: AnnotationFormat) -> Result<Annotation, Error> {
        if self.next_exon == 0 {
            return Err(Error::Annotation(format!(
                "no usable exons found in {format} annotation"
            )));
        }
        info!(
            "Loaded {} exons of {} genes from {format} annotation",
            self.next_exon,
            self.annotation.genes.len()
        );
        Ok(self.annotation)
    }
}
