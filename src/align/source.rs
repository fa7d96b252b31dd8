/// Alignment sources: anything that can replay the records of one reference
use super::record::{AlignmentRecord, Reference};
use crate::error::Error;

/// Random access to the alignments of one reference sequence at a time.
///
/// Records must be visited in ascending start order, as a coordinate-sorted
/// and indexed BAM yields them.
pub trait AlignmentSource {
    /// Reference sequences, indexed by reference id
    fn references(&self) -> &[Reference];

    /// Mapped record count for a reference, when the index records it
    fn mapped_count(&self, reference_id: usize) -> Option<u64>;

    /// Visit every record placed on `reference_id`, in position order
    fn visit<F>(&mut self, reference_id: usize, f: F) -> Result<(), Error>
    where
        F: FnMut(&AlignmentRecord) -> Result<(), Error>;

    /// Reference id for a chromosome name
    fn reference_id(&self, name: &str) -> Option<usize> {
        self.references().iter().position(|r| r.name == name)
    }
}

/// In-memory alignment source, sorted on construction
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    references: Vec<Reference>,
    records: Vec<Vec<AlignmentRecord>>,
}

impl MemorySource {
    pub fn new(references: Vec<Reference>) -> Self {
        let records = vec![Vec::new(); references.len()];
        Self {
            references,
            records,
        }
    }

    /// Add a record to the reference named by its `reference_id`
    pub fn push(&mut self, record: AlignmentRecord) -> Result<(), Error> {
        let reference_id = record.reference_id.ok_or_else(|| {
            Error::Alignment(format!("record {} has no reference", record.name))
        })?;
        let bucket = self.records.get_mut(reference_id).ok_or_else(|| {
            Error::Alignment(format!(
                "record {} names unknown reference {}",
                record.name, reference_id
            ))
        })?;
        // Keep insertion order among equal starts, as a sorted BAM would
        let at = bucket.partition_point(|r| r.start <= record.start);
        bucket.insert(at, record);
        Ok(())
    }

    /// Add several records
    pub fn extend<I>(&mut self, records: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = AlignmentRecord>,
    {
        for record in records {
            self.push(record)?;
        }
        Ok(())
    }
}

impl AlignmentSource for MemorySource {
    fn references(&self) -> &[Reference] {
        &self.references
    }

    fn mapped_count(&self, reference_id: usize) -> Option<u64> {
        self.records.get(reference_id).map(|records| {
            records
                .iter()
                .filter(|r| !r.flags.is_unmapped())
                .count() as u64
        })
    }

    fn visit<F>(&mut self, reference_id: usize, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&AlignmentRecord) -> Result<(), Error>,
    {
        if let Some(records) = self.records.get(reference_id) {
            for record in records {
                f(record)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_chromosomes() -> MemorySource {
        MemorySource::new(vec![Reference::new("chr1", 1000), Reference::new("chr2", 500)])
    }

    #[test]
    fn test_push_keeps_position_order() {
        let mut source = two_chromosomes();
        source
            .push(AlignmentRecord::paired("b", 0, 200, 300, 60, "10M").unwrap())
            .unwrap();
        source
            .push(AlignmentRecord::paired("a", 0, 100, 300, 60, "10M").unwrap())
            .unwrap();
        source
            .push(AlignmentRecord::paired("c", 0, 100, 300, 60, "10M").unwrap())
            .unwrap();

        let mut names = Vec::new();
        source
            .visit(0, |r| {
                names.push(r.name.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(names, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_push_unknown_reference() {
        let mut source = two_chromosomes();
        let rec = AlignmentRecord::paired("a", 5, 100, 300, 60, "10M").unwrap();
        assert!(source.push(rec).is_err());
    }

    #[test]
    fn test_mapped_count_and_lookup() {
        let mut source = two_chromosomes();
        source
            .push(AlignmentRecord::paired("a", 1, 10, 30, 60, "10M").unwrap())
            .unwrap();
        assert_eq!(source.mapped_count(0), Some(0));
        assert_eq!(source.mapped_count(1), Some(1));
        assert_eq!(source.mapped_count(7), None);
        assert_eq!(source.reference_id("chr2"), Some(1));
        assert_eq!(source.reference_id("chrX"), None);
    }

    #[test]
    fn test_visit_propagates_errors() {
        let mut source = two_chromosomes();
        source
            .push(AlignmentRecord::paired("a", 0, 10, 30, 60, "10M").unwrap())
            .unwrap();
        let result = source.visit(0, |_| Err(Error::Alignment("stop".into())));
        assert!(result.is_err());
    }
}
