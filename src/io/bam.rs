/// Indexed BAM input with noodles
use crate::align::{AlignmentRecord, AlignmentSource, CigarOp, Reference};
use crate::error::Error;
use bstr::BString;
use noodles::bam;
use noodles::core::Region;
use noodles::sam;
use noodles::sam::alignment::record::Cigar as _;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::read_group::tag as rg_tag;
use std::path::{Path, PathBuf};

/// Coordinate-sorted, indexed BAM file
///
/// Each chromosome pass opens its own indexed reader and queries the
/// whole reference, so records arrive in position order.
pub struct BamSource {
    path: PathBuf,
    header: sam::Header,
    references: Vec<Reference>,
    /// Mapped record counts from the index metadata
    mapped: Vec<u64>,
}

impl BamSource {
    /// Open a BAM file together with its `.bai`/`.csi` index
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(path)
            .map_err(|e| Error::io(e, path))?;
        let header = reader.read_header().map_err(|e| Error::io(e, path))?;

        let references: Vec<Reference> = header
            .reference_sequences()
            .iter()
            .map(|(name, map)| Reference::new(name.to_string(), map.length().get()))
            .collect();

        // References without index metadata hold no records
        let mut mapped: Vec<u64> = reader
            .index()
            .reference_sequences()
            .map(|rs| rs.metadata().map_or(0, |m| m.mapped_record_count()))
            .collect();
        mapped.resize(references.len(), 0);

        log::debug!(
            "Opened {} with {} reference sequences",
            path.display(),
            references.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            references,
            mapped,
        })
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sample name from `@RG SM`, falling back to the file stem
    pub fn sample_name(&self) -> Result<String, Error> {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        sample_name(&self.header, &stem)
    }
}

/// Single sample named by the header's read groups.
///
/// No `SM` tag yields `fallback`; more than one distinct sample is an error.
pub fn sample_name(header: &sam::Header, fallback: &str) -> Result<String, Error> {
    let mut samples: Vec<String> = header
        .read_groups()
        .iter()
        .filter_map(|(_, rg)| rg.other_fields().get(&rg_tag::SAMPLE).map(|sm| sm.to_string()))
        .collect();
    samples.sort();
    samples.dedup();

    match samples.len() {
        0 => Ok(fallback.to_string()),
        1 => Ok(samples.remove(0)),
        _ => Err(Error::Header(format!(
            "only one sample (@RG SM) is allowed per BAM file, found {}",
            samples.join(", ")
        ))),
    }
}

/// Copy the fields the counting engines read out of a decoded record
fn to_alignment_record(record: &RecordBuf) -> Result<AlignmentRecord, Error> {
    let cigar = record
        .cigar()
        .iter()
        .map(|op| op.map(|op| CigarOp::from_kind(op.kind(), op.len())))
        .collect::<std::io::Result<Vec<_>>>()?;

    Ok(AlignmentRecord {
        name: record.name().map(BString::from).unwrap_or_default(),
        flags: record.flags(),
        reference_id: record.reference_sequence_id(),
        start: record
            .alignment_start()
            .map_or(0, |p| usize::from(p) - 1),
        // 255 marks an unavailable mapping quality
        mapping_quality: record.mapping_quality().map_or(255, |q| q.get()),
        cigar,
        mate_reference_id: record.mate_reference_sequence_id(),
        mate_start: record
            .mate_alignment_start()
            .map_or(0, |p| usize::from(p) - 1),
    })
}

impl AlignmentSource for BamSource {
    fn references(&self) -> &[Reference] {
        &self.references
    }

    fn mapped_count(&self, reference_id: usize) -> Option<u64> {
        self.mapped.get(reference_id).copied()
    }

    fn visit<F>(&mut self, reference_id: usize, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&AlignmentRecord) -> Result<(), Error>,
    {
        let reference = self.references.get(reference_id).ok_or_else(|| {
            Error::Alignment(format!("unknown reference id {reference_id}"))
        })?;

        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(&self.path)
            .map_err(|e| Error::io(e, &self.path))?;
        reader
            .read_header()
            .map_err(|e| Error::io(e, &self.path))?;

        let region = Region::new(reference.name.as_str(), ..);
        let query = reader
            .query(&self.header, &region)
            .map_err(|e| Error::io(e, &self.path))?;

        for result in query {
            let record = result.map_err(|e| Error::io(e, &self.path))?;
            let record = RecordBuf::try_from_alignment_record(&self.header, &record)
                .map_err(|e| Error::io(e, &self.path))?;
            f(&to_alignment_record(&record)?)?;
        }

        Ok(())
    }
}
