/// GTF and GFF3 parsing for exon annotations
///
/// Both formats are tab-separated with 9 columns:
/// 1. seqname (chromosome)
/// 2. source (ignored)
/// 3. feature (gene, transcript, exon, etc.)
/// 4. start (1-based inclusive)
/// 5. end (1-based inclusive)
/// 6. score (ignored)
/// 7. strand (ignored)
/// 8. frame (ignored)
/// 9. attributes: `key "value";` in GTF, `key=value;` in GFF3
use super::annotation::{Annotation, AnnotationBuilder, AnnotationFormat};
use crate::align::Reference;
use crate::error::Error;
use crate::io::open_text;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// GTF/GFF3 record (single line)
#[derive(Debug, Clone)]
pub struct GtfRecord {
    pub seqname: String,
    pub feature: String,
    /// 0-based start
    pub start: usize,
    /// Exclusive end
    pub end: usize,
    pub attributes: HashMap<String, String>,
}

/// Which features to keep and how to group them
#[derive(Debug, Clone)]
pub struct FeatureFilter {
    pub feature: String,
    pub id_attribute: String,
}

impl Default for FeatureFilter {
    fn default() -> Self {
        Self {
            feature: "exon".to_string(),
            id_attribute: "gene_id".to_string(),
        }
    }
}

/// Guess GTF vs GFF3 from the content of an annotation file.
///
/// A `##gff-version 3` pragma decides immediately; otherwise the
/// attribute column of the first feature line is inspected.
pub fn detect_format<R: BufRead>(reader: R) -> Result<AnnotationFormat, Error> {
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("##gff-version") {
            return Ok(if line.contains('3') {
                AnnotationFormat::Gff3
            } else {
                AnnotationFormat::Gtf
            });
        }
        if line.starts_with('#') {
            continue;
        }
        let Some(attributes) = line.split('\t').nth(8) else {
            continue;
        };
        let first = attributes.split(';').next().unwrap_or("").trim();
        let gff3 = first.contains('=') && !first.contains('"');
        return Ok(if gff3 {
            AnnotationFormat::Gff3
        } else {
            AnnotationFormat::Gtf
        });
    }
    Ok(AnnotationFormat::Gtf)
}

pub fn detect_format_path(path: &Path) -> Result<AnnotationFormat, Error> {
    detect_format(open_text(path)?)
}

/// Parse a single GTF or GFF3 line
fn parse_gtf_line(line: &str, format: AnnotationFormat) -> Result<GtfRecord, Error> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < 9 {
        return Err(Error::Annotation(format!(
            "{format} line has {} fields, expected 9",
            fields.len()
        )));
    }

    let start = fields[3]
        .parse::<usize>()
        .map_err(|e| Error::Annotation(format!("Invalid start position: {e}")))?;
    let end = fields[4]
        .parse::<usize>()
        .map_err(|e| Error::Annotation(format!("Invalid end position: {e}")))?;
    if start == 0 || start > end {
        return Err(Error::Annotation(format!(
            "Invalid feature bounds {start}-{end}"
        )));
    }

    let attributes = match format {
        AnnotationFormat::Gff3 => parse_gff3_attributes(fields[8]),
        _ => parse_attributes(fields[8]),
    };

    Ok(GtfRecord {
        seqname: fields[0].to_string(),
        feature: fields[2].to_string(),
        start: start - 1,
        end,
        attributes,
    })
}

/// Parse GTF attributes field
///
/// Format: key1 "value1"; key2 "value2";
fn parse_attributes(attr_str: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();

    for pair in attr_str.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let Some((key, value)) = pair.split_once(' ') else {
            continue;
        };
        attributes.insert(
            key.trim().to_string(),
            value.trim().trim_matches('"').to_string(),
        );
    }

    attributes
}

/// Parse GFF3 attributes field
///
/// Format: key1=value1;key2=value2
fn parse_gff3_attributes(attr_str: &str) -> HashMap<String, String> {
    attr_str
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Feed every matching feature of a GTF/GFF3 stream into `builder`
pub fn read_features<R: BufRead>(
    reader: R,
    format: AnnotationFormat,
    filter: &FeatureFilter,
    builder: &mut AnnotationBuilder,
) -> Result<(), Error> {
    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.map_err(|e| {
            Error::Annotation(format!("Failed to read line {line_num}: {e}"))
        })?;

        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record = match parse_gtf_line(line, format) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping malformed {format} line {line_num}: {e}");
                continue;
            }
        };
        if record.feature != filter.feature {
            continue;
        }
        match record.attributes.get(&filter.id_attribute) {
            Some(gene) => {
                builder.add(&record.seqname, record.start, record.end, gene);
            }
            None => log::warn!(
                "Skipping {format} line {line_num}: no {} attribute",
                filter.id_attribute
            ),
        }
    }
    Ok(())
}

/// Load a GTF or GFF3 file (plain or gzipped), detecting the flavour from its content
pub fn load_gtf(
    path: &Path,
    references: &[Reference],
    filter: &FeatureFilter,
) -> Result<Annotation, Error> {
    let format = detect_format_path(path)?;
    log::info!("Loading {format} annotation from: {}", path.display());

    let mut builder = AnnotationBuilder::new(references);
    read_features(open_text(path)?, format, filter, &mut builder)?;
    builder.finish(format)
}
