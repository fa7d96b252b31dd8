/// BED exon annotation: `chr start end name [score strand]`, 0-based half-open
use super::annotation::{Annotation, AnnotationBuilder, AnnotationFormat};
use crate::align::Reference;
use crate::error::Error;
use crate::io::open_text;
use std::io::BufRead;
use std::path::Path;

/// Feed every BED line into `builder`, the name column grouping exons
pub fn read_bed<R: BufRead>(reader: R, builder: &mut AnnotationBuilder) -> Result<(), Error> {
    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            log::warn!("Skipping BED line {line_num}: expected chr, start, end and name");
            continue;
        }
        let (Ok(start), Ok(end)) = (fields[1].parse::<usize>(), fields[2].parse::<usize>()) else {
            log::warn!("Skipping BED line {line_num}: invalid coordinates");
            continue;
        };
        if start > end {
            log::warn!("Skipping BED line {line_num}: start {start} after end {end}");
            continue;
        }
        builder.add(fields[0], start, end, fields[3]);
    }
    Ok(())
}

pub fn load_bed(path: &Path, references: &[Reference]) -> Result<Annotation, Error> {
    log::info!("Loading BED annotation from: {}", path.display());
    let mut builder = AnnotationBuilder::new(references);
    read_bed(open_text(path)?, &mut builder)?;
    builder.finish(AnnotationFormat::Bed)
}
