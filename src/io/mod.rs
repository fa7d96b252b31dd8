/// Input and output plumbing: BAM access, gzip-aware text files
pub mod bam;

pub use bam::{sample_name, BamSource};

use crate::error::Error;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}

/// Open a text file (plain or gzip compressed) for line reading
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead + Send>, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;

    if is_gzipped(path) {
        // bgzip output is multi-member
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Output table, gzip compressed when the path ends in `.gz`
pub enum OutputWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputWriter {
    pub fn create(path: &Path) -> Result<Self, Error> {
        let file = File::create(path).map_err(|e| Error::io(e, path))?;
        let buf = BufWriter::new(file);
        if is_gzipped(path) {
            Ok(Self::Gzip(GzEncoder::new(buf, Compression::default())))
        } else {
            Ok(Self::Plain(buf))
        }
    }

    /// Flush all data and write the gzip trailer
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(enc) => enc.finish()?.flush(),
        }
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}
