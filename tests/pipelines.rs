/// End-to-end pipeline tests over in-memory alignments and real output files
use ruAlfred::align::{AlignmentRecord, MemorySource, Reference};
use ruAlfred::coverage::{count_windows, CountDnaConfig, IntervalSet, WindowPolicy};
use ruAlfred::io::{open_text, OutputWriter};
use ruAlfred::junction::{count_junctions, load_bed, CountJctConfig};
use ruAlfred::stats::RunStats;
use ruAlfred::track::{build_tracks, TrackConfig, TrackFormat};
use std::fs;
use std::io::BufRead;
use std::path::Path;
use tempfile::TempDir;

fn read_lines(path: &Path) -> Vec<String> {
    open_text(path).unwrap().lines().map(|l| l.unwrap()).collect()
}

/// One tied pair per base of chr1: both mates start at `p` with a 1M alignment
fn tiled_source() -> MemorySource {
    let mut source =
        MemorySource::new(vec![Reference::new("chr1", 1000), Reference::new("chr2", 300)]);
    for p in 0..1000 {
        let name = format!("frag{p}");
        source
            .extend([
                AlignmentRecord::paired(&name, 0, p, p, 60, "1M").unwrap(),
                AlignmentRecord::paired(&name, 0, p, p, 60, "1M").unwrap(),
            ])
            .unwrap();
    }
    source
}

#[test]
fn test_count_dna_fixed_windows_gzip() {
    let tmpdir = TempDir::new().unwrap();
    let outfile = tmpdir.path().join("cov.gz");

    let mut source = tiled_source();
    let config = CountDnaConfig {
        min_quality: 10,
        windows: WindowPolicy::Fixed {
            size: 200,
            offset: 200,
        },
        sample: "NA12878".to_string(),
    };

    let mut out = OutputWriter::create(&outfile).unwrap();
    let mut stats = RunStats::new();
    count_windows(&mut source, &config, &mut out, &mut |s| stats.observe(s)).unwrap();
    out.finish().unwrap();

    let lines = read_lines(&outfile);
    assert_eq!(lines[0], "chr\tstart\tend\tid\tNA12878");
    assert_eq!(lines.len(), 6);
    for (i, line) in lines[1..].iter().enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields[0], "chr1");
        assert_eq!(fields[1], (i * 200).to_string());
        assert_eq!(fields[2], ((i + 1) * 200).to_string());
        assert_eq!(fields[4], "200");
    }

    assert_eq!(stats.chromosomes, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.pairs.fragments, 1000);
}

#[test]
fn test_count_dna_interval_file() {
    let tmpdir = TempDir::new().unwrap();
    let intervals = tmpdir.path().join("regions.txt");
    fs::write(&intervals, "chr1\t500\t600\tlate\nchr1\t0\t100\tearly\n").unwrap();

    let mut source = tiled_source();
    let config = CountDnaConfig {
        min_quality: 10,
        windows: WindowPolicy::Intervals(IntervalSet::from_path(&intervals).unwrap()),
        sample: "S1".to_string(),
    };

    let mut out = Vec::new();
    count_windows(&mut source, &config, &mut out, &mut |_| {}).unwrap();
    let text = String::from_utf8(out).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(rows, vec!["chr1\t0\t100\tearly\t100", "chr1\t500\t600\tlate\t100"]);
}

#[test]
fn test_tracks_bed_output() {
    let tmpdir = TempDir::new().unwrap();
    let outfile = tmpdir.path().join("track.bed.gz");

    let mut source = tiled_source();
    let config = TrackConfig {
        min_quality: 10,
        resolution: 0.2,
        normalize: 0,
        format: TrackFormat::Bed,
        sample: "S1".to_string(),
    };

    let mut out = OutputWriter::create(&outfile).unwrap();
    build_tracks(&mut source, &config, &mut out, &mut |_| {}).unwrap();
    out.finish().unwrap();

    // Both mates cover every base once: one flat segment
    let lines = read_lines(&outfile);
    assert_eq!(lines, vec!["chr\tstart\tend\tid\tS1", "chr1\t0\t1000\tchr1:0-1000\t2"]);
}

#[test]
fn test_count_jct_from_bed() {
    let tmpdir = TempDir::new().unwrap();
    let bed = tmpdir.path().join("exons.bed");
    fs::write(
        &bed,
        "chr1\t100\t200\tGENE1\nchr1\t300\t400\tGENE1\nchr1\t600\t700\tGENE1\nchr2\t10\t20\tGENE2\n",
    )
    .unwrap();

    let refs = vec![Reference::new("chr1", 1000), Reference::new("chr2", 300)];
    let annotation = load_bed(&bed, &refs).unwrap();

    let mut source = MemorySource::new(refs);
    source
        .extend([
            AlignmentRecord::paired("r1", 0, 150, 0, 60, "50M100N50M").unwrap(),
            AlignmentRecord::paired("r2", 0, 180, 0, 60, "20M100N50M").unwrap(),
            AlignmentRecord::paired("r3", 0, 350, 0, 60, "50M200N30M").unwrap(),
            AlignmentRecord::paired("r4", 0, 150, 0, 60, "50M400N30M").unwrap(),
        ])
        .unwrap();

    let intra_path = tmpdir.path().join("intra.tsv");
    let inter_path = tmpdir.path().join("inter.tsv");
    let mut intra = OutputWriter::create(&intra_path).unwrap();
    let mut inter = OutputWriter::create(&inter_path).unwrap();
    let config = CountJctConfig {
        min_quality: 10,
        sample: "S1".to_string(),
    };
    let mut stats = RunStats::new();
    count_junctions(
        &mut source,
        &annotation,
        &config,
        &mut intra,
        &mut inter,
        &mut |s| stats.observe(s),
    )
    .unwrap();
    intra.finish().unwrap();
    inter.finish().unwrap();

    assert_eq!(
        read_lines(&intra_path),
        vec![
            "gene\texonA\texonB\tS1",
            "GENE1\tchr1:100-200\tchr1:300-400\t2",
            "GENE1\tchr1:100-200\tchr1:600-700\t1",
            "GENE1\tchr1:300-400\tchr1:600-700\t1",
        ]
    );
    assert_eq!(read_lines(&inter_path).len(), 1);
    assert_eq!(stats.junction_reads, 4);
    assert_eq!(stats.chromosomes, 2);
}
