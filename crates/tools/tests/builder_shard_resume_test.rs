use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use collapsi_core::GameState;
use collapsi_core::enumerate::CanonicalEnumerator;
use collapsi_core::record::{RecordSchema, SolvedReader, SolvedRecord};
use tempfile::TempDir;
use tools::builder::{self, BuildConfig};

fn slice(n: usize) -> Vec<GameState> {
    CanonicalEnumerator::new().take(n).collect()
}

fn config(out: &Path) -> BuildConfig {
    BuildConfig {
        out: out.to_path_buf(),
        limit: 0,
        batch: 4,
        ..BuildConfig::default()
    }
}

fn read_all(path: &Path) -> Vec<SolvedRecord> {
    SolvedReader::open(path, RecordSchema::V1)
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn shards_partition_the_single_shard_output() {
    let dir = TempDir::new().unwrap();
    let states = slice(24);

    let whole = dir.path().join("whole.db");
    builder::run(&config(&whole), states.clone()).unwrap();
    let expected: HashSet<SolvedRecord> = read_all(&whole).into_iter().collect();
    assert_eq!(expected.len(), 24);

    let mut union = HashSet::new();
    let mut total = 0;
    for offset in 0..3 {
        let out = dir.path().join(format!("shard_{offset}.db"));
        let cfg = BuildConfig {
            stride: 3,
            offset,
            ..config(&out)
        };
        builder::run(&cfg, states.clone()).unwrap();
        let recs = read_all(&out);
        for r in &recs {
            assert_eq!(r.key.shard(3), offset);
        }
        total += recs.len();
        union.extend(recs);
    }
    // 各局面はちょうど1つのシャードに入る
    assert_eq!(total, 24);
    assert_eq!(union, expected);
}

#[test]
fn rerun_on_complete_output_appends_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("solved.db");
    let states = slice(16);

    let first = builder::run(&config(&out), states.clone()).unwrap();
    assert_eq!(first.produced, 16);
    let before = std::fs::read(&out).unwrap();

    let second = builder::run(&config(&out), states.clone()).unwrap();
    assert_eq!(second.produced, 0);
    assert_eq!(second.skipped_seen, 16);
    assert_eq!(second.records_at_start, 16);
    assert_eq!(std::fs::read(&out).unwrap(), before);

    // 途中で落ちたときの端数は切り詰められる
    let mut f = std::fs::OpenOptions::new().append(true).open(&out).unwrap();
    f.write_all(&[0xAB; 5]).unwrap();
    drop(f);
    let third = builder::run(&config(&out), states).unwrap();
    assert_eq!(third.produced, 0);
    assert_eq!(std::fs::read(&out).unwrap(), before);
}

#[test]
fn gz_seen_source_skips_known_states() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("base.db");
    let states = slice(8);
    builder::run(&config(&base), states.clone()).unwrap();

    let gz = dir.path().join("base.db.gz");
    let mut enc = flate2::write::GzEncoder::new(
        std::fs::File::create(&gz).unwrap(),
        flate2::Compression::default(),
    );
    enc.write_all(&std::fs::read(&base).unwrap()).unwrap();
    enc.finish().unwrap();

    let out = dir.path().join("fresh.db");
    let cfg = BuildConfig {
        seen: vec![gz],
        ..config(&out)
    };
    let summary = builder::run(&cfg, states).unwrap();
    assert_eq!(summary.seen_loaded, 8);
    assert_eq!(summary.produced, 0);
    assert_eq!(summary.skipped_seen, 8);
}

#[test]
fn interrupt_flushes_pending_batch() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("solved.db");
    let stop = AtomicBool::new(true);
    let summary = builder::run_with_interrupt(&config(&out), slice(10), &stop).unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.produced, 1);
    assert_eq!(read_all(&out).len(), 1);
}
