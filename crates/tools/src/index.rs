//! キー → 局面の逆引き索引の生成
//!
//! キーは一方向ハッシュなので、正規化局面を列挙し直して solved DB にある
//! (key, turn) と一致したものを索引レコードとして書き出す。
//! ビルダーと同様、末尾の切り詰めと既存エントリのスキップで再開できる。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use collapsi_core::enumerate::CANONICAL_STATES;
use collapsi_core::record::{
    IndexReader, IndexRecord, KeyTurn, RecordSchema, SolvedReader, append_bytes,
    encode_index_batch, truncate_to_record_boundary,
};
use collapsi_core::{GameState, KeyWidth};
use indicatif::{ProgressBar, ProgressStyle};

use crate::common::io::{ensure_parent_dir, open_reader};

/// 索引生成の設定
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub db: PathBuf,
    pub out: PathBuf,
    pub key_width: KeyWidth,
    pub stride: u64,
    pub offset: u64,
    pub batch: usize,
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            bail!("--stride must be at least 1");
        }
        if self.offset >= self.stride {
            bail!("--offset ({}) must be less than --stride ({})", self.offset, self.stride);
        }
        if self.batch == 0 {
            bail!("--batch must be at least 1");
        }
        Ok(())
    }
}

/// 索引生成の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// solved DB から読んだ有効な (key, turn) の数
    pub wanted_total: u64,
    pub already_indexed: u64,
    pub written: u64,
    pub scanned: u64,
    /// 列挙後も見つからなかった数
    pub remaining: u64,
}

/// solved DB の (key, turn) を読み込む（ゼロキーと turn > 1 は除く）
pub fn load_wanted(db: &Path, schema: RecordSchema) -> Result<HashSet<KeyTurn>> {
    let reader = open_reader(db).with_context(|| format!("failed to open {}", db.display()))?;
    let mut wanted = HashSet::new();
    let mut dropped = 0u64;
    for rec in SolvedReader::new(reader, schema) {
        let rec = rec.with_context(|| format!("failed to read {}", db.display()))?;
        if rec.key.is_zero() || rec.turn > 1 {
            dropped += 1;
            continue;
        }
        wanted.insert(rec.key_turn());
    }
    if dropped > 0 {
        log::warn!("{}: ignored {dropped} records with zero key or bad turn", db.display());
    }
    Ok(wanted)
}

/// 索引を生成する。`states` は通常 `CanonicalEnumerator`。
pub fn run<I>(config: &IndexConfig, states: I) -> Result<IndexSummary>
where
    I: IntoIterator<Item = GameState>,
{
    config.validate()?;
    let schema = RecordSchema::new(config.key_width);
    let record_size = schema.index_size();

    let mut wanted = load_wanted(&config.db, schema)?;
    let mut summary = IndexSummary {
        wanted_total: wanted.len() as u64,
        ..IndexSummary::default()
    };

    ensure_parent_dir(&config.out)
        .with_context(|| format!("failed to create parent of {}", config.out.display()))?;
    let existing = truncate_to_record_boundary(&config.out, record_size)
        .with_context(|| format!("failed to truncate {}", config.out.display()))?;
    if existing > 0 {
        let reader = IndexReader::open(&config.out, schema)
            .with_context(|| format!("failed to open {}", config.out.display()))?;
        for rec in reader {
            let rec = rec.with_context(|| format!("failed to read {}", config.out.display()))?;
            if wanted.remove(&rec.key_turn()) {
                summary.already_indexed += 1;
            }
        }
    }
    log::info!(
        "index: wanted={} already_indexed={} out={} (existing records={existing})",
        summary.wanted_total,
        summary.already_indexed,
        config.out.display()
    );
    if wanted.is_empty() {
        log::info!("index: nothing to do");
        return Ok(summary);
    }

    let progress = ProgressBar::new(CANONICAL_STATES);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec}) {msg}")
            .context("invalid progress template")?,
    );

    let start = Instant::now();
    let mut pending: Vec<IndexRecord> = Vec::with_capacity(config.batch);
    for state in states {
        summary.scanned += 1;
        if summary.scanned % 65_536 == 0 {
            progress.set_position(summary.scanned);
            progress.set_message(format!("remaining={}", wanted.len()));
        }
        let key = config.key_width.key(&state);
        if key.shard(config.stride) != config.offset {
            continue;
        }
        let kt = KeyTurn {
            key,
            turn: state.turn() as u8,
        };
        if !wanted.remove(&kt) {
            continue;
        }
        pending.push(IndexRecord::from_state(key, &state));
        if pending.len() >= config.batch {
            flush(config, schema, &mut pending, &mut summary)?;
        }
        if wanted.is_empty() {
            break;
        }
    }
    flush(config, schema, &mut pending, &mut summary)?;
    progress.finish_and_clear();

    summary.remaining = wanted.len() as u64;
    log::info!(
        "index DONE written={} scanned={} remaining={} elapsed={:.1}s",
        summary.written,
        summary.scanned,
        summary.remaining,
        start.elapsed().as_secs_f64()
    );
    if summary.remaining > 0 {
        log::warn!(
            "index: {} wanted entries were not found in this shard of the enumeration",
            summary.remaining
        );
    }
    Ok(summary)
}

fn flush(
    config: &IndexConfig,
    schema: RecordSchema,
    pending: &mut Vec<IndexRecord>,
    summary: &mut IndexSummary,
) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    let bytes = encode_index_batch(pending, schema)?;
    append_bytes(&config.out, &bytes)
        .with_context(|| format!("failed to append to {}", config.out.display()))?;
    summary.written += pending.len() as u64;
    log::debug!("index flush: {} records (total {})", pending.len(), summary.written);
    pending.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use collapsi_core::enumerate::CanonicalEnumerator;
    use collapsi_core::record::{SolvedRecord, encode_solved_batch};
    use collapsi_core::types::Side;

    fn write_db(path: &Path, states: &[GameState]) {
        let recs: Vec<SolvedRecord> = states
            .iter()
            .map(|s| SolvedRecord {
                key: KeyWidth::Bits64.key(s),
                turn: s.turn() as u8,
                win: 0,
                best: 0xFF,
                plies: 0,
            })
            .collect();
        std::fs::write(path, encode_solved_batch(&recs, RecordSchema::V1).unwrap()).unwrap();
    }

    #[test]
    fn test_index_resolves_keys_and_resumes() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("solved.db");
        let out = dir.path().join("index.db");
        let states: Vec<GameState> = CanonicalEnumerator::new().take(40).collect();
        write_db(&db, &[states[3], states[10], states[31]]);

        let config = IndexConfig {
            db: db.clone(),
            out: out.clone(),
            key_width: KeyWidth::Bits64,
            stride: 1,
            offset: 0,
            batch: 2,
        };
        let summary = run(&config, CanonicalEnumerator::new()).unwrap();
        assert_eq!(summary.wanted_total, 3);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.remaining, 0);
        // 最後の一致で列挙を打ち切る
        assert_eq!(summary.scanned, 32);

        let back: Vec<IndexRecord> = IndexReader::open(&out, RecordSchema::V1)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(back.len(), 3);
        assert_eq!(back[0].to_state().unwrap(), states[3]);
        assert_eq!(back[2].to_state().unwrap().turn(), Side::Second);

        let again = run(&config, CanonicalEnumerator::new()).unwrap();
        assert_eq!(again.already_indexed, 3);
        assert_eq!(again.written, 0);
        assert_eq!(again.scanned, 0);
    }
}
