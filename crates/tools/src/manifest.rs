//! 実行マニフェスト（`<out>.manifest.json`）

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use collapsi_core::record::{RecordResult, RecordSchema};
use serde::{Deserialize, Serialize};

use crate::common::io::{with_suffix, write_atomic};

/// マニフェストのパス
pub fn manifest_path(out: &Path) -> PathBuf {
    with_suffix(out, ".manifest.json")
}

/// ビルダー1回分の実行記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub tool: String,
    pub schema_version: u16,
    pub key_bits: u32,
    pub record_bytes: usize,
    pub stride: u64,
    pub offset: u64,
    pub limit: u64,
    pub batch: usize,
    pub turn: Option<u8>,
    pub seen_sources: Vec<PathBuf>,
    pub dump_dir: Option<PathBuf>,
    /// 開始時にファイルにあったレコード数
    pub records_at_start: u64,
    /// 今回追記したレコード数
    pub produced: u64,
    pub records_total: u64,
    pub skipped_seen: u64,
    pub scanned: u64,
    pub flushes: u64,
    pub flagged_batches: u64,
    pub interrupted: bool,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_sec: f64,
}

impl BuildManifest {
    pub fn save(&self, out: &Path) -> Result<PathBuf> {
        let path = manifest_path(out);
        write_atomic(&path, |w| {
            serde_json::to_writer_pretty(&mut *w, self)?;
            std::io::Write::write_all(w, b"\n")
        })
        .with_context(|| format!("failed to write manifest {}", path.display()))?;
        Ok(path)
    }

    /// 記録されたスキーマ
    pub fn schema(&self) -> RecordResult<RecordSchema> {
        RecordSchema::from_version(self.schema_version)
    }

    pub fn load(path: &Path) -> Result<BuildManifest> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }
}

/// 現在時刻（RFC 3339, UTC）
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("solved.db");
        let m = BuildManifest {
            tool: "solve_norm_db".to_string(),
            schema_version: 1,
            key_bits: 64,
            record_bytes: 16,
            stride: 4,
            offset: 1,
            limit: 100,
            batch: 10,
            turn: None,
            seen_sources: vec![],
            dump_dir: None,
            records_at_start: 0,
            produced: 7,
            records_total: 7,
            skipped_seen: 0,
            scanned: 30,
            flushes: 1,
            flagged_batches: 0,
            interrupted: false,
            started_at: now_rfc3339(),
            finished_at: now_rfc3339(),
            elapsed_sec: 0.5,
        };
        let path = m.save(&out).unwrap();
        assert!(path.ends_with("solved.db.manifest.json"));
        let loaded = BuildManifest::load(&path).unwrap();
        assert_eq!(loaded, m);
        assert_eq!(loaded.schema().unwrap(), RecordSchema::V1);

        let unknown = BuildManifest {
            schema_version: 9,
            ..m
        };
        assert!(unknown.schema().is_err());
    }
}
