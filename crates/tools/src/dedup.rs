//! solved DB の重複除去
//!
//! (key, turn) ごとに最初のレコードを残す。`<file>.dedup` に書き出した後、
//! 元ファイルを `<file>.bak` に退避し、`.dedup` を元の名前に rename する。
//! 置き換えが完了するまで元ファイルは消さない。

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use collapsi_core::record::{KeyTurn, RecordReader, RecordSchema, SolvedRecord};

use crate::common::io::with_suffix;

/// 重複除去の失敗。種類ごとに終了コードが異なる。
#[derive(thiserror::Error, Debug)]
pub enum DedupError {
    #[error("input not found: {0}")]
    Missing(PathBuf),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot rename {from} to backup {to}: {source}")]
    Backup {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot move {from} into place at {to}: {source}")]
    Replace {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while deduplicating {path}: {source}")]
    Stream {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DedupError {
    /// プロセス終了コード
    pub fn exit_code(&self) -> u8 {
        match self {
            DedupError::Missing(_) => 1,
            DedupError::Open { .. } => 2,
            DedupError::Backup { .. } => 3,
            DedupError::Replace { .. } => 4,
            DedupError::Stream { .. } => 5,
        }
    }
}

/// 重複除去の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub read: u64,
    pub written: u64,
    pub duplicates: u64,
    /// 末尾の不完全なレコード（書き出さない）
    pub trailing_bytes: usize,
}

/// ストリーム間の重複除去（レコードはバイト列のまま複写する）
pub fn dedup_stream<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    schema: RecordSchema,
) -> io::Result<DedupReport> {
    let mut raw = RecordReader::new(reader, schema.solved_size());
    let mut seen: HashSet<KeyTurn> = HashSet::new();
    let mut report = DedupReport::default();

    while let Some(buf) = raw.next_record()? {
        report.read += 1;
        let rec = SolvedRecord::decode(schema, buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if seen.insert(rec.key_turn()) {
            writer.write_all(buf)?;
            report.written += 1;
        } else {
            report.duplicates += 1;
        }
    }
    writer.flush()?;
    report.trailing_bytes = raw.trailing_bytes();
    Ok(report)
}

/// ファイルをその場で重複除去する
pub fn dedup_in_place(path: &Path, schema: RecordSchema) -> Result<DedupReport, DedupError> {
    if !path.exists() {
        return Err(DedupError::Missing(path.to_path_buf()));
    }
    let tmp = with_suffix(path, ".dedup");
    let bak = with_suffix(path, ".bak");

    let input = File::open(path).map_err(|source| DedupError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let output = File::create(&tmp).map_err(|source| DedupError::Open {
        path: tmp.clone(),
        source,
    })?;

    let streamed = (|| -> io::Result<DedupReport> {
        let mut w = BufWriter::with_capacity(1 << 20, output);
        let report = dedup_stream(BufReader::with_capacity(1 << 20, input), &mut w, schema)?;
        let f = w.into_inner().map_err(|e| e.into_error())?;
        f.sync_all()?;
        Ok(report)
    })();
    let report = match streamed {
        Ok(r) => r,
        Err(source) => {
            let _ = std::fs::remove_file(&tmp);
            return Err(DedupError::Stream {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if report.trailing_bytes > 0 {
        log::warn!(
            "{}: dropped {} trailing bytes (partial record)",
            path.display(),
            report.trailing_bytes
        );
    }

    std::fs::rename(path, &bak).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        DedupError::Backup {
            from: path.to_path_buf(),
            to: bak.clone(),
            source,
        }
    })?;
    if let Err(source) = std::fs::rename(&tmp, path) {
        // 元の名前に戻しておく
        if let Err(e) = std::fs::rename(&bak, path) {
            log::error!("failed to restore {} from {}: {e}", path.display(), bak.display());
        }
        return Err(DedupError::Replace {
            from: tmp,
            to: path.to_path_buf(),
            source,
        });
    }

    log::info!(
        "dedup {}: read={} written={} duplicates={} backup={}",
        path.display(),
        report.read,
        report.written,
        report.duplicates,
        bak.display()
    );
    Ok(report)
}
