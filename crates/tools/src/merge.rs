//! シャードファイルの結合
//!
//! 入力を辞書順に並べ、各ファイルのレコード境界までをそのまま連結する。
//! 重複は後段の dedup で除くので順序に意味はない。

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};

use crate::common::io::{ensure_parent_dir, write_atomic};

/// 結合の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inputs: usize,
    pub records: u64,
    /// 入力末尾の不完全なレコードとして捨てたバイト数
    pub dropped_bytes: u64,
}

/// 明示パスと glob パターンから入力一覧を作る（辞書順、重複なし）
pub fn collect_inputs(paths: &[PathBuf], pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut inputs: Vec<PathBuf> = paths.to_vec();
    if let Some(pat) = pattern {
        let entries = glob::glob(pat).with_context(|| format!("invalid glob pattern {pat}"))?;
        for entry in entries {
            let path = entry.with_context(|| format!("failed to read glob match for {pat}"))?;
            if path.is_file() {
                inputs.push(path);
            }
        }
    }
    inputs.sort();
    inputs.dedup();
    Ok(inputs)
}

/// `inputs` を `out` に結合する（`<out>.tmp` に書いてから rename）
pub fn merge_files(inputs: &[PathBuf], out: &Path, record_size: usize) -> Result<MergeReport> {
    if inputs.is_empty() {
        bail!("no input files to merge");
    }
    let inputs: Vec<&PathBuf> = inputs
        .iter()
        .filter(|p| {
            let same = p.as_path() == out;
            if same {
                log::warn!("skipping output file listed as input: {}", out.display());
            }
            !same
        })
        .collect();

    let mut sizes = Vec::with_capacity(inputs.len());
    for path in &inputs {
        let len = std::fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        sizes.push(len);
    }
    let total: u64 = sizes.iter().map(|len| len - len % record_size as u64).sum();

    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .context("invalid progress template")?,
    );

    ensure_parent_dir(out).with_context(|| format!("failed to create parent of {}", out.display()))?;
    let mut report = MergeReport {
        inputs: inputs.len(),
        ..MergeReport::default()
    };
    write_atomic(out, |w| {
        for (path, &len) in inputs.iter().zip(&sizes) {
            let aligned = len - len % record_size as u64;
            if aligned != len {
                log::warn!(
                    "{}: dropping {} trailing bytes (partial record)",
                    path.display(),
                    len - aligned
                );
                report.dropped_bytes += len - aligned;
            }
            progress.set_message(path.display().to_string());
            let f = File::open(path)?;
            let mut src = progress.wrap_read(BufReader::with_capacity(1 << 20, f).take(aligned));
            let copied = io::copy(&mut src, w)?;
            if copied != aligned {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("{} shrank while merging", path.display()),
                ));
            }
            report.records += aligned / record_size as u64;
            log::debug!("merged {} ({} records)", path.display(), aligned / record_size as u64);
        }
        Ok(())
    })
    .with_context(|| format!("failed to write merged output {}", out.display()))?;
    progress.finish_and_clear();

    log::info!(
        "merged {} files into {}: records={} dropped_bytes={}",
        report.inputs,
        out.display(),
        report.records,
        report.dropped_bytes
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_orders_inputs_and_drops_partial_tail() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("shard_1.bin");
        let b = dir.path().join("shard_0.bin");
        std::fs::write(&a, [1u8; 20]).unwrap(); // 16 + 4 バイトの端数
        std::fs::write(&b, [0u8; 16]).unwrap();

        let pattern = format!("{}/shard_*.bin", dir.path().display());
        let inputs = collect_inputs(&[a.clone()], Some(&pattern)).unwrap();
        assert_eq!(inputs, vec![b.clone(), a.clone()]);

        let out = dir.path().join("merged.db");
        let report = merge_files(&inputs, &out, 16).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.dropped_bytes, 4);
        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(bytes.len(), 32);
        assert!(bytes[..16].iter().all(|&x| x == 0));
        assert!(bytes[16..].iter().all(|&x| x == 1));
    }

    #[test]
    fn test_merge_requires_inputs() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(merge_files(&[], &dir.path().join("out.db"), 16).is_err());
    }
}
