//! レコードファイルの読み書き
//!
//! 追記専用ファイル。再開時は末尾の不完全なレコードを切り詰めてから読む。

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use super::schema::{IndexRecord, KeyTurn, RecordResult, RecordSchema, SolvedRecord};

/// ファイルをレコード長の倍数に切り詰め、残ったレコード数を返す
///
/// ファイルがなければ何もせず 0。
pub fn truncate_to_record_boundary(path: &Path, record_size: usize) -> io::Result<u64> {
    let len = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let aligned = len - len % record_size as u64;
    if aligned != len {
        log::warn!(
            "truncating {} from {} to {} bytes (partial trailing record)",
            path.display(),
            len,
            aligned
        );
        let f = OpenOptions::new().write(true).open(path)?;
        f.set_len(aligned)?;
        f.sync_all()?;
    }
    Ok(aligned / record_size as u64)
}

/// バイト列をファイル末尾に追記して同期する
///
/// 呼び出し側はレコード境界で揃ったバイト列だけを渡す。
pub fn append_bytes(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(bytes)?;
    f.flush()?;
    f.sync_data()
}

/// solved レコード列をまとめてエンコード
pub fn encode_solved_batch(records: &[SolvedRecord], schema: RecordSchema) -> RecordResult<Vec<u8>> {
    let size = schema.solved_size();
    let mut out = vec![0u8; records.len() * size];
    for (rec, chunk) in records.iter().zip(out.chunks_exact_mut(size)) {
        rec.encode(schema, chunk)?;
    }
    Ok(out)
}

/// index レコード列をまとめてエンコード
pub fn encode_index_batch(records: &[IndexRecord], schema: RecordSchema) -> RecordResult<Vec<u8>> {
    let size = schema.index_size();
    let mut out = vec![0u8; records.len() * size];
    for (rec, chunk) in records.iter().zip(out.chunks_exact_mut(size)) {
        rec.encode(schema, chunk)?;
    }
    Ok(out)
}

/// 固定長レコードの逐次リーダー
///
/// 末尾の不完全なレコードは読み飛ばし、そのバイト数を `trailing_bytes` に残す。
pub struct RecordReader<R> {
    inner: R,
    buf: Vec<u8>,
    records: u64,
    trailing: usize,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, record_size: usize) -> RecordReader<R> {
        RecordReader {
            inner,
            buf: vec![0u8; record_size],
            records: 0,
            trailing: 0,
        }
    }

    /// 次のレコードのバイト列。終端なら None。
    pub fn next_record(&mut self) -> io::Result<Option<&[u8]>> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.inner.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if filled < self.buf.len() {
            self.trailing = filled;
            return Ok(None);
        }
        self.records += 1;
        Ok(Some(&self.buf))
    }

    /// これまでに読んだ完全なレコード数
    #[inline]
    pub fn records_read(&self) -> u64 {
        self.records
    }

    /// 終端で見つかった不完全なレコードのバイト数
    #[inline]
    pub fn trailing_bytes(&self) -> usize {
        self.trailing
    }
}

/// solved レコードのイテレータ
pub struct SolvedReader<R> {
    raw: RecordReader<R>,
    schema: RecordSchema,
}

impl<R: Read> SolvedReader<R> {
    pub fn new(inner: R, schema: RecordSchema) -> SolvedReader<R> {
        SolvedReader {
            raw: RecordReader::new(inner, schema.solved_size()),
            schema,
        }
    }

    #[inline]
    pub fn trailing_bytes(&self) -> usize {
        self.raw.trailing_bytes()
    }
}

impl SolvedReader<io::BufReader<File>> {
    pub fn open(path: &Path, schema: RecordSchema) -> io::Result<Self> {
        let f = File::open(path)?;
        Ok(SolvedReader::new(io::BufReader::with_capacity(1 << 20, f), schema))
    }
}

impl<R: Read> Iterator for SolvedReader<R> {
    type Item = RecordResult<SolvedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.raw.next_record() {
            Ok(Some(buf)) => Some(SolvedRecord::decode(self.schema, buf)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// index レコードのイテレータ
pub struct IndexReader<R> {
    raw: RecordReader<R>,
    schema: RecordSchema,
}

impl<R: Read> IndexReader<R> {
    pub fn new(inner: R, schema: RecordSchema) -> IndexReader<R> {
        IndexReader {
            raw: RecordReader::new(inner, schema.index_size()),
            schema,
        }
    }

    #[inline]
    pub fn trailing_bytes(&self) -> usize {
        self.raw.trailing_bytes()
    }
}

impl IndexReader<io::BufReader<File>> {
    pub fn open(path: &Path, schema: RecordSchema) -> io::Result<Self> {
        let f = File::open(path)?;
        Ok(IndexReader::new(io::BufReader::with_capacity(1 << 20, f), schema))
    }
}

impl<R: Read> Iterator for IndexReader<R> {
    type Item = RecordResult<IndexRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.raw.next_record() {
            Ok(Some(buf)) => Some(IndexRecord::decode(self.schema, buf)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// solved レコードの (キー, 手番) を `seen` に読み込み、読んだレコード数を返す
pub fn load_seen<R: Read>(
    inner: R,
    schema: RecordSchema,
    seen: &mut HashSet<KeyTurn>,
) -> RecordResult<u64> {
    let mut loaded = 0u64;
    for rec in SolvedReader::new(inner, schema) {
        seen.insert(rec?.key_turn());
        loaded += 1;
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::StateKey;

    fn rec(key: u64, turn: u8) -> SolvedRecord {
        SolvedRecord {
            key: StateKey::K64(key),
            turn,
            win: 0,
            best: 0xFF,
            plies: 0,
        }
    }

    #[test]
    fn test_reader_skips_partial_tail() {
        let schema = RecordSchema::V1;
        let mut bytes = encode_solved_batch(&[rec(1, 0), rec(2, 1)], schema).unwrap();
        bytes.extend_from_slice(&[9, 9, 9]);
        let mut reader = SolvedReader::new(bytes.as_slice(), schema);
        let got: Vec<SolvedRecord> = reader.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(got, vec![rec(1, 0), rec(2, 1)]);
        assert_eq!(reader.trailing_bytes(), 3);
    }

    #[test]
    fn test_truncate_and_append() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("solved.db");
        assert_eq!(truncate_to_record_boundary(&path, 16).unwrap(), 0);

        let schema = RecordSchema::V1;
        let bytes = encode_solved_batch(&[rec(5, 0), rec(6, 0)], schema).unwrap();
        append_bytes(&path, &bytes).unwrap();
        append_bytes(&path, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 37);

        assert_eq!(truncate_to_record_boundary(&path, 16).unwrap(), 2);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 32);

        let mut seen = HashSet::new();
        let f = File::open(&path).unwrap();
        assert_eq!(load_seen(f, schema, &mut seen).unwrap(), 2);
        assert!(seen.contains(&rec(6, 0).key_turn()));
        assert!(!seen.contains(&rec(6, 1).key_turn()));
    }
}
