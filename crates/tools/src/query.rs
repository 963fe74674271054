//! solved DB の参照
//!
//! 任意の局面を正規化してキーを求め、DB を走査して該当レコードを探す。
//! 保存されている最善手は正規化局面上の手なので、逆平行移動で元の盤に戻す。

use std::path::Path;

use anyhow::{Context, Result};
use collapsi_core::record::{IndexReader, RecordSchema, SolvedReader, SolvedRecord};
use collapsi_core::{GameState, KeyWidth, Move, StateKey, Translation};

use crate::common::io::open_reader;

/// 参照結果
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub normalized: GameState,
    pub translation: Translation,
    pub key: StateKey,
    pub record: SolvedRecord,
    /// 元の盤での最善手
    pub best: Move,
    /// 索引と照合した結果（索引なし・未収録なら None）
    pub index_verified: Option<bool>,
}

/// `state` を solved DB から引く。見つからなければ None。
pub fn lookup(
    db: &Path,
    index: Option<&Path>,
    state: &GameState,
    key_width: KeyWidth,
) -> Result<Option<LookupResult>> {
    let schema = RecordSchema::new(key_width);
    let (normalized, translation) = state.normalize();
    let key = key_width.key(&normalized);
    let turn = normalized.turn() as u8;

    let reader = open_reader(db).with_context(|| format!("failed to open {}", db.display()))?;
    let mut found = None;
    for rec in SolvedReader::new(reader, schema) {
        let rec = rec.with_context(|| format!("failed to read {}", db.display()))?;
        if rec.key == key && rec.turn == turn {
            found = Some(rec);
            break;
        }
    }
    let Some(record) = found else {
        log::debug!("lookup: key {key} turn {turn} not in {}", db.display());
        return Ok(None);
    };

    let index_verified = match index {
        Some(path) => verify_with_index(path, schema, &record, &normalized)?,
        None => None,
    };
    if index_verified == Some(false) {
        log::warn!("lookup: index entry for key {key} describes a different board (hash collision)");
    }

    Ok(Some(LookupResult {
        normalized,
        translation,
        key,
        record,
        best: translation.inverse().apply_move(record.best_move()),
        index_verified,
    }))
}

fn verify_with_index(
    path: &Path,
    schema: RecordSchema,
    record: &SolvedRecord,
    normalized: &GameState,
) -> Result<Option<bool>> {
    let reader = IndexReader::open(path, schema)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for rec in reader {
        let rec = rec.with_context(|| format!("failed to read {}", path.display()))?;
        if rec.key_turn() == record.key_turn() {
            return Ok(Some(rec.masks == normalized.raw_masks()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use collapsi_core::record::{IndexRecord, encode_index_batch, encode_solved_batch};
    use collapsi_core::{Side, Solver, Square};

    /// 先手 X を升 10 に置いた非正規化局面
    fn concrete() -> GameState {
        "003f,03c0,3c00,c000,0400,0080,0020,0".parse().unwrap()
    }

    #[test]
    fn test_lookup_maps_move_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("solved.db");
        let idx = dir.path().join("index.db");
        let state = concrete();
        let (normalized, t) = state.normalize();
        assert_eq!(normalized.token_square(Side::First), Square::ORIGIN);

        let key = KeyWidth::Bits64.key(&normalized);
        let answer = Solver::default().answer(&normalized);
        let rec = SolvedRecord::from_answer(key, Side::First, &answer);
        std::fs::write(&db, encode_solved_batch(&[rec], RecordSchema::V1).unwrap()).unwrap();
        let irec = IndexRecord::from_state(key, &normalized);
        std::fs::write(&idx, encode_index_batch(&[irec], RecordSchema::V1).unwrap()).unwrap();

        let hit = lookup(&db, Some(&idx), &state, KeyWidth::Bits64).unwrap().unwrap();
        assert_eq!(hit.translation, t);
        assert_eq!(hit.record, rec);
        assert_eq!(hit.index_verified, Some(true));
        if !answer.best.is_none() {
            assert_eq!(hit.best.from(), state.token_square(Side::First));
            assert_eq!(t.apply_move(hit.best), answer.best);
        }

        let other = state.with_turn(Side::Second);
        assert!(lookup(&db, None, &other, KeyWidth::Bits64).unwrap().is_none());
    }
}
