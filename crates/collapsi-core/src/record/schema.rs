//! レコードの定義とエンコード

use byteorder::{ByteOrder, LittleEndian};

use crate::hash::{KeyWidth, StateKey};
use crate::position::{GameState, StateError};
use crate::search::{Answer, MAX_PLIES};
use crate::types::{Move, Side};

/// レコード関連のエラー
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("record buffer too short: expected {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },

    /// レコードとスキーマのキー幅が一致しない
    #[error("key width mismatch: schema uses {expected}-bit keys, record has {actual}-bit key")]
    WidthMismatch { expected: KeyWidth, actual: KeyWidth },

    #[error("unsupported schema version {0}")]
    UnsupportedVersion(u16),

    /// 索引レコードのマスクが局面として不正
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// スキーマ（キー幅で決まる）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecordSchema {
    pub key_width: KeyWidth,
}

impl RecordSchema {
    pub const V1: RecordSchema = RecordSchema {
        key_width: KeyWidth::Bits64,
    };
    pub const V2: RecordSchema = RecordSchema {
        key_width: KeyWidth::Bits128,
    };

    #[inline]
    pub const fn new(key_width: KeyWidth) -> RecordSchema {
        RecordSchema { key_width }
    }

    pub fn from_version(version: u16) -> RecordResult<RecordSchema> {
        match version {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            v => Err(RecordError::UnsupportedVersion(v)),
        }
    }

    #[inline]
    pub const fn version(self) -> u16 {
        match self.key_width {
            KeyWidth::Bits64 => 1,
            KeyWidth::Bits128 => 2,
        }
    }

    #[inline]
    pub const fn key_bytes(self) -> usize {
        self.key_width.bytes()
    }

    /// solved レコードのバイト数
    #[inline]
    pub const fn solved_size(self) -> usize {
        self.key_bytes() + 8
    }

    /// index レコードのバイト数
    #[inline]
    pub const fn index_size(self) -> usize {
        self.key_bytes() + 16
    }

    fn read_key(self, buf: &[u8]) -> StateKey {
        match self.key_width {
            KeyWidth::Bits64 => StateKey::K64(LittleEndian::read_u64(buf)),
            KeyWidth::Bits128 => StateKey::K128(LittleEndian::read_u128(buf)),
        }
    }

    fn write_key(self, key: StateKey, buf: &mut [u8]) -> RecordResult<()> {
        match (self.key_width, key) {
            (KeyWidth::Bits64, StateKey::K64(k)) => LittleEndian::write_u64(buf, k),
            (KeyWidth::Bits128, StateKey::K128(k)) => LittleEndian::write_u128(buf, k),
            _ => {
                return Err(RecordError::WidthMismatch {
                    expected: self.key_width,
                    actual: key.width(),
                });
            }
        }
        Ok(())
    }

    fn check_len(expected: usize, buf: &[u8]) -> RecordResult<()> {
        if buf.len() < expected {
            return Err(RecordError::ShortBuffer {
                expected,
                actual: buf.len(),
            });
        }
        Ok(())
    }
}

/// (キー, 手番) の組。seen 集合・dedup・index の照合に使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyTurn {
    pub key: StateKey,
    pub turn: u8,
}

/// 構造上の異常
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anomalies {
    pub zero_key: bool,
    /// turn が 0/1 以外
    pub bad_turn: bool,
    /// win が 0/1 以外
    pub bad_win: bool,
    /// 指し手の形式が不正（from == to、勝ちなのに番兵）
    pub bad_move: bool,
    /// plies が範囲外（上限超過、勝ちなのに 0）
    pub plies_out_of_range: bool,
    /// 勝ち ⇔ plies 奇数 が成り立たない
    pub parity: bool,
}

impl Anomalies {
    #[inline]
    pub fn any(&self) -> bool {
        self.zero_key
            || self.bad_turn
            || self.bad_win
            || self.bad_move
            || self.plies_out_of_range
            || self.parity
    }
}

/// solved レコード
///
/// 異常検出のため turn / win / best は生の値で保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolvedRecord {
    pub key: StateKey,
    pub turn: u8,
    pub win: u8,
    pub best: u8,
    pub plies: u16,
}

impl SolvedRecord {
    pub fn from_answer(key: StateKey, turn: Side, answer: &Answer) -> SolvedRecord {
        SolvedRecord {
            key,
            turn: turn as u8,
            win: answer.win as u8,
            best: answer.best.raw(),
            plies: answer.plies,
        }
    }

    #[inline]
    pub fn key_turn(&self) -> KeyTurn {
        KeyTurn {
            key: self.key,
            turn: self.turn,
        }
    }

    #[inline]
    pub fn best_move(&self) -> Move {
        Move::from_raw(self.best)
    }

    #[inline]
    pub fn is_win(&self) -> bool {
        self.win == 1
    }

    pub fn encode(&self, schema: RecordSchema, out: &mut [u8]) -> RecordResult<()> {
        let size = schema.solved_size();
        RecordSchema::check_len(size, out)?;
        let kb = schema.key_bytes();
        out[..size].fill(0);
        schema.write_key(self.key, &mut out[..kb])?;
        out[kb] = self.turn;
        out[kb + 1] = self.win;
        out[kb + 2] = self.best;
        LittleEndian::write_u16(&mut out[kb + 4..kb + 6], self.plies);
        Ok(())
    }

    pub fn decode(schema: RecordSchema, buf: &[u8]) -> RecordResult<SolvedRecord> {
        RecordSchema::check_len(schema.solved_size(), buf)?;
        let kb = schema.key_bytes();
        Ok(SolvedRecord {
            key: schema.read_key(&buf[..kb]),
            turn: buf[kb],
            win: buf[kb + 1],
            best: buf[kb + 2],
            plies: LittleEndian::read_u16(&buf[kb + 4..kb + 6]),
        })
    }

    /// 構造上の異常を分類する
    pub fn anomalies(&self) -> Anomalies {
        let mv = self.best_move();
        let win = self.win == 1;
        Anomalies {
            zero_key: self.key.is_zero(),
            bad_turn: self.turn > 1,
            bad_win: self.win > 1,
            bad_move: (!mv.is_none() && !mv.is_well_formed()) || (win && mv.is_none()),
            plies_out_of_range: self.plies > MAX_PLIES || (win && self.plies == 0),
            parity: self.win <= 1 && win != (self.plies % 2 == 1),
        }
    }
}

/// index レコード（キー → 正規化局面）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRecord {
    pub key: StateKey,
    pub turn: u8,
    /// `[a, 2, 3, 4, x, o, c]`
    pub masks: [u16; 7],
}

impl IndexRecord {
    pub fn from_state(key: StateKey, state: &GameState) -> IndexRecord {
        IndexRecord {
            key,
            turn: state.turn() as u8,
            masks: state.raw_masks(),
        }
    }

    #[inline]
    pub fn key_turn(&self) -> KeyTurn {
        KeyTurn {
            key: self.key,
            turn: self.turn,
        }
    }

    /// 局面を復元する（検証付き）
    pub fn to_state(&self) -> RecordResult<GameState> {
        Ok(GameState::from_raw(self.masks, self.turn)?)
    }

    pub fn encode(&self, schema: RecordSchema, out: &mut [u8]) -> RecordResult<()> {
        let size = schema.index_size();
        RecordSchema::check_len(size, out)?;
        let kb = schema.key_bytes();
        out[..size].fill(0);
        schema.write_key(self.key, &mut out[..kb])?;
        out[kb] = self.turn;
        LittleEndian::write_u16_into(&self.masks, &mut out[kb + 2..kb + 16]);
        Ok(())
    }

    pub fn decode(schema: RecordSchema, buf: &[u8]) -> RecordResult<IndexRecord> {
        RecordSchema::check_len(schema.index_size(), buf)?;
        let kb = schema.key_bytes();
        let mut masks = [0u16; 7];
        LittleEndian::read_u16_into(&buf[kb + 2..kb + 16], &mut masks);
        Ok(IndexRecord {
            key: schema.read_key(&buf[..kb]),
            turn: buf[kb],
            masks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    fn sample(win: bool, plies: u16) -> SolvedRecord {
        SolvedRecord {
            key: StateKey::K64(0x1122_3344_5566_7788),
            turn: 1,
            win: win as u8,
            best: if win { 0x03 } else { 0xFF },
            plies,
        }
    }

    #[test]
    fn test_sizes() {
        assert_eq!(RecordSchema::V1.solved_size(), 16);
        assert_eq!(RecordSchema::V2.solved_size(), 24);
        assert_eq!(RecordSchema::V1.index_size(), 24);
        assert_eq!(RecordSchema::V2.index_size(), 32);
        assert_eq!(RecordSchema::from_version(2).unwrap(), RecordSchema::V2);
        assert!(RecordSchema::from_version(3).is_err());
    }

    #[test]
    fn test_solved_layout() {
        let rec = sample(true, 7);
        let mut buf = [0xAAu8; 16];
        rec.encode(RecordSchema::V1, &mut buf).unwrap();
        assert_eq!(&buf[..8], &0x1122_3344_5566_7788u64.to_le_bytes());
        assert_eq!(&buf[8..16], &[1, 1, 0x03, 0, 7, 0, 0, 0]);
        assert_eq!(SolvedRecord::decode(RecordSchema::V1, &buf).unwrap(), rec);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let rec = sample(false, 2);
        let mut buf = [0u8; 24];
        assert!(matches!(
            rec.encode(RecordSchema::V2, &mut buf),
            Err(RecordError::WidthMismatch { .. })
        ));
        assert!(matches!(
            SolvedRecord::decode(RecordSchema::V2, &buf[..20]),
            Err(RecordError::ShortBuffer { expected: 24, actual: 20 })
        ));
    }

    #[test]
    fn test_anomalies() {
        assert!(!sample(true, 7).anomalies().any());
        assert!(!sample(false, 0).anomalies().any());
        assert!(sample(true, 4).anomalies().parity);
        assert!(sample(true, 17).anomalies().plies_out_of_range);

        let mut bad = sample(true, 3);
        bad.best = 0x55;
        assert!(bad.anomalies().bad_move);
        bad.best = 0xFF;
        assert!(bad.anomalies().bad_move);

        let mut zero = sample(false, 2);
        zero.key = StateKey::K64(0);
        zero.turn = 2;
        let a = zero.anomalies();
        assert!(a.zero_key && a.bad_turn && !a.parity);
    }

    #[test]
    fn test_index_record_restores_state() {
        let state: GameState = "003f,03c0,3c00,c000,0001,0002,0000,1".parse().unwrap();
        let key = KeyWidth::Bits128.key(&state);
        let rec = IndexRecord::from_state(key, &state);
        let mut buf = [0u8; 32];
        rec.encode(RecordSchema::V2, &mut buf).unwrap();
        assert_eq!(buf[16], 1);
        assert_eq!(&buf[18..20], &0x003Fu16.to_le_bytes());
        let back = IndexRecord::decode(RecordSchema::V2, &buf).unwrap();
        assert_eq!(back, rec);
        let restored = back.to_state().unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.mover_square(), Square::from_nibble(1));
    }
}
