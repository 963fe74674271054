//! ビットボードモジュール
//!
//! 16マスの盤面を16bitで表現する。
//!
//! - `Bitboard`: 16bit盤面表現（bit i = 升目 i）
//! - 周回近傍テーブル（`UP`, `DOWN`, `LEFT`, `RIGHT`）と探索順 `DIRECTIONS`

mod core;
mod tables;

pub use self::core::Bitboard;
pub use self::core::BitboardIter;
pub use tables::*;
