//! 指し手（Move）

use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use super::Square;

/// 指し手（1バイト）
///
/// レイアウト: `(from << 4) | to`。
/// `0xFF` は「合法手なし」を表す番兵。JSON ではパック済みバイトの数値になる。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Move(u8);

/// 1局面の指し手リスト（移動先は最大でも16升）
pub type MoveList = SmallVec<[Move; 16]>;

impl Move {
    /// 合法手なし
    pub const NONE: Move = Move(0xFF);

    #[inline]
    pub const fn new(from: Square, to: Square) -> Move {
        Move((from.raw() << 4) | to.raw())
    }

    /// パック済みバイトから生成（検証なし）
    #[inline]
    pub const fn from_raw(raw: u8) -> Move {
        Move(raw)
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_nibble(self.0 >> 4)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_nibble(self.0)
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// 番兵でなく、移動元と移動先が異なる
    #[inline]
    pub const fn is_well_formed(self) -> bool {
        !self.is_none() && (self.0 >> 4) != (self.0 & 0x0F)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "Move::NONE")
        } else {
            write!(f, "Move({}->{})", self.from().index(), self.to().index())
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "{}{}", self.from(), self.to())
        }
    }
}
