//! 升目（Square）

use std::fmt;

/// 升目（0-15）
///
/// 配置: 行優先。`index = row * 4 + col`。
/// 盤は上下左右とも周回する（トーラス）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 升目の数
    pub const NUM: usize = 16;

    /// 一辺の長さ
    pub const SIDE: u8 = 4;

    /// 左上隅（正規化局面で先手の駒が置かれる升）
    pub const ORIGIN: Square = Square(0);

    /// 行・列から生成（4 を法として折り返す）
    #[inline]
    pub const fn new(row: u8, col: u8) -> Square {
        Square((row % Self::SIDE) * Self::SIDE + col % Self::SIDE)
    }

    /// u8から生成（範囲チェックあり）
    #[inline]
    pub const fn from_u8(n: u8) -> Option<Square> {
        if (n as usize) < Self::NUM {
            Some(Square(n))
        } else {
            None
        }
    }

    /// u8から生成（下位4bitのみ使用）
    #[inline]
    pub const fn from_nibble(n: u8) -> Square {
        Square(n & 0x0F)
    }

    #[inline]
    pub const fn row(self) -> u8 {
        self.0 / Self::SIDE
    }

    #[inline]
    pub const fn col(self) -> u8 {
        self.0 % Self::SIDE
    }

    /// インデックスとして使用
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 内部値を取得
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 単一ビットのマスク
    #[inline]
    pub const fn bit(self) -> u16 {
        1u16 << self.0
    }

    /// 全升目を昇順に列挙
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::NUM as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row(), self.col())
    }
}
