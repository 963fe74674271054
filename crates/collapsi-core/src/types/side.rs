//! 手番（Side）

/// 手番（先手/後手）
///
/// ディスク上・ハッシュ上の turn 値は `First = 0`, `Second = 1`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Side {
    First = 0,
    Second = 1,
}

impl Side {
    /// 手番の数
    pub const NUM: usize = 2;

    pub const ALL: [Side; 2] = [Side::First, Side::Second];

    /// 相手番を返す
    #[inline]
    pub const fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// インデックスとして使用（配列アクセス用）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// turn 値（0/1）から生成
    #[inline]
    pub const fn from_u8(v: u8) -> Option<Side> {
        match v {
            0 => Some(Side::First),
            1 => Some(Side::Second),
            _ => None,
        }
    }

    /// 盤面図での駒記号
    #[inline]
    pub const fn token_char(self) -> char {
        match self {
            Side::First => 'X',
            Side::Second => 'O',
        }
    }
}

impl std::ops::Not for Side {
    type Output = Side;

    #[inline]
    fn not(self) -> Side {
        self.opponent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::First.opponent(), Side::Second);
        assert_eq!(Side::Second.opponent(), Side::First);
        assert_eq!(!Side::First, Side::Second);
    }

    #[test]
    fn test_side_from_u8() {
        assert_eq!(Side::from_u8(0), Some(Side::First));
        assert_eq!(Side::from_u8(1), Some(Side::Second));
        assert_eq!(Side::from_u8(2), None);
        assert_eq!(Side::Second as u8, 1);
    }
}
