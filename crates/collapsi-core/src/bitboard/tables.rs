//! 周回近傍テーブル
//!
//! 盤の端は反対側に折り返す。近傍は compile time に生成する。

use crate::types::Square;

const fn build_shift(dr: usize, dc: usize) -> [u8; Square::NUM] {
    let mut table = [0u8; Square::NUM];
    let mut i = 0;
    while i < Square::NUM {
        let row = i / 4;
        let col = i % 4;
        table[i] = (((row + dr) % 4) * 4 + (col + dc) % 4) as u8;
        i += 1;
    }
    table
}

/// 上の升（行 -1）
pub const UP: [u8; Square::NUM] = build_shift(3, 0);
/// 下の升（行 +1）
pub const DOWN: [u8; Square::NUM] = build_shift(1, 0);
/// 左の升（列 -1）
pub const LEFT: [u8; Square::NUM] = build_shift(0, 3);
/// 右の升（列 +1）
pub const RIGHT: [u8; Square::NUM] = build_shift(0, 1);

/// 経路探索で試す方向の順序（上, 下, 左, 右）
pub const DIRECTIONS: [&[u8; Square::NUM]; 4] = [&UP, &DOWN, &LEFT, &RIGHT];

/// 4近傍を探索順で返す
#[inline]
pub fn neighbors(sq: Square) -> [Square; 4] {
    let i = sq.index();
    DIRECTIONS.map(|table| Square::from_nibble(table[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_match_torus_layout() {
        assert_eq!(UP, [12, 13, 14, 15, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(DOWN, [4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0, 1, 2, 3]);
        assert_eq!(LEFT, [3, 0, 1, 2, 7, 4, 5, 6, 11, 8, 9, 10, 15, 12, 13, 14]);
        assert_eq!(RIGHT, [1, 2, 3, 0, 5, 6, 7, 4, 9, 10, 11, 8, 13, 14, 15, 12]);
    }

    #[test]
    fn test_neighbors_are_inverse_pairs() {
        for sq in Square::all() {
            let i = sq.index();
            assert_eq!(DOWN[UP[i] as usize] as usize, i);
            assert_eq!(LEFT[RIGHT[i] as usize] as usize, i);
        }
        let n: Vec<usize> = neighbors(Square::ORIGIN).iter().map(|s| s.index()).collect();
        assert_eq!(n, vec![12, 4, 3, 1]);
    }
}
