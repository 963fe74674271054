//! トーラス上の平行移動
//!
//! 平行移動で移り合う局面は戦略的に同一。正規化は先手の駒を升 0 に移す。

use super::state::GameState;
use crate::bitboard::Bitboard;
use crate::types::{Move, Side, Square};

/// 平行移動（行方向 `dr`, 列方向 `dc`、いずれも 0..4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Translation {
    pub dr: u8,
    pub dc: u8,
}

impl Translation {
    pub const IDENTITY: Translation = Translation { dr: 0, dc: 0 };

    #[inline]
    pub const fn new(dr: u8, dc: u8) -> Translation {
        Translation {
            dr: dr % Square::SIDE,
            dc: dc % Square::SIDE,
        }
    }

    /// `sq` を升 0 に移す平行移動
    #[inline]
    pub const fn to_origin(sq: Square) -> Translation {
        Translation::new(Square::SIDE - sq.row(), Square::SIDE - sq.col())
    }

    /// 逆変換
    #[inline]
    pub const fn inverse(self) -> Translation {
        Translation::new(Square::SIDE - self.dr, Square::SIDE - self.dc)
    }

    #[inline]
    pub const fn apply_square(self, sq: Square) -> Square {
        Square::new(sq.row() + self.dr, sq.col() + self.dc)
    }

    pub fn apply_mask(self, bb: Bitboard) -> Bitboard {
        if self == Self::IDENTITY {
            return bb;
        }
        bb.iter()
            .fold(Bitboard::EMPTY, |acc, sq| acc.with(self.apply_square(sq)))
    }

    /// 指し手の変換（番兵はそのまま）
    #[inline]
    pub fn apply_move(self, mv: Move) -> Move {
        if mv.is_none() {
            return mv;
        }
        Move::new(self.apply_square(mv.from()), self.apply_square(mv.to()))
    }

    pub fn apply_state(self, state: &GameState) -> GameState {
        let cards = state.cards().map(|bb| self.apply_mask(bb));
        let tokens = state.tokens().map(|bb| self.apply_mask(bb));
        GameState::from_parts_unchecked(
            cards,
            tokens,
            self.apply_mask(state.collapsed()),
            state.turn(),
        )
    }
}

impl GameState {
    /// 正規化（先手の駒を升 0 へ）。適用した平行移動も返す。
    ///
    /// 正規化局面での最善手は `translation.inverse().apply_move(..)` で元の盤に戻せる。
    pub fn normalize(&self) -> (GameState, Translation) {
        let t = Translation::to_origin(self.token_square(Side::First));
        (t.apply_state(self), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GameState {
        // 先手 X を升 10、後手 O を升 7 に置き、升 5 を崩落済みにした局面
        "003f,03c0,3c00,c000,0400,0080,0020,1".parse().unwrap()
    }

    #[test]
    fn test_translation_inverse() {
        let t = Translation::new(3, 1);
        for sq in Square::all() {
            assert_eq!(t.inverse().apply_square(t.apply_square(sq)), sq);
        }
        assert_eq!(Translation::new(0, 0).inverse(), Translation::IDENTITY);
    }

    #[test]
    fn test_normalize_moves_first_token_to_origin() {
        let s = sample();
        let (n, t) = s.normalize();
        assert!(n.is_normalized());
        assert_eq!(t, Translation::new(2, 2));
        assert!(n.validate().is_ok());
        assert_eq!(n.turn(), s.turn());
        assert_eq!(n.collapsed().count(), 1);
        // カードは升と一緒に移動する
        for sq in Square::all() {
            assert_eq!(n.card_at(t.apply_square(sq)), s.card_at(sq));
        }
        assert_eq!(t.inverse().apply_state(&n), s);
    }

    #[test]
    fn test_apply_move_keeps_sentinel() {
        let t = Translation::new(1, 2);
        assert_eq!(t.apply_move(Move::NONE), Move::NONE);
        let mv = Move::new(Square::new(0, 0), Square::new(0, 1));
        assert_eq!(t.apply_move(mv), Move::new(Square::new(1, 2), Square::new(1, 3)));
    }
}
