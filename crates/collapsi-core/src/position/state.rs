//! 局面（GameState）

use super::error::{StateError, StateResult};
use crate::bitboard::Bitboard;
use crate::types::{Card, Side, Square};

/// 局面
///
/// - カードマスク4枚（A/2/3/4）: 16升を分割する。駒の下や崩落升のカードも保持する
/// - 駒マスク2枚（先手 X / 後手 O）: 各1ビット、互いに重ならない
/// - 崩落マスク: 通過・停止できない升。駒の現在地とは重ならない
/// - 手番
///
/// 値型であり、着手は新しい局面を返す（`movegen::apply_move`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameState {
    cards: [Bitboard; Card::NUM],
    tokens: [Bitboard; Side::NUM],
    collapsed: Bitboard,
    turn: Side,
}

impl GameState {
    /// 検証付きで生成
    pub fn new(
        cards: [Bitboard; Card::NUM],
        tokens: [Bitboard; Side::NUM],
        collapsed: Bitboard,
        turn: Side,
    ) -> StateResult<GameState> {
        let state = Self::from_parts_unchecked(cards, tokens, collapsed, turn);
        state.validate()?;
        Ok(state)
    }

    /// 検証なしで生成（列挙など、構造上正しいことが分かっている経路用）
    #[inline]
    pub const fn from_parts_unchecked(
        cards: [Bitboard; Card::NUM],
        tokens: [Bitboard; Side::NUM],
        collapsed: Bitboard,
        turn: Side,
    ) -> GameState {
        GameState {
            cards,
            tokens,
            collapsed,
            turn,
        }
    }

    /// 生マスク `[a, 2, 3, 4, x, o, c]` と turn 値から検証付きで生成
    pub fn from_raw(masks: [u16; 7], turn: u8) -> StateResult<GameState> {
        let turn = Side::from_u8(turn).ok_or(StateError::InvalidTurn(turn))?;
        let bb = masks.map(Bitboard::from_bits);
        Self::new([bb[0], bb[1], bb[2], bb[3]], [bb[4], bb[5]], bb[6], turn)
    }

    /// 生マスク `[a, 2, 3, 4, x, o, c]`
    #[inline]
    pub const fn raw_masks(&self) -> [u16; 7] {
        [
            self.cards[0].bits(),
            self.cards[1].bits(),
            self.cards[2].bits(),
            self.cards[3].bits(),
            self.tokens[0].bits(),
            self.tokens[1].bits(),
            self.collapsed.bits(),
        ]
    }

    /// 不変条件を検査する
    pub fn validate(&self) -> StateResult<()> {
        let mut seen = 0u16;
        let mut overlap = 0u16;
        for mask in self.cards {
            overlap |= seen & mask.bits();
            seen |= mask.bits();
        }
        if overlap != 0 {
            return Err(StateError::CardOverlap(overlap));
        }
        if seen != Bitboard::ALL.bits() {
            return Err(StateError::CardGap(!seen));
        }
        for side in Side::ALL {
            let token = self.tokens[side.index()];
            if !token.is_single() {
                return Err(StateError::TokenCount {
                    side,
                    count: token.count(),
                });
            }
        }
        if !(self.tokens[0] & self.tokens[1]).is_empty() {
            return Err(StateError::TokensOverlap);
        }
        for side in Side::ALL {
            if !(self.tokens[side.index()] & self.collapsed).is_empty() {
                return Err(StateError::CollapsedUnderToken(side));
            }
        }
        Ok(())
    }

    #[inline]
    pub const fn cards(&self) -> [Bitboard; Card::NUM] {
        self.cards
    }

    #[inline]
    pub const fn card_mask(&self, card: Card) -> Bitboard {
        self.cards[card.index()]
    }

    /// 指定升のカード（どのマスクにも無ければ None）
    pub fn card_at(&self, sq: Square) -> Option<Card> {
        Card::ALL.into_iter().find(|card| self.card_mask(*card).contains(sq))
    }

    #[inline]
    pub const fn tokens(&self) -> [Bitboard; Side::NUM] {
        self.tokens
    }

    #[inline]
    pub const fn token(&self, side: Side) -> Bitboard {
        self.tokens[side.index()]
    }

    /// 駒の升（マスクが空なら升 0）
    #[inline]
    pub fn token_square(&self, side: Side) -> Square {
        self.token(side).lsb().unwrap_or(Square::ORIGIN)
    }

    #[inline]
    pub const fn collapsed(&self) -> Bitboard {
        self.collapsed
    }

    /// 手番
    #[inline]
    pub const fn turn(&self) -> Side {
        self.turn
    }

    /// 手番だけを差し替えたコピー
    #[inline]
    pub const fn with_turn(self, turn: Side) -> GameState {
        GameState { turn, ..self }
    }

    /// 手番側の駒の升
    #[inline]
    pub fn mover_square(&self) -> Square {
        self.token_square(self.turn)
    }

    /// 相手側の駒の升
    #[inline]
    pub fn opponent_square(&self) -> Square {
        self.token_square(self.turn.opponent())
    }

    /// 先手の駒が升 0 にある（正規化済み）か
    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.token(Side::First) == Bitboard::from_square(Square::ORIGIN)
    }

    /// 4行の盤面図
    ///
    /// `X`/`O` は駒、`.` は崩落升、それ以外はカード表記。
    pub fn diagram(&self) -> String {
        let mut out = String::with_capacity(40);
        for row in 0..Square::SIDE {
            for col in 0..Square::SIDE {
                let sq = Square::new(row, col);
                let c = if self.token(Side::First).contains(sq) {
                    Side::First.token_char()
                } else if self.token(Side::Second).contains(sq) {
                    Side::Second.token_char()
                } else if self.collapsed.contains(sq) {
                    '.'
                } else {
                    self.card_at(sq).map_or('?', Card::glyph)
                };
                if col > 0 {
                    out.push(' ');
                }
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}
