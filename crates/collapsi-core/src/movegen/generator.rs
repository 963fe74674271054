//! 移動先列挙と着手適用

use crate::bitboard::{Bitboard, DIRECTIONS};
use crate::position::GameState;
use crate::types::{Card, Move, MoveList, Square};

/// 升のカードの歩数（A, 2, 3, 4 の順に判定）
///
/// 駒が乗っている升・崩落済みの升でもカードは残っている。
/// どのカードマスクにも含まれない升は A とみなす。
#[inline]
pub fn steps_from(state: &GameState, sq: Square) -> u8 {
    for card in Card::ALL {
        if state.card_mask(card).contains(sq) {
            return card.steps();
        }
    }
    Card::Ace.steps()
}

fn walk(
    cur: Square,
    remaining: u8,
    blocked: Bitboard,
    visited: Bitboard,
    out: &mut Bitboard,
) {
    if remaining == 0 {
        out.set(cur);
        return;
    }
    for table in DIRECTIONS {
        let next = Square::from_nibble(table[cur.index()]);
        if blocked.contains(next) || visited.contains(next) {
            continue;
        }
        walk(next, remaining - 1, blocked, visited.with(next), out);
    }
}

/// `start` からちょうど `steps` 辺の単純経路で到達できる升の集合
///
/// - 崩落升は通過も停止もできない
/// - 同じ経路で一度使った升（出発升を含む）には戻れない
/// - 相手の駒の升は通過できるが停止はできない
///
/// 空集合なら手番側は指す手がなく負け。
pub fn enumerate_destinations(
    state: &GameState,
    start: Square,
    steps: u8,
    opponent: Square,
) -> Bitboard {
    let mut out = Bitboard::EMPTY;
    walk(
        start,
        steps,
        state.collapsed(),
        Bitboard::from_square(start),
        &mut out,
    );
    out.without(start).without(opponent)
}

/// 手番側の合法な移動先
#[inline]
pub fn legal_destinations(state: &GameState) -> Bitboard {
    let start = state.mover_square();
    enumerate_destinations(state, start, steps_from(state, start), state.opponent_square())
}

/// 手番側の合法手（移動先の升番号昇順）
pub fn legal_moves(state: &GameState) -> MoveList {
    let from = state.mover_square();
    legal_destinations(state)
        .iter()
        .map(|to| Move::new(from, to))
        .collect()
}

/// 手番側の合法手の数
#[inline]
pub fn reply_count(state: &GameState) -> u32 {
    legal_destinations(state).count()
}

/// 着手を適用した新しい局面を返す（入力は変更しない）
///
/// 出発升を崩落させ、手番側の駒を `to` へ移し、手番を交代する。
pub fn apply_move(state: &GameState, from: Square, to: Square) -> GameState {
    let mover = state.turn();
    let mut tokens = state.tokens();
    tokens[mover.index()] = tokens[mover.index()].without(from).with(to);
    GameState::from_parts_unchecked(
        state.cards(),
        tokens,
        state.collapsed().with(from),
        mover.opponent(),
    )
}
