//! 指し手の順序付け
//!
//! 相手の応手数がちょうど 1 の手を先頭に置き、残りは応手数の昇順に並べる。
//! 同順位は移動先の升番号の昇順（安定ソート）。応手 0 の手は応手 1 の手の後ろ、
//! 応手 2 以上の手の前に来る。

use smallvec::SmallVec;

use crate::movegen::{apply_move, legal_moves, reply_count};
use crate::position::GameState;
use crate::types::Move;

/// 順序付け済みの候補手
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub mv: Move,
    /// 着手後の局面（相手番）
    pub child: GameState,
    /// 着手後の相手の応手数
    pub replies: u32,
}

#[inline]
fn order_key(replies: u32) -> (bool, u32) {
    (replies != 1, replies)
}

/// 手番側の候補手を探索順に並べて返す。合法手がなければ空。
pub fn ordered_candidates(state: &GameState) -> SmallVec<[Candidate; 16]> {
    let mut list: SmallVec<[Candidate; 16]> = legal_moves(state)
        .into_iter()
        .map(|mv| {
            let child = apply_move(state, mv.from(), mv.to());
            Candidate {
                mv,
                child,
                replies: reply_count(&child),
            }
        })
        .collect();
    list.sort_by_key(|c| order_key(c.replies));
    list
}
