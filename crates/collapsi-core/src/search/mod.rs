//! 探索モジュール
//!
//! 1局面の勝敗・最善手・手数（plies）をメモ化付き AND/OR 探索で求める。
//!
//! - `Solver`: 探索本体（置換表は局面キー → `Answer`）
//! - `SolverConfig`: キー幅・木の記録・ルート指し手評価の有無（生成時に固定）
//! - 指し手順序: 相手の応手数が 1 の手を先頭、残りは応手数の昇順（安定ソート）
//! - `SearchTree`: 探索木（親 → 子のキー）の記録とバイナリ出力
//!
//! # 手数の数え方
//!
//! 手番側の候補手 m の評価（m の後は相手番）:
//! - 相手に応手がない: 勝ち、1
//! - 全ての応手の後も手番側が勝つ: 勝ち、2 + max(応手後の plies)
//! - 反駁する応手がある: 負け、2 + min(反駁後の plies)
//!
//! 局面の答えは順序上最初の勝ち手（打ち切り）。勝ち手がなければ負けの plies が
//! 最大の手（同値なら先に並ぶ手）。勝ちなら plies は奇数、負けなら偶数になる。
//! 勝ち手の中で最短の手を選ぶわけではない。

mod ordering;
mod solver;
mod tree;

#[cfg(test)]
mod tests;

pub use ordering::{Candidate, ordered_candidates};
pub use solver::{Answer, MAX_PLIES, MoveEval, Solution, Solver, SolverConfig};
pub use tree::{SearchTree, TREE_MAGIC, TREE_VERSION, TreeNode};
