//! 探索本体

use std::collections::HashMap;

use serde::Serialize;

use super::ordering::{Candidate, ordered_candidates};
use super::tree::SearchTree;
use crate::hash::{KeyWidth, StateKey};
use crate::movegen::{apply_move, legal_destinations};
use crate::position::GameState;
use crate::types::Move;

/// plies の上限。1手ごとに1升崩落するので 16 升盤ではこれを超えない。
pub const MAX_PLIES: u16 = 16;

/// 1局面の答え
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Answer {
    /// 手番側が勝ちを強制できるか
    pub win: bool,
    /// 最善手（合法手がなければ `Move::NONE`）
    pub best: Move,
    /// 終局までの手数
    pub plies: u16,
}

impl Answer {
    /// 合法手なし（手番側の負け）
    pub const TERMINAL: Answer = Answer {
        win: false,
        best: Move::NONE,
        plies: 0,
    };
}

/// ルート候補手1つの評価
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveEval {
    pub mv: Move,
    pub win: bool,
    pub plies: u16,
    /// 着手後の相手の応手数
    pub replies: u32,
}

/// `Solver::solve` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub answer: Answer,
    /// ルートの全候補手（探索順）。`collect_root_metrics` が無効なら空。
    pub root_moves: Vec<MoveEval>,
}

impl Solution {
    /// 推奨順: 勝ち手を plies 昇順、続いて負け手を plies 降順
    pub fn ranked(&self) -> Vec<MoveEval> {
        let mut moves = self.root_moves.clone();
        moves.sort_by_key(|m| {
            if m.win {
                (0u8, m.plies as i32)
            } else {
                (1u8, -(m.plies as i32))
            }
        });
        moves
    }
}

/// 探索設定（`Solver` 生成時に固定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverConfig {
    /// 置換表キーの幅
    pub key_width: KeyWidth,
    /// 探索木（親 → 子）を記録する
    pub capture_edges: bool,
    /// ルート候補手の評価一覧を作る
    pub collect_root_metrics: bool,
}

/// 候補手1つの評価（相手の全応手を調べた結果）
#[derive(Debug, Clone, Copy)]
struct Outcome {
    win: bool,
    plies: u16,
}

/// メモ化付き AND/OR 探索
///
/// 置換表は明示的に `clear_cache` するまで保持される。
/// 独立なルートを続けて解くときはルートごとにクリアしてメモリを抑える。
pub struct Solver {
    config: SolverConfig,
    cache: HashMap<StateKey, Answer>,
    tree: Option<SearchTree>,
    nodes: u64,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Solver {
        Solver {
            config,
            cache: HashMap::new(),
            tree: config.capture_edges.then(|| SearchTree::new(config.key_width)),
            nodes: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 局面を解く。設定に応じてルート候補手の一覧も返す。
    pub fn solve(&mut self, state: &GameState) -> Solution {
        let answer = self.solve_rec(state);
        let root_moves = if self.config.collect_root_metrics {
            self.root_metrics(state)
        } else {
            Vec::new()
        };
        Solution { answer, root_moves }
    }

    /// 答えだけを求める
    #[inline]
    pub fn answer(&mut self, state: &GameState) -> Answer {
        self.solve_rec(state)
    }

    /// 置換表と記録済みの探索木を破棄する
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        if let Some(tree) = self.tree.as_mut() {
            tree.clear();
        }
    }

    /// 置換表のエントリ数
    #[inline]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// 新規に展開した局面数（累計）
    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// 記録済みの探索木（`capture_edges` が無効なら None）
    #[inline]
    pub fn tree(&self) -> Option<&SearchTree> {
        self.tree.as_ref()
    }

    #[inline]
    fn key(&self, state: &GameState) -> StateKey {
        self.config.key_width.key(state)
    }

    fn solve_rec(&mut self, state: &GameState) -> Answer {
        let key = self.key(state);
        if let Some(answer) = self.cache.get(&key) {
            return *answer;
        }
        self.nodes += 1;

        let candidates = ordered_candidates(state);
        let mut answer = Answer::TERMINAL;
        let mut evaluated: Vec<StateKey> = Vec::new();
        for cand in &candidates {
            let outcome = self.evaluate(cand);
            if self.tree.is_some() {
                evaluated.push(self.key(&cand.child));
            }
            if outcome.win {
                answer = Answer {
                    win: true,
                    best: cand.mv,
                    plies: outcome.plies,
                };
                break;
            }
            // 負けの中では最も長く粘れる手（同値なら先の手）
            if outcome.plies > answer.plies {
                answer = Answer {
                    win: false,
                    best: cand.mv,
                    plies: outcome.plies,
                };
            }
        }

        self.cache.insert(key, answer);
        if let Some(tree) = self.tree.as_mut() {
            tree.record(key, state.turn(), evaluated, Some(answer));
        }
        answer
    }

    /// 候補手の評価: 相手の全応手を調べる
    fn evaluate(&mut self, cand: &Candidate) -> Outcome {
        let child = &cand.child;
        let replies = legal_destinations(child);
        if replies.is_empty() {
            if let Some(tree) = self.tree.as_mut() {
                let key = tree.key_width().key(child);
                tree.record(key, child.turn(), Vec::new(), Some(Answer::TERMINAL));
            }
            return Outcome {
                win: true,
                plies: 1,
            };
        }

        let from = child.mover_square();
        let mut longest_win = 0u16;
        let mut fastest_refutation: Option<u16> = None;
        let mut grandchildren: Vec<StateKey> = Vec::new();
        for to in replies {
            let next = apply_move(child, from, to);
            if self.tree.is_some() {
                grandchildren.push(self.key(&next));
            }
            let sub = self.solve_rec(&next);
            if sub.win {
                longest_win = longest_win.max(sub.plies);
            } else {
                fastest_refutation = Some(fastest_refutation.map_or(sub.plies, |p| p.min(sub.plies)));
            }
        }
        if let Some(tree) = self.tree.as_mut() {
            let key = tree.key_width().key(child);
            tree.record(key, child.turn(), grandchildren, None);
        }

        match fastest_refutation {
            None => Outcome {
                win: true,
                plies: longest_win.saturating_add(2),
            },
            Some(plies) => Outcome {
                win: false,
                plies: plies.saturating_add(2),
            },
        }
    }

    /// ルート候補手の評価一覧（探索順）
    ///
    /// 本探索が打ち切った手も含めて全候補手を評価する。
    /// 既に解いた子局面は置換表から引くので追加コストは小さい。
    fn root_metrics(&mut self, state: &GameState) -> Vec<MoveEval> {
        ordered_candidates(state)
            .iter()
            .map(|cand| {
                let outcome = self.evaluate(cand);
                MoveEval {
                    mv: cand.mv,
                    win: outcome.win,
                    plies: outcome.plies,
                    replies: cand.replies,
                }
            })
            .collect()
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new(SolverConfig::default())
    }
}
