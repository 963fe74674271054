//! Solver のテスト

use crate::hash::KeyWidth;
use crate::movegen::{apply_move, legal_destinations};
use crate::position::GameState;
use crate::search::{Answer, MAX_PLIES, Solver, SolverConfig, TREE_MAGIC};
use crate::types::{Move, Side, Square};

/// X=0, O=1, 0-5: A, 6-9: 2, 10-13: 3, 14-15: 4, 先手番
fn fixture() -> GameState {
    "003f,03c0,3c00,c000,0001,0002,0000,0".parse().unwrap()
}

fn with_collapsed(collapsed: u16, turn: u8) -> GameState {
    let mut masks = fixture().raw_masks();
    masks[6] = collapsed;
    GameState::from_raw(masks, turn).unwrap()
}

/// 置換表も順序付けも使わない素朴な勝敗判定
fn naive_win(state: &GameState) -> bool {
    let from = state.mover_square();
    legal_destinations(state).iter().any(|to| {
        let child = apply_move(state, from, to);
        let opp_from = child.mover_square();
        legal_destinations(&child)
            .iter()
            .all(|reply| naive_win(&apply_move(&child, opp_from, reply)))
    })
}

fn metrics_config() -> SolverConfig {
    SolverConfig {
        collect_root_metrics: true,
        ..SolverConfig::default()
    }
}

#[test]
fn test_terminal_position_is_loss() {
    // X の近傍 12, 4, 3 が崩落、1 は O
    let s = with_collapsed(0x1018, 0);
    assert!(legal_destinations(&s).is_empty());
    let mut solver = Solver::new(metrics_config());
    let sol = solver.solve(&s);
    assert_eq!(sol.answer, Answer::TERMINAL);
    assert_eq!(sol.answer.best, Move::NONE);
    assert!(sol.root_moves.is_empty());
}

#[test]
fn test_immediate_win_counts_one_ply() {
    // X は 0 -> 3 のみ。着手後 O（升 1、A）の近傍 13, 5, 0, 2 は全て崩落
    let s = with_collapsed(0x3034, 0);
    let mut solver = Solver::new(metrics_config());
    let sol = solver.solve(&s);
    assert_eq!(
        sol.answer,
        Answer {
            win: true,
            best: Move::new(Square::ORIGIN, Square::from_nibble(3)),
            plies: 1,
        }
    );
    assert_eq!(sol.root_moves.len(), 1);
    assert_eq!(sol.root_moves[0].replies, 0);
}

#[test]
fn test_fixture_is_deterministic() {
    let s = fixture();
    let mut solver = Solver::default();
    let first = solver.answer(&s);
    let again = solver.answer(&s);
    assert_eq!(first, again);

    solver.clear_cache();
    assert_eq!(solver.cache_len(), 0);
    assert_eq!(solver.answer(&s), first);

    let mut fresh = Solver::default();
    assert_eq!(fresh.answer(&s), first);

    assert!(first.plies <= MAX_PLIES);
    assert_eq!(first.win, first.plies % 2 == 1);
    if first.win {
        assert!(first.best.is_well_formed());
    }
}

#[test]
fn test_key_width_does_not_change_answer() {
    let s = fixture();
    let a64 = Solver::default().answer(&s);
    let a128 = Solver::new(SolverConfig {
        key_width: KeyWidth::Bits128,
        ..SolverConfig::default()
    })
    .answer(&s);
    assert_eq!(a64, a128);
}

#[test]
fn test_verdict_matches_naive_search() {
    // 崩落升を増やして素朴探索でも扱える大きさにした局面
    let layouts = [0xFF00u16, 0x0FF0, 0xF0F0, 0xAAA8, 0x5554, 0x3CF0, 0xC33C, 0x0F0C];
    for collapsed in layouts {
        for turn in 0..=1u8 {
            let s = with_collapsed(collapsed & !0x0003, turn);
            let mut solver = Solver::new(metrics_config());
            let sol = solver.solve(&s);
            assert_eq!(sol.answer.win, naive_win(&s), "state {s}");
            assert_eq!(sol.answer.win, sol.answer.plies % 2 == 1, "state {s}");
            if sol.answer.win {
                let child = apply_move(&s, sol.answer.best.from(), sol.answer.best.to());
                let opp_from = child.mover_square();
                for reply in legal_destinations(&child).iter() {
                    assert!(naive_win(&apply_move(&child, opp_from, reply)));
                }
            }
        }
    }
}

#[test]
fn test_root_metrics_agree_with_answer() {
    for collapsed in [0x0000u16, 0x0F00, 0x8420, 0x0C30] {
        let s = with_collapsed(collapsed, 0);
        let mut solver = Solver::new(metrics_config());
        let sol = solver.solve(&s);
        let legal = legal_destinations(&s).count() as usize;
        assert_eq!(sol.root_moves.len(), legal);

        for m in &sol.root_moves {
            assert_eq!(m.win, m.plies % 2 == 1, "move {m:?}");
            assert!(m.plies >= 1 && m.plies <= MAX_PLIES);
        }
        if sol.answer.win {
            // 最初の勝ち手が答え
            let first_win = sol.root_moves.iter().find(|m| m.win).unwrap();
            assert_eq!(first_win.mv, sol.answer.best);
            assert_eq!(first_win.plies, sol.answer.plies);
        } else if !sol.root_moves.is_empty() {
            assert!(sol.root_moves.iter().all(|m| !m.win));
            let longest = sol.root_moves.iter().map(|m| m.plies).max().unwrap();
            assert_eq!(sol.answer.plies, longest);
            let first_longest = sol.root_moves.iter().find(|m| m.plies == longest).unwrap();
            assert_eq!(first_longest.mv, sol.answer.best);
        }

        let ranked = sol.ranked();
        assert_eq!(ranked.len(), sol.root_moves.len());
        let first_loss = ranked.iter().position(|m| !m.win).unwrap_or(ranked.len());
        assert!(ranked[first_loss..].iter().all(|m| !m.win));
        for w in ranked[..first_loss].windows(2) {
            assert!(w[0].plies <= w[1].plies);
        }
        for w in ranked[first_loss..].windows(2) {
            assert!(w[0].plies >= w[1].plies);
        }
    }
}

#[test]
fn test_second_mover_turn() {
    let s = fixture().with_turn(Side::Second);
    let mut solver = Solver::default();
    let a = solver.answer(&s);
    assert_eq!(a.win, a.plies % 2 == 1);
    if !a.best.is_none() {
        assert_eq!(a.best.from(), Square::from_nibble(1));
    }
}

#[test]
fn test_tree_capture_and_dump() {
    let s = with_collapsed(0x0C30, 0);
    let config = SolverConfig {
        capture_edges: true,
        ..SolverConfig::default()
    };
    let mut solver = Solver::new(config);
    let answer = solver.answer(&s);
    let root = KeyWidth::Bits64.key(&s);

    let tree = solver.tree().unwrap();
    let node = tree.get(&root).unwrap();
    assert_eq!(node.answer, Some(answer));
    assert_eq!(node.turn, Side::First);
    assert!(!node.children.is_empty());
    let reachable = tree.reachable(root);
    assert_eq!(reachable[0].0, root);

    let mut buf = Vec::new();
    let written = tree.write_to(root, &mut buf).unwrap();
    assert_eq!(written, reachable.len());
    assert_eq!(&buf[..4], &TREE_MAGIC);
    assert_eq!(buf[6], 8);
    assert_eq!(u32::from_le_bytes([buf[7], buf[8], buf[9], buf[10]]) as usize, written);

    solver.clear_cache();
    assert!(solver.tree().unwrap().is_empty());
}

#[test]
fn test_no_tree_without_capture() {
    let mut solver = Solver::default();
    solver.answer(&with_collapsed(0x0F00, 0));
    assert!(solver.tree().is_none());
    assert!(solver.nodes() > 0);
}
