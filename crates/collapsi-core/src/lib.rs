//! # collapsi-core
//!
//! 4×4 トーラス盤ゲーム Collapsi の完全解析コアライブラリ。
//!
//! ## モジュール構成
//!
//! - `types`: 基本型（Side, Square, Card, Move）
//! - `bitboard`: 16bit ビットボードと周回近傍テーブル
//! - `position`: 局面表現、検証、平行移動による正規化
//! - `movegen`: 移動先列挙と着手適用
//! - `hash`: 局面キー（64bit / 128bit）
//! - `search`: メモ化 AND/OR 探索
//! - `enumerate`: 正規化局面の全列挙
//! - `record`: ディスク上のレコード形式（バージョン付き）
//! - `deal`: 実カードデッキからのランダム配札
//!

// 基本型
pub mod types;

// 盤面表現
pub mod bitboard;
pub mod position;

// 合法手生成
pub mod movegen;

// 局面キー
pub mod hash;

// 探索
pub mod search;

// 列挙とレコード
pub mod enumerate;
pub mod record;

// 配札
pub mod deal;

pub use bitboard::Bitboard;
pub use hash::{KeyWidth, StateKey};
pub use position::{GameState, StateError, Translation};
pub use search::{Answer, MoveEval, Solution, Solver, SolverConfig};
pub use types::{Card, Move, Side, Square};
