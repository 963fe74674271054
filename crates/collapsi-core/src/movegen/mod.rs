//! 合法手生成
//!
//! - `steps_from`: 升のカードの歩数
//! - `enumerate_destinations`: ちょうど `steps` 辺の単純経路で到達できる升
//! - `apply_move`: 着手適用（出発升を崩落、駒を移動、手番交代）
//! - `legal_moves`: 手番側の合法手一覧（移動先の升番号昇順）

mod generator;

pub use generator::{
    apply_move, enumerate_destinations, legal_destinations, legal_moves, reply_count,
    steps_from,
};
