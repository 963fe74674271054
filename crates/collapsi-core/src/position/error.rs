//! Error types for game states

use crate::types::Side;

/// 局面の検証・パースエラー
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// 複数のカードマスクに含まれる升がある
    #[error("cells {0:#06x} carry more than one card")]
    CardOverlap(u16),

    /// どのカードマスクにも含まれない升がある
    #[error("cells {0:#06x} carry no card")]
    CardGap(u16),

    /// 駒マスクが1ビットでない
    #[error("{side:?} token mask has {count} bits set, expected exactly 1")]
    TokenCount { side: Side, count: u32 },

    /// 両者の駒が同じ升にある
    #[error("both tokens occupy the same cell")]
    TokensOverlap,

    /// 駒が崩落済みの升にある
    #[error("{0:?} token stands on a collapsed cell")]
    CollapsedUnderToken(Side),

    #[error("invalid turn value {0}, expected 0 or 1")]
    InvalidTurn(u8),

    /// テキスト形式のフィールド数が8でない
    #[error("expected 8 comma separated fields, got {0}")]
    FieldCount(usize),

    #[error("field {index} is not a valid hex value: {value:?}")]
    InvalidField { index: usize, value: String },
}

/// Result type for state construction
pub type StateResult<T> = Result<T, StateError>;
