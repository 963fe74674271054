//! 局面表現
//!
//! - `GameState`: 7枚のビットボード + 手番からなる不変値
//! - `StateError`: 局面の検証・パースエラー
//! - `Translation`: トーラス上の平行移動（正規化に使用）
//!
//! テキスト形式は `a,2,3,4,x,o,c,turn`（各フィールド16進）。

mod error;
mod state;
mod text;
mod translate;

pub use error::{StateError, StateResult};
pub use state::GameState;
pub use translate::Translation;
