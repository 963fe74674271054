//! 基本型
//!
//! - `Side`: 手番（先手/後手）
//! - `Square`: 升目（0-15、行優先）
//! - `Card`: 升目のカード（A/2/3/4 = 歩数）
//! - `Move`: 指し手（1バイトにパック）

mod card;
mod moves;
mod side;
mod square;

pub use card::Card;
pub use moves::{Move, MoveList};
pub use side::Side;
pub use square::Square;
