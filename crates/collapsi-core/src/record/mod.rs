//! ディスク上のレコード形式
//!
//! 解析結果（solved）と逆引き索引（index）の固定長レコードを定義する。
//! 書き手（ビルダー、dedup、index、merge）も読み手もこのモジュールだけを通す。
//!
//! # スキーマ
//!
//! キー幅でバージョンが決まる（v1 = 64bit キー、v2 = 128bit キー）。
//! 全フィールドはリトルエンディアン。`kb` はキーのバイト数（8 / 16）。
//!
//! ```text
//! solved: key[kb] turn:u8 win:u8 best:u8 pad:u8 plies:u16 pad[2]   (v1: 16B, v2: 24B)
//! index:  key[kb] turn:u8 pad:u8 masks:[u16; 7] (a,2,3,4,x,o,c)     (v1: 24B, v2: 32B)
//! ```

mod io;
mod schema;

pub use io::{
    IndexReader, RecordReader, SolvedReader, append_bytes, encode_index_batch,
    encode_solved_batch, load_seen, truncate_to_record_boundary,
};
pub use schema::{
    Anomalies, IndexRecord, KeyTurn, RecordError, RecordResult, RecordSchema, SolvedRecord,
};
