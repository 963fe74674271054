//! gen_index - solved DB のキーから正規化局面への索引を作る
//!
//! ```bash
//! cargo run --release -p tools --bin gen_index -- \
//!   --db data/solved_norm.db --out data/index_norm.db
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use collapsi_core::KeyWidth;
use collapsi_core::enumerate::CanonicalEnumerator;

use tools::common::init_logging;
use tools::index::{self, IndexConfig};
use tools::parse_key_width;

#[derive(Parser, Debug)]
#[command(name = "gen_index", version, about = "正規化局面を列挙し直して逆引き索引を作る")]
struct Cli {
    /// 入力 solved DB（.gz 可）
    #[arg(long, default_value = "data/solved_norm.db")]
    db: PathBuf,

    /// 出力索引ファイル
    #[arg(long, default_value = "data/index_norm.db")]
    out: PathBuf,

    /// シャード総数
    #[arg(long, default_value_t = 1)]
    stride: u64,

    /// 担当シャード番号（0..stride）
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// 何レコードごとに書き出すか
    #[arg(long, default_value_t = 100_000)]
    batch: usize,

    /// キー幅（64 / 128）
    #[arg(long, default_value = "64", value_parser = parse_key_width)]
    key_width: KeyWidth,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = IndexConfig {
        db: cli.db,
        out: cli.out,
        key_width: cli.key_width,
        stride: cli.stride,
        offset: cli.offset,
        batch: cli.batch,
    };
    let summary = index::run(&config, CanonicalEnumerator::new())?;
    println!(
        "wanted={} already_indexed={} written={} remaining={}",
        summary.wanted_total, summary.already_indexed, summary.written, summary.remaining
    );
    Ok(())
}
