//! merge_shards - シャード出力を1つのファイルに結合する
//!
//! ```bash
//! cargo run --release -p tools --bin merge_shards -- \
//!   --glob 'data/shard_*.db' --out data/solved_norm.db
//! cargo run --release -p tools --bin dedup_db -- data/solved_norm.db
//! ```

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use collapsi_core::KeyWidth;
use collapsi_core::record::RecordSchema;

use tools::common::init_logging;
use tools::merge::{collect_inputs, merge_files};
use tools::parse_key_width;

#[derive(Parser, Debug)]
#[command(name = "merge_shards", version, about = "シャードファイルを辞書順に連結する")]
struct Cli {
    /// 入力ファイル
    inputs: Vec<PathBuf>,

    /// 入力に加える glob パターン
    #[arg(long)]
    glob: Option<String>,

    /// 出力ファイル
    #[arg(long)]
    out: PathBuf,

    /// 索引ファイルとして扱う（レコード長が変わる）
    #[arg(long)]
    index: bool,

    /// キー幅（64 / 128）
    #[arg(long, default_value = "64", value_parser = parse_key_width)]
    key_width: KeyWidth,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let inputs = collect_inputs(&cli.inputs, cli.glob.as_deref())?;
    if inputs.is_empty() {
        bail!("no input files (pass paths or --glob)");
    }
    let schema = RecordSchema::new(cli.key_width);
    let record_size = if cli.index {
        schema.index_size()
    } else {
        schema.solved_size()
    };
    let report = merge_files(&inputs, &cli.out, record_size)?;
    println!(
        "inputs={} records={} dropped_bytes={}",
        report.inputs, report.records, report.dropped_bytes
    );
    Ok(())
}
