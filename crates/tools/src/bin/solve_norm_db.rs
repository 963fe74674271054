//! solve_norm_db - 正規化局面の solved DB を生成する
//!
//! 全正規化局面を列挙し、担当シャードの局面を解いて追記する。
//! 既存の出力があれば続きから再開する。
//!
//! # 使用例
//!
//! ```bash
//! # 4 並列のうち 0 番シャード
//! cargo run --release -p tools --bin solve_norm_db -- \
//!   --out data/shard_0.db --stride 4 --offset 0 --limit 0
//!
//! # 他のシャード出力を seen として読み込む
//! cargo run --release -p tools --bin solve_norm_db -- \
//!   --out data/solved_norm.db --seen data/old.db.gz
//!
//! # 既存 DB の重複除去のみ
//! cargo run --release -p tools --bin solve_norm_db -- --dedup data/solved_norm.db
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use collapsi_core::record::RecordSchema;
use collapsi_core::{KeyWidth, Side};

use tools::builder::{self, BuildConfig};
use tools::common::init_logging;
use tools::dedup::dedup_in_place;
use tools::{parse_key_width, parse_turn};

/// 正規化局面の solved DB を生成
#[derive(Parser, Debug)]
#[command(name = "solve_norm_db", version, about = "正規化局面を解いて solved DB に追記する")]
struct Cli {
    /// 出力ファイル
    #[arg(long, default_value = "data/solved_norm.db")]
    out: PathBuf,

    /// シャード総数
    #[arg(long, default_value_t = 1)]
    stride: u64,

    /// 担当シャード番号（0..stride）
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// 今回新たに書くレコード数の上限（0 = 無制限）
    #[arg(long, default_value_t = 10_000_000)]
    limit: u64,

    /// 何レコードごとに書き出すか
    #[arg(long, default_value_t = 1_000_000)]
    batch: usize,

    /// 事前に seen として読み込む DB（複数可、.gz 可）
    #[arg(long)]
    seen: Vec<PathBuf>,

    /// 根ごとの探索木ダンプの出力先
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// 手番を限定する（0 = 先手, 1 = 後手）
    #[arg(long, value_parser = parse_turn)]
    turn: Option<Side>,

    /// キー幅（64 / 128）
    #[arg(long, default_value = "64", value_parser = parse_key_width)]
    key_width: KeyWidth,

    /// 指定ファイルを重複除去して終了する
    #[arg(long, value_name = "FILE")]
    dedup: Option<PathBuf>,
}

/// Ctrl-C が押されたか
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    if let Some(path) = &cli.dedup {
        return match dedup_in_place(path, RecordSchema::new(cli.key_width)) {
            Ok(report) => {
                println!(
                    "read={} written={} duplicates={}",
                    report.read, report.written, report.duplicates
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{e}");
                ExitCode::from(e.exit_code())
            }
        };
    }

    match build(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build(cli: Cli) -> Result<()> {
    let config = BuildConfig {
        out: cli.out,
        stride: cli.stride,
        offset: cli.offset,
        limit: cli.limit,
        batch: cli.batch,
        seen: cli.seen,
        dump_dir: cli.dump_dir,
        turn: cli.turn,
        key_width: cli.key_width,
    };
    config.validate()?;

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted!");
        INTERRUPTED.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl-C handler")?;

    let summary = builder::run_with_interrupt(&config, config.canonical_states(), &INTERRUPTED)?;
    if summary.interrupted {
        log::warn!("stopped by Ctrl-C after {} new records", summary.produced);
    }
    Ok(())
}
