//! dedup_db - solved DB をその場で重複除去する
//!
//! 終了コード: 0 成功, 1 入力なし, 2 オープン失敗, 3 退避失敗, 4 置換失敗, 5 読み書き失敗

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use collapsi_core::KeyWidth;
use collapsi_core::record::RecordSchema;

use tools::common::init_logging;
use tools::dedup::dedup_in_place;
use tools::parse_key_width;

#[derive(Parser, Debug)]
#[command(name = "dedup_db", version, about = "(key, turn) ごとに最初のレコードだけを残す")]
struct Cli {
    /// 対象ファイル
    file: PathBuf,

    /// キー幅（64 / 128）
    #[arg(long, default_value = "64", value_parser = parse_key_width)]
    key_width: KeyWidth,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match dedup_in_place(&cli.file, RecordSchema::new(cli.key_width)) {
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
    }
}
