//! peek_solved - solved DB の中身を表示・検証する
//!
//! ```bash
//! # 先頭 20 件
//! cargo run -p tools --bin peek_solved -- --db data/solved_norm.db
//! # 索引と突き合わせて盤面図付きで表示
//! cargo run -p tools --bin peek_solved -- --db data/solved_norm.db --index data/index_norm.db
//! # 全件の検証サマリー（JSON）
//! cargo run -p tools --bin peek_solved -- --db data/solved_norm.db --summary
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use collapsi_core::KeyWidth;
use collapsi_core::record::{IndexReader, KeyTurn, RecordSchema, SolvedReader, SolvedRecord};

use tools::common::init_logging;
use tools::common::io::{open_reader, print_line};
use tools::health::BatchStats;
use tools::parse_key_width;

#[derive(Parser, Debug)]
#[command(name = "peek_solved", version, about = "solved DB のレコードを表示する")]
struct Cli {
    /// solved DB（.gz 可）
    #[arg(long, default_value = "data/solved_norm.db")]
    db: PathBuf,

    /// 表示を始めるレコード番号
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// 表示件数
    #[arg(long, default_value_t = 20)]
    limit: u64,

    /// 構造上の異常があるレコードを飛ばす
    #[arg(long)]
    valid_only: bool,

    /// 盤面図の表示に使う索引
    #[arg(long)]
    index: Option<PathBuf>,

    /// 全件を走査して検証サマリーを JSON で出力する
    #[arg(long)]
    summary: bool,

    /// キー幅（64 / 128）
    #[arg(long, default_value = "64", value_parser = parse_key_width)]
    key_width: KeyWidth,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let schema = RecordSchema::new(cli.key_width);

    let reader =
        open_reader(&cli.db).with_context(|| format!("failed to open {}", cli.db.display()))?;
    let mut records = SolvedReader::new(reader, schema);

    if cli.summary {
        let mut stats = BatchStats::default();
        for rec in records.by_ref() {
            stats.add(&rec.with_context(|| format!("failed to read {}", cli.db.display()))?);
        }
        let mut value = stats.summary_json();
        value["file"] = serde_json::json!(cli.db.display().to_string());
        value["schema_version"] = serde_json::json!(schema.version());
        value["trailing_bytes"] = serde_json::json!(records.trailing_bytes());
        print_line(&serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    let mut page: Vec<(u64, SolvedRecord)> = Vec::new();
    for (n, rec) in records.by_ref().enumerate() {
        let n = n as u64;
        if n < cli.start {
            continue;
        }
        let rec = rec.with_context(|| format!("failed to read record {n}"))?;
        if cli.valid_only && rec.anomalies().any() {
            continue;
        }
        page.push((n, rec));
        if page.len() as u64 >= cli.limit {
            break;
        }
    }

    let boards = match &cli.index {
        Some(path) => load_boards(path, schema, &page)?,
        None => HashMap::new(),
    };

    for (n, rec) in &page {
        let anomalies = rec.anomalies();
        let mut line = format!(
            "#{n} key={} turn={} win={} best={:02x} ({}) plies={}",
            rec.key,
            rec.turn,
            rec.win,
            rec.best,
            rec.best_move(),
            rec.plies
        );
        if anomalies.any() {
            line.push_str(&format!(" anomalies={anomalies:?}"));
        }
        print_line(&line)?;
        if let Some(board) = boards.get(&rec.key_turn()) {
            print_line(board.trim_end())?;
        }
    }
    Ok(())
}

/// 表示対象のキーについて索引から盤面図を集める
fn load_boards(
    path: &Path,
    schema: RecordSchema,
    page: &[(u64, SolvedRecord)],
) -> Result<HashMap<KeyTurn, String>> {
    let mut wanted: HashMap<KeyTurn, String> = HashMap::new();
    let keys: HashSet<KeyTurn> = page.iter().map(|(_, r)| r.key_turn()).collect();
    let reader = IndexReader::open(path, schema)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for rec in reader {
        let rec = rec.with_context(|| format!("failed to read {}", path.display()))?;
        if keys.contains(&rec.key_turn()) {
            match rec.to_state() {
                Ok(state) => {
                    wanted.insert(rec.key_turn(), state.diagram());
                }
                Err(e) => log::warn!("index entry for key {} is invalid: {e}", rec.key),
            }
            if wanted.len() == keys.len() {
                break;
            }
        }
    }
    Ok(wanted)
}
