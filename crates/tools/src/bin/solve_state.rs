//! solve_state - 1局面を解いて最善手を表示する
//!
//! 出力（1行）: `win best plies | MM:PP:W ...`
//! - `best`, `MM`: パック済み指し手（16進2桁、`ff` は合法手なし）
//! - `PP`: その手の plies、`W`: その手で勝てるか（0/1）
//!
//! `--db` を指定すると先に solved DB を引き、見つかればその値を使う。
//!
//! ```bash
//! cargo run --release -p tools --bin solve_state -- --state 003f,03c0,3c00,c000,0001,0002,0000,0
//! cargo run --release -p tools --bin solve_state -- --seed 42 --json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use collapsi_core::deal::deal;
use collapsi_core::{GameState, KeyWidth, Solver, SolverConfig};

use tools::common::init_logging;
use tools::common::io::print_line;
use tools::parse_key_width;
use tools::query::lookup;

#[derive(Parser, Debug)]
#[command(name = "solve_state", version, about = "任意の局面を解いて最善手と候補手の評価を表示する")]
struct Cli {
    /// 局面（`a,2,3,4,x,o,c,turn` の16進表記）
    #[arg(long, conflicts_with = "seed")]
    state: Option<String>,

    /// 乱数シードから配札した初期局面を使う
    #[arg(long)]
    seed: Option<u64>,

    /// JSON で出力する
    #[arg(long)]
    json: bool,

    /// 盤面図を stderr に表示する
    #[arg(long)]
    show: bool,

    /// 先に参照する solved DB
    #[arg(long)]
    db: Option<PathBuf>,

    /// `--db` と照合する索引
    #[arg(long, requires = "db")]
    index: Option<PathBuf>,

    /// キー幅（64 / 128）
    #[arg(long, default_value = "64", value_parser = parse_key_width)]
    key_width: KeyWidth,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let state: GameState = match (&cli.state, cli.seed) {
        (Some(text), _) => text
            .parse()
            .with_context(|| format!("invalid state '{text}'"))?,
        (None, Some(seed)) => deal(seed),
        (None, None) => bail!("either --state or --seed is required"),
    };
    if cli.show {
        eprint!("{}", state.diagram());
    }

    if let Some(db) = &cli.db {
        if let Some(hit) = lookup(db, cli.index.as_deref(), &state, cli.key_width)? {
            let rec = hit.record;
            if cli.json {
                let value = serde_json::json!({
                    "state": state.to_string(),
                    "normalized": hit.normalized.to_string(),
                    "key": hit.key.to_string(),
                    "source": "db",
                    "win": rec.is_win(),
                    "best": hit.best,
                    "plies": rec.plies,
                    "index_verified": hit.index_verified,
                });
                print_line(&serde_json::to_string_pretty(&value)?)?;
            } else {
                print_line(&format!("{} {:02x} {} |", rec.win, hit.best.raw(), rec.plies))?;
            }
            return Ok(());
        }
        log::info!("state not found in {}; solving", db.display());
    }

    let mut solver = Solver::new(SolverConfig {
        key_width: cli.key_width,
        capture_edges: false,
        collect_root_metrics: true,
    });
    let solution = solver.solve(&state);
    log::debug!("solved with {} nodes", solver.nodes());
    let answer = solution.answer;

    if cli.json {
        let (normalized, _) = state.normalize();
        let value = serde_json::json!({
            "state": state.to_string(),
            "normalized": normalized.to_string(),
            "key": cli.key_width.key(&normalized).to_string(),
            "source": "search",
            "win": answer.win,
            "best": answer.best,
            "plies": answer.plies,
            "moves": solution.ranked(),
        });
        print_line(&serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    let mut line = format!("{} {:02x} {} |", u8::from(answer.win), answer.best.raw(), answer.plies);
    for m in &solution.root_moves {
        line.push_str(&format!(" {:02x}:{:02}:{}", m.mv.raw(), m.plies, u8::from(m.win)));
    }
    print_line(&line)?;
    Ok(())
}
