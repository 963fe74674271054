//! シャード分割された solved DB の生成
//!
//! 正規化局面を列挙し、自分のシャード（`key mod stride == offset`）の局面だけを
//! 解いてバッチ単位で追記する。
//!
//! 再開手順:
//! 1. 出力ファイルをレコード境界まで切り詰める
//! 2. 出力と `--seen` の各ファイルから (key, turn) を読み込む
//! 3. 読み込んだ局面は解かずに飛ばす
//!
//! 中断（上限到達・Ctrl-C）時も未書き込みのバッチは書き出してから終わる。

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use collapsi_core::enumerate::{CanonicalEnumerator, TurnFilter};
use collapsi_core::record::{
    KeyTurn, RecordSchema, SolvedRecord, append_bytes, encode_solved_batch, load_seen,
    truncate_to_record_boundary,
};
use collapsi_core::{GameState, KeyWidth, Side, Solver, SolverConfig};

use crate::common::format_hms;
use crate::common::io::{ensure_parent_dir, open_reader};
use crate::health::{BatchStats, HealthMonitor};
use crate::manifest::{BuildManifest, manifest_path, now_rfc3339};

/// 進捗ログの間隔
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// ビルダーの設定
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub out: PathBuf,
    pub stride: u64,
    pub offset: u64,
    /// 今回新たに書くレコード数の上限（0 = 無制限）
    pub limit: u64,
    pub batch: usize,
    pub seen: Vec<PathBuf>,
    pub dump_dir: Option<PathBuf>,
    pub turn: Option<Side>,
    pub key_width: KeyWidth,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            out: PathBuf::from("data/solved_norm.db"),
            stride: 1,
            offset: 0,
            limit: 10_000_000,
            batch: 1_000_000,
            seen: Vec::new(),
            dump_dir: None,
            turn: None,
            key_width: KeyWidth::Bits64,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            bail!("--stride must be at least 1");
        }
        if self.offset >= self.stride {
            bail!("--offset ({}) must be less than --stride ({})", self.offset, self.stride);
        }
        if self.batch == 0 {
            bail!("--batch must be at least 1");
        }
        Ok(())
    }

    #[inline]
    pub fn schema(&self) -> RecordSchema {
        RecordSchema::new(self.key_width)
    }

    pub fn turn_filter(&self) -> TurnFilter {
        match self.turn {
            Some(side) => TurnFilter::Only(side),
            None => TurnFilter::Both,
        }
    }

    /// この設定で列挙すべき正規化局面
    pub fn canonical_states(&self) -> CanonicalEnumerator {
        CanonicalEnumerator::with_filter(self.turn_filter())
    }
}

/// 1回の実行結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildSummary {
    pub records_at_start: u64,
    pub seen_loaded: u64,
    pub scanned: u64,
    pub skipped_seen: u64,
    pub produced: u64,
    pub flushes: u64,
    pub flagged_batches: u64,
    pub interrupted: bool,
    pub elapsed_sec: f64,
}

/// 進捗（レート・残り時間）の計算
struct Progress {
    start: Instant,
    last_report: Instant,
    /// 完了率の分母
    target: u64,
}

impl Progress {
    fn new(target: u64) -> Progress {
        let now = Instant::now();
        Progress {
            start: now,
            last_report: now,
            target,
        }
    }

    fn due(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_report) >= PROGRESS_INTERVAL {
            self.last_report = now;
            return true;
        }
        false
    }

    fn line(&self, produced: u64) -> String {
        let elapsed = self.start.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { produced as f64 / elapsed } else { 0.0 };
        let pct = if self.target > 0 {
            100.0 * produced as f64 / self.target as f64
        } else {
            0.0
        };
        let eta = if rate > 0.0 && self.target > produced {
            format_hms((self.target - produced) as f64 / rate)
        } else {
            "--:--:--".to_string()
        };
        format!(
            "produced={produced} elapsed={} rate_per_s={rate:.1} pct={pct:.3} eta={eta}",
            format_hms(elapsed)
        )
    }
}

/// ビルダー本体の状態
struct Builder<'a> {
    config: &'a BuildConfig,
    schema: RecordSchema,
    solver: Solver,
    seen: HashSet<KeyTurn>,
    pending: Vec<SolvedRecord>,
    health: HealthMonitor,
    progress: Progress,
    summary: BuildSummary,
}

impl<'a> Builder<'a> {
    fn new(config: &'a BuildConfig) -> Builder<'a> {
        let target = if config.limit > 0 {
            config.limit
        } else {
            config.turn_filter().total() / config.stride
        };
        Builder {
            config,
            schema: config.schema(),
            solver: Solver::new(SolverConfig {
                key_width: config.key_width,
                capture_edges: config.dump_dir.is_some(),
                collect_root_metrics: false,
            }),
            seen: HashSet::new(),
            pending: Vec::with_capacity(config.batch.min(1 << 20)),
            health: HealthMonitor::new(),
            progress: Progress::new(target),
            summary: BuildSummary::default(),
        }
    }

    /// 出力の切り詰めと seen 集合の構築
    fn prepare(&mut self) -> Result<()> {
        let out = &self.config.out;
        ensure_parent_dir(out)
            .with_context(|| format!("failed to create parent of {}", out.display()))?;
        if let Some(dir) = &self.config.dump_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create dump dir {}", dir.display()))?;
        }

        // 前回と異なるキー幅で追記するとレコード境界が壊れる
        let manifest = manifest_path(out);
        if manifest.exists() {
            let recorded = BuildManifest::load(&manifest)?
                .schema()
                .with_context(|| format!("unreadable schema in {}", manifest.display()))?;
            if recorded != self.schema {
                bail!(
                    "{} was built with schema v{} ({}-bit keys), requested v{}",
                    out.display(),
                    recorded.version(),
                    recorded.key_width.bits(),
                    self.schema.version()
                );
            }
        }

        let existing = truncate_to_record_boundary(out, self.schema.solved_size())
            .with_context(|| format!("failed to truncate {}", out.display()))?;
        self.summary.records_at_start = existing;
        if existing > 0 {
            self.load_seen_from(out)?;
        }
        for path in &self.config.seen {
            self.load_seen_from(path)?;
        }
        log::info!(
            "resume: existing_records={} seen={} out={}",
            existing,
            self.seen.len(),
            out.display()
        );
        Ok(())
    }

    fn load_seen_from(&mut self, path: &Path) -> Result<()> {
        let reader =
            open_reader(path).with_context(|| format!("failed to open {}", path.display()))?;
        let loaded = load_seen(reader, self.schema, &mut self.seen)
            .with_context(|| format!("failed to load seen set from {}", path.display()))?;
        self.summary.seen_loaded += loaded;
        log::info!("seen: loaded {loaded} records from {}", path.display());
        Ok(())
    }

    fn solve_one(&mut self, state: &GameState) -> Result<()> {
        let key = self.config.key_width.key(state);
        if key.shard(self.config.stride) != self.config.offset {
            return Ok(());
        }
        let kt = KeyTurn {
            key,
            turn: state.turn() as u8,
        };
        if self.seen.contains(&kt) {
            self.summary.skipped_seen += 1;
            return Ok(());
        }

        // 根ごとの部分木は独立なので置換表を捨てる
        self.solver.clear_cache();
        let answer = self.solver.answer(state);
        if let Some(dir) = &self.config.dump_dir {
            dump_tree(&self.solver, dir, key, state.turn())?;
        }
        self.pending
            .push(SolvedRecord::from_answer(key, state.turn(), &answer));
        self.seen.insert(kt);
        self.summary.produced += 1;

        if self.pending.len() >= self.config.batch {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let bytes = encode_solved_batch(&self.pending, self.schema)?;
        append_bytes(&self.config.out, &bytes)
            .with_context(|| format!("failed to append to {}", self.config.out.display()))?;
        self.summary.flushes += 1;

        let stats = BatchStats::from_records(&self.pending);
        let flags = self.health.observe(&stats);
        log::info!("batch: {stats}");
        if !flags.is_empty() {
            log::warn!("batch flagged with {} condition(s)", flags.len());
        }
        log::info!(
            "flush flushes={} {}",
            self.summary.flushes,
            self.progress.line(self.summary.produced)
        );
        self.pending.clear();
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.config.limit > 0 && self.summary.produced >= self.config.limit
    }
}

fn dump_tree(solver: &Solver, dir: &Path, key: collapsi_core::StateKey, turn: Side) -> Result<()> {
    let Some(tree) = solver.tree() else {
        return Ok(());
    };
    let path = dir.join(format!("{key}-{}.bin", turn as u8));
    let f = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    let nodes = tree
        .write_to(key, &mut w)
        .with_context(|| format!("failed to write {}", path.display()))?;
    std::io::Write::flush(&mut w).with_context(|| format!("failed to flush {}", path.display()))?;
    log::debug!("dump {} ({nodes} nodes)", path.display());
    Ok(())
}

/// ビルダーを実行する（中断なし）
pub fn run<I>(config: &BuildConfig, states: I) -> Result<BuildSummary>
where
    I: IntoIterator<Item = GameState>,
{
    let never = AtomicBool::new(false);
    run_with_interrupt(config, states, &never)
}

/// ビルダーを実行する。`interrupt` が立つと現在のバッチを書き出して終了する。
pub fn run_with_interrupt<I>(
    config: &BuildConfig,
    states: I,
    interrupt: &AtomicBool,
) -> Result<BuildSummary>
where
    I: IntoIterator<Item = GameState>,
{
    config.validate()?;
    let started_at = now_rfc3339();
    let schema = config.schema();
    log::info!(
        "build: out={} stride={} offset={} limit={} batch={} key_bits={} schema=v{}",
        config.out.display(),
        config.stride,
        config.offset,
        config.limit,
        config.batch,
        config.key_width.bits(),
        schema.version()
    );
    log::info!(
        "build: expected colliding key pairs over the full canonical space: {:.3e}",
        config
            .key_width
            .expected_collisions(collapsi_core::enumerate::CANONICAL_STATES)
    );

    let mut builder = Builder::new(config);
    builder.prepare()?;

    let mut result = Ok(());
    if !builder.limit_reached() {
        for state in states {
            builder.summary.scanned += 1;
            if let Err(e) = builder.solve_one(&state) {
                result = Err(e);
                break;
            }
            if builder.limit_reached() {
                break;
            }
            if interrupt.load(Ordering::Relaxed) {
                log::warn!("interrupted; flushing pending batch");
                builder.summary.interrupted = true;
                break;
            }
            if builder.summary.scanned % 256 == 0 && builder.progress.due() {
                log::info!(
                    "progress scanned={} skipped_seen={} {}",
                    builder.summary.scanned,
                    builder.summary.skipped_seen,
                    builder.progress.line(builder.summary.produced)
                );
            }
        }
    }
    // 失敗時も書けるところまでは書き出す
    let flushed = builder.flush();
    result?;
    flushed?;

    builder.summary.flagged_batches = builder.health.flagged_batches();
    builder.summary.elapsed_sec = builder.progress.start.elapsed().as_secs_f64();
    let summary = builder.summary.clone();
    log::info!(
        "DONE produced={} skipped_seen={} scanned={} flushes={} flagged_batches={} elapsed={}",
        summary.produced,
        summary.skipped_seen,
        summary.scanned,
        summary.flushes,
        summary.flagged_batches,
        format_hms(summary.elapsed_sec)
    );
    if builder.health.cumulative().count > 0 {
        log::info!("cumulative: {}", builder.health.cumulative());
    }

    let manifest = BuildManifest {
        tool: "solve_norm_db".to_string(),
        schema_version: schema.version(),
        key_bits: config.key_width.bits(),
        record_bytes: schema.solved_size(),
        stride: config.stride,
        offset: config.offset,
        limit: config.limit,
        batch: config.batch,
        turn: config.turn.map(|s| s as u8),
        seen_sources: config.seen.clone(),
        dump_dir: config.dump_dir.clone(),
        records_at_start: summary.records_at_start,
        produced: summary.produced,
        records_total: summary.records_at_start + summary.produced,
        skipped_seen: summary.skipped_seen,
        scanned: summary.scanned,
        flushes: summary.flushes,
        flagged_batches: summary.flagged_batches,
        interrupted: summary.interrupted,
        started_at,
        finished_at: now_rfc3339(),
        elapsed_sec: summary.elapsed_sec,
    };
    let path = manifest.save(&config.out)?;
    log::debug!("manifest written to {}", path.display());
    Ok(summary)
}
