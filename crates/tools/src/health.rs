//! バッチ単位の健全性チェック
//!
//! flush ごとにバッチ統計を取り、累積勝率との乖離や構造上の異常を検出する。
//! 検出結果は warn ログに出して数えるだけで、処理は止めない。

use std::fmt;

use collapsi_core::record::SolvedRecord;
use serde::Serialize;

/// 勝率乖離の閾値
pub const WIN_RATE_DRIFT_THRESHOLD: f64 = 0.10;

/// 乖離判定を始めるのに必要な累積レコード数
pub const MIN_PRIOR_RECORDS: u64 = 10_000;

/// レコード列の統計
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub count: u64,
    pub wins: u64,
    pub plies_sum: u64,
    pub plies_min: Option<u16>,
    pub plies_max: Option<u16>,
    /// `[turn 0, turn 1]`
    pub turn_counts: [u64; 2],
    pub zero_keys: u64,
    pub bad_turns: u64,
    pub bad_wins: u64,
    pub invalid_moves: u64,
    pub plies_out_of_range: u64,
    pub parity_mismatches: u64,
}

impl BatchStats {
    pub fn from_records(records: &[SolvedRecord]) -> BatchStats {
        let mut stats = BatchStats::default();
        for rec in records {
            stats.add(rec);
        }
        stats
    }

    pub fn add(&mut self, rec: &SolvedRecord) {
        self.count += 1;
        self.wins += u64::from(rec.is_win());
        self.plies_sum += u64::from(rec.plies);
        self.plies_min = Some(self.plies_min.map_or(rec.plies, |m| m.min(rec.plies)));
        self.plies_max = Some(self.plies_max.map_or(rec.plies, |m| m.max(rec.plies)));
        if let Some(c) = self.turn_counts.get_mut(rec.turn as usize) {
            *c += 1;
        }

        let a = rec.anomalies();
        self.zero_keys += u64::from(a.zero_key);
        self.bad_turns += u64::from(a.bad_turn);
        self.bad_wins += u64::from(a.bad_win);
        self.invalid_moves += u64::from(a.bad_move);
        self.plies_out_of_range += u64::from(a.plies_out_of_range);
        self.parity_mismatches += u64::from(a.parity);
    }

    /// 別の統計を合算する
    pub fn merge(&mut self, other: &BatchStats) {
        self.count += other.count;
        self.wins += other.wins;
        self.plies_sum += other.plies_sum;
        self.plies_min = match (self.plies_min, other.plies_min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.plies_max = match (self.plies_max, other.plies_max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.turn_counts[0] += other.turn_counts[0];
        self.turn_counts[1] += other.turn_counts[1];
        self.zero_keys += other.zero_keys;
        self.bad_turns += other.bad_turns;
        self.bad_wins += other.bad_wins;
        self.invalid_moves += other.invalid_moves;
        self.plies_out_of_range += other.plies_out_of_range;
        self.parity_mismatches += other.parity_mismatches;
    }

    pub fn win_rate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.wins as f64 / self.count as f64
    }

    pub fn plies_avg(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.plies_sum as f64 / self.count as f64
    }

    /// 構造上の異常の総数
    pub fn structural_anomalies(&self) -> u64 {
        self.zero_keys
            + self.bad_turns
            + self.bad_wins
            + self.invalid_moves
            + self.plies_out_of_range
            + self.parity_mismatches
    }

    /// JSON サマリー（率と平均を含む）
    pub fn summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "count": self.count,
            "wins": self.wins,
            "win_rate": self.win_rate(),
            "plies_min": self.plies_min,
            "plies_avg": self.plies_avg(),
            "plies_max": self.plies_max,
            "turn_counts": self.turn_counts,
            "zero_keys": self.zero_keys,
            "bad_turns": self.bad_turns,
            "bad_wins": self.bad_wins,
            "invalid_moves": self.invalid_moves,
            "plies_out_of_range": self.plies_out_of_range,
            "parity_mismatches": self.parity_mismatches,
        })
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={} win_rate={:.4} plies(min/avg/max)={}/{:.2}/{} turns={}/{} zero_keys={} invalid_moves={} plies_oor={} parity={}",
            self.count,
            self.win_rate(),
            self.plies_min.unwrap_or(0),
            self.plies_avg(),
            self.plies_max.unwrap_or(0),
            self.turn_counts[0],
            self.turn_counts[1],
            self.zero_keys,
            self.invalid_moves,
            self.plies_out_of_range,
            self.parity_mismatches,
        )
    }
}

/// 検出された異常
#[derive(Debug, Clone, PartialEq)]
pub enum HealthFlag {
    WinRateDrift { batch: f64, cumulative: f64 },
    ZeroKeys(u64),
    BadTurns(u64),
    BadWins(u64),
    InvalidMoves(u64),
    PliesOutOfRange(u64),
    ParityMismatch(u64),
}

impl fmt::Display for HealthFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthFlag::WinRateDrift { batch, cumulative } => write!(
                f,
                "win rate drift: batch={batch:.4} cumulative={cumulative:.4}"
            ),
            HealthFlag::ZeroKeys(n) => write!(f, "{n} zero keys"),
            HealthFlag::BadTurns(n) => write!(f, "{n} records with turn > 1"),
            HealthFlag::BadWins(n) => write!(f, "{n} records with win > 1"),
            HealthFlag::InvalidMoves(n) => write!(f, "{n} invalid move encodings"),
            HealthFlag::PliesOutOfRange(n) => write!(f, "{n} plies out of range"),
            HealthFlag::ParityMismatch(n) => write!(f, "{n} win/plies parity mismatches"),
        }
    }
}

/// 累積統計を保持し、バッチごとに異常を判定する
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    cumulative: BatchStats,
    flagged_batches: u64,
    drift_threshold: f64,
    min_prior: u64,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMonitor {
    pub fn new() -> HealthMonitor {
        HealthMonitor {
            cumulative: BatchStats::default(),
            flagged_batches: 0,
            drift_threshold: WIN_RATE_DRIFT_THRESHOLD,
            min_prior: MIN_PRIOR_RECORDS,
        }
    }

    /// 判定パラメータを指定して生成（テスト用の小さな閾値など）
    pub fn with_limits(drift_threshold: f64, min_prior: u64) -> HealthMonitor {
        HealthMonitor {
            drift_threshold,
            min_prior,
            ..HealthMonitor::new()
        }
    }

    pub fn cumulative(&self) -> &BatchStats {
        &self.cumulative
    }

    pub fn flagged_batches(&self) -> u64 {
        self.flagged_batches
    }

    /// バッチを判定してから累積に加える
    pub fn observe(&mut self, batch: &BatchStats) -> Vec<HealthFlag> {
        let mut flags = Vec::new();
        if self.cumulative.count >= self.min_prior && batch.count > 0 {
            let cumulative = self.cumulative.win_rate();
            let rate = batch.win_rate();
            if (rate - cumulative).abs() > self.drift_threshold {
                flags.push(HealthFlag::WinRateDrift {
                    batch: rate,
                    cumulative,
                });
            }
        }
        let counters: [(u64, fn(u64) -> HealthFlag); 6] = [
            (batch.zero_keys, HealthFlag::ZeroKeys),
            (batch.bad_turns, HealthFlag::BadTurns),
            (batch.bad_wins, HealthFlag::BadWins),
            (batch.invalid_moves, HealthFlag::InvalidMoves),
            (batch.plies_out_of_range, HealthFlag::PliesOutOfRange),
            (batch.parity_mismatches, HealthFlag::ParityMismatch),
        ];
        for (n, flag) in counters {
            if n > 0 {
                flags.push(flag(n));
            }
        }

        if !flags.is_empty() {
            self.flagged_batches += 1;
            for flag in &flags {
                log::warn!("health: {flag}");
            }
        }
        self.cumulative.merge(batch);
        flags
    }
}
