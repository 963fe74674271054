//! 局面キー
//!
//! 7枚のマスクと手番の計8値を Szudzik ペアリングで左から畳み込み、
//! SplitMix64 の最終ミックスで拡散する。置換表のキーとシャード判定の両方に使う。
//!
//! - 乱数シードを使わない純関数（プロセス・マシン間で同一）
//! - 単射ではない。衝突はキャッシュ上は性能の問題だが、
//!   データベース上では「同一局面」と区別できない
//! - キー幅は `KeyWidth` で選択する（64bit / 128bit）
//!
//! 正規化局面全体（約 1.89×10⁹）での期待衝突ペア数:
//! 64bit で約 0.097、128bit で約 5×10⁻²¹。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::GameState;

/// Szudzik ペアリング（64bit、折り返しあり）
#[inline]
pub const fn pair64(a: u64, b: u64) -> u64 {
    if a >= b {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    } else {
        a.wrapping_add(b.wrapping_mul(b))
    }
}

/// Szudzik ペアリング（128bit、折り返しあり）
#[inline]
pub const fn pair128(a: u128, b: u128) -> u128 {
    if a >= b {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    } else {
        a.wrapping_add(b.wrapping_mul(b))
    }
}

/// SplitMix64 最終ミックス
#[inline]
pub const fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// ハッシュ入力の8値 `[a, 2, 3, 4, x, o, c, turn]`
#[inline]
fn hash_inputs(state: &GameState) -> [u16; 8] {
    let m = state.raw_masks();
    [m[0], m[1], m[2], m[3], m[4], m[5], m[6], state.turn() as u8 as u16]
}

/// 64bit キー
#[inline]
pub fn hash64(state: &GameState) -> u64 {
    let h = hash_inputs(state)
        .into_iter()
        .fold(0u64, |h, v| pair64(h, v as u64));
    mix64(h)
}

/// 128bit キー
///
/// 128bit で畳み込み、下位半分をミックスした値を上位半分のミックスに混ぜる。
#[inline]
pub fn hash128(state: &GameState) -> u128 {
    let h = hash_inputs(state)
        .into_iter()
        .fold(0u128, |h, v| pair128(h, v as u128));
    let lo = mix64(h as u64);
    let hi = mix64((h >> 64) as u64 ^ lo);
    ((hi as u128) << 64) | lo as u128
}

/// キー幅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyWidth {
    #[default]
    Bits64,
    Bits128,
}

impl KeyWidth {
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            KeyWidth::Bits64 => 64,
            KeyWidth::Bits128 => 128,
        }
    }

    #[inline]
    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    pub const fn from_bits(bits: u32) -> Option<KeyWidth> {
        match bits {
            64 => Some(KeyWidth::Bits64),
            128 => Some(KeyWidth::Bits128),
            _ => None,
        }
    }

    /// `n` 個の異なる局面を格納したときの期待衝突ペア数 n(n-1)/2 / 2^bits
    pub fn expected_collisions(self, n: u64) -> f64 {
        let n = n as f64;
        n * (n - 1.0) / 2.0 / 2f64.powi(self.bits() as i32)
    }

    /// 局面キーを計算
    #[inline]
    pub fn key(self, state: &GameState) -> StateKey {
        match self {
            KeyWidth::Bits64 => StateKey::K64(hash64(state)),
            KeyWidth::Bits128 => StateKey::K128(hash128(state)),
        }
    }
}

impl fmt::Display for KeyWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// 局面キー（幅付き）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    K64(u64),
    K128(u128),
}

impl StateKey {
    #[inline]
    pub const fn width(self) -> KeyWidth {
        match self {
            StateKey::K64(_) => KeyWidth::Bits64,
            StateKey::K128(_) => KeyWidth::Bits128,
        }
    }

    /// 128bit に拡張した値
    #[inline]
    pub const fn as_u128(self) -> u128 {
        match self {
            StateKey::K64(k) => k as u128,
            StateKey::K128(k) => k,
        }
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.as_u128() == 0
    }

    /// `stride` 分割時のシャード番号（key mod stride）
    #[inline]
    pub const fn shard(self, stride: u64) -> u64 {
        match self {
            StateKey::K64(k) => k % stride,
            StateKey::K128(k) => (k % stride as u128) as u64,
        }
    }

    /// リトルエンディアンのバイト列（幅に応じて 8 / 16 バイト）
    pub fn to_le_bytes(self, out: &mut [u8]) {
        match self {
            StateKey::K64(k) => out[..8].copy_from_slice(&k.to_le_bytes()),
            StateKey::K128(k) => out[..16].copy_from_slice(&k.to_le_bytes()),
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKey::K64(k) => write!(f, "{k:016x}"),
            StateKey::K128(k) => write!(f, "{k:032x}"),
        }
    }
}
