//! 正規化局面の列挙
//!
//! 先手の駒を升 0 に固定し、後手の駒を升 1..15 に置く。
//! カードは駒の下も含めた全16升に配る: A を4升、残り12升から 2 を4升、
//! 残り8升から 3 を4升、残り4升が 4。各組合せは添字の辞書順。
//! 各配置について turn 0 → 1 の順に両手番を出す。
//!
//! 総数: C(16,4)·C(12,4)·C(8,4)·15·2 = 1,891,890,000

use crate::bitboard::Bitboard;
use crate::position::GameState;
use crate::types::{Side, Square};

/// 1つの後手駒位置あたりのカード配置数 C(16,4)·C(12,4)·C(8,4)
pub const LAYOUTS_PER_PLACEMENT: u64 = 1820 * 495 * 70;

/// 正規化局面（局面, 手番）の総数
pub const CANONICAL_STATES: u64 = LAYOUTS_PER_PLACEMENT * 15 * 2;

/// 列挙する手番
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnFilter {
    #[default]
    Both,
    Only(Side),
}

impl TurnFilter {
    #[inline]
    fn sides(self) -> &'static [Side] {
        match self {
            TurnFilter::Both => &Side::ALL,
            TurnFilter::Only(Side::First) => &[Side::First],
            TurnFilter::Only(Side::Second) => &[Side::Second],
        }
    }

    /// このフィルタでの列挙総数
    pub fn total(self) -> u64 {
        LAYOUTS_PER_PLACEMENT * 15 * self.sides().len() as u64
    }
}

/// `mask` の立っているビットから4個を選ぶ組合せを辞書順に列挙する
///
/// 選んだ位置（`mask` 内での順位）を保持し、次の組合せへ進める。
#[derive(Debug, Clone)]
struct Combination {
    slots: [u8; Square::NUM],
    n: usize,
    picks: [usize; 4],
    done: bool,
}

impl Combination {
    fn new(mask: u16) -> Combination {
        let mut slots = [0u8; Square::NUM];
        let mut n = 0;
        for sq in Bitboard::from_bits(mask).iter() {
            slots[n] = sq.raw();
            n += 1;
        }
        Combination {
            slots,
            n,
            picks: [0, 1, 2, 3],
            done: n < 4,
        }
    }

    fn mask(&self) -> u16 {
        self.picks
            .iter()
            .fold(0u16, |acc, &p| acc | (1u16 << self.slots[p]))
    }

    fn advance(&mut self) {
        let k = self.picks.len();
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.picks[i] < self.n - k + i {
                self.picks[i] += 1;
                for j in i + 1..k {
                    self.picks[j] = self.picks[j - 1] + 1;
                }
                return;
            }
        }
        self.done = true;
    }
}

/// 正規化局面のイテレータ
///
/// 順序: 後手駒の升 → A の組合せ → 2 の組合せ → 3 の組合せ → 手番。
#[derive(Debug, Clone)]
pub struct CanonicalEnumerator {
    sides: &'static [Side],
    second: u8,
    aces: Combination,
    twos: Combination,
    threes: Combination,
    side_idx: usize,
    finished: bool,
}

impl CanonicalEnumerator {
    pub fn new() -> CanonicalEnumerator {
        Self::with_filter(TurnFilter::Both)
    }

    pub fn with_filter(filter: TurnFilter) -> CanonicalEnumerator {
        let aces = Combination::new(Bitboard::ALL.bits());
        let twos = Combination::new(!aces.mask());
        let threes = Combination::new(!aces.mask() & !twos.mask());
        CanonicalEnumerator {
            sides: filter.sides(),
            second: 1,
            aces,
            twos,
            threes,
            side_idx: 0,
            finished: false,
        }
    }

    fn current(&self) -> GameState {
        let a = self.aces.mask();
        let two = self.twos.mask();
        let three = self.threes.mask();
        let four = !(a | two | three);
        GameState::from_parts_unchecked(
            [a, two, three, four].map(Bitboard::from_bits),
            [
                Bitboard::from_square(Square::ORIGIN),
                Bitboard::from_square(Square::from_nibble(self.second)),
            ],
            Bitboard::EMPTY,
            self.sides[self.side_idx],
        )
    }

    /// 次の配置へ進める
    fn advance_layout(&mut self) {
        self.threes.advance();
        if !self.threes.done {
            return;
        }
        self.twos.advance();
        if !self.twos.done {
            self.threes = Combination::new(!self.aces.mask() & !self.twos.mask());
            return;
        }
        self.aces.advance();
        if self.aces.done {
            self.second += 1;
            if self.second as usize >= Square::NUM {
                self.finished = true;
                return;
            }
            self.aces = Combination::new(Bitboard::ALL.bits());
        }
        self.twos = Combination::new(!self.aces.mask());
        self.threes = Combination::new(!self.aces.mask() & !self.twos.mask());
    }
}

impl Default for CanonicalEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for CanonicalEnumerator {
    type Item = GameState;

    fn next(&mut self) -> Option<GameState> {
        if self.finished {
            return None;
        }
        let state = self.current();
        self.side_idx += 1;
        if self.side_idx >= self.sides.len() {
            self.side_idx = 0;
            self.advance_layout();
        }
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        assert_eq!(LAYOUTS_PER_PLACEMENT, 63_063_000);
        assert_eq!(CANONICAL_STATES, 1_891_890_000);
        assert_eq!(TurnFilter::Only(Side::First).total(), 945_945_000);
    }

    #[test]
    fn test_combination_counts() {
        let mut c = Combination::new(0x0FFF);
        let mut count = 0;
        let mut last = 0u16;
        while !c.done {
            let m = c.mask();
            assert_eq!(m.count_ones(), 4);
            assert_eq!(m & !0x0FFF, 0);
            assert_ne!(m, last);
            last = m;
            count += 1;
            c.advance();
        }
        assert_eq!(count, 495);

        let mut a = Combination::new(0xFFFF);
        let mut count = 0;
        while !a.done {
            count += 1;
            a.advance();
        }
        assert_eq!(count, 1820);
    }

    #[test]
    fn test_first_states_in_order() {
        let mut it = CanonicalEnumerator::new();
        let s0 = it.next().unwrap();
        let s1 = it.next().unwrap();
        let s2 = it.next().unwrap();
        assert_eq!(s0.raw_masks(), [0x000F, 0x00F0, 0x0F00, 0xF000, 0x0001, 0x0002, 0]);
        assert_eq!(s0.turn(), Side::First);
        assert_eq!(s1.raw_masks(), s0.raw_masks());
        assert_eq!(s1.turn(), Side::Second);
        // 3 の組合せが先に進む: 8,9,10,12
        assert_eq!(s2.raw_masks()[2], 0x1700);
        assert_eq!(s2.raw_masks()[3], 0xE800);
        assert!(s2.validate().is_ok());
    }

    #[test]
    fn test_turn_filter_and_validity() {
        let states: Vec<GameState> = CanonicalEnumerator::with_filter(TurnFilter::Only(Side::Second))
            .take(500)
            .collect();
        assert!(states.iter().all(|s| s.turn() == Side::Second));
        assert!(states.iter().all(|s| s.validate().is_ok() && s.is_normalized()));
        // 最初の70件は 3 の組合せが一巡する
        let distinct: std::collections::HashSet<u16> =
            states[..70].iter().map(|s| s.raw_masks()[2]).collect();
        assert_eq!(distinct.len(), 70);
        // 71件目で 2 の組合せが {4,5,6,8} に進み、3 は残り {7,9,10,11,..} の先頭4升に戻る
        assert_eq!(states[70].raw_masks()[1], 0x0170);
        assert_eq!(states[70].raw_masks()[2], 0x0E80);
    }
}
