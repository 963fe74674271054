//! カード（Card）

/// 升目に置かれたカード。値はその升から出発するときの歩数。
///
/// 配札時のジャック（J）は A として扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Card {
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Card {
    /// カード種別の数
    pub const NUM: usize = 4;

    /// マスク配列・レコード上の並び順（A, 2, 3, 4）
    pub const ALL: [Card; 4] = [Card::Ace, Card::Two, Card::Three, Card::Four];

    /// 歩数
    #[inline]
    pub const fn steps(self) -> u8 {
        self as u8
    }

    /// インデックスとして使用（A=0 .. 4=3）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// 歩数から生成
    #[inline]
    pub const fn from_steps(steps: u8) -> Option<Card> {
        match steps {
            1 => Some(Card::Ace),
            2 => Some(Card::Two),
            3 => Some(Card::Three),
            4 => Some(Card::Four),
            _ => None,
        }
    }

    /// 盤面図での表記
    #[inline]
    pub const fn glyph(self) -> char {
        match self {
            Card::Ace => 'A',
            Card::Two => '2',
            Card::Three => '3',
            Card::Four => '4',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_steps_and_index() {
        for (i, card) in Card::ALL.iter().enumerate() {
            assert_eq!(card.index(), i);
            assert_eq!(card.steps() as usize, i + 1);
            assert_eq!(Card::from_steps(card.steps()), Some(*card));
        }
        assert_eq!(Card::from_steps(0), None);
        assert_eq!(Card::from_steps(5), None);
    }
}
