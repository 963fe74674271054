//! テキスト形式 `a,2,3,4,x,o,c,turn`
//!
//! 各フィールドは16進（`0x` 接頭辞は任意）。出力はマスク4桁、turn 1桁。

use std::fmt;
use std::str::FromStr;

use super::error::StateError;
use super::state::GameState;

fn parse_hex(index: usize, field: &str) -> Result<u16, StateError> {
    let trimmed = field.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16).map_err(|_| StateError::InvalidField {
        index,
        value: field.to_string(),
    })
}

impl FromStr for GameState {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(',').collect();
        if fields.len() != 8 {
            return Err(StateError::FieldCount(fields.len()));
        }
        let mut masks = [0u16; 7];
        for (i, field) in fields[..7].iter().enumerate() {
            masks[i] = parse_hex(i, field)?;
        }
        let turn = parse_hex(7, fields[7])?;
        let turn = u8::try_from(turn).map_err(|_| StateError::InvalidField {
            index: 7,
            value: fields[7].to_string(),
        })?;
        GameState::from_raw(masks, turn)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mask in self.raw_masks() {
            write!(f, "{mask:04x},")?;
        }
        write!(f, "{:x}", self.turn() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    const FIXTURE: &str = "003f,03c0,3c00,c000,0001,0002,0000,0";

    #[test]
    fn test_parse_and_display() {
        let s: GameState = FIXTURE.parse().unwrap();
        assert_eq!(s.turn(), Side::First);
        assert_eq!(s.raw_masks()[1], 0x03C0);
        assert_eq!(s.to_string(), FIXTURE);

        let prefixed: GameState = "0x3f,0x3c0,0x3c00,0xc000,0x1,0x2,0x0,1".parse().unwrap();
        assert_eq!(prefixed.turn(), Side::Second);
        assert_eq!(prefixed.with_turn(Side::First), s);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("1,2,3".parse::<GameState>(), Err(StateError::FieldCount(3)));
        assert!(matches!(
            "003f,zz,3c00,c000,0001,0002,0000,0".parse::<GameState>(),
            Err(StateError::InvalidField { index: 1, .. })
        ));
        assert_eq!(
            "003f,03c0,3c00,c000,0001,0002,0000,5".parse::<GameState>(),
            Err(StateError::InvalidTurn(5))
        );
        assert_eq!(
            "003f,03c0,3c00,c000,0001,0002,0000,100".parse::<GameState>(),
            Err(StateError::InvalidField {
                index: 7,
                value: "100".to_string()
            })
        );
    }
}
