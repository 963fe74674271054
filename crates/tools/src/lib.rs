//! Collapsi solved DB の生成・保守ツール群
//!
//! - `builder`: シャード単位の solved DB 生成（再開・バッチ追記）
//! - `health`: バッチ統計と異常検出
//! - `merge` / `dedup` / `index`: シャードの結合、重複除去、逆引き索引
//! - `query`: 任意局面の DB 参照
//! - `manifest`: 実行マニフェスト

pub mod common;

pub mod builder;
pub mod dedup;
pub mod health;
pub mod index;
pub mod manifest;
pub mod merge;
pub mod query;

pub use collapsi_core::KeyWidth;

// ============================================================================
// CLI 共通
// ============================================================================

/// `--key-width` の値を解釈する（64 / 128）
pub fn parse_key_width(s: &str) -> Result<KeyWidth, String> {
    let bits: u32 = s
        .parse()
        .map_err(|_| format!("invalid key width '{s}' (expected 64 or 128)"))?;
    KeyWidth::from_bits(bits).ok_or_else(|| format!("unsupported key width {bits} (expected 64 or 128)"))
}

/// `--turn` の値を解釈する（0 / 1）
pub fn parse_turn(s: &str) -> Result<collapsi_core::Side, String> {
    s.parse::<u8>()
        .ok()
        .and_then(collapsi_core::Side::from_u8)
        .ok_or_else(|| format!("invalid turn '{s}' (expected 0 or 1)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_width() {
        assert_eq!(parse_key_width("64"), Ok(KeyWidth::Bits64));
        assert_eq!(parse_key_width("128"), Ok(KeyWidth::Bits128));
        assert!(parse_key_width("32").is_err());
        assert!(parse_key_width("x").is_err());
    }

    #[test]
    fn test_parse_turn() {
        assert_eq!(parse_turn("1"), Ok(collapsi_core::Side::Second));
        assert!(parse_turn("2").is_err());
    }
}
