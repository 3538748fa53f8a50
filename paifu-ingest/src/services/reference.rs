//! Reference code handling
//!
//! A reference uniquely identifies one game log on the provider. Users paste
//! them embedded in URLs or chat snippets, so the raw input is normalized to
//! the first match of the provider pattern before use as a dedup key.
//!
//! The code itself encodes game facts: `2024010500gm-00a9-0000-12345678`
//! carries the play time (leading `YYYYMMDDHH` digits), the rule code
//! (second dash segment) and the lobby (third dash segment).

use chrono::{NaiveDate, NaiveDateTime};
use paifu_common::{Error, Result};
use regex::Regex;

/// Compiled reference pattern; the first capture group is the canonical code
#[derive(Debug, Clone)]
pub struct ReferencePattern {
    regex: Regex,
}

impl ReferencePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid reference pattern: {}", e)))?;
        Ok(Self { regex })
    }

    /// Extract the canonical reference code from raw input, first match only
    pub fn normalize(&self, raw: &str) -> Option<String> {
        self.regex
            .captures(raw)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
    }
}

/// Facts derived from a normalized reference code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRef {
    pub code: String,
    pub play_time: NaiveDateTime,
    pub rule_code: String,
    pub lobby: String,
}

impl GameRef {
    /// Derive game facts from an already-normalized code
    ///
    /// Returns `None` when the code does not have the expected
    /// `<datetime>gm-<rule>-<lobby>-<id>` segment layout.
    pub fn parse(code: &str) -> Option<GameRef> {
        let segments: Vec<&str> = code.split('-').collect();
        if segments.len() != 4 {
            return None;
        }

        let head = segments[0];
        if !head.ends_with("gm") || head.len() < 12 {
            return None;
        }

        let date = NaiveDate::parse_from_str(head.get(0..8)?, "%Y%m%d").ok()?;
        let hour: u32 = head.get(8..10)?.parse().ok()?;
        let play_time = date.and_hms_opt(hour, 0, 0)?;

        Some(GameRef {
            code: code.to_string(),
            play_time,
            rule_code: segments[1].to_string(),
            lobby: segments[2].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> ReferencePattern {
        ReferencePattern::new(r"(\d{10}gm-[0-9a-f]{4}-\d{4}-[0-9a-f]{8})").unwrap()
    }

    #[test]
    fn test_normalize_bare_code() {
        let code = "2024010521gm-00a9-0000-12ab34cd";
        assert_eq!(pattern().normalize(code), Some(code.to_string()));
    }

    #[test]
    fn test_normalize_extracts_from_url() {
        let raw = "https://tenhou.net/0/?log=2024010521gm-00a9-0000-12ab34cd&tw=2";
        assert_eq!(
            pattern().normalize(raw),
            Some("2024010521gm-00a9-0000-12ab34cd".to_string())
        );
    }

    #[test]
    fn test_normalize_first_match_only() {
        let raw = "2024010521gm-00a9-0000-12ab34cd and 2024010600gm-00b9-0000-deadbeef";
        assert_eq!(
            pattern().normalize(raw),
            Some("2024010521gm-00a9-0000-12ab34cd".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(pattern().normalize("not a reference"), None);
        assert_eq!(pattern().normalize(""), None);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        assert!(ReferencePattern::new("([unclosed").is_err());
    }

    #[test]
    fn test_game_ref_derivation() {
        let gref = GameRef::parse("2024010521gm-00a9-0002-12ab34cd").unwrap();
        assert_eq!(gref.rule_code, "00a9");
        assert_eq!(gref.lobby, "0002");
        assert_eq!(
            gref.play_time,
            NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(21, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_game_ref_rejects_bad_layout() {
        assert!(GameRef::parse("2024010521gm-00a9-0000").is_none());
        assert!(GameRef::parse("20240105gm-00a9-0000-12ab34cd").is_none());
        assert!(GameRef::parse("2024019921gm-00a9-0000-12ab34cd").is_none());
    }
}
