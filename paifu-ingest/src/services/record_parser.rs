//! Record line parser for the provider's bulk feed
//!
//! One feed line describes one finished game in a fixed pipe-delimited
//! mini-grammar:
//!
//! ```text
//! L<lobby>|<time_cost>|<date> <time>|<rule_name>|<ref_or_placeholder>|<result_text>
//! ```
//!
//! The result text alternates player names with signed point deltas
//! (`Alice+30Bob-10Carol-20`); the delta pattern is the separator, so the
//! matches are the deltas and the splits are the names, and the two must
//! align 1:1. Parsing is pure: no I/O, and the same line always produces the
//! same record and the same content hash.

use crate::error::{IngestError, IngestResult};
use crate::services::content_hash::content_hash;
use crate::services::reference::ReferencePattern;
use chrono::NaiveDateTime;
use paifu_common::config::ProviderConfig;
use paifu_common::{Error, Result};
use regex::Regex;

/// One parsed feed line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub lobby: String,
    /// Minutes the game took; absent or non-numeric in many feed variants
    pub time_cost_minutes: Option<i64>,
    pub play_time: NaiveDateTime,
    pub rule_name: String,
    pub ref_code: Option<String>,
    /// Participants ordered by rank (1-based, best first)
    pub results: Vec<Standing>,
    pub content_hash: String,
    pub raw_line: String,
}

/// One participant's outcome within a record
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub rank: i64,
    pub name: String,
    pub point_delta: f64,
}

/// Parser for the provider's record line grammar
#[derive(Debug, Clone)]
pub struct RecordParser {
    delta: Regex,
    reference: ReferencePattern,
    placeholder: String,
    time_format: String,
}

impl RecordParser {
    pub fn new(provider: &ProviderConfig) -> Result<Self> {
        let delta = Regex::new(&provider.delta_pattern)
            .map_err(|e| Error::Config(format!("invalid delta pattern: {}", e)))?;
        Ok(Self {
            delta,
            reference: ReferencePattern::new(&provider.ref_pattern)?,
            placeholder: provider.ref_placeholder.clone(),
            time_format: provider.time_format.clone(),
        })
    }

    /// Parse one feed line into a structured record
    pub fn parse(&self, line: &str) -> IngestResult<ParsedRecord> {
        let line = line.trim();

        let parts: Vec<&str> = line.splitn(6, '|').collect();
        if parts.len() != 6 {
            return Err(malformed("layout", line));
        }

        let lobby = parts[0].strip_prefix('L').unwrap_or(parts[0]).to_string();

        // Absent or non-numeric time cost is normal, not an error
        let time_cost_minutes = parts[1].trim().parse::<i64>().ok();

        // The play time is the record's position in history; without it the
        // record is unusable
        let play_time = NaiveDateTime::parse_from_str(parts[2].trim(), &self.time_format)
            .map_err(|_| malformed("play_time", line))?;

        let rule_name = parts[3].to_string();

        let ref_field = parts[4].trim();
        let ref_code = if ref_field == self.placeholder {
            None
        } else {
            let normalized = self.reference.normalize(ref_field);
            if normalized.is_none() {
                tracing::debug!(field = ref_field, "reference field matched nothing, treating as absent");
            }
            normalized
        };

        let results = self.parse_results(parts[5], line)?;

        Ok(ParsedRecord {
            lobby,
            time_cost_minutes,
            play_time,
            rule_name,
            ref_code,
            results,
            content_hash: content_hash(line),
            raw_line: line.to_string(),
        })
    }

    /// Split result text into ranked standings
    ///
    /// Deltas are the pattern matches, names are the splits between them.
    /// Ranking sorts by delta descending; the sort is stable so equal deltas
    /// keep their original (seat) order.
    fn parse_results(&self, text: &str, line: &str) -> IngestResult<Vec<Standing>> {
        let deltas: Vec<f64> = self
            .delta
            .find_iter(text)
            .map(|m| m.as_str().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| malformed("results", line))?;

        let mut names: Vec<&str> = self.delta.split(text).collect();
        // A well-formed result text ends with a delta, leaving one empty split
        if names.last() == Some(&"") {
            names.pop();
        }

        if deltas.is_empty() || names.len() != deltas.len() || names.iter().any(|n| n.is_empty()) {
            return Err(malformed("results", line));
        }

        let mut pairs: Vec<(String, f64)> = names
            .into_iter()
            .map(str::to_string)
            .zip(deltas)
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(pairs
            .into_iter()
            .enumerate()
            .map(|(i, (name, point_delta))| Standing {
                rank: i as i64 + 1,
                name,
                point_delta,
            })
            .collect())
    }
}

fn malformed(field: &'static str, line: &str) -> IngestError {
    IngestError::MalformedRecord {
        field,
        line: line.to_string(),
    }
}
