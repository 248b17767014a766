//! Recovers the record list that the domain page embeds in inline scripts.
//!
//! The page is not a stable contract: it may carry zero, one or several
//! `<script>` blocks declaring `records`, and any of them may be malformed.
//! Extraction runs in two stages. [`locate_segments`] finds every candidate
//! declaration without caring whether it parses, then [`parse_segment`] turns
//! each one into a [`BlockOutcome`]. The outcomes are folded so that any
//! parsed block wins over broken ones.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::api::models::DnsRecord;
use crate::error::{DnsError, Result};

pub const DEFAULT_DUMP_PATH: &str = "njalla_records_dump.html";

static SCRIPT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").unwrap());

// The declaration may follow other statements on the same line.
static DECLARATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[;{}\s])[A-Za-z_$][\w$]*\s+records\s*=\s*(\[)").unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Parsed(Vec<DnsRecord>),
    /// Valid JSON, but not an array of records.
    NotAList,
    Failed(String),
}

/// Returns the array literal of each script block declaring `records`, in
/// document order, without the declaration or anything following the array.
pub fn locate_segments(html: &str) -> Vec<&str> {
    SCRIPT_REGEX
        .captures_iter(html)
        .filter_map(|script| {
            let body = script.get(1)?.as_str();
            let start = DECLARATION_REGEX.captures(body)?.get(1)?.start();
            Some(array_literal(&body[start..]))
        })
        .collect()
}

/// Cuts `text`, which starts at `[`, after the bracket closing the array.
/// Brackets inside string literals are ignored. An unterminated array yields
/// the rest of the line so that it is reported as a parse failure.
fn array_literal(text: &str) -> &str {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[..=i];
                }
            }
            _ => {}
        }
    }

    let line = text.lines().next().unwrap_or_default();
    line.trim_end().trim_end_matches(';').trim_end()
}

/// Doubles every backslash that does not start a valid JSON escape, so that
/// raw DKIM keys survive strict parsing.
pub fn normalize_escapes(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let escape_len = match chars.get(i + 1).copied() {
            Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => 2,
            Some('u') if chars.len() > i + 5 && chars[i + 2..i + 6].iter().all(|c| c.is_ascii_hexdigit()) => 6,
            _ => 0,
        };
        if escape_len == 0 {
            out.push_str("\\\\");
            i += 1;
        } else {
            out.extend(&chars[i..i + escape_len]);
            i += escape_len;
        }
    }
    out
}

/// A block is all or nothing: one bad record discards the whole block.
pub fn parse_segment(segment: &str) -> BlockOutcome {
    let normalized = normalize_escapes(segment);
    match serde_json::from_str::<Value>(&normalized) {
        Ok(value @ Value::Array(_)) => match serde_json::from_value::<Vec<DnsRecord>>(value) {
            Ok(records) => BlockOutcome::Parsed(records),
            Err(e) => BlockOutcome::Failed(e.to_string()),
        },
        Ok(_) => BlockOutcome::NotAList,
        Err(e) => BlockOutcome::Failed(e.to_string()),
    }
}

pub struct RecordExtractor {
    dump_path: PathBuf,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_DUMP_PATH)
    }
}

impl RecordExtractor {
    pub fn new(dump_path: impl Into<PathBuf>) -> Self {
        Self {
            dump_path: dump_path.into(),
        }
    }

    pub fn dump_path(&self) -> &Path {
        &self.dump_path
    }

    /// Best effort: a failed write must not hide the extraction failure.
    fn dump(&self, html: &str) -> Option<PathBuf> {
        match fs::write(&self.dump_path, html) {
            Ok(()) => {
                error!("Page saved to {}", self.dump_path.display());
                Some(self.dump_path.clone())
            }
            Err(e) => {
                error!("Unable to save page to {}: {}", self.dump_path.display(), e);
                None
            }
        }
    }

    /// An empty result means the page declared no records at all. Fails only
    /// when blocks were found, none could be parsed, and nothing was recovered.
    pub fn extract(&self, html: &str) -> Result<Vec<DnsRecord>> {
        let segments = locate_segments(html);
        debug!("Found {} records block(s)", segments.len());

        let (records, failures) = segments.into_iter().enumerate().fold(
            (Vec::new(), 0usize),
            |(mut records, failures), (index, segment)| match parse_segment(segment) {
                BlockOutcome::Parsed(parsed) => {
                    records.extend(parsed);
                    (records, failures)
                }
                BlockOutcome::NotAList => {
                    debug!("Records block {} is not a list, skipping", index);
                    (records, failures)
                }
                BlockOutcome::Failed(reason) => {
                    warn!("Records block {} could not be parsed: {}", index, reason);
                    (records, failures + 1)
                }
            },
        );

        if records.is_empty() && failures > 0 {
            error!("No records recovered from {} broken block(s)", failures);
            return Err(DnsError::ExtractionFailed {
                dump_path: self.dump(html),
            });
        }
        Ok(records)
    }
}
