//! Patch descriptors and filename parsing.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::level::PatchLevel;
use super::PatchId;

/// Filename does not match the `NAME_LEVEL_SITE@INDEX_DATE.EXT` grammar.
///
/// Sources skip such candidates with a warning; a malformed name is never
/// fatal to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("filename {filename:?} does not match NAME_LEVEL_SITE@INDEX_DATE.EXT")]
pub struct ParseError {
    /// The offending filename.
    pub filename: String,
}

/// Immutable patch descriptor.
///
/// Parsed from a source filename such as `Cropland_D_World@7_20200101.bin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchInfo {
    /// Level-of-detail tier.
    pub level: PatchLevel,
    /// Data layer name (e.g. "Cropland").
    pub name: String,
    /// Site name (e.g. "World").
    pub site: String,
    /// Index within the level's 32-ary decomposition.
    pub index: u32,
    /// Source filename the descriptor was parsed from.
    pub filename: String,
    /// Numeric date stamp from the filename.
    pub date: i64,
}

impl PatchInfo {
    /// Global identity: site + name + level + index.
    ///
    /// Used as the spatial index key and as the cache key for derived
    /// render objects.
    pub fn id(&self) -> PatchId {
        format!("{}{}{}{}", self.site, self.name, self.level, self.index)
    }
}

// Serde needs PatchLevel as a letter so persisted records stay readable.
impl Serialize for PatchLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PatchLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut chars = text.chars();
        match (chars.next().and_then(PatchLevel::from_letter), chars.next()) {
            (Some(level), None) => Ok(level),
            _ => Err(serde::de::Error::custom(format!(
                "invalid patch level {:?}",
                text
            ))),
        }
    }
}

fn info_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?)_([A-F])_(.+?)@(\d+)_(\d+)\.[A-Za-z0-9]+$")
            .expect("patch filename pattern is valid")
    })
}

/// Parse a patch filename into its descriptor.
///
/// The grammar is `NAME_LEVEL_SITE@INDEX_DATE.EXT` with LEVEL one of
/// `A`..`F`. Returns [`ParseError`] on any mismatch.
pub fn parse_info(filename: &str) -> Result<PatchInfo, ParseError> {
    let malformed = || ParseError {
        filename: filename.to_string(),
    };

    let captures = info_pattern().captures(filename).ok_or_else(malformed)?;

    let level = captures[2]
        .chars()
        .next()
        .and_then(PatchLevel::from_letter)
        .ok_or_else(malformed)?;
    let index: u32 = captures[4].parse().map_err(|_| malformed())?;
    let date: i64 = captures[5].parse().map_err(|_| malformed())?;

    Ok(PatchInfo {
        level,
        name: captures[1].to_string(),
        site: captures[3].to_string(),
        index,
        filename: filename.to_string(),
        date,
    })
}
