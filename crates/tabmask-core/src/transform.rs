//! Column transforms for de-identification
//!
//! This module provides:
//! - [`TransformKind`], the closed set of masking/generalization/hashing transforms
//! - a static catalog that maps configuration names to kinds
//! - [`TransformRegistry`], which applies a kind to a single cell
//!
//! Every transform is total: `Missing` passes through unchanged and malformed
//! input degrades to a pass-through or a documented sentinel, never an error.

use crate::error::{Error, Result};
use crate::table::Cell;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Suffix appended by `TruncateMask` and used by `NameMask`
pub const MASK_SUFFIX: &str = "**";
/// Placeholder for the hidden part of phone numbers and addresses
pub const SEGMENT_MASK: &str = "****";
/// AgeBand output for a present value that is not a date
pub const INVALID_DATE: &str = "Invalid Date";

const MASK_CHAR: char = '*';

/// A named column transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransformKind {
    /// Keep the first `width` characters, then append [`MASK_SUFFIX`]
    TruncateMask(usize),
    /// Lowercase hex SHA-256 digest of the text form
    HashSha256,
    /// Partial masking of 2-4 character names
    NameMask,
    /// `0XX-****-rest` phone layout
    PhoneMask,
    /// Birth date to ten-year age band
    AgeBand,
    /// First address token followed by [`SEGMENT_MASK`]
    AddressMask,
    /// Round numbers up to the next multiple of the unit
    RoundUp(u64),
}

impl TransformKind {
    /// Base name without parameters
    pub fn base_name(&self) -> &'static str {
        match self {
            TransformKind::TruncateMask(_) => "TruncateMask",
            TransformKind::HashSha256 => "HashSHA256",
            TransformKind::NameMask => "NameMask",
            TransformKind::PhoneMask => "PhoneMask",
            TransformKind::AgeBand => "AgeBand",
            TransformKind::AddressMask => "AddressMask",
            TransformKind::RoundUp(_) => "RoundUp",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformKind::TruncateMask(width) => write!(f, "TruncateMask({})", width),
            TransformKind::RoundUp(unit) => write!(f, "RoundUp({})", unit),
            other => f.write_str(other.base_name()),
        }
    }
}

impl FromStr for TransformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();

        if let Some(kind) = lookup(name) {
            return Ok(kind);
        }

        let Some((base, rest)) = name.split_once('(') else {
            return Err(Error::UnknownTransform(name.to_string()));
        };
        let Some(param) = rest.strip_suffix(')') else {
            return Err(Error::UnknownTransform(name.to_string()));
        };
        let base = base.trim();
        let param = param.trim();

        if base.eq_ignore_ascii_case("TruncateMask") {
            let width = param
                .parse::<usize>()
                .map_err(|_| invalid_param(name, "width must be a non-negative integer"))?;
            Ok(TransformKind::TruncateMask(width))
        } else if base.eq_ignore_ascii_case("RoundUp") {
            let unit = param
                .parse::<u64>()
                .map_err(|_| invalid_param(name, "unit must be a positive integer"))?;
            if unit == 0 {
                return Err(invalid_param(name, "unit must be a positive integer"));
            }
            Ok(TransformKind::RoundUp(unit))
        } else if lookup(base).is_some() {
            Err(invalid_param(name, "transform takes no parameter"))
        } else {
            Err(Error::UnknownTransform(name.to_string()))
        }
    }
}

impl TryFrom<String> for TransformKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TransformKind> for String {
    fn from(kind: TransformKind) -> Self {
        kind.to_string()
    }
}

fn invalid_param(name: &str, message: &str) -> Error {
    Error::InvalidTransformParameter {
        name: name.to_string(),
        message: message.to_string(),
    }
}

/// A configurable transform preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Configuration name
    pub name: &'static str,
    /// The transform it selects
    pub kind: TransformKind,
    /// Short human-readable description
    pub description: &'static str,
}

/// Recognized transform presets
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "TruncateMask(2)",
        kind: TransformKind::TruncateMask(2),
        description: "keep 2 characters, append **",
    },
    CatalogEntry {
        name: "TruncateMask(3)",
        kind: TransformKind::TruncateMask(3),
        description: "keep 3 characters, append **",
    },
    CatalogEntry {
        name: "HashSHA256",
        kind: TransformKind::HashSha256,
        description: "SHA-256 hex digest, salted when a salt is configured",
    },
    CatalogEntry {
        name: "NameMask",
        kind: TransformKind::NameMask,
        description: "mask the tail of 2-4 character names",
    },
    CatalogEntry {
        name: "PhoneMask",
        kind: TransformKind::PhoneMask,
        description: "0XX-****-rest",
    },
    CatalogEntry {
        name: "AgeBand",
        kind: TransformKind::AgeBand,
        description: "birth date to 10-year age band",
    },
    CatalogEntry {
        name: "AddressMask",
        kind: TransformKind::AddressMask,
        description: "first address token + ****",
    },
    CatalogEntry {
        name: "RoundUp(100)",
        kind: TransformKind::RoundUp(100),
        description: "round up to 100 (square footage)",
    },
    CatalogEntry {
        name: "RoundUp(100000)",
        kind: TransformKind::RoundUp(100_000),
        description: "round up to 100000 (payments)",
    },
];

/// Display names used by earlier versions of the tool
const ALIASES: &[(&str, TransformKind)] = &[
    ("Replace with **", TransformKind::TruncateMask(2)),
    ("Replace with ***", TransformKind::TruncateMask(3)),
    ("SHA-256 Encrypt", TransformKind::HashSha256),
    ("Mask Phone", TransformKind::PhoneMask),
    ("Categorize Age", TransformKind::AgeBand),
    ("Mask Address", TransformKind::AddressMask),
    ("Round Up Square Footage", TransformKind::RoundUp(100)),
    ("Round Up Monthly Payment", TransformKind::RoundUp(100_000)),
];

/// Look up a preset or alias by name, ignoring ASCII case
pub fn lookup(name: &str) -> Option<TransformKind> {
    CATALOG
        .iter()
        .map(|entry| (entry.name, entry.kind))
        .chain(ALIASES.iter().copied())
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, kind)| kind)
}

/// Applies transforms to cells
///
/// Holds the hashing salt and the reference date for age computation.
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    salt: Option<String>,
    today: NaiveDate,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self {
            salt: None,
            today: Local::now().date_naive(),
        }
    }
}

impl TransformRegistry {
    /// Registry with no salt and today's local date
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every hashed value with a secret
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Pin the reference date used by `AgeBand`
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Reference date used by `AgeBand`
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Whether hashing is salted
    pub fn is_salted(&self) -> bool {
        self.salt.is_some()
    }

    /// Apply a transform to one cell
    pub fn apply(&self, kind: TransformKind, cell: &Cell) -> Cell {
        if cell.is_missing() {
            return Cell::Missing;
        }

        match kind {
            TransformKind::TruncateMask(width) => Cell::Text(truncate_mask(&cell.to_text(), width)),
            TransformKind::HashSha256 => {
                Cell::Text(sha256_hex(self.salt.as_deref(), &cell.to_text()))
            }
            TransformKind::NameMask => Cell::Text(mask_name(&cell.to_text())),
            TransformKind::PhoneMask => Cell::Text(mask_phone(&cell.to_text())),
            TransformKind::AgeBand => match cell.to_date() {
                Some(birth) => Cell::Text(age_band(age_on(birth, self.today)).to_string()),
                None => Cell::Text(INVALID_DATE.to_string()),
            },
            TransformKind::AddressMask => Cell::Text(mask_address(&cell.to_text())),
            // Non-numeric values are left unchanged.
            TransformKind::RoundUp(unit) => match cell.as_f64() {
                Some(value) => round_up(value, unit),
                None => cell.clone(),
            },
        }
    }
}

/// Keep the first `width` characters and append [`MASK_SUFFIX`]
pub fn truncate_mask(text: &str, width: usize) -> String {
    let mut masked: String = text.chars().take(width).collect();
    masked.push_str(MASK_SUFFIX);
    masked
}

/// SHA-256 of `salt || text` as lowercase hex
pub fn sha256_hex(salt: Option<&str>, text: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(salt) = salt {
        hasher.update(salt.as_bytes());
    }
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mask a name by its character count; other lengths are returned as-is
pub fn mask_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let visible = match chars.len() {
        2 | 3 => 1,
        4 => 2,
        _ => return name.to_string(),
    };

    let mut masked: String = chars[..visible].iter().collect();
    masked.extend(std::iter::repeat(MASK_CHAR).take(chars.len() - visible));
    masked
}

/// `0` + first two digits + `-****-` + digits from the seventh on
///
/// Short input yields empty segments.
pub fn mask_phone(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let head: String = chars.iter().take(2).collect();
    let tail: String = chars.iter().skip(6).collect();
    format!("0{}-{}-{}", head, SEGMENT_MASK, tail)
}

/// First whitespace-separated token followed by [`SEGMENT_MASK`]
pub fn mask_address(address: &str) -> String {
    let mut tokens = address.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(first), Some(_)) => format!("{} {}", first, SEGMENT_MASK),
        _ => address.to_string(),
    }
}

/// Whole years between `birth` and `today`
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Ten-year band label for an age
pub fn age_band(age: i32) -> &'static str {
    match age {
        i32::MIN..=19 => "10s",
        20..=29 => "20s",
        30..=39 => "30s",
        40..=49 => "40s",
        _ => "50s-or-above",
    }
}

/// `ceil(value / unit) * unit`, as an integer when the result is integral
pub fn round_up(value: f64, unit: u64) -> Cell {
    let unit = unit as f64;
    let rounded = (value / unit).ceil() * unit;

    if rounded.fract() == 0.0 && rounded.abs() < 9.0e15 {
        Cell::Integer(rounded as i64)
    } else {
        Cell::Float(rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TransformRegistry {
        TransformRegistry::new().with_today(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("TruncateMask(2)".parse::<TransformKind>().unwrap(), TransformKind::TruncateMask(2));
        assert_eq!("TruncateMask(5)".parse::<TransformKind>().unwrap(), TransformKind::TruncateMask(5));
        assert_eq!("hashsha256".parse::<TransformKind>().unwrap(), TransformKind::HashSha256);
        assert_eq!("RoundUp( 250 )".parse::<TransformKind>().unwrap(), TransformKind::RoundUp(250));
        assert_eq!("Round Up Monthly Payment".parse::<TransformKind>().unwrap(), TransformKind::RoundUp(100_000));
        assert_eq!("Replace with ***".parse::<TransformKind>().unwrap(), TransformKind::TruncateMask(3));
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        assert!(matches!("Shuffle".parse::<TransformKind>(), Err(Error::UnknownTransform(_))));
        assert!(matches!(
            "RoundUp(0)".parse::<TransformKind>(),
            Err(Error::InvalidTransformParameter { .. })
        ));
        assert!(matches!(
            "RoundUp(1.5)".parse::<TransformKind>(),
            Err(Error::InvalidTransformParameter { .. })
        ));
        assert!(matches!(
            "NameMask(3)".parse::<TransformKind>(),
            Err(Error::InvalidTransformParameter { .. })
        ));
    }

    #[test]
    fn test_display_round_trips_catalog() {
        for entry in CATALOG {
            assert_eq!(entry.kind.to_string(), entry.name);
            assert_eq!(entry.name.parse::<TransformKind>().unwrap(), entry.kind);
        }
    }

    #[test]
    fn test_missing_passes_through_every_kind() {
        let registry = registry().with_salt("pepper");
        for entry in CATALOG {
            assert_eq!(registry.apply(entry.kind, &Cell::Missing), Cell::Missing, "{}", entry.name);
        }
    }

    #[test]
    fn test_truncate_mask() {
        let registry = registry();
        assert_eq!(registry.apply(TransformKind::TruncateMask(2), &text("홍길동")), text("홍길**"));
        assert_eq!(registry.apply(TransformKind::TruncateMask(3), &Cell::Integer(12345)), text("123**"));
        assert_eq!(registry.apply(TransformKind::TruncateMask(5), &text("ab")), text("ab**"));
    }

    #[test]
    fn test_hash_sha256() {
        let registry = registry();
        let digest = registry.apply(TransformKind::HashSha256, &text("abc"));
        assert_eq!(
            digest,
            text("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(digest, registry.apply(TransformKind::HashSha256, &text("abc")));
        assert_ne!(digest, registry.apply(TransformKind::HashSha256, &text("abd")));
    }

    #[test]
    fn test_hash_salt_changes_digest() {
        let plain = registry().apply(TransformKind::HashSha256, &text("abc"));
        let salted = registry().with_salt("password").apply(TransformKind::HashSha256, &text("abc"));
        assert_ne!(plain, salted);
        assert_eq!(salted, text(&sha256_hex(None, "passwordabc")));
    }

    #[test]
    fn test_name_mask() {
        assert_eq!(mask_name("ab"), "a*");
        assert_eq!(mask_name("abc"), "a**");
        assert_eq!(mask_name("abcd"), "ab**");
        assert_eq!(mask_name("abcde"), "abcde");
        assert_eq!(mask_name("a"), "a");
        assert_eq!(mask_name("김철수"), "김**");
    }

    #[test]
    fn test_phone_mask() {
        let registry = registry();
        let phone = Cell::parse("01012345678");
        assert_eq!(registry.apply(TransformKind::PhoneMask, &phone), text("010-****-5678"));
        assert_eq!(mask_phone("12"), "012-****-");
        assert_eq!(mask_phone(""), "0-****-");
    }

    #[test]
    fn test_age_band_boundaries() {
        let registry = registry();
        let twenty = Cell::Text("2006-10-18".to_string());
        let almost = Cell::Text("2006-10-19".to_string());
        assert_eq!(registry.apply(TransformKind::AgeBand, &twenty), text("20s"));
        assert_eq!(registry.apply(TransformKind::AgeBand, &almost), text("10s"));
        assert_eq!(registry.apply(TransformKind::AgeBand, &text("1970-01-01")), text("50s-or-above"));
        assert_eq!(registry.apply(TransformKind::AgeBand, &Cell::Integer(19900101)), text("30s"));
    }

    #[test]
    fn test_age_band_invalid_date() {
        let registry = registry();
        assert_eq!(registry.apply(TransformKind::AgeBand, &text("yesterday")), text(INVALID_DATE));
        assert_eq!(registry.apply(TransformKind::AgeBand, &Cell::Float(1.5)), text(INVALID_DATE));
        assert_eq!(registry.apply(TransformKind::AgeBand, &Cell::Missing), Cell::Missing);
    }

    #[test]
    fn test_age_on_leap_day() {
        let birth = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2020, 2, 28).unwrap()), 19);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2020, 2, 29).unwrap()), 20);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap()), 21);
    }

    #[test]
    fn test_address_mask() {
        assert_eq!(mask_address("Seoul Gangnam-gu 123"), "Seoul ****");
        assert_eq!(mask_address("Seoul"), "Seoul");
        assert_eq!(mask_address("  Busan   Haeundae "), "Busan ****");
    }

    #[test]
    fn test_round_up() {
        let registry = registry();
        let kind = TransformKind::RoundUp(100);
        assert_eq!(registry.apply(kind, &Cell::Integer(250)), Cell::Integer(300));
        assert_eq!(registry.apply(kind, &Cell::Integer(300)), Cell::Integer(300));
        assert_eq!(registry.apply(kind, &Cell::Integer(0)), Cell::Integer(0));
        assert_eq!(registry.apply(kind, &Cell::Float(100.5)), Cell::Integer(200));
        assert_eq!(registry.apply(kind, &Cell::Integer(-250)), Cell::Integer(-200));
        assert_eq!(
            registry.apply(TransformKind::RoundUp(100_000), &Cell::Integer(1_250_000)),
            Cell::Integer(1_300_000)
        );
    }

    #[test]
    fn test_round_up_leaves_non_numeric() {
        let registry = registry();
        assert_eq!(registry.apply(TransformKind::RoundUp(100), &text("n/a-ish")), text("n/a-ish"));
    }
}
