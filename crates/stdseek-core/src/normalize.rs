//! Identifier canonicalization and status vocabulary mapping.
//!
//! [`normalize_identifier`] produces the merge key for every record: all
//! whitespace, hyphens, slashes and periods removed, then lowercased.
//! `"GB/T 1234-2020"` and `"gbt12342020"` both become `"gbt12342020"`.
//!
//! [`map_status`] folds each source's status text or numeric code into the
//! four-value [`Status`]. Anything outside the table becomes
//! [`Status::Unknown`] with a warning; it never fails.

use crate::models::Status;

/// Canonical dedup key for a raw identifier. Idempotent.
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '/' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Trailing `-YYYY` year of an identifier, e.g. `2024` for
/// `"GB/T 3324-2024"`.
pub fn trailing_year(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    let (head, year) = raw.rsplit_once('-')?;
    if head.trim().is_empty() || year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    year.parse().ok()
}

/// True when the keyword already pins a version year.
pub fn has_year(keyword: &str) -> bool {
    trailing_year(keyword).is_some()
}

/// The identifier with any trailing `-YYYY` removed.
pub fn strip_year(raw: &str) -> &str {
    let raw = raw.trim();
    match trailing_year(raw) {
        Some(_) => raw[..raw.len() - 5].trim_end(),
        None => raw,
    }
}

/// Query category used for source reordering.
///
/// National `GB` standards are `Primary`: the authoritative portal must
/// be consulted early for them. Everything else (industry and local
/// standards) is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    Primary,
    Other,
}

pub fn classify(keyword: &str) -> QueryCategory {
    let head: String = keyword
        .trim_start()
        .chars()
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if head == "GB" {
        QueryCategory::Primary
    } else {
        QueryCategory::Other
    }
}

/// Fixed status table. Entries are matched against the trimmed,
/// lowercased input.
const STATUS_TABLE: &[(&str, Status)] = &[
    ("现行", Status::Current),
    ("现行有效", Status::Current),
    ("有效", Status::Current),
    ("current", Status::Current),
    ("active", Status::Current),
    ("valid", Status::Current),
    ("即将实施", Status::Pending),
    ("待实施", Status::Pending),
    ("pending", Status::Pending),
    ("upcoming", Status::Pending),
    ("废止", Status::Withdrawn),
    ("作废", Status::Withdrawn),
    ("被代替", Status::Withdrawn),
    ("被替代", Status::Withdrawn),
    ("已废止", Status::Withdrawn),
    ("withdrawn", Status::Withdrawn),
    ("abolished", Status::Withdrawn),
    ("replaced", Status::Withdrawn),
    // Numeric codes used by the zhenggui search API.
    ("1", Status::Current),
    ("2", Status::Pending),
    ("3", Status::Withdrawn),
    ("4", Status::Withdrawn),
];

/// Map free-text or coded status into [`Status`].
pub fn map_status(source_name: &str, raw: &str) -> Status {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return Status::Unknown;
    }
    if let Some((_, status)) = STATUS_TABLE.iter().find(|(k, _)| *k == key) {
        return *status;
    }
    tracing::warn!(source = source_name, status = raw, "unmapped status value");
    Status::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_identifier("GB/T 1234-2020"), "gbt12342020");
        assert_eq!(
            normalize_identifier("GB/T 1234-2020"),
            normalize_identifier("gbt12342020")
        );
        assert_eq!(normalize_identifier("QB/T 1951.1-2010"), "qbt195112010");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["GB/T 3324-2024", " db11/ 1234. 5 ", "ＧＢ 1", "", "---"] {
            let once = normalize_identifier(raw);
            assert_eq!(normalize_identifier(&once), once);
        }
    }

    #[test]
    fn test_normalize_only_punctuation_is_empty() {
        assert_eq!(normalize_identifier(" / - . "), "");
    }

    #[test]
    fn test_trailing_year() {
        assert_eq!(trailing_year("GB/T 3324-2024"), Some(2024));
        assert_eq!(trailing_year("GB/T 3324"), None);
        assert_eq!(trailing_year("GB/T 3324-24"), None);
        assert_eq!(trailing_year("-2020"), None);
        assert!(has_year("QB/T 1951.1-2010"));
    }

    #[test]
    fn test_strip_year() {
        assert_eq!(strip_year("GB/T 3324-2024"), "GB/T 3324");
        assert_eq!(strip_year("GB/T 3324"), "GB/T 3324");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("GB/T 3324"), QueryCategory::Primary);
        assert_eq!(classify(" gb 6675"), QueryCategory::Primary);
        assert_eq!(classify("QB/T 1951"), QueryCategory::Other);
        assert_eq!(classify("G"), QueryCategory::Other);
    }

    #[test]
    fn test_map_status() {
        assert_eq!(map_status("gbw", "现行"), Status::Current);
        assert_eq!(map_status("gbw", " 即将实施 "), Status::Pending);
        assert_eq!(map_status("zby", "3"), Status::Withdrawn);
        assert_eq!(map_status("by", "Withdrawn"), Status::Withdrawn);
        assert_eq!(map_status("by", "???"), Status::Unknown);
        assert_eq!(map_status("by", ""), Status::Unknown);
    }
}
