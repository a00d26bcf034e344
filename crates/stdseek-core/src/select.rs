//! Picking one record out of a result list.
//!
//! Keywords without a year ask for "the current version": prefer records
//! with [`Status::Current`], break ties (or the lack of any current record)
//! by the largest trailing year. Keywords that already carry a year ask for
//! that exact edition: prefer an identifier match, otherwise fall back to
//! the first candidate and flag it as low confidence.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{StandardRecord, Status};
use crate::normalize::{has_year, normalize_identifier, trailing_year};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Only current-status record.
    Current,
    /// Largest trailing year, among current records or all records.
    LatestYear,
    Exact,
    /// Nothing matched exactly; first candidate returned.
    LowConfidence,
}

#[derive(Debug, Clone, Serialize)]
pub struct Selection<'a> {
    pub record: &'a StandardRecord,
    pub kind: MatchKind,
}

/// First record with the largest trailing year.
fn latest_by_year<'a>(records: &[&'a StandardRecord]) -> Option<&'a StandardRecord> {
    let mut best: Option<(u16, &'a StandardRecord)> = None;
    for &r in records {
        if let Some(year) = trailing_year(&r.raw_identifier) {
            match best {
                Some((y, _)) if y >= year => {}
                _ => best = Some((year, r)),
            }
        }
    }
    best.map(|(_, r)| r)
}

/// Choose the current version of a standard.
pub fn select_current<'a>(candidates: &'a [StandardRecord], keyword: &str) -> Result<Selection<'a>> {
    let current: Vec<&StandardRecord> = candidates
        .iter()
        .filter(|r| r.status == Status::Current)
        .collect();

    match current.len() {
        1 => {
            return Ok(Selection {
                record: current[0],
                kind: MatchKind::Current,
            })
        }
        0 => {}
        _ => {
            let record = latest_by_year(&current).unwrap_or(current[0]);
            return Ok(Selection {
                record,
                kind: MatchKind::LatestYear,
            });
        }
    }

    let all: Vec<&StandardRecord> = candidates.iter().collect();
    latest_by_year(&all)
        .map(|record| Selection {
            record,
            kind: MatchKind::LatestYear,
        })
        .ok_or_else(|| Error::IdentifierAmbiguous(keyword.to_string()))
}

/// Choose the record whose normalized id equals the keyword's.
pub fn select_exact<'a>(candidates: &'a [StandardRecord], keyword: &str) -> Result<Selection<'a>> {
    let wanted = normalize_identifier(keyword);
    if let Some(record) = candidates.iter().find(|r| r.id == wanted) {
        return Ok(Selection {
            record,
            kind: MatchKind::Exact,
        });
    }
    let record = candidates
        .first()
        .ok_or_else(|| Error::IdentifierAmbiguous(keyword.to_string()))?;
    tracing::warn!(
        keyword,
        chosen = %record.raw_identifier,
        "no exact identifier match, using first candidate (low confidence)"
    );
    Ok(Selection {
        record,
        kind: MatchKind::LowConfidence,
    })
}

/// Dispatch on whether the keyword pins a year.
pub fn resolve<'a>(candidates: &'a [StandardRecord], keyword: &str) -> Result<Selection<'a>> {
    if has_year(keyword) {
        select_exact(candidates, keyword)
    } else {
        select_current(candidates, keyword)
    }
}
