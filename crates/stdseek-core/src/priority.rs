//! Source priority from measured latency and query category.
//!
//! ```text
//!   declared order ──► base_order (ascending latency, ∞ last)
//!                          │
//!                          ▼
//!                   category_order
//!        Primary: [fastest, authoritative, rest…]
//!        Other:   [rest…, authoritative]
//! ```
//!
//! Both steps are pure and stable: ties keep the declared order, so the
//! same latencies always produce the same order.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::normalize::QueryCategory;

/// Consecutive availability failures after which a source is treated as
/// unavailable until the next benchmark.
pub const FAILURE_THRESHOLD: u32 = 3;

/// Measured round-trip of the benchmark query. `Unavailable` sorts after
/// every measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Latency {
    Measured(Duration),
    Unavailable,
}

impl Latency {
    pub fn is_available(&self) -> bool {
        matches!(self, Latency::Measured(_))
    }

    pub fn as_millis(&self) -> Option<u128> {
        match self {
            Latency::Measured(d) => Some(d.as_millis()),
            Latency::Unavailable => None,
        }
    }
}

/// Live, per-process state of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceHealth {
    pub source_name: String,
    #[serde(serialize_with = "ser_latency")]
    pub last_measured_latency: Option<Latency>,
    pub last_probe_time: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

fn ser_latency<S: serde::Serializer>(l: &Option<Latency>, s: S) -> Result<S::Ok, S::Error> {
    match l.and_then(|l| l.as_millis()) {
        Some(ms) => s.serialize_some(&(ms as u64)),
        None => s.serialize_none(),
    }
}

impl SourceHealth {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            last_measured_latency: None,
            last_probe_time: None,
            consecutive_failures: 0,
        }
    }

    /// Latency used for ordering. Never-probed sources count as
    /// unavailable so they are tried last rather than skipped.
    pub fn effective_latency(&self) -> Latency {
        self.last_measured_latency.unwrap_or(Latency::Unavailable)
    }

    pub fn is_available(&self) -> bool {
        self.effective_latency().is_available()
    }

    pub fn record_probe(&mut self, latency: Latency, at: DateTime<Utc>) {
        self.last_measured_latency = Some(latency);
        self.last_probe_time = Some(at);
        if latency.is_available() {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
    }

    /// A search call answered. Clears the failure streak.
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_probe_time = Some(at);
        self.consecutive_failures = 0;
    }

    /// A search call failed for availability reasons.
    pub fn record_failure(&mut self, at: DateTime<Utc>) {
        self.last_probe_time = Some(at);
        self.consecutive_failures += 1;
        if self.consecutive_failures >= FAILURE_THRESHOLD {
            self.last_measured_latency = Some(Latency::Unavailable);
        }
    }
}

/// Sort sources ascending by latency. Unknown sources and `Unavailable`
/// ones keep their declared relative order at the end.
pub fn base_order(declared: &[String], latencies: &HashMap<String, Latency>) -> Vec<String> {
    let mut order: Vec<String> = declared.to_vec();
    order.sort_by_key(|name| {
        latencies
            .get(name)
            .copied()
            .unwrap_or(Latency::Unavailable)
    });
    order
}

/// Apply the authoritative-source rule for the query category.
pub fn category_order(
    base: Vec<String>,
    category: QueryCategory,
    authoritative: Option<&str>,
) -> Vec<String> {
    let Some(auth) = authoritative else {
        return base;
    };
    if !base.iter().any(|s| s == auth) {
        return base;
    }
    match category {
        QueryCategory::Primary => {
            if base[0] == auth {
                return base;
            }
            let mut order = Vec::with_capacity(base.len());
            order.push(base[0].clone());
            order.push(auth.to_string());
            order.extend(base.into_iter().skip(1).filter(|s| s != auth));
            order
        }
        QueryCategory::Other => {
            let mut order: Vec<String> = base.into_iter().filter(|s| s != auth).collect();
            order.push(auth.to_string());
            order
        }
    }
}

/// Full ordering: latency first, then the category rule.
pub fn priority_order(
    declared: &[String],
    latencies: &HashMap<String, Latency>,
    category: QueryCategory,
    authoritative: Option<&str>,
) -> Vec<String> {
    category_order(base_order(declared, latencies), category, authoritative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn lat(pairs: &[(&str, Option<u64>)]) -> HashMap<String, Latency> {
        pairs
            .iter()
            .map(|(n, ms)| {
                let l = match ms {
                    Some(ms) => Latency::Measured(Duration::from_millis(*ms)),
                    None => Latency::Unavailable,
                };
                (n.to_string(), l)
            })
            .collect()
    }

    #[test]
    fn test_primary_forces_authoritative_second() {
        let latencies = lat(&[("A", Some(500)), ("B", Some(100)), ("C", None)]);
        let order = priority_order(
            &names(&["A", "B", "C"]),
            &latencies,
            QueryCategory::Primary,
            Some("C"),
        );
        assert_eq!(order, names(&["B", "C", "A"]));
    }

    #[test]
    fn test_primary_keeps_authoritative_first_when_fastest() {
        let latencies = lat(&[("A", Some(500)), ("B", Some(100)), ("C", Some(50))]);
        let order = priority_order(
            &names(&["A", "B", "C"]),
            &latencies,
            QueryCategory::Primary,
            Some("C"),
        );
        assert_eq!(order, names(&["C", "B", "A"]));
    }

    #[test]
    fn test_other_moves_authoritative_last() {
        let latencies = lat(&[("A", Some(500)), ("B", Some(100)), ("C", Some(50))]);
        let order = priority_order(
            &names(&["A", "B", "C"]),
            &latencies,
            QueryCategory::Other,
            Some("C"),
        );
        assert_eq!(order, names(&["B", "A", "C"]));
    }

    #[test]
    fn test_unavailable_keep_declared_order() {
        let latencies = lat(&[("A", None), ("B", Some(10)), ("C", None), ("D", Some(10))]);
        let order = base_order(&names(&["A", "B", "C", "D"]), &latencies);
        assert_eq!(order, names(&["B", "D", "A", "C"]));
    }

    #[test]
    fn test_missing_authoritative_is_ignored() {
        let latencies = lat(&[("A", Some(5))]);
        let order = priority_order(&names(&["A"]), &latencies, QueryCategory::Primary, Some("Z"));
        assert_eq!(order, names(&["A"]));
    }

    #[test]
    fn test_failure_streak_marks_unavailable() {
        let now = Utc::now();
        let mut h = SourceHealth::new("zby");
        h.record_probe(Latency::Measured(Duration::from_millis(80)), now);
        for _ in 0..FAILURE_THRESHOLD {
            h.record_failure(now);
        }
        assert!(!h.is_available());
        h.record_success(now);
        assert_eq!(h.consecutive_failures, 0);
    }
}
