//! Co-occurrence graph construction.
//!
//! Turns decoded records into a weighted identity graph. Two identities are
//! related when they appear in the same screenshot. Each shared screenshot
//! adds a weight that decays with age, and the pair's similarity is the
//! Jaccard coefficient of the two identities' capture-time sets. Rarely seen
//! identities and weak pairs are pruned.
//!
//! The build is a pure function of the records and the reference time: every
//! call produces a fresh graph.

pub mod range;

pub use range::DateRange;

use crate::metadata::DecodedRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Minimum Jaccard similarity for an edge.
pub const SIMILARITY_THRESHOLD: f64 = 0.10;

/// Minimum accumulated decayed weight for an edge.
pub const WEIGHT_THRESHOLD: f64 = 1.0;

/// Appearance floor below which no identity becomes a node.
pub const MIN_APPEARANCES: f64 = 2.0;

/// Decay horizon in months: a co-occurrence this old counts `1/e`.
const DECAY_MONTHS: f64 = 12.0;

/// A "month" for decay purposes.
const MONTH_MILLIS: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// An admitted identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Identity id.
    pub id: String,
    /// First display name seen, or the id.
    pub display_name: String,
    /// Number of records the identity appears in.
    pub appearance_count: usize,
}

/// An admitted relationship. `source < target` lexicographically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    /// Lesser id of the pair.
    pub source: String,
    /// Greater id of the pair.
    pub target: String,
    /// Sum of time-decayed co-occurrence weights.
    pub weight: f64,
    /// Jaccard similarity of capture-time sets.
    pub similarity: f64,
}

/// Node and edge lists handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    /// Admitted identities.
    pub nodes: Vec<Node>,
    /// Admitted relationships; endpoints are always in `nodes`.
    pub edges: Vec<Edge>,
}

/// Accumulated statistics for one unordered pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairStats {
    /// Sum of decayed weights.
    pub weight: f64,
    /// Latest computed similarity.
    pub similarity: f64,
}

/// Unfiltered aggregates from both passes over the records.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// First display name seen per identity (may be absent).
    pub display_names: BTreeMap<String, Option<String>>,
    /// Distinct capture times (epoch millis) per identity.
    pub timestamps: BTreeMap<String, BTreeSet<i64>>,
    /// Records each identity appears in.
    pub appearances: BTreeMap<String, usize>,
    /// Statistics per canonical `(lesser, greater)` pair.
    pub pairs: BTreeMap<(String, String), PairStats>,
}

impl Aggregation {
    /// Stats for a pair in either order.
    pub fn pair(&self, a: &str, b: &str) -> Option<&PairStats> {
        let key = canonical_pair(a, b);
        self.pairs.get(&(key.0.to_string(), key.1.to_string()))
    }
}

/// Builds graphs relative to a fixed reference time.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    now: DateTime<Utc>,
    range: DateRange,
}

/// A record reduced to what the build needs.
struct UsableRecord {
    millis: i64,
    /// Distinct ids in order of first appearance.
    ids: Vec<String>,
    /// Display names aligned with `ids`.
    names: Vec<Option<String>>,
}

impl GraphBuilder {
    /// Builder using `now` as the decay reference.
    pub fn new(now: DateTime<Utc>) -> Self {
        GraphBuilder {
            now,
            range: DateRange::unbounded(),
        }
    }

    /// Restrict input to records captured within `range`.
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Run both aggregation passes without any pruning.
    pub fn aggregate(&self, records: &[DecodedRecord]) -> Aggregation {
        let usable: Vec<UsableRecord> = self
            .range
            .filter(records)
            .into_iter()
            .filter_map(usable_record)
            .collect();

        let mut agg = Aggregation::default();

        // Pass 1: names and capture-time sets.
        for record in &usable {
            for (id, name) in record.ids.iter().zip(&record.names) {
                agg.display_names
                    .entry(id.clone())
                    .or_insert_with(|| name.clone());
                agg.timestamps
                    .entry(id.clone())
                    .or_default()
                    .insert(record.millis);
            }
        }

        // Pass 2: appearance counts, decayed weights, similarity.
        for record in &usable {
            let decay = decay_factor(self.now.timestamp_millis(), record.millis);

            for id in &record.ids {
                *agg.appearances.entry(id.clone()).or_insert(0) += 1;
            }

            for (i, first) in record.ids.iter().enumerate() {
                for second in &record.ids[i + 1..] {
                    let (a, b) = canonical_pair(first, second);
                    let similarity = match (agg.timestamps.get(a), agg.timestamps.get(b)) {
                        (Some(sa), Some(sb)) => jaccard(sa, sb),
                        _ => 0.0,
                    };
                    let stats = agg
                        .pairs
                        .entry((a.to_string(), b.to_string()))
                        .or_insert(PairStats {
                            weight: 0.0,
                            similarity: 0.0,
                        });
                    stats.weight += decay;
                    stats.similarity = similarity;
                }
            }
        }

        agg
    }

    /// Aggregate, prune and emit the graph.
    pub fn build(&self, records: &[DecodedRecord]) -> Graph {
        let agg = self.aggregate(records);

        let Some(floor) = appearance_floor(agg.appearances.values().copied()) else {
            log::info!("No usable records; graph is empty");
            return Graph::default();
        };

        let nodes: Vec<Node> = agg
            .appearances
            .iter()
            .filter(|&(_, &count)| count as f64 >= floor)
            .map(|(id, &count)| Node {
                id: id.clone(),
                display_name: agg
                    .display_names
                    .get(id)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| id.clone()),
                appearance_count: count,
            })
            .collect();

        let admitted: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

        let edges: Vec<Edge> = agg
            .pairs
            .iter()
            .filter(|((a, b), stats)| {
                admitted.contains(a.as_str())
                    && admitted.contains(b.as_str())
                    && edge_admitted(stats.similarity, stats.weight)
            })
            .map(|((a, b), stats)| Edge {
                source: a.clone(),
                target: b.clone(),
                weight: stats.weight,
                similarity: stats.similarity,
            })
            .collect();

        log::info!(
            "{} nodes and {} links created (floor {:.2})",
            nodes.len(),
            edges.len(),
            floor
        );
        Graph { nodes, edges }
    }
}

fn usable_record(record: &DecodedRecord) -> Option<UsableRecord> {
    let participants = record.participants()?;
    let millis = record.captured_at()?.timestamp_millis();

    let mut seen = BTreeSet::new();
    let mut ids = Vec::new();
    let mut names = Vec::new();
    for p in participants {
        if seen.insert(p.id.clone()) {
            ids.push(p.id);
            names.push(p.display_name);
        }
    }
    Some(UsableRecord { millis, ids, names })
}

fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn decay_factor(now_millis: i64, then_millis: i64) -> f64 {
    let months = (now_millis - then_millis) as f64 / MONTH_MILLIS;
    (-months / DECAY_MONTHS).exp()
}

/// Weight one co-occurrence at `then` contributes, seen from `now`.
///
/// `exp(-months / 12)` with 30-day months.
pub fn time_decay_weight(now: &DateTime<Utc>, then: &DateTime<Utc>) -> f64 {
    decay_factor(now.timestamp_millis(), then.timestamp_millis())
}

/// `|a ∩ b| / |a ∪ b|`; 0 when both are empty.
pub fn jaccard(a: &BTreeSet<i64>, b: &BTreeSet<i64>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// `max(2, mean - 2 * stddev)` over appearance counts (population stddev).
///
/// Only a lower bound; heavy outliers are kept. `None` for no identities.
pub fn appearance_floor<I>(counts: I) -> Option<f64>
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<f64> = counts.into_iter().map(|c| c as f64).collect();
    if counts.is_empty() {
        return None;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<f64>() / n;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    Some(MIN_APPEARANCES.max(mean - 2.0 * variance.sqrt()))
}

/// Whether a pair with these statistics becomes an edge.
pub fn edge_admitted(similarity: f64, weight: f64) -> bool {
    similarity >= SIMILARITY_THRESHOLD && weight >= WEIGHT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_orders_lexicographically() {
        assert_eq!(canonical_pair("usr_b", "usr_a"), ("usr_a", "usr_b"));
        assert_eq!(canonical_pair("usr_a", "usr_b"), ("usr_a", "usr_b"));
    }

    #[test]
    fn test_jaccard() {
        let a: BTreeSet<i64> = [1, 2, 3].into_iter().collect();
        let b: BTreeSet<i64> = [3, 4].into_iter().collect();
        assert!((jaccard(&a, &b) - 0.25).abs() < 1e-12);
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 0.0);
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn test_floor_for_single_identity_is_mean() {
        assert_eq!(appearance_floor([7]), Some(7.0));
        assert_eq!(appearance_floor([1]), Some(2.0));
        assert_eq!(appearance_floor(Vec::<usize>::new()), None);
    }

    #[test]
    fn test_floor_outlier_population() {
        // mean 13.25, stddev ~21.22
        assert_eq!(appearance_floor([1, 1, 1, 50]), Some(2.0));
    }

    #[test]
    fn test_floor_tight_population() {
        // mean 10, stddev 0 -> floor 10
        assert_eq!(appearance_floor([10, 10, 10]), Some(10.0));
    }

    #[test]
    fn test_edge_thresholds() {
        assert!(edge_admitted(0.10, 1.0));
        assert!(!edge_admitted(0.099999, 1.0));
        assert!(!edge_admitted(0.5, 0.999));
        assert!(edge_admitted(1.0, 3.5));
    }

    #[test]
    fn test_decay_values() {
        let now = 1_700_000_000_000i64;
        assert_eq!(decay_factor(now, now), 1.0);
        let two_years = (24.0 * MONTH_MILLIS) as i64;
        assert!((decay_factor(now, now - two_years) - (-2.0f64).exp()).abs() < 1e-12);
    }
}
