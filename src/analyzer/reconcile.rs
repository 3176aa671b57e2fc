//! Left-join of aggregation results against a complete reference set, so that
//! entities without any activity still show up with an explicit zero.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::analyzer::aggregate::{Aggregate, GroupKey};

/// One entity of the reference set a summary is reconciled against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub key: GroupKey,
    pub label: String,
    /// Secondary label shown next to the entity (e.g. the operator's team).
    pub group: Option<String>,
}

impl ReferenceEntry {
    pub fn new(key: GroupKey, label: impl Into<String>) -> Self {
        ReferenceEntry {
            key,
            label: label.into(),
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub key: GroupKey,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Count descending, ties kept in reference order.
    CountDesc,
    /// Reference order (time series).
    Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total: usize,
    pub mean_per_entity: f64,
    pub top: Option<TopEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciled {
    pub rows: Vec<SummaryRow>,
    /// Sum of the reconciled counts.
    pub total: usize,
    /// Counts that fell on keys outside the reference set.
    pub excluded: usize,
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Percentage rounded to one decimal; 0 when `total` is 0.
pub(crate) fn pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(count as f64 / total as f64 * 100.0)
    }
}

/// Every entry of `reference` appears exactly once in the output, with a
/// count of 0 when the aggregation has nothing for it.
pub fn reconcile(aggregates: &[Aggregate], reference: &[ReferenceEntry], order: RowOrder) -> Reconciled {
    let counts: HashMap<&GroupKey, usize> = aggregates.iter().map(|a| (&a.key, a.count)).collect();
    let known: HashSet<&GroupKey> = reference.iter().map(|e| &e.key).collect();

    let excluded: usize = aggregates
        .iter()
        .filter(|a| !known.contains(&a.key))
        .map(|a| a.count)
        .sum();

    let mut rows: Vec<SummaryRow> = reference
        .iter()
        .map(|entry| SummaryRow {
            key: entry.key.clone(),
            label: entry.label.clone(),
            group: entry.group.clone(),
            count: counts.get(&entry.key).copied().unwrap_or(0),
            percentage: None,
        })
        .collect();

    if order == RowOrder::CountDesc {
        // sort_by is stable: equal counts keep reference order
        rows.sort_by(|a, b| b.count.cmp(&a.count));
    }

    let total = rows.iter().map(|r| r.count).sum();

    Reconciled {
        rows,
        total,
        excluded,
    }
}

impl Reconciled {
    pub fn with_percentages(mut self) -> Self {
        let total = self.total;
        for row in &mut self.rows {
            row.percentage = Some(pct(row.count, total));
        }
        self
    }

    /// Labels of the entities with no activity at all in the reconciled set.
    pub fn zero_count(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| r.count == 0)
            .map(|r| r.label.clone())
            .collect()
    }

    pub fn stats(&self) -> ReportStats {
        let mean_per_entity = if self.rows.is_empty() {
            0.0
        } else {
            round1(self.total as f64 / self.rows.len() as f64)
        };
        // first row with the highest count
        let top = self
            .rows
            .iter()
            .fold(None::<&SummaryRow>, |best, r| match best {
                Some(b) if b.count >= r.count => Some(b),
                _ => Some(r),
            })
            .filter(|r| r.count > 0)
            .map(|r| TopEntry {
                label: r.label.clone(),
                count: r.count,
            });
        ReportStats {
            total: self.total,
            mean_per_entity,
            top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::aggregate::KeyPart;

    fn entries(codes: &[i64]) -> Vec<ReferenceEntry> {
        codes
            .iter()
            .map(|&c| ReferenceEntry::new(vec![KeyPart::Code(c)], format!("op{c}")))
            .collect()
    }

    fn agg(code: i64, count: usize) -> Aggregate {
        Aggregate {
            key: vec![KeyPart::Code(code)],
            count,
        }
    }

    #[test]
    fn test_every_reference_entry_appears_once() {
        let reference = entries(&[1, 2, 3, 4]);
        let out = reconcile(&[agg(2, 5)], &reference, RowOrder::CountDesc);
        assert_eq!(out.rows.len(), 4);
        let mut keys: Vec<_> = out.rows.iter().map(|r| r.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_empty_aggregation_gives_all_zero() {
        let reference = entries(&[1, 2, 3]);
        let out = reconcile(&[], &reference, RowOrder::CountDesc);
        assert_eq!(out.rows.len(), 3);
        assert!(out.rows.iter().all(|r| r.count == 0));
        assert_eq!(out.total, 0);
        assert_eq!(out.zero_count(), vec!["op1", "op2", "op3"]);
    }

    #[test]
    fn test_sorted_desc_with_stable_ties() {
        let reference = entries(&[1, 2, 3, 4, 5]);
        let out = reconcile(&[agg(4, 2), agg(2, 2), agg(5, 9)], &reference, RowOrder::CountDesc);
        let labels: Vec<&str> = out.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["op5", "op2", "op4", "op1", "op3"]);
    }

    #[test]
    fn test_reference_order_is_kept_when_requested() {
        let reference = entries(&[1, 2, 3]);
        let out = reconcile(&[agg(3, 10)], &reference, RowOrder::Reference);
        let labels: Vec<&str> = out.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["op1", "op2", "op3"]);
    }

    #[test]
    fn test_unknown_keys_are_excluded_and_accounted() {
        let reference = entries(&[1, 2]);
        let aggs = vec![agg(1, 3), agg(99, 4), Aggregate { key: vec![KeyPart::Null], count: 1 }];
        let out = reconcile(&aggs, &reference, RowOrder::CountDesc);
        assert_eq!(out.total, 3);
        assert_eq!(out.excluded, 5);
        let raw_total: usize = aggs.iter().map(|a| a.count).sum();
        assert_eq!(out.total + out.excluded, raw_total);
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let reference = entries(&[1, 2, 3]);
        let out = reconcile(&[agg(1, 1), agg(2, 1), agg(3, 1)], &reference, RowOrder::CountDesc)
            .with_percentages();
        let sum: f64 = out.rows.iter().map(|r| r.percentage.unwrap()).sum();
        assert_eq!(round1(sum), 99.9);
        assert_eq!(out.rows[0].percentage, Some(33.3));
    }

    #[test]
    fn test_rounded_percentages_can_drift_past_a_tenth() {
        // each row is rounded on its own, six times 16.7 overshoots
        let reference = entries(&[1, 2, 3, 4, 5, 6]);
        let aggs: Vec<Aggregate> = (1..=6).map(|c| agg(c, 1)).collect();
        let out = reconcile(&aggs, &reference, RowOrder::CountDesc).with_percentages();
        assert!(out.rows.iter().all(|r| r.percentage == Some(16.7)));
        let sum: f64 = out.rows.iter().map(|r| r.percentage.unwrap()).sum();
        assert_eq!(round1(sum), 100.2);
    }

    #[test]
    fn test_percentages_zero_when_total_zero() {
        let reference = entries(&[1, 2]);
        let out = reconcile(&[], &reference, RowOrder::CountDesc).with_percentages();
        assert!(out.rows.iter().all(|r| r.percentage == Some(0.0)));
    }

    #[test]
    fn test_idempotent() {
        let reference = entries(&[1, 2, 3, 4]);
        let aggs = vec![agg(3, 2), agg(1, 2), agg(2, 7)];
        let a = reconcile(&aggs, &reference, RowOrder::CountDesc).with_percentages();
        let b = reconcile(&aggs, &reference, RowOrder::CountDesc).with_percentages();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_stats() {
        let reference = entries(&[1, 2, 3, 4]);
        let out = reconcile(&[agg(2, 6), agg(3, 6), agg(1, 2)], &reference, RowOrder::CountDesc);
        let stats = out.stats();
        assert_eq!(stats.total, 14);
        assert_eq!(stats.mean_per_entity, 3.5);
        // tie between op2 and op3 goes to the first in reference order
        assert_eq!(
            stats.top,
            Some(TopEntry {
                label: "op2".into(),
                count: 6
            })
        );
    }

    #[test]
    fn test_stats_without_activity_has_no_top() {
        let reference = entries(&[1, 2]);
        let stats = reconcile(&[], &reference, RowOrder::CountDesc).stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean_per_entity, 0.0);
        assert!(stats.top.is_none());
    }

    #[test]
    fn test_group_label_is_carried() {
        let reference = vec![ReferenceEntry::new(vec![KeyPart::Code(1)], "Ana").with_group("N1")];
        let out = reconcile(&[agg(1, 1)], &reference, RowOrder::CountDesc);
        assert_eq!(out.rows[0].group.as_deref(), Some("N1"));
    }
}
