//! Pure transforms over record collections.
//!
//! Nothing here rounds: values keep full `f64` precision and only the report
//! layer rounds for display. Every rate is guarded so an empty denominator
//! yields 0 instead of NaN.

use crate::models::{CostRecord, Field, KeyField, LedgerRecord, RevenueRecord};
use std::collections::HashMap;

/// `numerator / denominator * 100`, or 0 when the denominator is not positive.
pub fn percent_of(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

pub fn sum<R: LedgerRecord>(records: &[R], field: Field) -> f64 {
    records.iter().map(|r| r.value(field)).sum()
}

// ── Summary ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub total: f64,
    pub total_budget: f64,
    pub rate: f64,
}

impl Summary {
    pub fn new(total: f64, total_budget: f64) -> Self {
        Self {
            total,
            total_budget,
            rate: percent_of(total, total_budget),
        }
    }

    /// Summary of the union of two disjoint collections.
    pub fn merge(self, other: Summary) -> Summary {
        Summary::new(self.total + other.total, self.total_budget + other.total_budget)
    }
}

pub fn summarize<R: LedgerRecord>(records: &[R], amount: Field, budget: Field) -> Summary {
    Summary::new(sum(records, amount), sum(records, budget))
}

// ── Grouping ──────────────────────────────────────────────────────────────────

/// Sums keyed by label, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GroupedTotals {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl GroupedTotals {
    pub fn add(&mut self, key: &str, value: f64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += value,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn grand_total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    /// Largest first; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = self.iter().collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }
}

impl PartialEq for GroupedTotals {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

pub fn group_by<R: LedgerRecord>(records: &[R], key: KeyField, value: Field) -> GroupedTotals {
    let mut groups = GroupedTotals::default();
    for r in records {
        groups.add(r.key(key), r.value(value));
    }
    groups
}

// ── Cross-collection ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CrossSummary {
    pub total_revenue: f64,
    pub total_cost: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
}

/// Year-to-date revenue against year-to-date cost.
///
/// A loss is still reported when revenue is 0; only the margin is guarded.
pub fn cross_summarize(revenue: &[RevenueRecord], cost: &[CostRecord]) -> CrossSummary {
    let total_revenue = sum(revenue, Field::YearToDate);
    let total_cost = sum(cost, Field::YearToDate);
    let net_profit = total_revenue - total_cost;
    CrossSummary {
        total_revenue,
        total_cost,
        net_profit,
        profit_margin: percent_of(net_profit, total_revenue),
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Descending,
    Ascending,
}

/// Up to `n` records sorted by `field`. Stable: ties keep input order.
pub fn top_n<R: LedgerRecord>(records: &[R], field: Field, n: usize, order: Order) -> Vec<&R> {
    let mut sorted: Vec<&R> = records.iter().collect();
    match order {
        Order::Descending => sorted.sort_by(|a, b| b.value(field).total_cmp(&a.value(field))),
        Order::Ascending => sorted.sort_by(|a, b| a.value(field).total_cmp(&b.value(field))),
    }
    sorted.truncate(n);
    sorted
}

// ── Derived metrics ───────────────────────────────────────────────────────────

/// Everything a single-collection view needs. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedMetrics {
    pub total_current_period: f64,
    pub total_year_to_date: f64,
    pub total_budget: f64,
    pub overall_rate: f64,
    pub grouped_by_department: GroupedTotals,
}

pub fn derive_metrics<R: LedgerRecord>(records: &[R]) -> DerivedMetrics {
    let ytd = summarize(records, Field::YearToDate, Field::Budget);
    DerivedMetrics {
        total_current_period: sum(records, Field::CurrentPeriod),
        total_year_to_date: ytd.total,
        total_budget: ytd.total_budget,
        overall_rate: ytd.rate,
        grouped_by_department: group_by(records, KeyField::Department, Field::YearToDate),
    }
}
