//! Dashboard views: composes aggregates and renders them, rounded, as text.

use crate::aggregate::{
    cross_summarize, derive_metrics, percent_of, sum, top_n, CrossSummary, DerivedMetrics, Order,
};
use crate::config::ReportConfig;
use crate::models::{Dataset, Field, LedgerRecord, Schema};
use crate::utils::{fmt_amount, fmt_count, fmt_pct};

// ── Rate tiers ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    OnTrack,
    Watch,
    Behind,
}

impl RateTier {
    pub fn classify(rate: f64, cfg: &ReportConfig) -> RateTier {
        if rate >= cfg.on_track_rate {
            RateTier::OnTrack
        } else if rate >= cfg.watch_rate {
            RateTier::Watch
        } else {
            RateTier::Behind
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RateTier::OnTrack => "on track",
            RateTier::Watch => "watch",
            RateTier::Behind => "behind",
        }
    }
}

// ── Overview ──────────────────────────────────────────────────────────────────

/// Global figures across both collections.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub totals: CrossSummary,
    /// Revenue YTD against revenue budget.
    pub completion_rate: f64,
    pub revenue_count: usize,
    pub cost_count: usize,
    pub has_data: bool,
}

pub fn overview(data: &Dataset) -> Overview {
    let revenue_budget = sum(&data.revenue, Field::Budget);
    let totals = cross_summarize(&data.revenue, &data.cost);
    Overview {
        completion_rate: percent_of(totals.total_revenue, revenue_budget),
        totals,
        revenue_count: data.revenue.len(),
        cost_count: data.cost.len(),
        has_data: data.has_data(),
    }
}

const RULE: &str = "─────────────────────────────────";

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn render_overview(o: &Overview) -> String {
    let mut lines = vec![RULE.to_string(), "  Financial overview (万元)".to_string(), RULE.to_string()];
    if !o.has_data {
        lines.push("  No data — run `findash upload` first.".to_string());
        return join_lines(lines);
    }
    lines.push(format!("  Revenue YTD   : {}", fmt_amount(o.totals.total_revenue)));
    lines.push(format!("  Cost YTD      : {}", fmt_amount(o.totals.total_cost)));
    lines.push(format!("  Net profit    : {}", fmt_amount(o.totals.net_profit)));
    lines.push(format!("  Profit margin : {}", fmt_pct(o.totals.profit_margin)));
    lines.push(format!("  Completion    : {}", fmt_pct(o.completion_rate)));
    lines.push(format!(
        "  Records       : {} revenue / {} cost",
        fmt_count(o.revenue_count),
        fmt_count(o.cost_count)
    ));
    lines.push(RULE.to_string());
    join_lines(lines)
}

// ── Per-schema report ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub label: String,
    pub value: f64,
    pub tier: Option<RateTier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaReport {
    pub schema: Schema,
    pub record_count: usize,
    pub metrics: DerivedMetrics,
    pub top_departments: Vec<RankedEntry>,
    pub top_by_rate: Vec<RankedEntry>,
}

pub fn schema_report<R: LedgerRecord>(records: &[R], cfg: &ReportConfig) -> SchemaReport {
    let metrics = derive_metrics(records);

    let top_departments = metrics
        .grouped_by_department
        .ranked()
        .into_iter()
        .take(cfg.top_n)
        .map(|(dept, value)| RankedEntry {
            label: dept.to_string(),
            value,
            tier: None,
        })
        .collect();

    let top_by_rate = top_n(records, Field::Rate, cfg.top_n, Order::Descending)
        .into_iter()
        .map(|r| {
            let rate = r.value(Field::Rate);
            RankedEntry {
                label: r.identity().to_string(),
                value: rate,
                tier: Some(RateTier::classify(rate, cfg)),
            }
        })
        .collect();

    SchemaReport {
        schema: R::SCHEMA,
        record_count: records.len(),
        metrics,
        top_departments,
        top_by_rate,
    }
}

pub fn render_schema_report(r: &SchemaReport) -> String {
    let m = &r.metrics;
    let rate_label = match r.schema {
        Schema::Revenue => "Completion",
        Schema::Cost => "Cost rate",
    };

    let mut lines = vec![
        format!("── {} ({} records, 万元) ──", r.schema, fmt_count(r.record_count)),
        format!("  Current month : {}", fmt_amount(m.total_current_period)),
        format!("  Year to date  : {}", fmt_amount(m.total_year_to_date)),
        format!("  Budget        : {}", fmt_amount(m.total_budget)),
        format!("  {:<13} : {}", rate_label, fmt_pct(m.overall_rate)),
    ];
    if m.grouped_by_department.is_empty() {
        return join_lines(lines);
    }

    lines.push("  By department:".to_string());
    for (dept, value) in m.grouped_by_department.iter() {
        let name = if dept.is_empty() { "(none)" } else { dept };
        lines.push(format!("    {:<20} {:>14}", name, fmt_amount(value)));
    }

    lines.push("  Top departments:".to_string());
    for (i, e) in r.top_departments.iter().enumerate() {
        lines.push(format!("    {}. {} {}", i + 1, e.label, fmt_amount(e.value)));
    }

    lines.push("  Top by rate:".to_string());
    for (i, e) in r.top_by_rate.iter().enumerate() {
        let tier = e.tier.map(RateTier::label).unwrap_or("");
        lines.push(format!("    {}. {} {} ({})", i + 1, e.label, fmt_pct(e.value), tier));
    }
    join_lines(lines)
}

/// Flat table of a collection, amounts rounded for display.
pub fn render_records<R: LedgerRecord>(records: &[R]) -> String {
    if records.is_empty() {
        return format!("No {} records.\n", R::SCHEMA);
    }
    let header = format!(
        "{:<28} {:>12} {:>12} {:>12} {:>8}  {}",
        "label", "current", "ytd", "budget", "rate", "department"
    );
    let rows = records.iter().map(|r| {
        format!(
            "{:<28} {:>12} {:>12} {:>12} {:>8}  {}",
            r.identity(),
            fmt_amount(r.value(Field::CurrentPeriod)),
            fmt_amount(r.value(Field::YearToDate)),
            fmt_amount(r.value(Field::Budget)),
            fmt_pct(r.value(Field::Rate)),
            r.department()
        )
    });
    join_lines(std::iter::once(header).chain(rows).collect())
}

pub fn render_comparison(x: &CrossSummary) -> String {
    let loss = if x.net_profit < 0.0 { " (loss)" } else { "" };
    format!(
        "Revenue vs cost (万元)\n  Total revenue : {}\n  Total cost    : {}\n  Net profit    : {}{}\n  Profit margin : {}\n",
        fmt_amount(x.total_revenue),
        fmt_amount(x.total_cost),
        fmt_amount(x.net_profit),
        loss,
        fmt_pct(x.profit_margin)
    )
}
