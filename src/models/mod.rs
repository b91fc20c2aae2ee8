use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Raw spreadsheet cells ─────────────────────────────────────────────────────

/// One untyped cell as it comes off the decoder.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawCell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

/// Positional row, column 0 first.
pub type RawRow = Vec<RawCell>;

// ── Schema selection ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    Revenue,
    Cost,
}

impl Schema {
    pub fn label(self) -> &'static str {
        match self {
            Schema::Revenue => "revenue",
            Schema::Cost => "cost",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Schema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revenue" | "income" | "收入" => Ok(Schema::Revenue),
            "cost" | "costs" | "成本" => Ok(Schema::Cost),
            other => Err(format!("unknown schema '{}' (expected revenue or cost)", other)),
        }
    }
}

// ── Column table ──────────────────────────────────────────────────────────────

/// Which spreadsheet column feeds which record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub identity: usize,
    pub current: usize,
    pub year_to_date: usize,
    pub budget: usize,
    pub rate: usize,
    pub department: usize,
}

impl ColumnMap {
    /// Identity | current | YTD | budget | rate | department
    pub const STANDARD: ColumnMap = ColumnMap {
        identity: 0,
        current: 1,
        year_to_date: 2,
        budget: 3,
        rate: 4,
        department: 5,
    };

    pub fn for_schema(schema: Schema) -> ColumnMap {
        match schema {
            Schema::Revenue | Schema::Cost => ColumnMap::STANDARD,
        }
    }
}

// ── Field selectors ───────────────────────────────────────────────────────────

/// Numeric fields shared by both record shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CurrentPeriod,
    YearToDate,
    Budget,
    Rate,
}

/// Text fields usable as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    Identity,
    Department,
}

/// A typed row after unit conversion, before it takes a schema-specific shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub identity: String,
    pub current: f64,
    pub year_to_date: f64,
    pub budget: f64,
    pub rate: f64,
    pub department: String,
}

/// Behaviour shared by revenue and cost records.
pub trait LedgerRecord: Clone {
    const SCHEMA: Schema;

    fn from_normalized(row: NormalizedRow) -> Self;
    fn identity(&self) -> &str;
    fn department(&self) -> &str;
    fn value(&self, field: Field) -> f64;

    fn key(&self, field: KeyField) -> &str {
        match field {
            KeyField::Identity => self.identity(),
            KeyField::Department => self.department(),
        }
    }
}

// ── Revenue ───────────────────────────────────────────────────────────────────

/// Amounts are in wan (10,000 currency units).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRecord {
    pub business_segment: String,
    pub current_month_revenue: f64,
    pub year_to_date_revenue: f64,
    pub budget_amount: f64,
    pub completion_rate: f64,
    pub department: String,
}

impl LedgerRecord for RevenueRecord {
    const SCHEMA: Schema = Schema::Revenue;

    fn from_normalized(row: NormalizedRow) -> Self {
        Self {
            business_segment: row.identity,
            current_month_revenue: row.current,
            year_to_date_revenue: row.year_to_date,
            budget_amount: row.budget,
            completion_rate: row.rate,
            department: row.department,
        }
    }

    fn identity(&self) -> &str {
        &self.business_segment
    }

    fn department(&self) -> &str {
        &self.department
    }

    fn value(&self, field: Field) -> f64 {
        match field {
            Field::CurrentPeriod => self.current_month_revenue,
            Field::YearToDate => self.year_to_date_revenue,
            Field::Budget => self.budget_amount,
            Field::Rate => self.completion_rate,
        }
    }
}

// ── Cost ──────────────────────────────────────────────────────────────────────

/// Amounts are in wan (10,000 currency units).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    pub cost_category: String,
    pub current_month_cost: f64,
    pub year_to_date_cost: f64,
    pub budget_amount: f64,
    pub cost_rate: f64,
    pub department: String,
}

impl LedgerRecord for CostRecord {
    const SCHEMA: Schema = Schema::Cost;

    fn from_normalized(row: NormalizedRow) -> Self {
        Self {
            cost_category: row.identity,
            current_month_cost: row.current,
            year_to_date_cost: row.year_to_date,
            budget_amount: row.budget,
            cost_rate: row.rate,
            department: row.department,
        }
    }

    fn identity(&self) -> &str {
        &self.cost_category
    }

    fn department(&self) -> &str {
        &self.department
    }

    fn value(&self, field: Field) -> f64 {
        match field {
            Field::CurrentPeriod => self.current_month_cost,
            Field::YearToDate => self.year_to_date_cost,
            Field::Budget => self.budget_amount,
            Field::Rate => self.cost_rate,
        }
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Both persisted collections as last uploaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub revenue: Vec<RevenueRecord>,
    pub cost: Vec<CostRecord>,
}

impl Dataset {
    pub fn has_data(&self) -> bool {
        !self.revenue.is_empty() || !self.cost.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revenue_serializes_with_camel_case_names() {
        let rec = RevenueRecord {
            business_segment: "A".into(),
            current_month_revenue: 1.0,
            year_to_date_revenue: 2.0,
            budget_amount: 3.0,
            completion_rate: 4.0,
            department: "D".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        for key in [
            "businessSegment",
            "currentMonthRevenue",
            "yearToDateRevenue",
            "budgetAmount",
            "completionRate",
            "department",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_cost_field_accessors() {
        let rec = CostRecord {
            cost_category: "Labour".into(),
            current_month_cost: 1.5,
            year_to_date_cost: 9.0,
            budget_amount: 12.0,
            cost_rate: 75.0,
            department: "Ops".into(),
        };
        assert_eq!(rec.key(KeyField::Identity), "Labour");
        assert_eq!(rec.key(KeyField::Department), "Ops");
        assert_eq!(rec.value(Field::YearToDate), 9.0);
        assert_eq!(rec.value(Field::Rate), 75.0);

        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"costCategory\":\"Labour\""));
        assert!(json.contains("\"costRate\":75.0"));
    }

    #[test]
    fn test_schema_from_str() {
        assert_eq!("Revenue".parse::<Schema>(), Ok(Schema::Revenue));
        assert_eq!(" cost ".parse::<Schema>(), Ok(Schema::Cost));
        assert_eq!("成本".parse::<Schema>(), Ok(Schema::Cost));
        assert!("profit".parse::<Schema>().is_err());
    }
}
