use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use utoipa::ToSchema;

use super::normalizer::{AttendanceNormalizer, NormalizedBatch, RawRow};
use crate::error::PayrollError;
use crate::model::{employee::EmployeeConfig, payroll::PayrollSummary};

/// Recognized names of the calendar-date column.
pub const DATE_ALIASES: [&str; 2] = ["date_val", "Date"];

/// Recognized names of the month-name column.
pub const MONTH_ALIASES: [&str; 2] = ["month_val", "Month"];

/// How overtime hours are paid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OvertimePolicy {
    /// A flat amount per overtime hour.
    FixedRate { rate_per_hour: f64 },
    /// A multiple of the employee's contracted per-hour rate.
    Multiplier { multiplier: f64 },
}

impl OvertimePolicy {
    pub fn mode(&self) -> &'static str {
        match self {
            OvertimePolicy::FixedRate { .. } => "fixed_rate",
            OvertimePolicy::Multiplier { .. } => "multiplier",
        }
    }

    pub fn rate(&self, per_hour_rate: f64) -> f64 {
        match *self {
            OvertimePolicy::FixedRate { rate_per_hour } => rate_per_hour,
            OvertimePolicy::Multiplier { multiplier } => per_hour_rate * multiplier,
        }
    }
}

/// Monthly professional-tax charge, looked up by month name.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxSchedule {
    default_charge: f64,
    by_month: BTreeMap<String, f64>,
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self::new(200.0).with_month("February", 300.0)
    }
}

impl TaxSchedule {
    pub fn new(default_charge: f64) -> Self {
        Self {
            default_charge,
            by_month: BTreeMap::new(),
        }
    }

    pub fn with_month(mut self, month: &str, charge: f64) -> Self {
        self.by_month.insert(month_key(month), charge);
        self
    }

    pub fn charge_for(&self, month: Option<&str>) -> f64 {
        month
            .and_then(|m| self.by_month.get(&month_key(m)))
            .copied()
            .unwrap_or(self.default_charge)
    }
}

fn month_key(month: &str) -> String {
    month.trim().to_lowercase()
}

/// Policy knobs that are not part of an employee's own configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollPolicy {
    pub overtime: OvertimePolicy,
    pub tax: TaxSchedule,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            overtime: OvertimePolicy::FixedRate {
                rate_per_hour: 100.0,
            },
            tax: TaxSchedule::default(),
        }
    }
}

/// Normalized rows together with the summary computed from them.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollRun {
    pub batch: NormalizedBatch,
    pub summary: PayrollSummary,
}

pub struct PayrollCalculator {
    policy: PayrollPolicy,
}

impl PayrollCalculator {
    pub fn new(policy: PayrollPolicy) -> Self {
        Self { policy }
    }

    /// Normalizes `rows` with the employee's standard day and computes the
    /// summary. `Ok(None)` means there was nothing to process.
    pub fn run(
        &self,
        rows: Vec<RawRow>,
        config: &EmployeeConfig,
    ) -> Result<Option<PayrollRun>, PayrollError> {
        validate(config)?;
        let batch = AttendanceNormalizer::new(config.standard_hours_per_day).normalize(rows);
        Ok(self
            .compute(&batch, config)?
            .map(|summary| PayrollRun { batch, summary }))
    }

    /// Computes the payroll summary of one period's normalized rows.
    ///
    /// Fails on a non-positive working-day count or standard day. An empty
    /// row set is not an error and yields `Ok(None)`.
    pub fn compute(
        &self,
        batch: &NormalizedBatch,
        config: &EmployeeConfig,
    ) -> Result<Option<PayrollSummary>, PayrollError> {
        validate(config)?;
        if batch.is_empty() {
            debug!(employee = %config.name, "no attendance rows to process");
            return Ok(None);
        }

        let total_worked_hours: f64 = batch.rows.iter().map(|r| r.worked_hours).sum();
        let total_overtime_hours: f64 = batch.rows.iter().map(|r| r.overtime_hours).sum();

        let working_days = f64::from(config.working_days);
        let contracted_hours = config.standard_hours_per_day * working_days;
        let per_hour_rate = config.monthly_salary / contracted_hours;

        let missing_hours = (contracted_hours - total_worked_hours).max(0.0);
        let leave_deduction = missing_hours * per_hour_rate;

        let tax_month = batch
            .rows
            .first()
            .and_then(|r| first_field(&r.fields, &MONTH_ALIASES))
            .and_then(Value::as_str)
            .map(str::to_string);
        let tax_deduction = self.policy.tax.charge_for(tax_month.as_deref());

        let attended_days = distinct_dates(batch);
        let deposit_deduction = config.security_deposit / working_days * attended_days as f64;

        let total_deductions = leave_deduction + tax_deduction + deposit_deduction;

        let overtime_rate = self.policy.overtime.rate(per_hour_rate);
        let overtime_pay = total_overtime_hours * overtime_rate;

        let final_payable = (config.monthly_salary - total_deductions) + overtime_pay;

        info!(
            employee = %config.name,
            rows = batch.rows.len(),
            total_worked_hours,
            total_overtime_hours,
            total_deductions,
            final_payable,
            "payroll computed"
        );

        Ok(Some(PayrollSummary {
            employee: config.name.clone(),
            monthly_salary: config.monthly_salary,
            total_worked_hours,
            total_overtime_hours,
            contracted_hours,
            per_hour_rate,
            leave_deduction,
            tax_deduction,
            deposit_deduction,
            total_deductions,
            overtime_policy: self.policy.overtime,
            overtime_rate,
            overtime_pay,
            final_payable,
            attended_days,
            tax_month,
            parse_failures: batch.parse_failures,
        }))
    }
}

fn validate(config: &EmployeeConfig) -> Result<(), PayrollError> {
    // NaN must fail too, hence the negated comparison.
    if config.working_days <= 0 || !(config.standard_hours_per_day > 0.0) {
        return Err(PayrollError::InvalidConfiguration {
            working_days: config.working_days,
            standard_hours_per_day: config.standard_hours_per_day,
        });
    }
    Ok(())
}

/// First alias present in the row. Sheet headers may carry stray spaces
/// (`Month `), so a trimmed match is accepted when no exact one exists.
pub(crate) fn first_field<'a>(fields: &'a RawRow, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        fields
            .get(*alias)
            .or_else(|| fields.iter().find(|(k, _)| k.trim() == *alias).map(|(_, v)| v))
    })
}

fn distinct_dates(batch: &NormalizedBatch) -> usize {
    batch
        .rows
        .iter()
        .filter_map(|r| first_field(&r.fields, &DATE_ALIASES))
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            // a zero here is a filled gap, not a date
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(salary: f64, days: i32, hours: f64, deposit: f64) -> EmployeeConfig {
        EmployeeConfig {
            name: "Om".into(),
            monthly_salary: salary,
            working_days: days,
            standard_hours_per_day: hours,
            security_deposit: deposit,
        }
    }

    fn day(date: &str, month: &str, work: f64) -> RawRow {
        match json!({ "date_val": date, "month_val": month, "work_hours": work, "ot_hours": null }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    /// 25 days of 8 hours, the 200 h scenario.
    fn month_of(month: &str) -> Vec<RawRow> {
        (1..=25)
            .map(|d| day(&format!("2026-01-{d:02}"), month, 8.0))
            .collect()
    }

    fn round2(v: f64) -> f64 {
        (v * 100.0).round() / 100.0
    }

    #[test]
    fn short_month_is_deducted_at_the_hourly_rate() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        let run = calc
            .run(month_of("January"), &config(18000.0, 26, 8.0, 0.0))
            .unwrap()
            .unwrap();
        let s = run.summary;

        assert_eq!(s.total_worked_hours, 200.0);
        assert_eq!(s.contracted_hours, 208.0);
        assert!((s.per_hour_rate - 86.538_461).abs() < 1e-5);
        assert_eq!(round2(s.leave_deduction), 692.31);
        assert_eq!(s.tax_deduction, 200.0);
        assert_eq!(s.overtime_pay, 0.0);
        assert_eq!(round2(s.final_payable), round2(18000.0 - 692.307_692 - 200.0));
    }

    #[test]
    fn february_carries_the_higher_tax() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        let s = calc
            .run(month_of("  FEBRUARY "), &config(18000.0, 26, 8.0, 0.0))
            .unwrap()
            .unwrap()
            .summary;
        assert_eq!(s.tax_deduction, 300.0);
        assert_eq!(s.tax_month.as_deref(), Some("  FEBRUARY "));
    }

    #[test]
    fn tax_month_comes_from_the_first_row_only() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        let rows = vec![
            day("2026-01-31", "January", 8.0),
            day("2026-02-01", "February", 8.0),
        ];
        let s = calc.run(rows, &config(18000.0, 26, 8.0, 0.0)).unwrap().unwrap().summary;
        assert_eq!(s.tax_deduction, 200.0);
    }

    #[test]
    fn deposit_is_apportioned_by_distinct_dates() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        let rows = vec![
            day("2026-01-05", "January", 4.0),
            day("2026-01-05", "January", 4.0),
            day("2026-01-06", "January", 8.0),
            day("2026-01-07", "January", 8.0),
        ];
        let s = calc
            .run(rows, &config(18000.0, 26, 8.0, 2600.0))
            .unwrap()
            .unwrap()
            .summary;
        assert_eq!(s.attended_days, 3);
        assert!((s.deposit_deduction - 300.0).abs() < 1e-9);
        assert!(
            (s.total_deductions - (s.leave_deduction + s.tax_deduction + s.deposit_deduction))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn surplus_hours_do_not_turn_deduction_negative() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        let rows = (1..=26)
            .map(|d| day(&format!("2026-03-{d:02}"), "March", 8.0))
            .collect();
        let s = calc
            .run(rows, &config(18000.0, 26, 8.0, 0.0))
            .unwrap()
            .unwrap()
            .summary;
        assert_eq!(s.leave_deduction, 0.0);
        assert_eq!(s.final_payable, 18000.0 - 200.0);
    }

    #[test]
    fn fixed_rate_overtime() {
        let calc = PayrollCalculator::new(PayrollPolicy {
            overtime: OvertimePolicy::FixedRate { rate_per_hour: 120.0 },
            tax: TaxSchedule::default(),
        });
        let rows = vec![day("2026-01-05", "January", 10.0)];
        let s = calc
            .run(rows, &config(18000.0, 26, 8.0, 0.0))
            .unwrap()
            .unwrap()
            .summary;
        assert_eq!(s.total_overtime_hours, 2.0);
        assert_eq!(s.overtime_rate, 120.0);
        assert_eq!(s.overtime_pay, 240.0);
    }

    #[test]
    fn multiplier_overtime_scales_the_hourly_rate() {
        let calc = PayrollCalculator::new(PayrollPolicy {
            overtime: OvertimePolicy::Multiplier { multiplier: 1.5 },
            tax: TaxSchedule::default(),
        });
        let rows = vec![day("2026-01-05", "January", 10.0)];
        let s = calc
            .run(rows, &config(20800.0, 26, 8.0, 0.0))
            .unwrap()
            .unwrap()
            .summary;
        assert_eq!(s.per_hour_rate, 100.0);
        assert_eq!(s.overtime_pay, 2.0 * 150.0);
    }

    #[test]
    fn final_payable_is_not_clamped() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        let rows = vec![day("2026-01-05", "January", 1.0)];
        let s = calc
            .run(rows, &config(1000.0, 26, 8.0, 26000.0))
            .unwrap()
            .unwrap()
            .summary;
        assert!(s.final_payable < 0.0);
    }

    #[test]
    fn empty_period_has_nothing_to_process() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        assert_eq!(calc.run(vec![], &config(18000.0, 26, 8.0, 0.0)), Ok(None));
    }

    #[test]
    fn zero_denominators_are_rejected_before_anything_else() {
        let calc = PayrollCalculator::new(PayrollPolicy::default());
        for cfg in [
            config(18000.0, 0, 8.0, 0.0),
            config(18000.0, 26, 0.0, 0.0),
            config(18000.0, -3, 8.0, 0.0),
            config(18000.0, 26, f64::NAN, 0.0),
        ] {
            assert!(matches!(
                calc.run(month_of("January"), &cfg),
                Err(PayrollError::InvalidConfiguration { .. })
            ));
            assert!(matches!(
                calc.run(vec![], &cfg),
                Err(PayrollError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn tax_schedule_lookup() {
        let tax = TaxSchedule::default().with_month("March", 250.0);
        assert_eq!(tax.charge_for(Some("february")), 300.0);
        assert_eq!(tax.charge_for(Some(" March")), 250.0);
        assert_eq!(tax.charge_for(Some("April")), 200.0);
        assert_eq!(tax.charge_for(None), 200.0);
    }
}
